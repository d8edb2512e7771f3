use clap::{Parser, Subcommand};
use idl_gen::cmds;
use idl_gen::cmds::codegen::OptionOverrides;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "idl-gen")]
#[command(about = "Schema compiler emitting zero-copy C# accessors and builders", long_about = None)]
struct Cli {
  /* Log at debug level unless RUST_LOG says otherwise */
  #[arg(short = 'v', long = "verbose", global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /* Generate C# sources from schema documents */
  Codegen {
    /* Input YAML schema files */
    #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /* YAML file with generator options */
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /* Output directory for generated code */
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = "generated")]
    output_dir: PathBuf,

    /* Base name of the combined file in one-file mode */
    #[arg(long = "name")]
    name: Option<String>,

    /* Write every entity into one file */
    #[arg(long = "one-file")]
    one_file: bool,

    /* Make mutators public */
    #[arg(long = "mutable-buffer")]
    mutable_buffer: bool,

    /* Emit owned classes with Pack/UnPack */
    #[arg(long = "object-api")]
    object_api: bool,

    /* Emit JSON hooks on owned classes */
    #[arg(long = "json")]
    json_serializer: bool,

    /* Annotate nullable reference returns */
    #[arg(long = "nullable")]
    nullable_annotation: bool,

    #[arg(long = "filename-suffix")]
    filename_suffix: Option<String>,

    #[arg(long = "filename-ext")]
    filename_extension: Option<String>,

    #[arg(long = "object-prefix")]
    object_prefix: Option<String>,

    #[arg(long = "object-suffix")]
    object_suffix: Option<String>,
  },

  /* Resolve schema documents and print per-field layout */
  Analyze {
    /* Input YAML schema files */
    #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /* Print the layout as JSON */
    #[arg(long = "json")]
    json: bool,
  },
}

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .init();

  match cli.command {
    Commands::Codegen {
      files,
      config,
      output_dir,
      name,
      one_file,
      mutable_buffer,
      object_api,
      json_serializer,
      nullable_annotation,
      filename_suffix,
      filename_extension,
      object_prefix,
      object_suffix,
    } => {
      let overrides = OptionOverrides {
        one_file,
        mutable_buffer,
        object_api,
        json_serializer,
        nullable_annotation,
        filename_suffix,
        filename_extension,
        object_prefix,
        object_suffix,
      };
      cmds::codegen::run(files, config, overrides, name, output_dir, cli.verbose)?;
    }

    Commands::Analyze { files, json } => {
      cmds::analyze::run(files, json)?;
    }
  }

  Ok(())
}

/* Codegen command - generate C# sources from schema documents */

use super::common::load_schema;
use crate::codegen::csharp::CSharpGenerator;
use crate::codegen::{DirectorySink, GeneratorOptions};
use anyhow::Context;
use std::path::PathBuf;

/* Flag overrides applied on top of the optional config file */
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
  pub one_file: bool,
  pub mutable_buffer: bool,
  pub object_api: bool,
  pub json_serializer: bool,
  pub nullable_annotation: bool,
  pub filename_suffix: Option<String>,
  pub filename_extension: Option<String>,
  pub object_prefix: Option<String>,
  pub object_suffix: Option<String>,
}

impl OptionOverrides {
  /* Switches only ever turn features on; strings replace the configured value */
  pub fn apply(self, options: &mut GeneratorOptions) {
    options.one_file |= self.one_file;
    options.mutable_buffer |= self.mutable_buffer;
    options.object_api |= self.object_api;
    options.json_serializer |= self.json_serializer;
    options.nullable_annotation |= self.nullable_annotation;
    if let Some(suffix) = self.filename_suffix {
      options.filename_suffix = suffix;
    }
    if let Some(ext) = self.filename_extension {
      options.filename_extension = ext;
    }
    if let Some(prefix) = self.object_prefix {
      options.object_prefix = prefix;
    }
    if let Some(suffix) = self.object_suffix {
      options.object_suffix = suffix;
    }
  }
}

pub fn load_options(config: Option<&PathBuf>, overrides: OptionOverrides) -> anyhow::Result<GeneratorOptions> {
  let mut options = match config {
    Some(path) => {
      let text =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config '{}'", path.display()))?;
      GeneratorOptions::from_yaml(&text).with_context(|| format!("invalid config '{}'", path.display()))?
    }
    None => GeneratorOptions::default(),
  };
  overrides.apply(&mut options);
  Ok(options)
}

/* Execute the codegen command */
pub fn run(
  files: Vec<PathBuf>,
  config: Option<PathBuf>,
  overrides: OptionOverrides,
  name: Option<String>,
  output_dir: PathBuf,
  verbose: bool,
) -> anyhow::Result<()> {
  let options = load_options(config.as_ref(), overrides)?;
  if verbose {
    println!("Schema Compiler - C# Code Generation");
    println!("====================================\n");
    println!("[~] Configuration:");
    println!("  Output directory: {}", output_dir.display());
    println!("  One file: {}", options.one_file);
    println!("  Object API: {}", options.object_api);
    println!("  JSON hooks: {}", options.json_serializer);
    println!();
  }

  let schema = load_schema(&files, name.as_deref(), verbose)?;

  let mut sink = DirectorySink::new(&output_dir);
  let report = CSharpGenerator::new(&schema, &options)
    .generate(&mut sink)
    .with_context(|| format!("failed to write into '{}'", output_dir.display()))?;

  for warning in &report.warnings {
    println!("[!] {}", warning);
  }
  if !report.is_success() {
    for failure in &report.failures {
      println!("[✗] {}", failure);
    }
    anyhow::bail!("{} definition(s) could not be generated", report.failures.len());
  }

  if verbose {
    println!("\n[✓] Generated {} unit(s) in {}", report.units.len(), output_dir.display());
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_flags_override_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("gen.yaml");
    std::fs::write(&config, "object-api: true\nobject-suffix: Obj\nfilename-extension: txt\n").unwrap();

    let overrides = OptionOverrides {
      one_file: true,
      object_suffix: Some("Data".to_string()),
      ..Default::default()
    };
    let options = load_options(Some(&config), overrides).unwrap();
    assert!(options.object_api);
    assert!(options.one_file);
    assert_eq!(options.object_suffix, "Data");
    assert_eq!(options.filename_extension, "txt");
  }

  #[test]
  fn test_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    let err = load_options(Some(&missing), OptionOverrides::default()).unwrap_err();
    assert!(err.to_string().contains("failed to read config"));
  }
}

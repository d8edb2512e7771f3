/* Common utilities shared between analyze and codegen commands */

use crate::schema::{Schema, SchemaResolver};
use anyhow::Context;
use std::path::PathBuf;

/* Load every schema file and resolve them together */
pub fn load_schema(files: &[PathBuf], name: Option<&str>, verbose: bool) -> anyhow::Result<Schema> {
  let mut resolver = SchemaResolver::new();
  if let Some(name) = name {
    resolver.set_name(name);
  }

  if verbose {
    println!("[~] Loading {} schema file(s)...", files.len());
  }
  for file in files {
    if verbose {
      println!("    - {}", file.display());
    }
    resolver.load_file(file).with_context(|| format!("failed to load schema '{}'", file.display()))?;
  }

  let schema = resolver.resolve().context("schema resolution failed")?;
  if verbose {
    println!(
      "[✓] Resolved {} enum(s), {} struct(s)/table(s), {} service(s)",
      schema.enums.len(),
      schema.structs.len(),
      schema.services.len()
    );
  }
  Ok(schema)
}

/* File assembly and the write boundary.
 *
 * Emitters produce bare code blocks; this module wraps them with the banner,
 * the namespace block and the runtime `using` lines, decides file names and
 * hands the text to an `OutputSink`.
 */

use super::options::GeneratorOptions;
use crate::error::{GenError, GenResult};
use crate::schema::Namespace;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const BANNER: &str =
  "// <auto-generated>\n//  automatically generated by the FlatBuffers compiler, do not modify\n// </auto-generated>\n\n";

pub const USINGS: &[&str] = &[
  "using global::System;",
  "using global::System.Collections.Generic;",
  "using global::System.Threading;",
  "using global::System.Threading.Tasks;",
  "using global::BigBuffers;",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
  Enum,
  Struct,
  Service,
}

impl UnitKind {
  /* Enums never reference runtime types */
  pub fn needs_includes(self) -> bool {
    !matches!(self, UnitKind::Enum)
  }
}

/* Emitted code of one entity, before assembly */
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedUnit {
  pub name: String,
  pub namespace: Namespace,
  pub kind: UnitKind,
  pub code: String,
}

/* ============================================================================
   Assembly
   ============================================================================ */

fn push_prologue(out: &mut String, options: &GeneratorOptions) {
  out.push_str(BANNER);
  if options.nullable_annotation {
    out.push_str("#nullable enable\n\n");
  }
}

fn push_usings(out: &mut String) {
  for line in USINGS {
    out.push_str(line);
    out.push('\n');
  }
  out.push('\n');
}

fn push_namespace_block(out: &mut String, namespace: &Namespace, needs_includes: bool, codes: &[&str]) {
  if !namespace.is_global() {
    out.push_str(&format!("namespace {}\n{{\n\n", namespace.dotted()));
  }
  if needs_includes {
    push_usings(out);
  }
  for code in codes {
    out.push_str(code);
  }
  if !namespace.is_global() {
    out.push_str("\n}\n");
  }
}

/* Text of a file holding a single entity */
pub fn assemble_unit(unit: &GeneratedUnit, options: &GeneratorOptions) -> String {
  let mut out = String::new();
  push_prologue(&mut out, options);
  push_namespace_block(&mut out, &unit.namespace, unit.kind.needs_includes(), &[unit.code.as_str()]);
  out
}

/* Text of the combined file. Units are grouped per namespace in order of first
 * appearance, with the global namespace first so its `using` lines stay ahead of
 * every namespace declaration. */
pub fn assemble_one_file(units: &[GeneratedUnit], options: &GeneratorOptions) -> String {
  let mut groups: IndexMap<Vec<String>, (bool, Vec<&str>)> = IndexMap::new();
  if units.iter().any(|u| u.namespace.is_global()) {
    groups.insert(Vec::new(), (false, Vec::new()));
  }
  for unit in units {
    let entry = groups.entry(unit.namespace.components.clone()).or_insert((false, Vec::new()));
    entry.0 |= unit.kind.needs_includes();
    entry.1.push(unit.code.as_str());
  }

  let mut out = String::new();
  push_prologue(&mut out, options);
  for (components, (needs_includes, codes)) in &groups {
    let namespace = Namespace { components: components.clone() };
    push_namespace_block(&mut out, &namespace, *needs_includes, codes);
  }
  out
}

/* `<NamespaceDir>/<Name><ext>` */
pub fn unit_path(unit: &GeneratedUnit, options: &GeneratorOptions) -> PathBuf {
  let mut path = PathBuf::new();
  for component in &unit.namespace.components {
    path.push(component);
  }
  path.push(format!("{}{}", unit.name, options.extension()));
  path
}

/* `<schema><suffix><ext>` */
pub fn one_file_path(schema_name: &str, options: &GeneratorOptions) -> PathBuf {
  PathBuf::from(format!("{}{}{}", schema_name, options.filename_suffix, options.extension()))
}

/* ============================================================================
   Sinks
   ============================================================================ */

pub trait OutputSink {
  fn write_file(&mut self, relative: &Path, contents: &str) -> GenResult<()>;
}

/* Writes below a root directory, creating namespace directories on demand */
pub struct DirectorySink {
  root: PathBuf,
}

impl DirectorySink {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    DirectorySink { root: root.into() }
  }
}

impl OutputSink for DirectorySink {
  fn write_file(&mut self, relative: &Path, contents: &str) -> GenResult<()> {
    let path = self.root.join(relative);
    let io_err = |source| GenError::Io { path: path.clone(), source };

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    /* Handle is released on every path, the explicit flush surfaces late errors */
    let mut writer = BufWriter::new(File::create(&path).map_err(io_err)?);
    writer.write_all(contents.as_bytes()).map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    tracing::info!(path = %path.display(), bytes = contents.len(), "wrote generated file");
    Ok(())
  }
}

/* Keeps files in memory, in write order */
#[derive(Debug, Default)]
pub struct MemorySink {
  pub files: IndexMap<PathBuf, String>,
}

impl MemorySink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, relative: impl AsRef<Path>) -> Option<&str> {
    self.files.get(relative.as_ref()).map(String::as_str)
  }
}

impl OutputSink for MemorySink {
  fn write_file(&mut self, relative: &Path, contents: &str) -> GenResult<()> {
    self.files.insert(relative.to_path_buf(), contents.to_string());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn unit(ns: &str, name: &str, kind: UnitKind) -> GeneratedUnit {
    GeneratedUnit { name: name.to_string(), namespace: Namespace::parse(ns), kind, code: format!("// {}\n", name) }
  }

  #[test]
  fn test_enum_unit_has_no_usings() {
    let text = assemble_unit(&unit("MyGame.Sample", "Color", UnitKind::Enum), &GeneratorOptions::default());
    assert!(text.starts_with(BANNER));
    assert!(text.contains("namespace MyGame.Sample\n{\n\n// Color\n\n}\n"));
    assert!(!text.contains("using global::BigBuffers;"));
  }

  #[test]
  fn test_struct_unit_in_global_namespace() {
    let text = assemble_unit(&unit("", "Monster", UnitKind::Struct), &GeneratorOptions::default());
    assert!(!text.contains("namespace"));
    assert!(text.ends_with("using global::BigBuffers;\n\n// Monster\n"));
  }

  #[test]
  fn test_paths() {
    let options = GeneratorOptions::default();
    assert_eq!(unit_path(&unit("MyGame.Sample", "Monster", UnitKind::Struct), &options), PathBuf::from("MyGame/Sample/Monster.cs"));
    assert_eq!(one_file_path("monster", &options), PathBuf::from("monster_generated.cs"));
  }

  #[test]
  fn test_one_file_groups_namespaces() {
    let units = vec![unit("A", "X", UnitKind::Enum), unit("", "G", UnitKind::Struct), unit("A", "Y", UnitKind::Struct)];
    let text = assemble_one_file(&units, &GeneratorOptions::default());
    let global = text.find("// G").unwrap();
    let ns = text.find("namespace A").unwrap();
    assert!(global < ns);
    assert!(text.contains("// X\n// Y\n"));
    assert_eq!(text.matches("using global::BigBuffers;").count(), 2);
  }
}

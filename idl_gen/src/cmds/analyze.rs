/* Analyze command - per-field layout report */

use super::common::load_schema;
use crate::layout::{Addressing, EntityLayout};
use crate::schema::Schema;
use serde_json::{Value, json};
use std::path::PathBuf;

fn layout_json(schema: &Schema) -> Value {
  let entities: Vec<Value> = schema
    .struct_ids()
    .map(|id| {
      let layout = EntityLayout::resolve(schema, id);
      let def = layout.def;
      let fields: Vec<Value> = layout
        .fields
        .iter()
        .map(|fl| {
          let (kind, position) = match fl.addressing {
            Addressing::Static { offset } => ("static", offset),
            Addressing::Vtable { voffset } => ("vtable", voffset as u64),
          };
          json!({
            "name": fl.field.name,
            "category": format!("{:?}", fl.category),
            "addressing": kind,
            "position": position,
            "size": fl.inline_size,
            "align": fl.inline_alignment,
            "referenceable": fl.directly_referenceable,
            "deprecated": fl.field.deprecated,
          })
        })
        .collect();
      json!({
        "name": schema.dotted_name(def.namespace, &def.name),
        "fixed": def.fixed,
        "bytesize": def.bytesize,
        "minalign": def.minalign,
        "fields": fields,
      })
    })
    .collect();
  json!({ "entities": entities })
}

fn print_layout_tables(schema: &Schema) {
  for id in schema.struct_ids() {
    let layout = EntityLayout::resolve(schema, id);
    let def = layout.def;
    let name = schema.dotted_name(def.namespace, &def.name);
    if def.fixed {
      println!("[~] struct {} (size {}, align {})", name, def.bytesize, def.minalign);
    } else {
      println!("[~] table {}", name);
    }
    for fl in &layout.fields {
      let position = match fl.addressing {
        Addressing::Static { offset } => format!("@{}", offset),
        Addressing::Vtable { voffset } => format!("vt{}", voffset),
      };
      let mut flags = Vec::new();
      if fl.directly_referenceable {
        flags.push("ref");
      }
      if fl.field.deprecated {
        flags.push("deprecated");
      }
      if fl.field.required {
        flags.push("required");
      }
      if fl.field.key {
        flags.push("key");
      }
      println!(
        "    {:<24} {:<10} {:>6} size {:>4} align {:>2} {}",
        fl.field.name,
        format!("{:?}", fl.category),
        position,
        fl.inline_size,
        fl.inline_alignment,
        flags.join(",")
      );
    }
    println!();
  }
}

/* Execute the analyze command */
pub fn run(files: Vec<PathBuf>, json: bool) -> anyhow::Result<()> {
  let schema = load_schema(&files, None, !json)?;
  if json {
    println!("{}", serde_json::to_string_pretty(&layout_json(&schema))?);
  } else {
    println!();
    print_layout_tables(&schema);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::SchemaResolver;
  use idl_types::SchemaFile;

  #[test]
  fn test_layout_json_reports_positions() {
    let yaml = r#"
definitions:
  - name: Vec2
    kind:
      struct:
        fields: [{ name: x, type: float }, { name: y, type: double }]
  - name: Body
    kind:
      table:
        fields: [{ name: pos, type: Vec2 }, { name: label, type: string }]
"#;
    let mut resolver = SchemaResolver::new();
    resolver.add_file(SchemaFile::from_yaml(yaml).unwrap()).unwrap();
    let schema = resolver.resolve().unwrap();

    let report = layout_json(&schema);
    let vec2 = &report["entities"][0];
    assert_eq!(vec2["bytesize"], 16);
    assert_eq!(vec2["fields"][1]["position"], 8);
    assert_eq!(vec2["fields"][1]["addressing"], "static");

    let body = &report["entities"][1];
    assert_eq!(body["fields"][1]["addressing"], "vtable");
    assert_eq!(body["fields"][1]["position"], 6);
    assert_eq!(body["fields"][1]["size"], 8);
  }
}

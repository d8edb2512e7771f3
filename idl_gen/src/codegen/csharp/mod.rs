/* C# emitter for the BigBuffers runtime.
 *
 * `CSharpGenerator` walks enums, then structs and tables, then services, and
 * hands each entity to its emitter. A contract violation inside one entity
 * drops only that entity; it is logged, recorded in the report and the run
 * carries on. Write failures abort the run.
 */

pub mod accessors;
pub mod builders;
pub mod enums;
pub mod lookup;
pub mod naming;
pub mod object_api;
pub mod services;
pub mod structs;
pub mod types;
pub mod unions;
pub mod vectors;

use super::context::EmitContext;
use super::options::GeneratorOptions;
use super::output::{GeneratedUnit, OutputSink, UnitKind, assemble_one_file, assemble_unit, one_file_path, unit_path};
use crate::error::{GenError, GenResult};
use crate::schema::Schema;
use tracing::{debug, error, info};

/* `///` comment block, one line per doc entry */
pub(crate) fn push_doc(code: &mut String, indent: &str, doc: &[String]) {
  for line in doc {
    code.push_str(indent);
    code.push_str("///");
    if !line.is_empty() {
      code.push(' ');
      code.push_str(line);
    }
    code.push('\n');
  }
}

pub(crate) fn metadata_index(code: &mut String, index: u16) {
  code.push_str(&format!("  [BigBuffers.MetadataIndex({})]\n", index));
}

#[derive(Debug, Default)]
pub struct GenerationReport {
  pub units: Vec<GeneratedUnit>,
  /* Entities dropped because of a contract violation */
  pub failures: Vec<GenError>,
  pub warnings: Vec<String>,
}

impl GenerationReport {
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }

  fn absorb(&mut self, entity: &str, result: GenResult<GeneratedUnit>) -> GenResult<()> {
    match result {
      Ok(unit) => {
        debug!(entity, bytes = unit.code.len(), "emitted");
        self.units.push(unit);
        Ok(())
      }
      Err(err @ GenError::Contract { .. }) => {
        error!("skipping {}: {}", entity, err);
        self.failures.push(err);
        Ok(())
      }
      Err(err) => Err(err),
    }
  }
}

pub struct CSharpGenerator<'s> {
  schema: &'s Schema,
  options: &'s GeneratorOptions,
}

impl<'s> CSharpGenerator<'s> {
  pub fn new(schema: &'s Schema, options: &'s GeneratorOptions) -> Self {
    CSharpGenerator { schema, options }
  }

  fn context(&self, namespace: crate::schema::NamespaceId) -> EmitContext<'s> {
    EmitContext::new(self.schema, self.options, namespace)
  }

  /* Every entity as a separate unit, in emission order */
  pub fn generate_units(&self) -> GenResult<GenerationReport> {
    let schema = self.schema;
    let mut report = GenerationReport::default();

    for id in schema.enum_ids() {
      let def = schema.enum_def(id);
      let cx = self.context(def.namespace);
      let unit = enums::emit_enum(&cx, id).map(|code| GeneratedUnit {
        name: def.name.clone(),
        namespace: cx.current_namespace().clone(),
        kind: UnitKind::Enum,
        code,
      });
      report.absorb(&def.name, unit)?;
    }

    for id in schema.struct_ids() {
      let def = schema.struct_def(id);
      let cx = self.context(def.namespace);
      let unit = match structs::emit_struct(&cx, id) {
        Ok(out) => {
          report.warnings.extend(out.warnings);
          Ok(GeneratedUnit {
            name: def.name.clone(),
            namespace: cx.current_namespace().clone(),
            kind: UnitKind::Struct,
            code: out.code,
          })
        }
        Err(err) => Err(err),
      };
      report.absorb(&def.name, unit)?;
    }

    for service in &schema.services {
      let cx = self.context(service.namespace);
      let unit = GeneratedUnit {
        name: format!("I{}", naming::make_camel(&service.name, true)),
        namespace: cx.current_namespace().clone(),
        kind: UnitKind::Service,
        code: services::emit_service(&cx, service),
      };
      report.absorb(&service.name, Ok(unit))?;
    }

    Ok(report)
  }

  /* Emits everything and writes it through `sink`, one file per entity or a
   * single combined file */
  pub fn generate(&self, sink: &mut dyn OutputSink) -> GenResult<GenerationReport> {
    let report = self.generate_units()?;

    if self.options.one_file {
      let path = one_file_path(&self.schema.name, self.options);
      sink.write_file(&path, &assemble_one_file(&report.units, self.options))?;
    } else {
      for unit in &report.units {
        sink.write_file(&unit_path(unit, self.options), &assemble_unit(unit, self.options))?;
      }
    }

    info!(
      units = report.units.len(),
      failures = report.failures.len(),
      warnings = report.warnings.len(),
      "generation finished"
    );
    Ok(report)
  }
}

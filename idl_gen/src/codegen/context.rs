/* Explicit emission context.
 *
 * Every emission call receives the schema, the options and the namespace of
 * the entity being emitted through this value; nothing is tracked globally.
 */

use super::options::GeneratorOptions;
use crate::schema::{EnumId, Namespace, NamespaceId, Schema, StructId};

#[derive(Clone, Copy)]
pub struct EmitContext<'s> {
  pub schema: &'s Schema,
  pub options: &'s GeneratorOptions,
  pub namespace: NamespaceId,
}

impl<'s> EmitContext<'s> {
  pub fn new(schema: &'s Schema, options: &'s GeneratorOptions, namespace: NamespaceId) -> Self {
    EmitContext { schema, options, namespace }
  }

  pub fn for_namespace(&self, namespace: NamespaceId) -> Self {
    EmitContext { namespace, ..*self }
  }

  pub fn current_namespace(&self) -> &'s Namespace {
    self.schema.namespace(self.namespace)
  }

  pub fn struct_namespace(&self, id: StructId) -> &'s Namespace {
    self.schema.namespace(self.schema.struct_def(id).namespace)
  }

  pub fn enum_namespace(&self, id: EnumId) -> &'s Namespace {
    self.schema.namespace(self.schema.enum_def(id).namespace)
  }
}

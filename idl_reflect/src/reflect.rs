/* Whole-buffer entry points over a resolved schema */

use idl_gen::schema::{Schema, StructId};
use tracing::debug;

use crate::buffer::Buffer;
use crate::builder::BufferBuilder;
use crate::errors::{ReflectError, ReflectResult};
use crate::object::{pack_table, unpack_table};
use crate::value::Value;

/// Packs and unpacks root tables of one schema.
pub struct Reflector<'s> {
    schema: &'s Schema,
    size_prefixed: bool,
    force_defaults: bool,
}

impl<'s> Reflector<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Reflector {
            schema,
            size_prefixed: false,
            force_defaults: false,
        }
    }

    pub fn size_prefixed(mut self, size_prefixed: bool) -> Self {
        self.size_prefixed = size_prefixed;
        self
    }

    pub fn force_defaults(mut self, force_defaults: bool) -> Self {
        self.force_defaults = force_defaults;
        self
    }

    fn root(&self) -> ReflectResult<StructId> {
        self.schema.root_struct.ok_or(ReflectError::MissingRoot)
    }

    /// Builds a finished buffer whose root is `value`, stamped with the
    /// schema's file identifier when it declares one.
    pub fn pack_root(&self, value: &Value) -> ReflectResult<Vec<u8>> {
        let root = self.root()?;
        let mut builder = BufferBuilder::new();
        builder.force_defaults(self.force_defaults);
        let table = pack_table(&mut builder, self.schema, root, value)?;
        builder.finish(table, self.schema.file_identifier.as_deref(), self.size_prefixed)?;
        let data = builder.finished_data()?.to_vec();
        debug!("packed root '{}' into {} bytes", self.schema.struct_def(root).name, data.len());
        Ok(data)
    }

    /// Reads the root table back, checking the file identifier first.
    pub fn unpack_root(&self, data: &[u8]) -> ReflectResult<Value> {
        let root = self.root()?;
        let buf = Buffer::new(data);
        if let Some(ident) = &self.schema.file_identifier {
            if !buf.has_identifier(ident, self.size_prefixed) {
                return Err(ReflectError::IdentifierMismatch { expected: ident.clone() });
            }
        }
        let table = if self.size_prefixed { buf.size_prefixed_root()? } else { buf.root()? };
        unpack_table(self.schema, root, &table)
    }

    pub fn pack_json(&self, json: &str) -> ReflectResult<Vec<u8>> {
        let value: Value = serde_json::from_str(json).map_err(|e| ReflectError::TypeMismatch {
            field: "<root>".to_string(),
            expected: "JSON value".to_string(),
            found: e.to_string(),
        })?;
        self.pack_root(&value)
    }

    pub fn unpack_json(&self, data: &[u8]) -> ReflectResult<String> {
        let value = self.unpack_root(data)?;
        serde_json::to_string_pretty(&value).map_err(|e| ReflectError::TypeMismatch {
            field: "<root>".to_string(),
            expected: "serializable value".to_string(),
            found: e.to_string(),
        })
    }
}

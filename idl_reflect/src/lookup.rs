/* Keyed vectors: sorting table offsets by their key field and binary search */

use std::cmp::Ordering;

use idl_gen::schema::{FieldDef, Schema, StructId, Type};
use tracing::debug;

use crate::buffer::{Buffer, TableView, VectorView};
use crate::builder::{BufferBuilder, UOffset};
use crate::errors::{ReflectError, ReflectResult};
use crate::object::struct_bytes;
use crate::value::{decode_scalar, default_bytes, encode_scalar, Value};

/// Comparable image of a key field.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Int(i128),
    Float(f64),
    /* strings compare bytewise, unsigned */
    Str(Vec<u8>),
    /* fixed struct keys compare by their raw bytes */
    Struct(Vec<u8>),
}

impl KeyValue {
    pub fn compare(&self, other: &KeyValue) -> Ordering {
        match (self, other) {
            (KeyValue::Int(a), KeyValue::Int(b)) => a.cmp(b),
            (KeyValue::Float(a), KeyValue::Float(b)) => a.total_cmp(b),
            (KeyValue::Str(a), KeyValue::Str(b)) | (KeyValue::Struct(a), KeyValue::Struct(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyValue::Int(_) => 0,
            KeyValue::Float(_) => 1,
            KeyValue::Str(_) => 2,
            KeyValue::Struct(_) => 3,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            KeyValue::Int(_) => "integer key",
            KeyValue::Float(_) => "float key",
            KeyValue::Str(_) => "string key",
            KeyValue::Struct(_) => "struct key",
        }
    }

    fn from_scalar(value: Value) -> KeyValue {
        match value {
            Value::Bool(b) => KeyValue::Int(b as i128),
            Value::Int(i) => KeyValue::Int(i as i128),
            Value::UInt(u) => KeyValue::Int(u as i128),
            Value::Float(f) => KeyValue::Float(f),
            _ => KeyValue::Int(0),
        }
    }
}

fn key_field(schema: &Schema, id: StructId) -> ReflectResult<&FieldDef> {
    let def = schema.struct_def(id);
    def.key_field().ok_or_else(|| ReflectError::UnknownField {
        entity: def.name.clone(),
        field: "<key>".to_string(),
    })
}

/* The `KeyValue` kind `field` produces */
fn key_kind(schema: &Schema, field: &FieldDef) -> &'static str {
    match (schema.scalar_kind(&field.ty), &field.ty) {
        (Some(kind), _) if kind.is_float() => "float key",
        (Some(_), _) => "integer key",
        (None, Type::String) => "string key",
        _ => "struct key",
    }
}

/// Key of a table already in the buffer. An absent scalar key reads as its default.
pub fn key_of(schema: &Schema, field: &FieldDef, table: &TableView) -> ReflectResult<KeyValue> {
    let voffset = field.voffset();
    if let Some(kind) = schema.scalar_kind(&field.ty) {
        let value = match table.field_pos(voffset)? {
            Some(pos) => decode_scalar(kind, table.buf.bytes(pos, kind.size())?),
            None => decode_scalar(kind, &default_bytes(kind, &field.default, &field.name)?),
        };
        return Ok(KeyValue::from_scalar(value));
    }
    match &field.ty {
        Type::String => Ok(KeyValue::Str(table.string(voffset)?.unwrap_or_default().as_bytes().to_vec())),
        Type::Struct(sid) => {
            let size = schema.struct_def(*sid).bytesize;
            let bytes = match table.struct_at(voffset)? {
                Some(view) => view.bytes(size)?.to_vec(),
                None => vec![0; size as usize],
            };
            Ok(KeyValue::Struct(bytes))
        }
        other => Err(ReflectError::TypeMismatch {
            field: field.name.clone(),
            expected: "scalar, string or struct key".to_string(),
            found: format!("{:?}", other),
        }),
    }
}

/// Key image of an owned value, for probing a sorted vector.
pub fn key_from_value(schema: &Schema, field: &FieldDef, value: &Value) -> ReflectResult<KeyValue> {
    if let Some(kind) = schema.scalar_kind(&field.ty) {
        let enum_def = field.ty.enum_id().map(|e| schema.enum_def(e));
        let bytes = encode_scalar(kind, value, enum_def, &field.name)?;
        return Ok(KeyValue::from_scalar(decode_scalar(kind, &bytes)));
    }
    match (&field.ty, value) {
        (Type::String, Value::String(s)) => Ok(KeyValue::Str(s.as_bytes().to_vec())),
        (Type::Struct(sid), _) => Ok(KeyValue::Struct(struct_bytes(schema, *sid, value)?)),
        _ => Err(ReflectError::TypeMismatch {
            field: field.name.clone(),
            expected: "key value".to_string(),
            found: value.type_name().to_string(),
        }),
    }
}

/// Sorts `offsets` (tables of `id` already written to `builder`) by key and
/// writes them as a vector. Equal keys keep their relative order.
pub fn create_sorted_vector_of(builder: &mut BufferBuilder, schema: &Schema, id: StructId, offsets: &[UOffset]) -> ReflectResult<UOffset> {
    let field = key_field(schema, id)?;
    let data = builder.data();
    let buf = Buffer::new(data);

    let mut keyed = Vec::with_capacity(offsets.len());
    for &offset in offsets {
        let pos = (data.len() as u64).checked_sub(offset.0).ok_or(ReflectError::BuilderState("offset past the end of the buffer"))?;
        keyed.push((key_of(schema, field, &buf.table_at(pos))?, offset));
    }
    keyed.sort_by(|a, b| a.0.compare(&b.0));
    debug!("sorted {} '{}' tables by '{}'", keyed.len(), schema.struct_def(id).name, field.name);

    let sorted: Vec<UOffset> = keyed.into_iter().map(|(_, offset)| offset).collect();
    builder.create_vector_of_offsets(&sorted)
}

/// Binary search over a vector sorted by `create_sorted_vector_of`. The span
/// halves each step and never leaves the vector; an unsorted vector gives an
/// arbitrary answer but never reads out of bounds.
pub fn lookup_by_key<'a>(schema: &Schema, id: StructId, vector: &VectorView<'a>, key: &KeyValue) -> ReflectResult<Option<TableView<'a>>> {
    let field = key_field(schema, id)?;
    let expected = key_kind(schema, field);
    if key.kind() != expected {
        return Err(ReflectError::TypeMismatch {
            field: field.name.clone(),
            expected: expected.to_string(),
            found: key.kind().to_string(),
        });
    }
    let mut start = 0u64;
    let mut span = vector.len();
    while span != 0 {
        let mut middle = span / 2;
        let table = vector.table(start + middle)?;
        match key_of(schema, field, &table)?.compare(key) {
            Ordering::Greater => span = middle,
            Ordering::Less => {
                middle += 1;
                start += middle;
                span -= middle;
            }
            Ordering::Equal => return Ok(Some(table)),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ordering() {
        assert_eq!(KeyValue::Int(-1).compare(&KeyValue::Int(3)), Ordering::Less);
        assert_eq!(KeyValue::Float(f64::NAN).compare(&KeyValue::Float(1.0)), Ordering::Greater);
        assert_eq!(KeyValue::Str(b"b".to_vec()).compare(&KeyValue::Str(b"ab".to_vec())), Ordering::Greater);
        assert_eq!(KeyValue::Str("é".as_bytes().to_vec()).compare(&KeyValue::Str(b"z".to_vec())), Ordering::Greater);
        assert_eq!(KeyValue::Int(9).compare(&KeyValue::Str(b"a".to_vec())), Ordering::Less);
    }
}

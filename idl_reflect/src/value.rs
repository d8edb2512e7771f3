/* Owned value graph for reflective pack/unpack */

use std::borrow::Cow;

use idl_gen::schema::{EnumDef, ScalarKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ReflectError, ReflectResult};

/// Schema-agnostic value tree.
///
/// Serializes to plain JSON. Unions are written as `{"variant": .., "value": ..}`
/// objects, so they deserialize ahead of general objects; a table whose only
/// fields are a string `variant` and a `value` therefore parses as a union and
/// is turned back into fields by [`Value::fields`] when packed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Vector(Vec<Value>),
    Union { variant: String, value: Box<Value> },
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::UInt(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Vector(_) => "vector",
            Value::Union { .. } => "union",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Fields of a value packed as a table. A union-shaped value yields its
    /// `variant` and `value` as two fields.
    pub fn fields(&self) -> Option<Cow<'_, IndexMap<String, Value>>> {
        match self {
            Value::Object(fields) => Some(Cow::Borrowed(fields)),
            Value::Union { variant, value } => {
                let mut fields = IndexMap::with_capacity(2);
                fields.insert("variant".to_string(), Value::String(variant.clone()));
                fields.insert("value".to_string(), (**value).clone());
                Some(Cow::Owned(fields))
            }
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /* Field lookup on an object; anything else has no fields */
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|fields| fields.get(name))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Vector(items)
    }
}

/* ============================================================================
   Scalar encoding
   ============================================================================ */

fn mismatch(field: &str, expected: impl Into<String>, value: &Value) -> ReflectError {
    ReflectError::TypeMismatch {
        field: field.to_string(),
        expected: expected.into(),
        found: value.type_name().to_string(),
    }
}

fn integer_of(kind: ScalarKind, value: &Value, enum_def: Option<&EnumDef>, field: &str) -> ReflectResult<i128> {
    let raw = match value {
        Value::Int(v) => *v as i128,
        Value::UInt(v) => *v as i128,
        Value::Bool(b) if kind == ScalarKind::Bool => *b as i128,
        Value::String(name) => match enum_def {
            Some(def) => match def.lookup(name) {
                Some(variant) => variant.value as i128,
                None => {
                    return Err(ReflectError::UnknownVariant {
                        owner: def.name.clone(),
                        name: name.clone(),
                    })
                }
            },
            None => return Err(mismatch(field, "integer", value)),
        },
        _ => return Err(mismatch(field, "integer", value)),
    };
    let (min, max) = kind.int_range();
    if raw < min || raw > max {
        return Err(ReflectError::TypeMismatch {
            field: field.to_string(),
            expected: format!("{:?} in range {}..={}", kind, min, max),
            found: raw.to_string(),
        });
    }
    Ok(raw)
}

/// Little-endian bytes of `value` stored as `kind`. Enum-typed fields also
/// accept a variant name.
pub fn encode_scalar(kind: ScalarKind, value: &Value, enum_def: Option<&EnumDef>, field: &str) -> ReflectResult<Vec<u8>> {
    let bytes = match kind {
        ScalarKind::Bool => match value {
            Value::Bool(b) => vec![*b as u8],
            _ => vec![integer_of(kind, value, enum_def, field)? as u8],
        },
        ScalarKind::F32 | ScalarKind::F64 => {
            let float = match value {
                Value::Float(f) => *f,
                Value::Int(i) => *i as f64,
                Value::UInt(u) => *u as f64,
                _ => return Err(mismatch(field, "float", value)),
            };
            if kind == ScalarKind::F32 {
                (float as f32).to_le_bytes().to_vec()
            } else {
                float.to_le_bytes().to_vec()
            }
        }
        _ => {
            let raw = integer_of(kind, value, enum_def, field)?;
            let size = kind.size() as usize;
            /* two's complement truncation is exact once the range check passed */
            (raw as u64).to_le_bytes()[..size].to_vec()
        }
    };
    Ok(bytes)
}

/// Reads a scalar of `kind` from the front of `bytes`. Integers decode to `Int`
/// unless an unsigned 64-bit value exceeds `i64::MAX`.
pub fn decode_scalar(kind: ScalarKind, bytes: &[u8]) -> Value {
    let mut raw = [0u8; 8];
    let size = kind.size() as usize;
    raw[..size].copy_from_slice(&bytes[..size]);
    let unsigned = u64::from_le_bytes(raw);
    match kind {
        ScalarKind::Bool => Value::Bool(raw[0] != 0),
        ScalarKind::I8 => Value::Int(raw[0] as i8 as i64),
        ScalarKind::U8 => Value::Int(raw[0] as i64),
        ScalarKind::I16 => Value::Int(unsigned as u16 as i16 as i64),
        ScalarKind::U16 => Value::Int(unsigned as u16 as i64),
        ScalarKind::I32 => Value::Int(unsigned as u32 as i32 as i64),
        ScalarKind::U32 => Value::Int(unsigned as u32 as i64),
        ScalarKind::I64 => Value::Int(unsigned as i64),
        ScalarKind::U64 if unsigned > i64::MAX as u64 => Value::UInt(unsigned),
        ScalarKind::U64 => Value::Int(unsigned as i64),
        ScalarKind::F32 => Value::Float(f32::from_bits(unsigned as u32) as f64),
        ScalarKind::F64 => Value::Float(f64::from_bits(unsigned)),
    }
}

/// Bytes of a normalized default literal (`"1"`, `"-inf"`, `"nan"`, `"16"`).
pub fn default_bytes(kind: ScalarKind, literal: &str, field: &str) -> ReflectResult<Vec<u8>> {
    let invalid = || ReflectError::TypeMismatch {
        field: field.to_string(),
        expected: format!("{:?} default", kind),
        found: literal.to_string(),
    };
    let value = if kind.is_float() {
        Value::Float(literal.parse::<f64>().map_err(|_| invalid())?)
    } else if let Ok(signed) = literal.parse::<i64>() {
        Value::Int(signed)
    } else {
        Value::UInt(literal.parse::<u64>().map_err(|_| invalid())?)
    };
    encode_scalar(kind, &value, None, field)
}

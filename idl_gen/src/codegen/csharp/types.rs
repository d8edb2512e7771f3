/* C# spellings of schema types, casts and default literals. */

use super::naming::{enum_name, object_name, struct_name, union_class_name};
use crate::codegen::context::EmitContext;
use crate::schema::{FieldDef, ScalarKind, Type};

pub fn scalar_name(kind: ScalarKind) -> &'static str {
  match kind {
    ScalarKind::Bool => "bool",
    ScalarKind::I8 => "sbyte",
    ScalarKind::U8 => "byte",
    ScalarKind::I16 => "short",
    ScalarKind::U16 => "ushort",
    ScalarKind::I32 => "int",
    ScalarKind::U32 => "uint",
    ScalarKind::I64 => "long",
    ScalarKind::U64 => "ulong",
    ScalarKind::F32 => "float",
    ScalarKind::F64 => "double",
  }
}

/* Storage type used with the buffer's Get/Put/Add; enums collapse to their underlying integer */
pub fn basic(cx: &EmitContext, ty: &Type) -> &'static str {
  match cx.schema.scalar_kind(ty) {
    Some(kind) => scalar_name(kind),
    None => "ulong",
  }
}

/* Type surfaced to callers by accessors */
pub fn type_get(cx: &EmitContext, ty: &Type) -> String {
  match ty {
    Type::Scalar(kind) => scalar_name(*kind).to_string(),
    Type::Enum(id) | Type::UnionType(id) => enum_name(cx, *id),
    Type::String => "string".to_string(),
    Type::Struct(id) => struct_name(cx, *id),
    Type::Vector(elem) | Type::Array(elem, _) => type_get(cx, elem),
    Type::Union(_) => "TTable".to_string(),
  }
}

/* Argument type of builder calls: scalars by value, everything else as an offset */
pub fn arg_type(cx: &EmitContext, ty: &Type) -> String {
  match ty {
    Type::Scalar(_) | Type::Enum(_) | Type::UnionType(_) => type_get(cx, ty),
    Type::String => "StringOffset".to_string(),
    Type::Vector(_) | Type::Array(..) => "VectorOffset".to_string(),
    Type::Struct(id) => offset_type(cx, *id),
    Type::Union(_) => "ulong".to_string(),
  }
}

pub fn offset_type(cx: &EmitContext, id: crate::schema::StructId) -> String {
  format!("Offset<{}>", struct_name(cx, id))
}

/* Owned-graph spelling used by the object API */
pub fn object_type(cx: &EmitContext, ty: &Type) -> String {
  match ty {
    Type::Struct(id) => object_name(cx, *id),
    Type::Union(id) => union_class_name(cx, *id),
    Type::Vector(elem) => format!("List<{}>", object_type(cx, elem)),
    Type::Array(elem, _) => format!("{}[]", object_type(cx, elem)),
    other => type_get(cx, other),
  }
}

/* Cast applied to a raw read before handing it out */
pub fn dest_cast(cx: &EmitContext, ty: &Type) -> String {
  match ty {
    Type::Enum(_) | Type::UnionType(_) => format!("({})", type_get(cx, ty)),
    Type::Vector(elem) | Type::Array(elem, _) => dest_cast(cx, elem),
    _ => String::new(),
  }
}

/* Cast applied to a caller value before writing it */
pub fn src_cast(cx: &EmitContext, ty: &Type) -> String {
  match ty {
    Type::Enum(_) | Type::UnionType(_) => format!("({})", basic(cx, ty)),
    Type::Vector(elem) | Type::Array(elem, _) => src_cast(cx, elem),
    _ => String::new(),
  }
}

/* `Get<T>` call on the byte buffer; bytes use the dedicated reader */
pub fn get_method(cx: &EmitContext, ty: &Type) -> String {
  match basic(cx, ty) {
    "byte" => "GetByte".to_string(),
    other => format!("Get<{}>", other),
  }
}

/* Literal for a normalized default in the storage type */
pub fn basic_literal(kind: ScalarKind, normalized: &str) -> String {
  match kind {
    ScalarKind::Bool => (if normalized == "0" { "false" } else { "true" }).to_string(),
    ScalarKind::F32 | ScalarKind::F64 => {
      let class = if kind == ScalarKind::F32 { "Single" } else { "Double" };
      match normalized {
        "nan" => format!("{}.NaN", class),
        "inf" => format!("{}.PositiveInfinity", class),
        "-inf" => format!("{}.NegativeInfinity", class),
        text if kind == ScalarKind::F32 => format!("{}f", text),
        text => text.to_string(),
      }
    }
    _ => normalized.to_string(),
  }
}

/* Default surfaced by accessors and the object API: named enum values when one
 * matches, `null` for optional scalars */
pub fn default_value(cx: &EmitContext, field: &FieldDef) -> String {
  if field.optional {
    return "null".to_string();
  }
  match &field.ty {
    Type::Enum(id) | Type::UnionType(id) => {
      let def = cx.schema.enum_def(*id);
      let matched = field.default.parse::<i64>().ok().and_then(|v| def.reverse_lookup(v));
      match matched {
        Some(val) => format!("{}.{}", enum_name(cx, *id), super::naming::escape_keyword(&val.name)),
        None => format!("({}){}", enum_name(cx, *id), field.default),
      }
    }
    ty => match cx.schema.scalar_kind(ty) {
      Some(kind) => basic_literal(kind, &field.default),
      None => "null".to_string(),
    },
  }
}

/* Default passed to `builder.Add<T>` so equal values are elided */
pub fn add_default(cx: &EmitContext, field: &FieldDef) -> Option<String> {
  if field.optional {
    return None;
  }
  cx.schema.scalar_kind(&field.ty).map(|kind| basic_literal(kind, &field.default))
}

/* Value returned for an element of an absent vector */
pub fn element_default(cx: &EmitContext, elem: &Type) -> String {
  match elem {
    Type::Enum(_) | Type::UnionType(_) => format!("({})0", type_get(cx, elem)),
    Type::Scalar(ScalarKind::Bool) => "false".to_string(),
    Type::Scalar(_) => "0".to_string(),
    _ => "null".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_float_literals() {
    assert_eq!(basic_literal(ScalarKind::F64, "nan"), "Double.NaN");
    assert_eq!(basic_literal(ScalarKind::F32, "inf"), "Single.PositiveInfinity");
    assert_eq!(basic_literal(ScalarKind::F64, "-inf"), "Double.NegativeInfinity");
    assert_eq!(basic_literal(ScalarKind::F32, "1.5"), "1.5f");
    assert_eq!(basic_literal(ScalarKind::F64, "3.25"), "3.25");
  }

  #[test]
  fn test_bool_and_int_literals() {
    assert_eq!(basic_literal(ScalarKind::Bool, "0"), "false");
    assert_eq!(basic_literal(ScalarKind::Bool, "1"), "true");
    assert_eq!(basic_literal(ScalarKind::I32, "-7"), "-7");
  }
}

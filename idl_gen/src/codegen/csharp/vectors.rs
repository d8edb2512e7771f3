/* Vector and fixed array accessors.
 *
 * Scalars and fixed structs sit inline at `base + _j * size`; strings, tables
 * and union payloads store an offset per element that is followed first.
 */

use super::accessors::offset_lookup;
use super::naming::{MemberNames, arg_name, struct_name};
use super::types::{basic, dest_cast, element_default, get_method, src_cast, type_get};
use super::{lookup, metadata_index, unions};
use crate::codegen::context::EmitContext;
use crate::error::{GenError, GenResult};
use crate::layout::{Addressing, FieldCategory, FieldLayout, categorize, element_size};
use crate::schema::Type;

fn series_element<'a>(fl: &'a FieldLayout) -> &'a Type {
  match &fl.field.ty {
    Type::Vector(elem) | Type::Array(elem, _) => elem,
    other => other,
  }
}

pub fn emit_vector(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) -> GenResult<()> {
  let field = fl.field;
  let Addressing::Vtable { voffset } = fl.addressing else {
    return Err(GenError::contract(&field.name, "vectors are only allowed in tables"));
  };
  let elem = series_element(fl);
  let size = element_size(cx.schema, elem);
  let lookup_o = offset_lookup(voffset);
  let at = format!("_model.__vector(o) + _j * {}", size);
  let ty = type_get(cx, elem);
  let nullable = cx.options.nullable_ref();

  match categorize(cx.schema, elem) {
    FieldCategory::Scalar => {
      let storage = basic(cx, elem);
      let arg = arg_name(field);
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public ref {}{} {}(ulong _j) {{ {} return ref (o != 0 ? ref _model.ByteBuffer.Ref<{}>({}) : ref SchemaModel.ThrowNullRef<{}>()); }}\n",
        cx.options.ref_qualifier(),
        ty,
        names.property,
        lookup_o,
        ty,
        at,
        ty
      ));
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public {} {}(ulong _j) {{ {} return o != 0 ? {}_model.ByteBuffer.{}({}) : {}; }}\n",
        ty,
        names.value(),
        lookup_o,
        dest_cast(cx, elem),
        get_method(cx, elem),
        at,
        element_default(cx, elem)
      ));
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  {} bool Set{}(ulong _j, {} {}) {{ {} if (o != 0) {{ _model.ByteBuffer.Put<{}>({}, {}{}); return true; }} else {{ return false; }} }}\n",
        cx.options.mutator_visibility(),
        names.camel,
        ty,
        arg,
        lookup_o,
        storage,
        at,
        src_cast(cx, elem),
        arg
      ));
      emit_bulk_access(cx, fl, names, voffset, size, code);
    }
    FieldCategory::UnionType => {
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public {} {}(ulong _j) {{ {} return o != 0 ? {}_model.ByteBuffer.{}({}) : {}; }}\n",
        ty,
        names.property,
        lookup_o,
        dest_cast(cx, elem),
        get_method(cx, elem),
        at,
        element_default(cx, elem)
      ));
    }
    FieldCategory::String => {
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public string{} {}(ulong _j) {{ {} return o != 0 ? _model.__string({}) : null; }}\n",
        nullable, names.property, lookup_o, at
      ));
    }
    FieldCategory::Struct => {
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public {}? {}(ulong _j) {{ {} return o != 0 ? ({}?)new ({}, _model.ByteBuffer) : null; }}\n",
        ty, names.property, lookup_o, ty, at
      ));
    }
    FieldCategory::Table => {
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public {}? {}(ulong _j) {{ {} return o != 0 ? ({}?)new (_model.__indirect({}), _model.ByteBuffer) : null; }}\n",
        ty, names.property, lookup_o, ty, at
      ));
      if let Type::Struct(sid) = elem {
        lookup::emit_by_key_accessor(cx, *sid, names, voffset, code);
      }
    }
    FieldCategory::Union => unions::emit_union_vector(cx, fl, names, code),
    FieldCategory::Vector | FieldCategory::Array => {
      return Err(GenError::contract(&field.name, "vector elements cannot be vectors or arrays"));
    }
  }

  code.push_str(&format!(
    "  public ulong {}Length {{ get {{ {} return o != 0 ? _model.__vector_len(o) : 0; }} }}\n",
    names.camel, lookup_o
  ));

  if let Some(nested) = field.nested_flatbuffer {
    let nested_ty = struct_name(cx, nested);
    code.push_str(&format!(
      "  public {}? Get{}As{}() {{ {} return o != 0 ? ({}?)new (_model.__indirect(_model.__vector(o)), _model.ByteBuffer) : null; }}\n",
      nested_ty,
      names.camel,
      cx.schema.struct_def(nested).name,
      lookup_o,
      nested_ty
    ));
  }
  Ok(())
}

/* Span, raw segment and array copies of a scalar vector. Enums are copied one
 * element at a time so every value goes through the enum conversion. */
fn emit_bulk_access(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, voffset: u16, size: u64, code: &mut String) {
  let elem = series_element(fl);
  let ty = type_get(cx, elem);
  let nullable = cx.options.nullable_ref();
  let is_enum = matches!(elem, Type::Enum(_));

  if !is_enum {
    code.push_str(&format!(
      "  public StirlingLabs.Utilities.BigSpan<{}> Get{}Span() {{ return _model.__vector_as_span<{}>({}, {}); }}\n",
      ty, names.camel, ty, voffset, size
    ));
  }
  code.push_str(&format!(
    "  public ArraySegment<byte>? Get{}ByteArraySegment() {{ return _model.__vector_as_arraysegment({}); }}\n",
    names.camel, voffset
  ));
  if is_enum {
    code.push_str(&format!("  public {}[]{} Get{}Array() {{\n", ty, nullable, names.camel));
    code.push_str(&format!("    {}\n", offset_lookup(voffset)));
    code.push_str("    if (o == 0) return null;\n");
    code.push_str("    var p = _model.__vector(o);\n");
    code.push_str("    var l = _model.__vector_len(o);\n");
    code.push_str(&format!("    var a = new {}[l];\n", ty));
    code.push_str(&format!(
      "    for (var i = 0uL; i < l; i++) {{ a[i] = {}_model.ByteBuffer.{}(p + i * {}); }}\n",
      dest_cast(cx, elem),
      get_method(cx, elem),
      size
    ));
    code.push_str("    return a;\n  }\n");
  } else {
    code.push_str(&format!(
      "  public {}[]{} Get{}Array() {{ return _model.__vector_as_array<{}>({}); }}\n",
      ty, nullable, names.camel, ty, voffset
    ));
  }
}

pub fn emit_array(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) -> GenResult<()> {
  let field = fl.field;
  let (Addressing::Static { offset }, Type::Array(elem, len)) = (fl.addressing, &field.ty) else {
    return Err(GenError::contract(&field.name, "fixed arrays are only allowed in fixed structs"));
  };
  let size = element_size(cx.schema, elem);
  let at = format!("_model.Offset + {} + _j * {}", offset, size);
  let ty = type_get(cx, elem);

  match categorize(cx.schema, elem) {
    FieldCategory::Scalar => {
      let arg = arg_name(field);
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public ref {}{} {}(ulong _j) {{ return ref _model.ByteBuffer.Ref<{}>({}); }}\n",
        cx.options.ref_qualifier(),
        ty,
        names.property,
        ty,
        at
      ));
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public {} {}(ulong _j) {{ return {}_model.ByteBuffer.{}({}); }}\n",
        ty,
        names.value(),
        dest_cast(cx, elem),
        get_method(cx, elem),
        at
      ));
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  {} void Set{}(ulong _j, {} {}) {{ _model.ByteBuffer.Put<{}>({}, {}{}); }}\n",
        cx.options.mutator_visibility(),
        names.camel,
        ty,
        arg,
        basic(cx, elem),
        at,
        src_cast(cx, elem),
        arg
      ));
      if let Some(span) = fl.span_length {
        code.push_str(&format!(
          "  {} StirlingLabs.Utilities.BigSpan<{}> Get{}Span() {{ return _model.ByteBuffer.GetSpan<{}>(_model.Offset + {}, {}); }}\n",
          cx.options.mutator_visibility(),
          ty,
          names.camel,
          ty,
          offset,
          span
        ));
      }
    }
    FieldCategory::Struct => {
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public {} {}(ulong _j) {{ return new ({}, _model.ByteBuffer); }}\n",
        ty, names.property, at
      ));
    }
    other => {
      return Err(GenError::contract(&field.name, format!("fixed arrays cannot hold {:?} elements", other)));
    }
  }
  code.push_str(&format!("  public const ulong {}Length = {};\n", names.camel, len));
  Ok(())
}


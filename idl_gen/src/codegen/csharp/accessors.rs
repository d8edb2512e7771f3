/* Read accessors, reference accessors and in-place mutators for non-series fields.
 *
 * Fixed struct fields are read at `_model.Offset + offset`. Table fields first
 * resolve their vtable entry; `o == 0` means absent and the accessor answers
 * the default without touching the buffer.
 */

use super::naming::{MemberNames, arg_name};
use super::types::{basic, default_value, dest_cast, get_method, src_cast, type_get};
use super::{metadata_index, push_doc, unions, vectors};
use crate::codegen::context::EmitContext;
use crate::error::GenResult;
use crate::layout::{Addressing, FieldCategory, FieldLayout};

/* Presence check prelude of table accessors */
pub fn offset_lookup(voffset: u16) -> String {
  format!("var o = _model.__offset({});", voffset)
}

pub fn emit_field(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) -> GenResult<()> {
  push_doc(code, "  ", &fl.field.doc);
  match fl.category {
    FieldCategory::Scalar => emit_scalar(cx, fl, names, code),
    FieldCategory::UnionType => emit_union_type(cx, fl, names, code),
    FieldCategory::String => emit_string(cx, fl, names, code),
    FieldCategory::Struct => emit_inline_struct(cx, fl, names, code),
    FieldCategory::Table => emit_table_ref(cx, fl, names, code),
    FieldCategory::Union => unions::emit_union(cx, fl, names, code),
    FieldCategory::Vector => return vectors::emit_vector(cx, fl, names, code),
    FieldCategory::Array => return vectors::emit_array(cx, fl, names, code),
  }
  Ok(())
}

fn emit_scalar(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) {
  let field = fl.field;
  let ty = type_get(cx, &field.ty);
  let storage = basic(cx, &field.ty);
  let get = get_method(cx, &field.ty);
  let ro = cx.options.ref_qualifier();
  let getter = names.value();
  let (ret, cast) = if field.optional {
    (format!("{}?", ty), format!("({}?)", ty))
  } else {
    (ty.clone(), dest_cast(cx, &field.ty))
  };
  let arg = arg_name(field);

  match fl.addressing {
    Addressing::Vtable { voffset } => {
      let lookup = offset_lookup(voffset);
      if fl.directly_referenceable {
        metadata_index(code, field.index);
        code.push_str(&format!(
          "  public ref {}{} {} {{ get {{ {} return ref (o != 0 ? ref _model.ByteBuffer.Ref<{}>(o + _model.Offset) : ref SchemaModel.ThrowNullRef<{}>()); }} }}\n",
          ro, ty, names.property, lookup, ty, ty
        ));
      }
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public {} {}() {{ {} return o != 0 ? {}_model.ByteBuffer.{}(o + _model.Offset) : {}; }}\n",
        ret,
        getter,
        lookup,
        cast,
        get,
        default_value(cx, field)
      ));
      if fl.mutable {
        metadata_index(code, field.index);
        code.push_str(&format!(
          "  {} bool Set{}({} {}) {{ {} if (o != 0) {{ _model.ByteBuffer.Put<{}>(o + _model.Offset, {}{}); return true; }} else {{ return false; }} }}\n",
          cx.options.mutator_visibility(),
          names.camel,
          ty,
          arg,
          lookup,
          storage,
          src_cast(cx, &field.ty),
          arg
        ));
      }
    }
    Addressing::Static { offset } => {
      if fl.directly_referenceable {
        metadata_index(code, field.index);
        code.push_str(&format!(
          "  public ref {}{} {} {{ get {{ return ref _model.ByteBuffer.Ref<{}>(_model.Offset + {}); }} }}\n",
          ro, ty, names.property, ty, offset
        ));
      }
      metadata_index(code, field.index);
      code.push_str(&format!(
        "  public {} {}() {{ return {}_model.ByteBuffer.{}(_model.Offset + {}); }}\n",
        ty,
        getter,
        dest_cast(cx, &field.ty),
        get,
        offset
      ));
      if fl.mutable {
        metadata_index(code, field.index);
        code.push_str(&format!(
          "  {} void Set{}({} {}) {{ _model.ByteBuffer.Put<{}>(_model.Offset + {}, {}{}); }}\n",
          cx.options.mutator_visibility(),
          names.camel,
          ty,
          arg,
          storage,
          offset,
          src_cast(cx, &field.ty),
          arg
        ));
      }
    }
  }
}

/* Union discriminants are read through their enum; never referenced or mutated */
fn emit_union_type(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) {
  let field = fl.field;
  let ty = type_get(cx, &field.ty);
  let read = match fl.addressing {
    Addressing::Vtable { voffset } => format!(
      "{} return o != 0 ? {}_model.ByteBuffer.{}(o + _model.Offset) : {};",
      offset_lookup(voffset),
      dest_cast(cx, &field.ty),
      get_method(cx, &field.ty),
      default_value(cx, field)
    ),
    Addressing::Static { offset } => format!(
      "return {}_model.ByteBuffer.{}(_model.Offset + {});",
      dest_cast(cx, &field.ty),
      get_method(cx, &field.ty),
      offset
    ),
  };
  metadata_index(code, field.index);
  code.push_str(&format!("  public {} {} {{ get {{ {} }} }}\n", ty, names.property, read));
}

fn emit_string(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) {
  let Addressing::Vtable { voffset } = fl.addressing else { return };
  let nullable = cx.options.nullable_ref();
  metadata_index(code, fl.field.index);
  code.push_str(&format!(
    "  public string{} {} {{ get {{ {} return o != 0 ? _model.__string(o + _model.Offset) : null; }} }}\n",
    nullable,
    names.property,
    offset_lookup(voffset)
  ));
  code.push_str(&format!(
    "  public StirlingLabs.Utilities.BigSpan<byte> Get{}Bytes() {{ return _model.__vector_as_span<byte>({}, 1); }}\n",
    names.camel, voffset
  ));
  code.push_str(&format!(
    "  public ArraySegment<byte>? Get{}ByteArraySegment() {{ return _model.__vector_as_arraysegment({}); }}\n",
    names.camel, voffset
  ));
  code.push_str(&format!(
    "  public byte[]{} Get{}Array() {{ return _model.__vector_as_array<byte>({}); }}\n",
    nullable, names.camel, voffset
  ));
}

fn emit_inline_struct(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) {
  let ty = type_get(cx, &fl.field.ty);
  metadata_index(code, fl.field.index);
  match fl.addressing {
    Addressing::Static { offset } => code.push_str(&format!(
      "  public {} {} {{ get {{ return new (_model.Offset + {}, _model.ByteBuffer); }} }}\n",
      ty, names.property, offset
    )),
    Addressing::Vtable { voffset } => code.push_str(&format!(
      "  public {}? {} {{ get {{ {} return o != 0 ? ({}?)new (o + _model.Offset, _model.ByteBuffer) : null; }} }}\n",
      ty,
      names.property,
      offset_lookup(voffset),
      ty
    )),
  }
}

fn emit_table_ref(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) {
  let Addressing::Vtable { voffset } = fl.addressing else { return };
  let ty = type_get(cx, &fl.field.ty);
  metadata_index(code, fl.field.index);
  code.push_str(&format!(
    "  public {}? {} {{ get {{ {} return o != 0 ? ({}?)new (_model.__indirect(o + _model.Offset), _model.ByteBuffer) : null; }} }}\n",
    ty,
    names.property,
    offset_lookup(voffset),
    ty
  ));
}

/* Union payload accessors.
 *
 * The payload is an offset whose meaning depends on the companion
 * discriminant; the generic accessor reinterprets it as any entity type and
 * every variant gets a typed `XAsVariant` shortcut.
 */

use super::accessors::offset_lookup;
use super::naming::{MemberNames, make_camel, struct_name};
use super::metadata_index;
use crate::codegen::context::EmitContext;
use crate::layout::{Addressing, FieldLayout, UOFFSET_SIZE};
use crate::schema::{EnumId, Type};

fn union_id(fl: &FieldLayout) -> Option<EnumId> {
  match &fl.field.ty {
    Type::Union(id) => Some(*id),
    Type::Vector(elem) => elem.enum_id(),
    _ => None,
  }
}

/* Typed shortcut name; a string variant named `string` or `String` is already served by `XAsString` */
fn variant_accessor(names: &MemberNames, variant: &str) -> Option<String> {
  let name = format!("{}As{}", names.camel, make_camel(variant, true));
  (name != format!("{}AsString", names.camel)).then_some(name)
}

pub fn emit_union(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) {
  let (Addressing::Vtable { voffset }, Some(id)) = (fl.addressing, union_id(fl)) else { return };
  let def = cx.schema.enum_def(id);
  let lookup_o = offset_lookup(voffset);
  let nullable = cx.options.nullable_ref();

  metadata_index(code, fl.field.index);
  code.push_str(&format!(
    "  public TTable? {}<TTable>() where TTable : struct, IBigBufferEntity {{ {} return o != 0 ? (TTable?)_model.__union<TTable>(o + _model.Offset) : null; }}\n",
    names.property, lookup_o
  ));
  if def.has_string_variant() {
    code.push_str(&format!(
      "  public string{} {}AsString() {{ {} return o != 0 ? _model.__string(o + _model.Offset) : null; }}\n",
      nullable, names.camel, lookup_o
    ));
  }
  for val in def.variants() {
    match &val.union_type {
      Some(Type::Struct(sid)) => {
        let ty = struct_name(cx, *sid);
        if let Some(accessor) = variant_accessor(names, &val.name) {
          code.push_str(&format!("  public {} {}() {{ return {}<{}>().Value; }}\n", ty, accessor, names.property, ty));
        }
      }
      Some(Type::String) => {
        if let Some(accessor) = variant_accessor(names, &val.name) {
          code.push_str(&format!("  public string{} {}() {{ return {}AsString(); }}\n", nullable, accessor, names.camel));
        }
      }
      _ => {}
    }
  }
}

/* Element `_j` of a union vector; its discriminant is element `_j` of the companion vector */
pub fn emit_union_vector(cx: &EmitContext, fl: &FieldLayout, names: &MemberNames, code: &mut String) {
  let (Addressing::Vtable { voffset }, Some(id)) = (fl.addressing, union_id(fl)) else { return };
  let def = cx.schema.enum_def(id);
  let lookup_o = offset_lookup(voffset);
  let at = format!("_model.__vector(o) + _j * {}", UOFFSET_SIZE);
  let nullable = cx.options.nullable_ref();

  metadata_index(code, fl.field.index);
  code.push_str(&format!(
    "  public TTable? {}<TTable>(ulong _j) where TTable : struct, IBigBufferEntity {{ {} return o != 0 ? (TTable?)_model.__union<TTable>({}) : null; }}\n",
    names.property, lookup_o, at
  ));
  if def.has_string_variant() {
    code.push_str(&format!(
      "  public string{} {}AsString(ulong _j) {{ {} return o != 0 ? _model.__string({}) : null; }}\n",
      nullable, names.camel, lookup_o, at
    ));
  }
  for val in def.variants() {
    match &val.union_type {
      Some(Type::Struct(sid)) => {
        let ty = struct_name(cx, *sid);
        if let Some(accessor) = variant_accessor(names, &val.name) {
          code.push_str(&format!(
            "  public {} {}(ulong _j) {{ return {}<{}>(_j).Value; }}\n",
            ty, accessor, names.property, ty
          ));
        }
      }
      Some(Type::String) => {
        if let Some(accessor) = variant_accessor(names, &val.name) {
          code.push_str(&format!(
            "  public string{} {}(ulong _j) {{ return {}AsString(_j); }}\n",
            nullable, accessor, names.camel
          ));
        }
      }
      _ => {}
    }
  }
}

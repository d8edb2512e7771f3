/* Keyed tables: ordering, sorted vector construction and binary search.
 *
 * One ordering serves everything: `CompareTo` on the key, which the sort, the
 * equality of keyed tables and the lookup all reuse. Lookup expects the vector
 * to have been built by `CreateSortedVectorOfX`; on unsorted input the result
 * is unspecified but never out of bounds.
 */

use super::naming::{MemberNames, member_names, struct_name};
use super::types::type_get;
use crate::codegen::context::EmitContext;
use crate::error::{GenError, GenResult};
use crate::layout::{FieldCategory, FieldLayout};
use crate::schema::StructId;

struct KeyInfo {
  category: FieldCategory,
  names: MemberNames,
  ty: String,
}

fn key_info(cx: &EmitContext, id: StructId) -> GenResult<Option<KeyInfo>> {
  let def = cx.schema.struct_def(id);
  let Some(field) = def.key_field() else { return Ok(None) };
  let layout = FieldLayout::resolve(cx.schema, def, field);
  match layout.category {
    FieldCategory::Scalar | FieldCategory::String | FieldCategory::Struct => Ok(Some(KeyInfo {
      category: layout.category,
      names: member_names(def, &layout),
      ty: type_get(cx, &field.ty),
    })),
    other => Err(GenError::contract(&def.name, format!("key field '{}' cannot be {:?}", field.name, other))),
  }
}

/* Key of `target` as an expression comparable with `CompareTo` */
fn key_expr(key: &KeyInfo, target: &str) -> String {
  match key.category {
    FieldCategory::Struct => format!("{}.{}.GetValueOrDefault()", target, key.names.property),
    _ => format!("{}.{}()", target, key.names.value()),
  }
}

pub fn is_keyed(cx: &EmitContext, id: StructId) -> bool {
  let def = cx.schema.struct_def(id);
  !def.fixed && def.key_field().is_some()
}

pub fn emit_compare_to(cx: &EmitContext, id: StructId, code: &mut String) -> GenResult<()> {
  let Some(key) = key_info(cx, id)? else { return Ok(()) };
  let name = super::naming::def_name(&cx.schema.struct_def(id).name);
  let body = match key.category {
    FieldCategory::String => format!("SchemaModel.CompareStrings({}, other.{})", key.names.property, key.names.property),
    _ => format!("{}.CompareTo({})", key_expr(&key, "this"), key_expr(&key, "other")),
  };
  code.push_str(&format!("  public int CompareTo({} other)\n    => {};\n\n", name, body));
  Ok(())
}

pub fn emit_sorted_vector_and_lookup(cx: &EmitContext, id: StructId, code: &mut String) -> GenResult<()> {
  let Some(key) = key_info(cx, id)? else { return Ok(()) };
  let def = cx.schema.struct_def(id);
  let qualified = struct_name(cx, id);

  code.push_str(&format!(
    "  public static VectorOffset CreateSortedVectorOf{}(BigBufferBuilder builder, Offset<{}>[] offsets) {{\n",
    def.name, qualified
  ));
  code.push_str(&format!(
    "    Array.Sort(offsets, (Offset<{q}> o1, Offset<{q}> o2) => new {q}(builder.ByteBuffer.Length - o1.Value, builder.ByteBuffer).CompareTo(new {q}(builder.ByteBuffer.Length - o2.Value, builder.ByteBuffer)));\n",
    q = qualified
  ));
  code.push_str("    return builder.CreateVectorOfTables(offsets);\n  }\n\n");

  let candidate = format!("new {}(tableOffset, bb)", qualified);
  let (prelude, comp) = match key.category {
    FieldCategory::String => (
      "    var byteKey = System.Text.Encoding.UTF8.GetBytes(key);\n".to_string(),
      format!("SchemaModel.CompareStrings({}.Get{}Bytes(), byteKey)", candidate, key.names.camel),
    ),
    _ => (String::new(), format!("{}.CompareTo(key)", key_expr(&key, &candidate))),
  };

  code.push_str(&format!(
    "  public static {}? __lookup_by_key(ulong vectorLocation, {} key, ByteBuffer bb) {{\n",
    qualified, key.ty
  ));
  code.push_str(&prelude);
  code.push_str("    var span = bb.Get<ulong>(vectorLocation - sizeof(ulong));\n");
  code.push_str("    var start = 0uL;\n");
  code.push_str("    while (span != 0uL) {\n");
  code.push_str("      var middle = span >> 1;\n");
  code.push_str("      var tableOffset = bb.__indirect(vectorLocation + sizeof(ulong) * (start + middle));\n");
  code.push_str(&format!("      var comp = {};\n", comp));
  code.push_str("      if (comp > 0) {\n");
  code.push_str("        span = middle;\n");
  code.push_str("      } else if (comp < 0) {\n");
  code.push_str("        middle++;\n");
  code.push_str("        start += middle;\n");
  code.push_str("        span -= middle;\n");
  code.push_str("      } else {\n");
  code.push_str(&format!("        return {};\n", candidate));
  code.push_str("      }\n");
  code.push_str("    }\n");
  code.push_str("    return null;\n");
  code.push_str("  }\n\n");
  Ok(())
}

/* `XByKey` on a vector of keyed tables */
pub fn emit_by_key_accessor(cx: &EmitContext, element: StructId, names: &MemberNames, voffset: u16, code: &mut String) {
  if !is_keyed(cx, element) {
    return;
  }
  let Ok(Some(key)) = key_info(cx, element) else { return };
  let qualified = struct_name(cx, element);
  code.push_str(&format!(
    "  public {}? {}ByKey({} key) {{ var o = _model.__offset({}); return o != 0 ? {}.__lookup_by_key(_model.__vector(o), key, _model.ByteBuffer) : null; }}\n",
    qualified, names.camel, key.ty, voffset, qualified
  ));
}

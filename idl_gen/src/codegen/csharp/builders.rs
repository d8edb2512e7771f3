/* Construction helpers: fixed struct constructors, table Start/Add/End, the
 * single-call table Create, vector builders and root finishers. */

use super::naming::{arg_name, def_name, escape_keyword, make_camel, member_names, object_name, struct_name};
use super::types::{add_default, arg_type, basic, default_value, src_cast, type_get};
use super::metadata_index;
use crate::codegen::context::EmitContext;
use crate::error::{GenError, GenResult};
use crate::flatten::{Flattened, StructLeaf, StructStep, struct_leaves};
use crate::layout::{FieldCategory, FieldLayout, base_size, categorize, inline_layout};
use crate::schema::{FieldDef, Schema, StructDef, StructId, Type};

/* Field width groups visited by size-sorted constructors, widest first */
const SIZE_GROUPS: [u64; 4] = [8, 4, 2, 1];

/* Field count above which no single-call constructor is generated */
const MAX_CREATE_ARGS: usize = 127;

/* Order of Add calls in single-call constructors. Fields are added last to
 * first so the back-to-front builder lays them out in declaration order;
 * with `sortbysize` this runs once per width group, widest first. The result
 * depends only on field widths and declaration order. */
pub fn create_order<'s>(schema: &Schema, def: &'s StructDef) -> Vec<&'s FieldDef> {
  let live = || def.fields.iter().rev().filter(|f| !f.deprecated);
  if !def.sortbysize {
    return live().collect();
  }
  let mut order = Vec::with_capacity(def.fields.len());
  for size in SIZE_GROUPS {
    order.extend(live().filter(|f| base_size(schema, &f.ty) == size));
  }
  order
}

fn offset_arg(field: &FieldDef) -> String {
  format!("{}Offset", make_camel(&field.name, false))
}

/* ============================================================================
   Fixed structs
   ============================================================================ */

/* Members of the value tuple standing in for a nested struct argument. Arrays
 * inside a tuple become one member per element. */
fn tuple_members(cx: &EmitContext, id: StructId) -> Vec<(String, String)> {
  let mut members = Vec::new();
  for field in &cx.schema.struct_def(id).fields {
    let lower = make_camel(&field.name, false);
    match &field.ty {
      Type::Array(elem, len) => {
        let elem_ty = tuple_value_type(cx, elem);
        for i in 0..*len {
          members.push((elem_ty.clone(), format!("{}_{}", lower, i)));
        }
      }
      other => members.push((tuple_value_type(cx, other), lower)),
    }
  }
  members
}

fn tuple_value_type(cx: &EmitContext, ty: &Type) -> String {
  match ty {
    Type::Struct(id) => tuple_type(cx, *id),
    other => type_get(cx, other),
  }
}

pub fn tuple_type(cx: &EmitContext, id: StructId) -> String {
  let members = tuple_members(cx, id);
  if members.len() == 1 {
    return format!("System.ValueTuple<{}>", members[0].0);
  }
  let parts: Vec<String> = members.iter().map(|(ty, name)| format!("{} {}", ty, escape_keyword(name))).collect();
  format!("({})", parts.join(", "))
}

/* How a tuple member is reached; single-member tuples only expose `Item1` */
pub fn tuple_access(cx: &EmitContext, id: StructId, member: &str) -> String {
  if tuple_members(cx, id).len() == 1 { "Item1".to_string() } else { escape_keyword(member) }
}

fn struct_arg_type(cx: &EmitContext, ty: &Type) -> String {
  match ty {
    Type::Array(elem, _) => format!("StirlingLabs.Utilities.ReadOnlyBigSpan<{}>", tuple_value_type(cx, elem)),
    other => tuple_value_type(cx, other),
  }
}

/* Statement writing one flattened leaf through its path: arguments are walked
 * as span indices and tuple members, the entity through nested views */
fn leaf_statement(cx: &EmitContext, root: StructId, leaf: &Flattened<StructStep, StructLeaf>) -> GenResult<String> {
  let schema = cx.schema;
  let mut entity = String::from("entity");
  let mut arg = String::new();
  let mut owner = root;
  let steps = &leaf.path;
  let mut k = 0;

  while k < steps.len() {
    let StructStep::Field(field) = steps[k] else {
      return Err(GenError::contract(&schema.struct_def(root).name, "array element step without its field"));
    };
    let def = schema.struct_def(owner);
    let names = member_names(def, &FieldLayout::resolve(schema, def, field));
    let lower = make_camel(&field.name, false);

    match &field.ty {
      Type::Array(elem, _) => {
        let Some(StructStep::Element(i)) = steps.get(k + 1).copied() else {
          return Err(GenError::contract(&def.name, format!("array '{}' reached without an element index", field.name)));
        };
        if k == 0 {
          arg = format!("{}[{}u]", arg_name(field), i);
        } else {
          arg.push('.');
          arg.push_str(&tuple_access(cx, owner, &format!("{}_{}", lower, i)));
        }
        if k + 2 >= steps.len() {
          entity.push_str(&format!(".Set{}({}, {})", names.camel, i, arg));
        } else if let Type::Struct(sid) = **elem {
          entity.push_str(&format!(".{}({})", names.property, i));
          owner = sid;
        }
        k += 2;
      }
      ty => {
        if k == 0 {
          arg = arg_name(field);
        } else {
          arg.push('.');
          arg.push_str(&tuple_access(cx, owner, &lower));
        }
        match ty {
          Type::Struct(sid) => {
            entity.push_str(&format!(".{}", names.property));
            owner = *sid;
          }
          _ => entity.push_str(&format!(".Set{}({})", names.camel, arg)),
        }
        k += 1;
      }
    }
  }
  Ok(format!("    {};\n", entity))
}

/* Writes the whole struct in one pass after reserving its exact size and
 * alignment. Array lengths are checked before anything is reserved. */
pub fn emit_struct_create(cx: &EmitContext, id: StructId, code: &mut String) -> GenResult<()> {
  let def = cx.schema.struct_def(id);
  let qualified = struct_name(cx, id);

  code.push_str(&format!("  public static Offset<{}> Create{}(BigBufferBuilder builder", qualified, def.name));
  for field in &def.fields {
    code.push_str(&format!(", {} {}", struct_arg_type(cx, &field.ty), arg_name(field)));
  }
  code.push_str(") {\n");

  for field in &def.fields {
    if let Type::Array(_, len) = field.ty {
      let arg = arg_name(field);
      code.push_str(&format!("    if ({} != {}.LongLength)\n", len, arg));
      code.push_str(&format!(
        "      throw new System.ArgumentException(\"Must be of length {}\", nameof({}));\n",
        len, arg
      ));
    }
  }

  code.push_str(&format!("    builder.Prep({}, {});\n", def.minalign, def.bytesize));
  code.push_str(&format!("    var entity = new {}(builder.Offset, builder.ByteBuffer);\n", qualified));
  code.push_str("    builder.Offset += ByteSize;\n");
  for leaf in struct_leaves(cx.schema, id) {
    code.push_str(&leaf_statement(cx, id, &leaf)?);
  }
  code.push_str(&format!("    return new Offset<{}>(entity._model.Offset);\n  }}\n\n", qualified));
  Ok(())
}

/* ============================================================================
   Tables
   ============================================================================ */

/* Fixed struct fields must be built inline right before their Add, which a
 * positional constructor can only do when it packs them itself */
pub fn table_has_create(cx: &EmitContext, def: &StructDef) -> bool {
  let mut has_struct_fields = false;
  let mut count = 0;
  for field in def.live_fields() {
    if cx.schema.is_fixed(&field.ty) {
      has_struct_fields = true;
    } else {
      count += 1;
    }
  }
  (!has_struct_fields || cx.options.object_api) && count > 0 && count < MAX_CREATE_ARGS
}

pub fn emit_table_create(cx: &EmitContext, id: StructId, code: &mut String) -> GenResult<()> {
  let def = cx.schema.struct_def(id);
  if !table_has_create(cx, def) {
    return Ok(());
  }
  let qualified = struct_name(cx, id);
  let name = def_name(&def.name);

  code.push_str(&format!("  public static Offset<{}> Create{}(BigBufferBuilder builder", qualified, def.name));
  for field in def.live_fields() {
    code.push_str(",\n      ");
    match categorize(cx.schema, &field.ty) {
      FieldCategory::Scalar | FieldCategory::UnionType => {
        let optional = if field.optional { "?" } else { "" };
        code.push_str(&format!(
          "{}{} {} = {}",
          type_get(cx, &field.ty),
          optional,
          arg_name(field),
          default_value(cx, field)
        ));
      }
      FieldCategory::Struct => {
        let ty = match field.ty {
          Type::Struct(sid) => object_name(cx, sid),
          _ => arg_type(cx, &field.ty),
        };
        code.push_str(&format!("{} {} = null", ty, arg_name(field)));
      }
      FieldCategory::Union => code.push_str(&format!("ulong {} = 0", offset_arg(field))),
      FieldCategory::String | FieldCategory::Table | FieldCategory::Vector => {
        let ty = arg_type(cx, &field.ty);
        code.push_str(&format!("{} {} = default({})", ty, offset_arg(field), ty));
      }
      FieldCategory::Array => {
        return Err(GenError::contract(&def.name, format!("table field '{}' cannot be a fixed array", field.name)));
      }
    }
  }
  code.push_str(") {\n");
  code.push_str(&format!("    builder.StartTable({});\n", def.fields.len()));
  for field in create_order(cx.schema, def) {
    let camel = make_camel(&field.name, true);
    let value = match categorize(cx.schema, &field.ty) {
      FieldCategory::Scalar | FieldCategory::UnionType => arg_name(field),
      FieldCategory::Struct => match field.ty {
        Type::Struct(sid) => format!("{}.Pack(builder, {})", struct_name(cx, sid), arg_name(field)),
        _ => arg_name(field),
      },
      _ => offset_arg(field),
    };
    code.push_str(&format!("    {}.Add{}(builder, {});\n", name, camel, value));
  }
  code.push_str(&format!("    return {}.End{}(builder);\n  }}\n\n", name, def.name));
  Ok(())
}

fn add_call(cx: &EmitContext, field: &FieldDef) -> GenResult<(String, String, String)> {
  let index = field.index;
  let call = match categorize(cx.schema, &field.ty) {
    FieldCategory::Scalar | FieldCategory::UnionType => {
      let arg = arg_name(field);
      let storage = basic(cx, &field.ty);
      let ty = type_get(cx, &field.ty);
      match add_default(cx, field) {
        Some(default) => {
          let cast = src_cast(cx, &field.ty);
          (ty, arg.clone(), format!("builder.Add<{}>({}, {}{}, {})", storage, index, cast, arg, default))
        }
        None => {
          let cast = if src_cast(cx, &field.ty).is_empty() { String::new() } else { format!("({}?)", storage) };
          (format!("{}?", ty), arg.clone(), format!("builder.Add<{}>({}, {}{})", storage, index, cast, arg))
        }
      }
    }
    FieldCategory::Struct => {
      let arg = offset_arg(field);
      (arg_type(cx, &field.ty), arg.clone(), format!("builder.AddStruct({}, {}.Value, 0)", index, arg))
    }
    FieldCategory::Union => {
      let arg = offset_arg(field);
      ("ulong".to_string(), arg.clone(), format!("builder.AddOffset({}, {}, 0)", index, arg))
    }
    FieldCategory::String | FieldCategory::Table | FieldCategory::Vector => {
      let arg = offset_arg(field);
      (arg_type(cx, &field.ty), arg.clone(), format!("builder.AddOffset({}, {}.Value, 0)", index, arg))
    }
    FieldCategory::Array => {
      return Err(GenError::contract(&field.name, "fixed arrays cannot be added to a table"));
    }
  };
  Ok(call)
}

/* Start, one Add per live field bound to its slot, End with required checks */
pub fn emit_start_add_end(cx: &EmitContext, id: StructId, code: &mut String) -> GenResult<()> {
  let def = cx.schema.struct_def(id);
  let qualified = struct_name(cx, id);

  code.push_str(&format!(
    "  public static void Start{}(BigBufferBuilder builder) {{ builder.StartTable({}); }}\n",
    def.name,
    def.fields.len()
  ));
  for field in def.live_fields() {
    let (ty, arg, call) = add_call(cx, field)?;
    metadata_index(code, field.index);
    code.push_str(&format!(
      "  public static void Add{}(BigBufferBuilder builder, {} {}) {{ {}; }}\n",
      make_camel(&field.name, true),
      ty,
      arg,
      call
    ));
  }
  emit_vector_helpers(cx, def, code);

  code.push_str(&format!("  public static Offset<{}> End{}(BigBufferBuilder builder) {{\n", qualified, def.name));
  code.push_str("    var o = builder.EndTable();\n");
  for field in def.live_fields().filter(|f| f.required) {
    code.push_str(&format!("    builder.Required(o, {});  // {}\n", field.voffset(), field.name));
  }
  code.push_str(&format!("    return new Offset<{}>(o);\n  }}\n", qualified));
  Ok(())
}

fn emit_vector_helpers(cx: &EmitContext, def: &StructDef, code: &mut String) {
  for field in def.live_fields() {
    let Type::Vector(elem) = &field.ty else { continue };
    let camel = make_camel(&field.name, true);
    let (size, align) = inline_layout(cx.schema, elem);

    if !cx.schema.is_fixed(elem) {
      let (elem_arg, add) = match categorize(cx.schema, elem) {
        FieldCategory::Scalar | FieldCategory::UnionType => {
          (type_get(cx, elem), format!("Add<{}>({}data[i])", basic(cx, elem), src_cast(cx, elem)))
        }
        FieldCategory::Union => ("ulong".to_string(), "AddOffset(data[i])".to_string()),
        _ => (arg_type(cx, elem), "AddOffset(data[i].Value)".to_string()),
      };
      code.push_str(&format!(
        "  public static VectorOffset Create{}Vector(BigBufferBuilder builder, {}[] data) {{\n",
        camel, elem_arg
      ));
      code.push_str(&format!("    builder.StartVector({}, (ulong)data.LongLength, {});\n", size, align));
      code.push_str(&format!("    for (var i = data.LongLength - 1; i >= 0; i--) builder.{};\n", add));
      code.push_str("    return builder.EndVector();\n  }\n");
    }
    code.push_str(&format!(
      "  public static void Start{}Vector(BigBufferBuilder builder, ulong numElems) {{ builder.StartVector({}, numElems, {}); }}\n",
      camel, size, align
    ));
  }
}

pub fn emit_root_helpers(cx: &EmitContext, id: StructId, code: &mut String) {
  if !cx.schema.is_root(id) {
    return;
  }
  let def = cx.schema.struct_def(id);
  let qualified = struct_name(cx, id);
  let ident = cx.schema.file_identifier.as_ref().map(|i| format!("\"{}\"", i)).unwrap_or_default();

  for prefix in ["", "SizePrefixed"] {
    code.push_str(&format!(
      "  public static void Begin{p}{n}Buffer(BigBufferBuilder builder) {{ builder.Begin{p}({i}); }}\n",
      p = prefix,
      n = def.name,
      i = ident
    ));
    code.push_str(&format!(
      "  public static void Finish{p}{n}Buffer(BigBufferBuilder builder, Offset<{q}> offset) {{ builder.Finish{p}(offset); }}\n",
      p = prefix,
      n = def.name,
      q = qualified
    ));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::SchemaResolver;
  use idl_types::SchemaFile;

  fn schema(yaml: &str) -> Schema {
    let mut resolver = SchemaResolver::new();
    resolver.add_file(SchemaFile::from_yaml(yaml).unwrap()).unwrap();
    resolver.resolve().unwrap()
  }

  const MIXED: &str = r#"
definitions:
  - name: Mixed
    kind:
      table:
        fields:
          - { name: a, type: byte }
          - { name: b, type: long }
          - { name: c, type: string }
          - { name: d, type: short }
          - { name: e, type: int }
          - { name: f, type: double }
          - { name: g, type: ubyte, deprecated: true }
          - { name: h, type: ushort }
"#;

  #[test]
  fn test_create_order_groups_by_size() {
    let schema = schema(MIXED);
    let def = schema.struct_def(StructId(0));
    let order: Vec<&str> = create_order(&schema, def).iter().map(|f| f.name.as_str()).collect();
    assert_eq!(order, vec!["f", "c", "b", "e", "h", "d", "a"]);
  }

  #[test]
  fn test_create_order_is_independent_of_interleaving() {
    let shuffled = MIXED
      .replace("          - { name: d, type: short }\n", "")
      .replace("          - { name: h, type: ushort }\n", "          - { name: h, type: ushort }\n          - { name: d, type: short }\n");
    let schema = schema(&shuffled);
    let order: Vec<&str> = create_order(&schema, schema.struct_def(StructId(0))).iter().map(|f| f.name.as_str()).collect();
    assert_eq!(&order[..4], &["f", "c", "b", "e"]);
    assert_eq!(&order[4..6], &["d", "h"]);
  }

  #[test]
  fn test_original_order_skips_grouping() {
    let yaml = MIXED.replace("      table:\n", "      table:\n        original-order: true\n");
    let schema = schema(&yaml);
    let order: Vec<&str> = create_order(&schema, schema.struct_def(StructId(0))).iter().map(|f| f.name.as_str()).collect();
    assert_eq!(order, vec!["h", "f", "e", "d", "c", "b", "a"]);
  }
}

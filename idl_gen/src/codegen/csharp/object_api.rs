/* Owned mirror classes and the Pack/UnPack bridge.
 *
 * UnPack reads every live field through the view's value accessors, so absent
 * fields come back as their defaults. Pack builds children first (strings,
 * sub-tables, vectors, union payloads) and only then opens the parent, as the
 * back-to-front builder requires every referenced object to exist already.
 */

use super::builders::{table_has_create, tuple_type};
use super::naming::{
  MemberNames, enum_name, escape_keyword, field_camel, make_camel, member_names, object_class_base, object_name,
  qualify, struct_name, union_class_name,
};
use super::types::{basic, default_value, object_type, src_cast};
use crate::codegen::context::EmitContext;
use crate::error::{GenError, GenResult};
use crate::layout::{FieldCategory, FieldLayout, categorize};
use crate::schema::{EnumId, FieldDef, StructDef, StructId, Type};

fn view_names(cx: &EmitContext, def: &StructDef, field: &FieldDef) -> MemberNames {
  member_names(def, &FieldLayout::resolve(cx.schema, def, field))
}

/* Property of the owned class */
fn object_property(field: &FieldDef) -> String {
  escape_keyword(&field_camel(field))
}

fn is_discriminant(ty: &Type) -> bool {
  match ty {
    Type::UnionType(_) => true,
    Type::Vector(elem) => matches!(**elem, Type::UnionType(_)),
    _ => false,
  }
}

fn companion_names(cx: &EmitContext, def: &StructDef, field: &FieldDef) -> GenResult<MemberNames> {
  let companion = def
    .union_type_field(field)
    .ok_or_else(|| GenError::contract(&def.name, format!("union field '{}' has no discriminant companion", field.name)))?;
  Ok(view_names(cx, def, companion))
}

/* ============================================================================
   UnPack
   ============================================================================ */

struct UnionRead<'a> {
  target: &'a str,
  type_read: String,
  payload: &'a str,
  string_read: String,
  index: &'a str,
  indent: &'a str,
}

fn push_union_switch(cx: &EmitContext, id: EnumId, read: &UnionRead, code: &mut String) {
  let def = cx.schema.enum_def(id);
  let enum_ty = enum_name(cx, id);
  let ind = read.indent;
  code.push_str(&format!("{}{}.Type = {};\n", ind, read.target, read.type_read));
  code.push_str(&format!("{}switch ({}) {{\n", ind, read.type_read));
  code.push_str(&format!("{}  default: break;\n", ind));
  for val in def.variants() {
    code.push_str(&format!("{}  case {}.{}:\n", ind, enum_ty, escape_keyword(&val.name)));
    match &val.union_type {
      Some(Type::Struct(sid)) => {
        let ty = struct_name(cx, *sid);
        let access = format!("this.{}<{}>({})", read.payload, ty, read.index);
        code.push_str(&format!(
          "{}    {}.Value = {}.HasValue ? {}.Value.UnPack() : null;\n",
          ind, read.target, access, access
        ));
      }
      _ => code.push_str(&format!("{}    {}.Value = {};\n", ind, read.target, read.string_read)),
    }
    code.push_str(&format!("{}    break;\n", ind));
  }
  code.push_str(&format!("{}}}\n", ind));
}

fn unpack_field(cx: &EmitContext, def: &StructDef, field: &FieldDef, code: &mut String) -> GenResult<()> {
  let names = view_names(cx, def, field);
  let prop = object_property(field);
  let start = format!("    _o.{} = ", prop);

  match categorize(cx.schema, &field.ty) {
    FieldCategory::Scalar => code.push_str(&format!("{}this.{}();\n", start, names.value())),
    FieldCategory::UnionType => {}
    FieldCategory::String => code.push_str(&format!("{}this.{};\n", start, names.property)),
    FieldCategory::Struct if def.fixed => code.push_str(&format!("{}this.{}.UnPack();\n", start, names.property)),
    FieldCategory::Struct | FieldCategory::Table => code.push_str(&format!(
      "{}this.{p}.HasValue ? this.{p}.Value.UnPack() : null;\n",
      start,
      p = names.property
    )),
    FieldCategory::Union => {
      let Some(id) = field.ty.enum_id() else { return Ok(()) };
      let companion = companion_names(cx, def, field)?;
      code.push_str(&format!("{}new {}();\n", start, union_class_name(cx, id)));
      let target = format!("_o.{}", prop);
      push_union_switch(
        cx,
        id,
        &UnionRead {
          target: &target,
          type_read: format!("this.{}", companion.property),
          payload: &names.property,
          string_read: format!("this.{}AsString()", names.camel),
          index: "",
          indent: "    ",
        },
        code,
      );
    }
    FieldCategory::Vector => {
      let Type::Vector(elem) = &field.ty else { return Ok(()) };
      if matches!(**elem, Type::UnionType(_)) {
        return Ok(());
      }
      code.push_str(&format!("{}new {}();\n", start, object_type(cx, &field.ty)));
      code.push_str(&format!("    for (ulong _j = 0; _j < this.{}Length; ++_j) {{", names.camel));
      match categorize(cx.schema, elem) {
        FieldCategory::Union => {
          let Some(id) = elem.enum_id() else { return Ok(()) };
          let companion = companion_names(cx, def, field)?;
          let local = format!("_o_{}", names.camel);
          code.push('\n');
          code.push_str(&format!("      var {} = new {}();\n", local, union_class_name(cx, id)));
          push_union_switch(
            cx,
            id,
            &UnionRead {
              target: &local,
              type_read: format!("this.{}(_j)", companion.property),
              payload: &names.property,
              string_read: format!("this.{}AsString(_j)", names.camel),
              index: "_j",
              indent: "      ",
            },
            code,
          );
          code.push_str(&format!("      _o.{}.Add({});\n    }}\n", prop, local));
        }
        FieldCategory::Scalar => code.push_str(&format!(" _o.{}.Add(this.{}(_j)); }}\n", prop, names.value())),
        FieldCategory::String => code.push_str(&format!(" _o.{}.Add(this.{}(_j)); }}\n", prop, names.property)),
        _ => code.push_str(&format!(
          " _o.{}.Add(this.{p}(_j).HasValue ? this.{p}(_j).Value.UnPack() : null); }}\n",
          prop,
          p = names.property
        )),
      }
    }
    FieldCategory::Array => {
      let Type::Array(elem, len) = &field.ty else { return Ok(()) };
      code.push_str(&format!("{}new {}[{}];\n", start, object_type(cx, elem), len));
      let read = match **elem {
        Type::Struct(_) => format!("this.{}(_j).UnPack()", names.property),
        _ => format!("this.{}(_j)", names.value()),
      };
      code.push_str(&format!("    for (ulong _j = 0; _j < {}; ++_j) {{ _o.{}[_j] = {}; }}\n", len, prop, read));
    }
  }
  Ok(())
}

/* ============================================================================
   Pack
   ============================================================================ */

/* Value tuple matching a struct constructor argument, read from an owned object */
fn tuple_from(cx: &EmitContext, id: StructId, source: &str) -> String {
  let mut parts = Vec::new();
  for field in &cx.schema.struct_def(id).fields {
    let value = format!("{}.{}", source, object_property(field));
    match &field.ty {
      Type::Struct(sid) => parts.push(tuple_from(cx, *sid, &value)),
      Type::Array(elem, len) => {
        for i in 0..*len {
          let item = format!("{}[{}]", value, i);
          match **elem {
            Type::Struct(sid) => parts.push(tuple_from(cx, sid, &item)),
            _ => parts.push(item),
          }
        }
      }
      _ => parts.push(value),
    }
  }
  if parts.len() == 1 {
    let ty = tuple_type(cx, id);
    return format!("new {}({})", ty, parts[0]);
  }
  format!("({})", parts.join(", "))
}

fn emit_struct_pack(cx: &EmitContext, id: StructId, code: &mut String) {
  let def = cx.schema.struct_def(id);
  let qualified = struct_name(cx, id);
  code.push_str(&format!(
    "  public static Offset<{q}> Pack(BigBufferBuilder builder, {o} _o) {{\n    if (_o == null) return default(Offset<{q}>);\n",
    q = qualified,
    o = object_name(cx, id)
  ));
  code.push_str(&format!("    return Create{}(\n      builder", def.name));
  for field in &def.fields {
    let value = format!("_o.{}", object_property(field));
    let arg = match &field.ty {
      Type::Struct(sid) => tuple_from(cx, *sid, &value),
      Type::Array(elem, _) => match **elem {
        Type::Struct(sid) => format!("System.Array.ConvertAll({}, _e => {})", value, tuple_from(cx, sid, "_e")),
        _ => value,
      },
      _ => value,
    };
    code.push_str(&format!(",\n      {}", arg));
  }
  code.push_str(");\n  }\n");
}

/* Children of one field, built before the table is opened */
fn pack_prelude(cx: &EmitContext, def: &StructDef, field: &FieldDef, code: &mut String) -> GenResult<()> {
  let prop = object_property(field);
  let local = format!("_{}", field.name);
  match &field.ty {
    Type::String => {
      let create = if field.shared { "CreateSharedString" } else { "CreateString" };
      code.push_str(&format!(
        "    var {} = _o.{p} == null ? default(StringOffset) : builder.{}(_o.{p});\n",
        local,
        create,
        p = prop
      ));
    }
    Type::Struct(sid) if !cx.schema.struct_def(*sid).fixed => {
      code.push_str(&format!(
        "    var {} = _o.{p} == null ? default(Offset<{q}>) : {q}.Pack(builder, _o.{p});\n",
        local,
        p = prop,
        q = struct_name(cx, *sid)
      ));
    }
    Type::Union(id) => {
      code.push_str(&format!(
        "    var {}_type = _o.{p} == null ? {e}.NONE : _o.{p}.Type;\n",
        local,
        p = prop,
        e = enum_name(cx, *id)
      ));
      code.push_str(&format!(
        "    var {} = _o.{p} == null ? 0 : {u}.Pack(builder, _o.{p});\n",
        local,
        p = prop,
        u = union_class_name(cx, *id)
      ));
    }
    Type::Vector(elem) => pack_vector(cx, def, field, elem, code)?,
    _ => {}
  }
  Ok(())
}

/* Vectors are refilled last element first so they read back in order */
fn pack_vector(cx: &EmitContext, def: &StructDef, field: &FieldDef, elem: &Type, code: &mut String) -> GenResult<()> {
  let camel = make_camel(&field.name, true);
  let local = format!("_{}", field.name);
  let mut source = object_property(field);

  let (array_ty, to_array) = match elem {
    Type::String => {
      let create = if field.shared { "CreateSharedString" } else { "CreateString" };
      ("StringOffset".to_string(), format!("builder.{}(_o.{}[_j])", create, source))
    }
    Type::Struct(sid) if !cx.schema.struct_def(*sid).fixed => {
      let q = struct_name(cx, *sid);
      (format!("Offset<{}>", q), format!("{}.Pack(builder, _o.{}[_j])", q, source))
    }
    Type::Union(id) => ("ulong".to_string(), format!("{}.Pack(builder, _o.{}[_j])", union_class_name(cx, *id), source)),
    Type::UnionType(id) => {
      /* Discriminants come from the union list the companion belongs to */
      let union_field = def
        .fields
        .iter()
        .find(|f| def.union_type_field(f).map(|c| c.name == field.name).unwrap_or(false))
        .ok_or_else(|| GenError::contract(&def.name, format!("discriminant vector '{}' has no union field", field.name)))?;
      source = object_property(union_field);
      (enum_name(cx, *id), format!("_o.{}[_j].Type", source))
    }
    _ => {
      let add = match elem {
        Type::Struct(sid) => format!("{}.Pack(builder, _o.{}[_j]);", struct_name(cx, *sid), source),
        _ => format!("builder.Add<{}>({}_o.{}[_j]);", basic(cx, elem), src_cast(cx, elem), source),
      };
      code.push_str(&format!("    var {} = default(VectorOffset);\n", local));
      code.push_str(&format!("    if (_o.{} != null) {{\n", source));
      code.push_str(&format!("      Start{}Vector(builder, (ulong)_o.{}.Count);\n", camel, source));
      code.push_str(&format!("      for (var _j = _o.{}.Count - 1; _j >= 0; --_j) {{ {} }}\n", source, add));
      code.push_str(&format!("      {} = builder.EndVector();\n    }}\n", local));
      return Ok(());
    }
  };

  let items = format!("__{}", field.name);
  code.push_str(&format!("    var {} = default(VectorOffset);\n", local));
  code.push_str(&format!("    if (_o.{} != null) {{\n", source));
  code.push_str(&format!("      var {} = new {}[_o.{}.Count];\n", items, array_ty, source));
  code.push_str(&format!("      for (var _j = 0; _j < {}.Length; ++_j) {{ {}[_j] = {}; }}\n", items, items, to_array));
  code.push_str(&format!("      {} = Create{}Vector(builder, {});\n    }}\n", local, camel, items));
  Ok(())
}

fn emit_table_pack(cx: &EmitContext, id: StructId, code: &mut String) -> GenResult<()> {
  let def = cx.schema.struct_def(id);
  let qualified = struct_name(cx, id);
  code.push_str(&format!(
    "  public static Offset<{q}> Pack(BigBufferBuilder builder, {o} _o) {{\n    if (_o == null) return default(Offset<{q}>);\n",
    q = qualified,
    o = object_name(cx, id)
  ));
  for field in def.live_fields() {
    pack_prelude(cx, def, field, code)?;
  }

  let value_of = |field: &FieldDef| match categorize(cx.schema, &field.ty) {
    FieldCategory::Scalar => format!("_o.{}", object_property(field)),
    _ => format!("_{}", field.name),
  };

  if table_has_create(cx, def) {
    code.push_str(&format!("    return Create{}(\n      builder", def.name));
    for field in def.live_fields() {
      let arg = match &field.ty {
        Type::Struct(sid) if cx.schema.struct_def(*sid).fixed => format!("_o.{}", object_property(field)),
        _ => value_of(field),
      };
      code.push_str(&format!(",\n      {}", arg));
    }
    code.push_str(");\n");
  } else {
    code.push_str(&format!("    Start{}(builder);\n", def.name));
    for field in def.live_fields() {
      let arg = match &field.ty {
        Type::Struct(sid) if cx.schema.struct_def(*sid).fixed => {
          format!("{}.Pack(builder, _o.{})", struct_name(cx, *sid), object_property(field))
        }
        _ => value_of(field),
      };
      code.push_str(&format!("    Add{}(builder, {});\n", make_camel(&field.name, true), arg));
    }
    code.push_str(&format!("    return End{}(builder);\n", def.name));
  }
  code.push_str("  }\n");
  Ok(())
}

/* UnPack, UnPackTo and Pack, emitted inside the view struct */
pub fn emit_pack_unpack(cx: &EmitContext, id: StructId, code: &mut String) -> GenResult<()> {
  let def = cx.schema.struct_def(id);
  let object = object_name(cx, id);
  code.push_str(&format!(
    "  public {o} UnPack() {{\n    var _o = new {o}();\n    this.UnPackTo(_o);\n    return _o;\n  }}\n",
    o = object
  ));
  code.push_str(&format!("  public void UnPackTo({} _o) {{\n", object));
  for field in def.live_fields() {
    unpack_field(cx, def, field, code)?;
  }
  code.push_str("  }\n");

  if def.fixed {
    emit_struct_pack(cx, id, code);
    Ok(())
  } else {
    emit_table_pack(cx, id, code)
  }
}

/* ============================================================================
   Owned class
   ============================================================================ */

fn json_union_members(cx: &EmitContext, field: &FieldDef, code: &mut String) {
  let Some(id) = field.ty.enum_id() else { return };
  let prop = object_property(field);
  let camel = field_camel(field);
  let enum_ty = enum_name(cx, id);
  let union_ty = union_class_name(cx, id);

  code.push_str(&format!("  [Newtonsoft.Json.JsonProperty(\"{}_type\")]\n", field.name));
  if field.ty.is_series() {
    code.push_str(&format!("  internal {}[] {}Type {{\n", enum_ty, camel));
    code.push_str(&format!(
      "    get {{\n      if (this.{p} == null) return null;\n      var _o = new {e}[this.{p}.Count];\n      for (var _j = 0; _j < _o.Length; ++_j) {{ _o[_j] = this.{p}[_j].Type; }}\n      return _o;\n    }}\n",
      p = prop,
      e = enum_ty
    ));
    code.push_str(&format!(
      "    set {{\n      this.{p} = new List<{u}>();\n      for (var _j = 0; _j < value.Length; ++_j) {{\n        var _o = new {u}();\n        _o.Type = value[_j];\n        this.{p}.Add(_o);\n      }}\n    }}\n  }}\n",
      p = prop,
      u = union_ty
    ));
  } else {
    code.push_str(&format!("  internal {} {}Type {{\n", enum_ty, camel));
    code.push_str(&format!(
      "    get {{\n      return this.{p} != null ? this.{p}.Type : {e}.NONE;\n    }}\n",
      p = prop,
      e = enum_ty
    ));
    code.push_str(&format!(
      "    set {{\n      this.{p} = new {u}();\n      this.{p}.Type = value;\n    }}\n  }}\n",
      p = prop,
      u = union_ty
    ));
  }
}

fn object_default(cx: &EmitContext, field: &FieldDef) -> String {
  match &field.ty {
    ty if ty.is_scalar() => default_value(cx, field),
    Type::Struct(sid) if cx.schema.struct_def(*sid).fixed => format!("new {}()", object_name(cx, *sid)),
    Type::Array(elem, len) => format!("new {}[{}]", object_type(cx, elem), len),
    _ => "null".to_string(),
  }
}

pub fn emit_object_class(cx: &EmitContext, id: StructId, code: &mut String) -> GenResult<()> {
  let def = cx.schema.struct_def(id);
  let class = object_class_base(cx, &def.name);
  let visibility = if def.private { "internal" } else { "public" };
  let partial = if def.partial { "partial " } else { "" };
  let json = cx.options.json_serializer;

  code.push_str(&format!("{} {}class {}\n{{\n", visibility, partial, class));
  for field in def.live_fields().filter(|f| !is_discriminant(&f.ty)) {
    let mut ty = object_type(cx, &field.ty);
    if field.optional {
      ty.push('?');
    }
    if json {
      let is_union = match &field.ty {
        Type::Union(_) => true,
        Type::Vector(elem) => matches!(**elem, Type::Union(_)),
        _ => false,
      };
      if is_union {
        json_union_members(cx, field, code);
      }
      code.push_str(&format!("  [Newtonsoft.Json.JsonProperty(\"{}\")]\n", field.name));
      if is_union {
        if let Some(eid) = field.ty.enum_id().or_else(|| field.ty.element().and_then(Type::enum_id)) {
          let converter = qualify(cx.enum_namespace(eid), &format!("{}Union_JsonConverter", cx.schema.enum_def(eid).name));
          code.push_str(&format!("  [Newtonsoft.Json.JsonConverter(typeof({}))]\n", converter));
        }
      }
    }
    code.push_str(&format!("  public {} {} {{ get; set; }}\n", ty, object_property(field)));
  }

  code.push_str(&format!("\n  public {}() {{\n", class));
  for field in def.live_fields().filter(|f| !is_discriminant(&f.ty)) {
    code.push_str(&format!("    this.{} = {};\n", object_property(field), object_default(cx, field)));
  }
  code.push_str("  }\n");

  if cx.schema.is_root(id) {
    let view = struct_name(cx, id);
    let name = &def.name;
    if json {
      code.push_str(&format!(
        "\n  public static {c} DeserializeFromJson(string jsonText) {{\n    return Newtonsoft.Json.JsonConvert.DeserializeObject<{c}>(jsonText);\n  }}\n",
        c = class
      ));
      code.push_str(
        "  public string SerializeToJson() {\n    return Newtonsoft.Json.JsonConvert.SerializeObject(this, Newtonsoft.Json.Formatting.Indented);\n  }\n",
      );
    }
    code.push_str(&format!(
      "  public static {c} DeserializeFromBinary(byte[] fbBuffer) {{\n    return {v}.GetRootAs{n}(new ByteBuffer(fbBuffer)).UnPack();\n  }}\n",
      c = class,
      v = view,
      n = name
    ));
    code.push_str(&format!(
      "  public byte[] SerializeToBinary() {{\n    var fbb = new BigBufferBuilder(0x10000);\n    {v}.Finish{n}Buffer(fbb, {v}.Pack(fbb, this));\n    return fbb.ByteBuffer.ToSizedArray();\n  }}\n",
      v = view,
      n = name
    ));
  }
  code.push_str("}\n\n");
  Ok(())
}

/* Enum declarations and, with the object API, the owned union wrapper. */

use super::naming::{def_name, escape_keyword, make_camel, struct_name};
use super::push_doc;
use super::types::{object_type, scalar_name};
use crate::codegen::context::EmitContext;
use crate::error::{GenError, GenResult};
use crate::schema::{EnumId, Type};

pub fn emit_enum(cx: &EmitContext, id: EnumId) -> GenResult<String> {
  let def = cx.schema.enum_def(id);
  if !def.underlying.is_integer() {
    return Err(GenError::contract(&def.name, "enum underlying type must be an integer"));
  }

  let mut code = String::new();
  push_doc(&mut code, "", &def.doc);
  if cx.options.json_serializer && cx.options.object_api {
    code.push_str("[Newtonsoft.Json.JsonConverter(typeof(Newtonsoft.Json.Converters.StringEnumConverter))]\n");
  }
  if def.bit_flags {
    code.push_str("[System.FlagsAttribute]\n");
  }
  let visibility = if def.private { "internal" } else { "public" };
  code.push_str(&format!("{} enum {} : {}\n{{\n", visibility, def_name(&def.name), scalar_name(def.underlying)));

  for val in &def.values {
    push_doc(&mut code, "  ", &val.doc);
    match &val.union_type {
      Some(Type::Struct(sid)) => {
        let target = struct_name(cx, *sid);
        code.push_str(&format!("  [BigBuffers.UnionTypeAssociation(typeof({}))]\n", target));
      }
      Some(Type::String) => code.push_str("  [BigBuffers.UnionTypeAssociation(typeof(string))]\n"),
      Some(other) => {
        return Err(GenError::contract(&def.name, format!("union variant '{}' has unsupported payload {:?}", val.name, other)));
      }
      None => {}
    }
    code.push_str(&format!("  {} = {},\n", escape_keyword(&val.name), val.value));
  }
  code.push_str("}\n\n");

  if def.is_union && cx.options.object_api {
    emit_union_class(cx, id, &mut code);
    if cx.options.json_serializer {
      emit_union_json_converter(cx, id, &mut code);
    }
  }
  Ok(code)
}

/* Owned `XUnion`: discriminant plus boxed payload, with typed views and Pack */
fn emit_union_class(cx: &EmitContext, id: EnumId, code: &mut String) {
  let def = cx.schema.enum_def(id);
  let enum_ty = def_name(&def.name);
  let class = format!("{}Union", def.name);
  let visibility = if def.private { "internal" } else { "public" };
  let none = def.values.first().map(|v| escape_keyword(&v.name)).unwrap_or_else(|| "NONE".to_string());

  code.push_str(&format!("{} class {} {{\n", visibility, class));
  code.push_str(&format!("  public {} Type {{ get; set; }}\n", enum_ty));
  code.push_str("  public object Value { get; set; }\n\n");
  code.push_str(&format!("  public {}() {{\n    this.Type = {}.{};\n    this.Value = null;\n  }}\n\n", class, enum_ty, none));
  code.push_str("  public T As<T>() where T : class { return this.Value as T; }\n");

  for val in def.variants() {
    let Some(payload) = &val.union_type else { continue };
    let type_name = object_type(cx, payload);
    let member_vis = match payload {
      Type::Struct(sid) if cx.schema.struct_def(*sid).private => "internal",
      _ => "public",
    };
    let helper = make_camel(&val.name, true);
    let lower = val.name.to_lowercase();
    code.push_str(&format!(
      "  {} {} As{}() {{ return this.As<{}>(); }}\n",
      member_vis, type_name, helper, type_name
    ));
    code.push_str(&format!(
      "  {} static {} From{}({} _{}) {{ return new {} {{ Type = {}.{}, Value = _{} }}; }}\n",
      member_vis,
      class,
      helper,
      type_name,
      lower,
      class,
      enum_ty,
      escape_keyword(&val.name),
      lower
    ));
  }
  code.push('\n');

  code.push_str(&format!("  public static ulong Pack(BigBuffers.BigBufferBuilder builder, {} _o) {{\n", class));
  code.push_str("    switch (_o.Type) {\n");
  code.push_str("      default: return 0;\n");
  for val in def.variants() {
    let case = format!("      case {}.{}: return ", enum_ty, escape_keyword(&val.name));
    match &val.union_type {
      Some(Type::Struct(sid)) => code.push_str(&format!(
        "{}{}.Pack(builder, _o.As{}()).Value;\n",
        case,
        struct_name(cx, *sid),
        make_camel(&val.name, true)
      )),
      Some(_) => code.push_str(&format!(
        "{}builder.CreateString(_o.As{}()).Value;\n",
        case,
        make_camel(&val.name, true)
      )),
      None => {}
    }
  }
  code.push_str("    }\n  }\n}\n\n");
}

fn emit_union_json_converter(cx: &EmitContext, id: EnumId, code: &mut String) {
  let def = cx.schema.enum_def(id);
  let enum_ty = def_name(&def.name);
  let union = format!("{}Union", def.name);
  let visibility = if def.private { "internal" } else { "public" };

  code.push_str(&format!("{} class {}_JsonConverter : Newtonsoft.Json.JsonConverter {{\n", visibility, union));
  code.push_str(&format!(
    "  public override bool CanConvert(System.Type objectType) {{\n    return objectType == typeof({u}) || objectType == typeof(System.Collections.Generic.List<{u}>);\n  }}\n",
    u = union
  ));
  code.push_str(&format!(
    concat!(
      "  public override void WriteJson(Newtonsoft.Json.JsonWriter writer, object value, Newtonsoft.Json.JsonSerializer serializer) {{\n",
      "    var _olist = value as System.Collections.Generic.List<{u}>;\n",
      "    if (_olist != null) {{\n",
      "      writer.WriteStartArray();\n",
      "      foreach (var _o in _olist) {{ this.WriteJson(writer, _o, serializer); }}\n",
      "      writer.WriteEndArray();\n",
      "    }} else {{\n",
      "      this.WriteJson(writer, value as {u}, serializer);\n",
      "    }}\n",
      "  }}\n",
      "  public void WriteJson(Newtonsoft.Json.JsonWriter writer, {u} _o, Newtonsoft.Json.JsonSerializer serializer) {{\n",
      "    if (_o == null) return;\n",
      "    serializer.Serialize(writer, _o.Value);\n",
      "  }}\n",
      "  public override object ReadJson(Newtonsoft.Json.JsonReader reader, System.Type objectType, object existingValue, Newtonsoft.Json.JsonSerializer serializer) {{\n",
      "    var _olist = existingValue as System.Collections.Generic.List<{u}>;\n",
      "    if (_olist != null) {{\n",
      "      for (var _j = 0; _j < _olist.Count; ++_j) {{\n",
      "        reader.Read();\n",
      "        _olist[_j] = this.ReadJson(reader, _olist[_j], serializer);\n",
      "      }}\n",
      "      reader.Read();\n",
      "      return _olist;\n",
      "    }} else {{\n",
      "      return this.ReadJson(reader, existingValue as {u}, serializer);\n",
      "    }}\n",
      "  }}\n",
      "  public {u} ReadJson(Newtonsoft.Json.JsonReader reader, {u} _o, Newtonsoft.Json.JsonSerializer serializer) {{\n",
      "    if (_o == null) return null;\n",
      "    switch (_o.Type) {{\n",
      "      default: break;\n",
    ),
    u = union
  ));
  for val in def.variants() {
    let Some(payload) = &val.union_type else { continue };
    code.push_str(&format!(
      "      case {}.{}: _o.Value = serializer.Deserialize<{}>(reader); break;\n",
      enum_ty,
      escape_keyword(&val.name),
      object_type(cx, payload)
    ));
  }
  code.push_str("    }\n    return _o;\n  }\n}\n\n");
}

/* Identifier sanitizing and member naming for C#. */

use crate::codegen::context::EmitContext;
use crate::layout::FieldLayout;
use crate::schema::{EnumId, FieldDef, Namespace, StructDef, StructId};

pub const CSHARP_KEYWORDS: &[&str] = &[
  "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class", "const", "continue",
  "decimal", "default", "delegate", "do", "double", "else", "enum", "event", "explicit", "extern", "false", "finally",
  "fixed", "float", "for", "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
  "long", "namespace", "new", "null", "object", "operator", "out", "override", "params", "private", "protected",
  "public", "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static", "string",
  "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort",
  "using", "virtual", "void", "volatile", "while",
];

pub fn is_keyword(name: &str) -> bool {
  CSHARP_KEYWORDS.contains(&name)
}

/* Verbatim-identifier escape, only for reserved words */
pub fn escape_keyword(name: &str) -> String {
  if is_keyword(name) { format!("@{}", name) } else { name.to_string() }
}

/* snake_case to CamelCase; with `first_upper` unset the first character is kept as written */
pub fn make_camel(name: &str, first_upper: bool) -> String {
  let mut out = String::with_capacity(name.len());
  let mut chars = name.chars().peekable();
  let mut first = true;
  while let Some(c) = chars.next() {
    if first && first_upper {
      out.extend(c.to_uppercase());
    } else if c == '_' && chars.peek().is_some() {
      if let Some(next) = chars.next() {
        out.extend(next.to_uppercase());
      }
    } else {
      out.push(c);
    }
    first = false;
  }
  out
}

/* `@A.@B.@Name`; every part is written as a verbatim identifier so no reserved
 * word can break qualification */
pub fn qualify(namespace: &Namespace, name: &str) -> String {
  let mut out = String::new();
  for component in &namespace.components {
    out.push('@');
    out.push_str(component);
    out.push('.');
  }
  out.push('@');
  out.push_str(name);
  out
}

pub fn struct_name(cx: &EmitContext, id: StructId) -> String {
  qualify(cx.struct_namespace(id), &cx.schema.struct_def(id).name)
}

pub fn enum_name(cx: &EmitContext, id: EnumId) -> String {
  qualify(cx.enum_namespace(id), &cx.schema.enum_def(id).name)
}

/* Companion class of a union in the object API */
pub fn union_class_name(cx: &EmitContext, id: EnumId) -> String {
  qualify(cx.enum_namespace(id), &format!("{}Union", cx.schema.enum_def(id).name))
}

pub fn object_class_base(cx: &EmitContext, name: &str) -> String {
  format!("{}{}{}", cx.options.object_prefix, name, cx.options.object_suffix)
}

/* Owned mirror class of a struct or table */
pub fn object_name(cx: &EmitContext, id: StructId) -> String {
  qualify(cx.struct_namespace(id), &object_class_base(cx, &cx.schema.struct_def(id).name))
}

/* Local declaration name of a definition */
pub fn def_name(name: &str) -> String {
  escape_keyword(name)
}

pub fn field_camel(field: &FieldDef) -> String {
  make_camel(&field.name, true)
}

/* Parameter name: lower camel, escaped */
pub fn arg_name(field: &FieldDef) -> String {
  escape_keyword(&make_camel(&field.name, false))
}

/* Names of the members generated for one field */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberNames {
  /* CamelCase stem used to build derived names (`SetX`, `XLength`, `AddX`) */
  pub camel: String,
  /* Bare member: the reference accessor when one exists, otherwise the value accessor */
  pub property: String,
  /* Value accessor renamed with a `Get` prefix when a reference accessor takes the bare name */
  pub getter: Option<String>,
  /* Set when the bare name had to be disambiguated from the owner */
  pub collision: Option<String>,
}

impl MemberNames {
  /* Member returning the field by value */
  pub fn value(&self) -> &str {
    self.getter.as_deref().unwrap_or(&self.property)
  }
}

/* C# forbids a member named like its enclosing type; the bare name gets a `_`
 * suffix, uniformly, whichever accessor owns it */
pub fn member_names(owner: &StructDef, layout: &FieldLayout) -> MemberNames {
  let camel = field_camel(layout.field);
  let mut bare = camel.clone();
  let mut collision = None;
  if camel == owner.name {
    bare.push('_');
    collision = Some(format!(
      "field '{}' of '{}' collides with its enclosing type, accessor renamed to '{}'",
      layout.field.name, owner.name, bare
    ));
  }
  let getter = layout.directly_referenceable.then(|| format!("Get{}", camel));
  MemberNames { property: escape_keyword(&bare), getter, camel, collision }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::layout::EntityLayout;
  use crate::schema::SchemaResolver;
  use idl_types::SchemaFile;

  #[test]
  fn test_escape_keyword() {
    assert_eq!(escape_keyword("class"), "@class");
    assert_eq!(escape_keyword("Class"), "Class");
    assert_eq!(escape_keyword("hp"), "hp");
  }

  #[test]
  fn test_make_camel() {
    assert_eq!(make_camel("test_nested_flatbuffer", true), "TestNestedFlatbuffer");
    assert_eq!(make_camel("test_nested_flatbuffer", false), "testNestedFlatbuffer");
    assert_eq!(make_camel("hp", true), "Hp");
    assert_eq!(make_camel("trailing_", true), "Trailing_");
  }

  #[test]
  fn test_qualify() {
    assert_eq!(qualify(&Namespace::parse("MyGame.Sample"), "Monster"), "@MyGame.@Sample.@Monster");
    assert_eq!(qualify(&Namespace::default(), "Monster"), "@Monster");
  }

  #[test]
  fn test_member_names_for_ref_and_collision() {
    let yaml = r#"
definitions:
  - name: Score
    kind:
      table:
        fields:
          - { name: score, type: int }
          - { name: label, type: string }
          - { name: event, type: short }
"#;
    let mut resolver = SchemaResolver::new();
    resolver.add_file(SchemaFile::from_yaml(yaml).unwrap()).unwrap();
    let schema = resolver.resolve().unwrap();
    let layout = EntityLayout::resolve(&schema, StructId(0));

    let score = member_names(layout.def, layout.field("score").unwrap());
    assert_eq!(score.property, "Score_");
    assert_eq!(score.value(), "GetScore");
    assert!(score.collision.is_some());

    let label = member_names(layout.def, layout.field("label").unwrap());
    assert_eq!(label.property, "Label");
    assert_eq!(label.value(), "Label");
    assert!(label.getter.is_none());
    assert!(label.collision.is_none());

    let event = member_names(layout.def, layout.field("event").unwrap());
    assert_eq!(event.property, "Event");
  }
}

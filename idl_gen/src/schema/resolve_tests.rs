use super::*;

fn resolve_yaml(yaml: &str) -> ResolveResult<Schema> {
  let file = SchemaFile::from_yaml(yaml).expect("fixture must parse");
  let mut resolver = SchemaResolver::new();
  resolver.add_file(file)?;
  resolver.resolve()
}

const MONSTER: &str = r#"
namespace: MyGame.Sample
root-type: Monster
file-identifier: MONS
definitions:
  - name: Color
    kind:
      enum:
        underlying: byte
        values:
          - name: Red
          - name: Green
          - name: Blue
            value: 2
  - name: Equipment
    kind:
      union:
        variants:
          - type: Weapon
  - name: Vec3
    kind:
      struct:
        fields:
          - { name: x, type: float }
          - { name: y, type: float }
          - { name: z, type: float }
  - name: Monster
    kind:
      table:
        fields:
          - { name: pos, type: Vec3 }
          - { name: hp, type: short, default: "100" }
          - { name: name, type: string, required: true }
          - { name: color, type: Color, default: Blue }
          - { name: equipped, type: Equipment }
          - { name: inventory, type: "[ubyte]" }
  - name: Weapon
    kind:
      table:
        fields:
          - { name: name, type: string }
          - { name: damage, type: short }
"#;

#[test]
fn test_union_companion_takes_preceding_slot() {
  let schema = resolve_yaml(MONSTER).unwrap();
  let monster = schema.struct_def(schema.find_struct("Monster").unwrap());

  let slots: Vec<(&str, u16, u16)> = monster.fields.iter().map(|f| (f.name.as_str(), f.index, f.voffset())).collect();
  assert_eq!(
    slots,
    vec![
      ("pos", 0, 4),
      ("hp", 1, 6),
      ("name", 2, 8),
      ("color", 3, 10),
      ("equipped_type", 4, 12),
      ("equipped", 5, 14),
      ("inventory", 6, 16),
    ]
  );

  let equipped = monster.field("equipped").unwrap();
  let companion = monster.union_type_field(equipped).unwrap();
  assert!(matches!(companion.ty, Type::UnionType(_)));
}

#[test]
fn test_slots_are_append_stable() {
  let before = resolve_yaml(MONSTER).unwrap();
  let extended = MONSTER.replace(
    "          - { name: inventory, type: \"[ubyte]\" }\n",
    "          - { name: inventory, type: \"[ubyte]\" }\n          - { name: mana, type: short, default: \"150\" }\n          - { name: loot, type: Equipment }\n",
  );
  let after = resolve_yaml(&extended).unwrap();

  let old = before.struct_def(before.find_struct("Monster").unwrap());
  let new = after.struct_def(after.find_struct("Monster").unwrap());
  for field in &old.fields {
    assert_eq!(new.field(&field.name).unwrap().index, field.index, "slot of '{}' moved", field.name);
  }
  assert_eq!(new.field("mana").unwrap().index, 7);
  assert_eq!(new.field("loot_type").unwrap().index, 8);
  assert_eq!(new.field("loot").unwrap().index, 9);
}

#[test]
fn test_deprecated_fields_keep_their_slot() {
  let yaml = r#"
definitions:
  - name: T
    kind:
      table:
        fields:
          - { name: a, type: int }
          - { name: b, type: int, deprecated: true }
          - { name: c, type: int }
"#;
  let schema = resolve_yaml(yaml).unwrap();
  let t = schema.struct_def(StructId(0));
  assert_eq!(t.field("c").unwrap().index, 2);
  assert_eq!(t.live_fields().count(), 2);
}

#[test]
fn test_explicit_ids_reorder_fields() {
  let yaml = r#"
definitions:
  - name: T
    kind:
      table:
        fields:
          - { name: a, type: int, id: 1 }
          - { name: b, type: int, id: 0 }
"#;
  let schema = resolve_yaml(yaml).unwrap();
  let names: Vec<&str> = schema.struct_def(StructId(0)).fields.iter().map(|f| f.name.as_str()).collect();
  assert_eq!(names, vec!["b", "a"]);

  let gap = yaml.replace("id: 0", "id: 2");
  assert!(matches!(resolve_yaml(&gap), Err(ResolveError::InvalidSlot { .. })));
}

#[test]
fn test_fixed_struct_layout_with_padding() {
  let yaml = r#"
definitions:
  - name: Color
    kind:
      enum:
        values: [{ name: Red }, { name: Green }]
  - name: Test
    kind:
      struct:
        fields:
          - { name: a, type: short }
          - { name: b, type: byte }
  - name: Vec3
    kind:
      struct:
        fields:
          - { name: x, type: float }
          - { name: y, type: float }
          - { name: z, type: float }
          - { name: test1, type: double }
          - { name: test2, type: Color }
          - { name: test3, type: Test }
"#;
  let schema = resolve_yaml(yaml).unwrap();
  let test = schema.struct_def(schema.find_struct("Test").unwrap());
  assert_eq!((test.bytesize, test.minalign), (4, 2));

  let vec3 = schema.struct_def(schema.find_struct("Vec3").unwrap());
  let offsets: Vec<u64> = vec3.fields.iter().map(|f| f.offset).collect();
  assert_eq!(offsets, vec![0, 4, 8, 16, 24, 26]);
  assert_eq!(vec3.bytesize, 32);
  assert_eq!(vec3.minalign, 8);
}

#[test]
fn test_arrays_and_force_align() {
  let yaml = r#"
definitions:
  - name: Quad
    kind:
      struct:
        force-align: 16
        fields:
          - { name: tag, type: ubyte }
          - { name: values, type: "[int:4]" }
"#;
  let schema = resolve_yaml(yaml).unwrap();
  let quad = schema.struct_def(StructId(0));
  assert_eq!(quad.field("values").unwrap().offset, 4);
  assert_eq!(quad.minalign, 16);
  assert_eq!(quad.bytesize, 32);
}

#[test]
fn test_fixed_struct_rejects_variable_fields() {
  let yaml = r#"
definitions:
  - name: Bad
    kind:
      struct:
        fields:
          - { name: label, type: string }
"#;
  assert!(matches!(resolve_yaml(yaml), Err(ResolveError::VariableFieldInStruct { .. })));
}

#[test]
fn test_cyclic_struct_is_rejected() {
  let yaml = r#"
definitions:
  - name: A
    kind:
      struct:
        fields:
          - { name: b, type: B }
  - name: B
    kind:
      struct:
        fields:
          - { name: a, type: A }
"#;
  assert!(matches!(resolve_yaml(yaml), Err(ResolveError::CyclicStruct { .. })));
}

#[test]
fn test_table_constraints() {
  let two_keys = r#"
definitions:
  - name: T
    kind:
      table:
        fields:
          - { name: a, type: int, key: true }
          - { name: b, type: string, key: true }
"#;
  assert!(matches!(resolve_yaml(two_keys), Err(ResolveError::MultipleKeys { .. })));

  let array = r#"
definitions:
  - name: T
    kind:
      table:
        fields:
          - { name: a, type: "[int:2]" }
"#;
  assert!(matches!(resolve_yaml(array), Err(ResolveError::ArrayOutsideStruct { .. })));

  let nested = r#"
definitions:
  - name: T
    kind:
      table:
        fields:
          - { name: a, type: "[[int]]" }
"#;
  assert!(matches!(resolve_yaml(nested), Err(ResolveError::NestedVector { .. })));

  let required_scalar = r#"
definitions:
  - name: T
    kind:
      table:
        fields:
          - { name: a, type: int, required: true }
"#;
  assert!(matches!(resolve_yaml(required_scalar), Err(ResolveError::RequiredScalar { .. })));

  let unknown = r#"
definitions:
  - name: T
    kind:
      table:
        fields:
          - { name: a, type: Missing }
"#;
  assert!(matches!(resolve_yaml(unknown), Err(ResolveError::UnknownType { .. })));
}

#[test]
fn test_default_normalization() {
  let yaml = r#"
definitions:
  - name: Color
    kind:
      enum:
        values: [{ name: Red }, { name: Green }, { name: Blue, value: 8 }]
  - name: T
    kind:
      table:
        fields:
          - { name: flag, type: bool, default: "true" }
          - { name: ratio, type: float, default: "NaN" }
          - { name: limit, type: double, default: "-inf" }
          - { name: color, type: Color, default: Blue }
          - { name: mask, type: uint, default: "0x10" }
          - { name: maybe, type: int, optional: true, default: "null" }
          - { name: plain, type: long }
"#;
  let schema = resolve_yaml(yaml).unwrap();
  let t = schema.struct_def(schema.find_struct("T").unwrap());
  let defaults: Vec<&str> = t.fields.iter().map(|f| f.default.as_str()).collect();
  assert_eq!(defaults, vec!["1", "nan", "-inf", "8", "16", "0", "0"]);
  assert!(t.field("maybe").unwrap().optional);

  let overflow = yaml.replace("default: \"0x10\"", "default: \"-1\"");
  assert!(matches!(resolve_yaml(&overflow), Err(ResolveError::InvalidDefault { .. })));
}

#[test]
fn test_enum_values_and_bit_flags() {
  let yaml = r#"
definitions:
  - name: Kind
    kind:
      enum:
        underlying: short
        values: [{ name: A }, { name: B, value: 5 }, { name: C }]
  - name: Perms
    kind:
      enum:
        bit-flags: true
        values: [{ name: Read }, { name: Write }, { name: Exec, value: 7 }]
"#;
  let schema = resolve_yaml(yaml).unwrap();
  let kind = schema.enum_def(EnumId(0));
  assert_eq!(kind.underlying, ScalarKind::I16);
  assert_eq!(kind.values.iter().map(|v| v.value).collect::<Vec<_>>(), vec![0, 5, 6]);

  let perms = schema.enum_def(EnumId(1));
  assert_eq!(perms.values.iter().map(|v| v.value).collect::<Vec<_>>(), vec![1, 2, 128]);

  let too_big = yaml.replace("value: 7", "value: 8");
  assert!(matches!(resolve_yaml(&too_big), Err(ResolveError::EnumValueOutOfRange { .. })));
}

#[test]
fn test_union_variants_and_root() {
  let schema = resolve_yaml(MONSTER).unwrap();
  let equipment = schema.enum_def(schema.find_enum("Equipment").unwrap());
  assert!(equipment.is_union);
  assert_eq!(equipment.values[0].name, "NONE");
  assert_eq!(equipment.values[0].value, 0);
  assert_eq!(equipment.values[1].name, "Weapon");
  assert_eq!(equipment.values[1].value, 1);

  assert_eq!(schema.root_struct, schema.find_struct("MyGame.Sample.Monster"));
  assert_eq!(schema.file_identifier.as_deref(), Some("MONS"));

  let bad_root = MONSTER.replace("root-type: Monster", "root-type: Vec3");
  assert!(matches!(resolve_yaml(&bad_root), Err(ResolveError::InvalidRootType { .. })));

  let bad_ident = MONSTER.replace("file-identifier: MONS", "file-identifier: MONSTER");
  assert!(matches!(resolve_yaml(&bad_ident), Err(ResolveError::InvalidFileIdentifier { .. })));
}

#[test]
fn test_services_require_tables() {
  let yaml = format!(
    "{}services:\n  - name: MonsterStorage\n    calls:\n      - {{ name: Store, request: Monster, response: Weapon, streaming: client }}\n",
    MONSTER
  );
  let schema = resolve_yaml(&yaml).unwrap();
  assert_eq!(schema.services[0].calls[0].streaming, Streaming::Client);

  let bad = yaml.replace("response: Weapon", "response: Vec3");
  assert!(matches!(resolve_yaml(&bad), Err(ResolveError::InvalidRpcMessage { .. })));
}

/* Pack/unpack round trips over the YAML fixtures */

use std::path::PathBuf;

use idl_gen::schema::{Schema, SchemaResolver};
use idl_reflect::{
    create_sorted_vector_of, lookup_by_key, pack_table, voffset, Buffer, BufferBuilder, KeyValue, ReflectError, Reflector, Value,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn load(name: &str) -> Schema {
    let mut resolver = SchemaResolver::new();
    resolver.load_file(&fixture(name)).expect("fixture must load");
    resolver.resolve().expect("fixture must resolve")
}

fn monster_value() -> Value {
    let contents = std::fs::read_to_string(fixture("monster_value.yaml")).unwrap();
    serde_yml::from_str(&contents).unwrap()
}

fn with_field(value: &Value, name: &str, replacement: Value) -> Value {
    let mut fields = value.as_object().unwrap().clone();
    fields.insert(name.to_string(), replacement);
    Value::Object(fields)
}

fn without_field(value: &Value, name: &str) -> Value {
    let mut fields = value.as_object().unwrap().clone();
    fields.shift_remove(name);
    Value::Object(fields)
}

fn weapon(id: i64, name: &str, damage: i64) -> Value {
    serde_json::from_value(serde_json::json!({ "id": id, "name": name, "damage": damage })).unwrap()
}

#[test]
fn test_monster_round_trip() {
    let schema = load("monster.yaml");
    let reflector = Reflector::new(&schema);
    let data = reflector.pack_root(&monster_value()).unwrap();

    let buf = Buffer::new(&data);
    assert!(buf.has_identifier("MONS", false));

    let out = reflector.unpack_root(&data).unwrap();
    assert_eq!(out.get("name"), Some(&Value::from("Orc")));
    assert_eq!(out.get("hp"), Some(&Value::Int(300)));
    assert_eq!(out.get("mana"), Some(&Value::Int(150)));
    assert_eq!(out.get("color"), Some(&Value::Int(0)));
    assert_eq!(out.get("inventory"), Some(&Value::from(vec![Value::Int(0), Value::Int(1), Value::Int(2)])));

    let pos = out.get("pos").unwrap();
    assert_eq!(pos.get("x"), Some(&Value::Float(1.0)));
    assert_eq!(pos.get("z"), Some(&Value::Float(3.0)));
    assert_eq!(out.get("path").unwrap().as_vector().unwrap()[1].get("y"), Some(&Value::Float(0.5)));

    match out.get("equipped").unwrap() {
        Value::Union { variant, value } => {
            assert_eq!(variant, "Weapon");
            assert_eq!(**value, weapon(9, "Club", 1));
        }
        other => panic!("expected a union, got {:?}", other),
    }
    assert!(out.get("equipped_type").is_none());
    assert!(out.get("loot_type").is_none());
}

#[test]
fn test_absent_fields_read_as_defaults() {
    let schema = load("monster.yaml");
    let reflector = Reflector::new(&schema);
    let minimal: Value = serde_json::from_str(r#"{"name": "Imp", "hp": 100}"#).unwrap();
    let data = reflector.pack_root(&minimal).unwrap();

    let monster = schema.struct_def(schema.find_struct("Monster").unwrap());
    let hp_voffset = monster.field("hp").unwrap().voffset();
    let root = Buffer::new(&data).root().unwrap();
    /* equal to the default, so never written */
    assert_eq!(root.field_offset(hp_voffset).unwrap(), 0);

    let out = reflector.unpack_root(&data).unwrap();
    assert_eq!(out.get("hp"), Some(&Value::Int(100)));
    assert_eq!(out.get("color"), Some(&Value::Int(2)));
    assert_eq!(out.get("pos"), Some(&Value::Null));
    assert_eq!(out.get("weapons"), Some(&Value::Null));
    assert_eq!(out.get("equipped"), Some(&Value::Null));

    let forced = Reflector::new(&schema).force_defaults(true).pack_root(&minimal).unwrap();
    let root = Buffer::new(&forced).root().unwrap();
    assert_ne!(root.field_offset(hp_voffset).unwrap(), 0);
    assert_eq!(root.get::<i16>(hp_voffset, 0).unwrap(), 100);
}

#[test]
fn test_missing_required_field_fails() {
    let schema = load("monster.yaml");
    let value = without_field(&monster_value(), "name");
    let err = Reflector::new(&schema).pack_root(&value).unwrap_err();
    assert_eq!(
        err,
        ReflectError::MissingRequired {
            table: "Monster".to_string(),
            field: "name".to_string(),
        }
    );

    let null_name = with_field(&monster_value(), "name", Value::Null);
    assert!(matches!(
        Reflector::new(&schema).pack_root(&null_name),
        Err(ReflectError::MissingRequired { .. })
    ));
}

#[test]
fn test_keyed_vector_keeps_pack_order() {
    let schema = load("monster.yaml");
    let reflector = Reflector::new(&schema);
    let input = monster_value();
    let out = reflector.unpack_root(&reflector.pack_root(&input).unwrap()).unwrap();
    assert_eq!(out.get("weapons"), input.get("weapons"));
}

#[test]
fn test_keyed_vector_is_sorted_and_searchable() {
    let schema = load("monster.yaml");
    let weapon_id = schema.find_struct("Weapon").unwrap();

    let mut builder = BufferBuilder::new();
    let offsets: Vec<_> = [weapon(5, "Sword", 3), weapon(1, "Axe", 5), weapon(3, "Bow", 2)]
        .iter()
        .map(|w| pack_table(&mut builder, &schema, weapon_id, w).unwrap())
        .collect();
    let sorted = create_sorted_vector_of(&mut builder, &schema, weapon_id, &offsets).unwrap();
    builder.finish(sorted, None, false).unwrap();

    let buf = Buffer::new(builder.finished_data().unwrap());
    let weapons = buf.vector_at(buf.indirect(0).unwrap()).unwrap();
    let ids: Vec<i32> = (0..weapons.len())
        .map(|i| weapons.table(i).unwrap().get::<i32>(voffset(0), 0).unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3, 5]);

    assert!(lookup_by_key(&schema, weapon_id, &weapons, &KeyValue::Int(2)).unwrap().is_none());
    let bow = lookup_by_key(&schema, weapon_id, &weapons, &KeyValue::Int(3)).unwrap().unwrap();
    assert_eq!(bow.string(voffset(1)).unwrap(), Some("Bow"));
}

#[test]
fn test_lookup_rejects_key_of_the_wrong_kind() {
    let schema = load("monster.yaml");
    let weapon_id = schema.find_struct("Weapon").unwrap();

    let mut builder = BufferBuilder::new();
    let offsets = vec![pack_table(&mut builder, &schema, weapon_id, &weapon(4, "Mace", 2)).unwrap()];
    let sorted = create_sorted_vector_of(&mut builder, &schema, weapon_id, &offsets).unwrap();
    builder.finish(sorted, None, false).unwrap();

    let buf = Buffer::new(builder.finished_data().unwrap());
    let weapons = buf.vector_at(buf.indirect(0).unwrap()).unwrap();
    assert!(matches!(
        lookup_by_key(&schema, weapon_id, &weapons, &KeyValue::Str(b"zzz".to_vec())),
        Err(ReflectError::TypeMismatch { .. })
    ));
    assert!(matches!(
        lookup_by_key(&schema, weapon_id, &weapons, &KeyValue::Float(4.0)),
        Err(ReflectError::TypeMismatch { .. })
    ));
    assert!(lookup_by_key(&schema, weapon_id, &weapons, &KeyValue::Int(4)).unwrap().is_some());
}

#[test]
fn test_union_vector_round_trip() {
    let schema = load("monster.yaml");
    let reflector = Reflector::new(&schema);
    let data = reflector.pack_root(&monster_value()).unwrap();
    let out = reflector.unpack_root(&data).unwrap();

    let shield: Value = serde_json::from_str(r#"{"armor": 4}"#).unwrap();
    let expected = Value::Vector(vec![
        Value::Union {
            variant: "Shield".to_string(),
            value: Box::new(shield),
        },
        Value::Union {
            variant: "Weapon".to_string(),
            value: Box::new(weapon(2, "Dagger", 1)),
        },
    ]);
    assert_eq!(out.get("loot"), Some(&expected));
}

#[test]
fn test_unknown_union_variant_is_rejected() {
    let schema = load("monster.yaml");
    let bad = with_field(
        &monster_value(),
        "equipped",
        Value::Union {
            variant: "Helmet".to_string(),
            value: Box::new(Value::Object(Default::default())),
        },
    );
    assert!(matches!(
        Reflector::new(&schema).pack_root(&bad),
        Err(ReflectError::UnknownVariant { name, .. }) if name == "Helmet"
    ));
}

#[test]
fn test_array_length_checked_before_writing() {
    let schema = load("grid.yaml");
    let sheet = schema.find_struct("Sheet").unwrap();
    let short: Value = serde_json::from_str(r#"{"cell": {"tag": 1, "values": [1, 2, 3]}}"#).unwrap();

    let mut builder = BufferBuilder::new();
    let err = pack_table(&mut builder, &schema, sheet, &short).unwrap_err();
    assert_eq!(
        err,
        ReflectError::ArrayLength {
            field: "values".to_string(),
            expected: 4,
            actual: 3,
        }
    );
    assert_eq!(builder.offset(), 0);
}

#[test]
fn test_inline_struct_arrays_round_trip() {
    let schema = load("grid.yaml");
    let reflector = Reflector::new(&schema);
    let value: Value = serde_json::from_str(
        r#"{"title": "t", "cell": {"tag": 7, "values": [1, -2, 3, 4]}, "cells": [{"tag": 1, "values": [0, 0, 0, 9]}]}"#,
    )
    .unwrap();
    let data = reflector.pack_root(&value).unwrap();
    assert_eq!(reflector.unpack_root(&data).unwrap(), value);
}

#[test]
fn test_size_prefixed_and_identifier_checks() {
    let schema = load("monster.yaml");
    let reflector = Reflector::new(&schema).size_prefixed(true);
    let data = reflector.pack_root(&monster_value()).unwrap();
    assert!(Buffer::new(&data).has_identifier("MONS", true));
    assert_eq!(reflector.unpack_root(&data).unwrap().get("hp"), Some(&Value::Int(300)));

    let mut corrupted = Reflector::new(&schema).pack_root(&monster_value()).unwrap();
    corrupted[8] = b'X';
    assert_eq!(
        Reflector::new(&schema).unpack_root(&corrupted).unwrap_err(),
        ReflectError::IdentifierMismatch {
            expected: "MONS".to_string()
        }
    );
}

#[test]
fn test_json_round_trip() {
    let schema = load("monster.yaml");
    let reflector = Reflector::new(&schema);
    let data = reflector.pack_json(r#"{"name": "Orc", "color": "Green", "inventory": [4]}"#).unwrap();
    let json = reflector.unpack_json(&data).unwrap();
    let back: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(back["name"], "Orc");
    assert_eq!(back["color"], 1);
    assert_eq!(back["inventory"], serde_json::json!([4]));
}

#[test]
fn test_unknown_field_is_rejected() {
    let schema = load("monster.yaml");
    let value = with_field(&monster_value(), "wings", Value::Int(2));
    assert_eq!(
        Reflector::new(&schema).pack_root(&value).unwrap_err(),
        ReflectError::UnknownField {
            entity: "Monster".to_string(),
            field: "wings".to_string(),
        }
    );
}

const INBOX: &str = r#"
root-type: Inbox
definitions:
  - name: Point
    kind:
      struct:
        fields: [{ name: x, type: int }, { name: y, type: int }]
  - name: Note
    kind:
      table:
        fields: [{ name: text, type: string }]
  - name: Payload
    kind:
      union:
        variants: [{ type: Note }, { type: Point }, { type: string }]
  - name: Inbox
    kind:
      table:
        fields: [{ name: items, type: "[Payload]" }]
"#;

#[test]
fn test_union_vector_of_table_struct_and_string() {
    let mut resolver = SchemaResolver::new();
    resolver.add_file(idl_types::SchemaFile::from_yaml(INBOX).unwrap()).unwrap();
    let schema = resolver.resolve().unwrap();

    let input: Value = serde_json::from_value(serde_json::json!({
        "items": [
            { "variant": "Point", "value": { "x": 3, "y": -4 } },
            { "variant": "string", "value": "hello" },
            { "variant": "Note", "value": { "text": "remember" } },
        ]
    }))
    .unwrap();
    let reflector = Reflector::new(&schema);
    let data = reflector.pack_root(&input).unwrap();
    assert_eq!(reflector.unpack_root(&data).unwrap(), input);

    let inbox = schema.struct_def(schema.find_struct("Inbox").unwrap());
    let root = Buffer::new(&data).root().unwrap();
    let tags = root.vector(inbox.field("items_type").unwrap().voffset()).unwrap().unwrap();
    let tags: Vec<u8> = (0..tags.len()).map(|i| tags.get::<u8>(i).unwrap()).collect();
    assert_eq!(tags, vec![2, 3, 1]);
}

#[test]
fn test_table_with_variant_and_value_fields_packs_as_table() {
    let mut resolver = SchemaResolver::new();
    let yaml = r#"
root-type: Envelope
definitions:
  - name: Envelope
    kind:
      table:
        fields: [{ name: variant, type: string }, { name: value, type: int }]
"#;
    resolver.add_file(idl_types::SchemaFile::from_yaml(yaml).unwrap()).unwrap();
    let schema = resolver.resolve().unwrap();

    let reflector = Reflector::new(&schema);
    let data = reflector.pack_json(r#"{"variant": "ping", "value": 7}"#).unwrap();
    let out = reflector.unpack_root(&data).unwrap();
    assert_eq!(out.get("variant"), Some(&Value::from("ping")));
    assert_eq!(out.get("value"), Some(&Value::Int(7)));
}

/* Keyed lookup agrees with a plain membership test */

use idl_gen::schema::{Schema, SchemaResolver};
use idl_reflect::{
    create_sorted_vector_of, key_from_value, lookup_by_key, pack_table, voffset, Buffer, BufferBuilder, Value,
};
use idl_types::SchemaFile;
use proptest::prelude::*;

const SCHEMA: &str = r#"
root-type: Catalog
definitions:
  - name: Item
    kind:
      table:
        fields:
          - { name: id, type: int, key: true }
          - { name: label, type: string }
  - name: Tag
    kind:
      table:
        fields:
          - { name: name, type: string, key: true }
  - name: Catalog
    kind:
      table:
        fields:
          - { name: items, type: "[Item]" }
          - { name: tags, type: "[Tag]" }
"#;

fn schema() -> Schema {
    let mut resolver = SchemaResolver::new();
    resolver.add_file(SchemaFile::from_yaml(SCHEMA).unwrap()).unwrap();
    resolver.resolve().unwrap()
}

fn item(id: i32) -> Value {
    serde_json::from_value(serde_json::json!({ "id": id, "label": format!("item-{}", id) })).unwrap()
}

fn tag(name: &str) -> Value {
    serde_json::from_value(serde_json::json!({ "name": name })).unwrap()
}

/* Packs `values` as tables of `entity` into a sorted vector used as the buffer root */
fn sorted_buffer(schema: &Schema, entity: &str, values: &[Value]) -> Vec<u8> {
    let id = schema.find_struct(entity).unwrap();
    let mut builder = BufferBuilder::new();
    let offsets: Vec<_> = values
        .iter()
        .map(|value| pack_table(&mut builder, schema, id, value).unwrap())
        .collect();
    let vector = create_sorted_vector_of(&mut builder, schema, id, &offsets).unwrap();
    builder.finish(vector, None, false).unwrap();
    builder.finished_data().unwrap().to_vec()
}

#[test]
fn test_string_keys_sort_bytewise() {
    let schema = schema();
    let data = sorted_buffer(&schema, "Tag", &[tag("pear"), tag("apple"), tag("fig")]);
    let buf = Buffer::new(&data);
    let vector = buf.vector_at(buf.indirect(0).unwrap()).unwrap();
    let names: Vec<&str> = (0..vector.len())
        .map(|i| vector.table(i).unwrap().string(voffset(0)).unwrap().unwrap())
        .collect();
    assert_eq!(names, vec!["apple", "fig", "pear"]);

    let tag_id = schema.find_struct("Tag").unwrap();
    let key_field = schema.struct_def(tag_id).key_field().unwrap();
    let fig = key_from_value(&schema, key_field, &Value::from("fig")).unwrap();
    assert!(lookup_by_key(&schema, tag_id, &vector, &fig).unwrap().is_some());
    let kiwi = key_from_value(&schema, key_field, &Value::from("kiwi")).unwrap();
    assert!(lookup_by_key(&schema, tag_id, &vector, &kiwi).unwrap().is_none());
}

proptest! {
    #[test]
    fn prop_lookup_finds_exactly_the_stored_keys(ids in prop::collection::vec(-50i32..50, 0..40), query in -60i32..60) {
        let schema = schema();
        let values: Vec<Value> = ids.iter().map(|id| item(*id)).collect();
        let data = sorted_buffer(&schema, "Item", &values);

        let item_id = schema.find_struct("Item").unwrap();
        let key_field = schema.struct_def(item_id).key_field().unwrap();
        let buf = Buffer::new(&data);
        let vector = buf.vector_at(buf.indirect(0).unwrap()).unwrap();

        let stored: Vec<i32> = (0..vector.len())
            .map(|i| vector.table(i).unwrap().get::<i32>(voffset(0), 0).unwrap())
            .collect();
        let mut expected = ids.clone();
        expected.sort();
        prop_assert_eq!(stored, expected);

        for id in &ids {
            let key = key_from_value(&schema, key_field, &Value::Int(*id as i64)).unwrap();
            let table = lookup_by_key(&schema, item_id, &vector, &key).unwrap();
            prop_assert!(table.is_some());
            let label = format!("item-{}", id);
            prop_assert_eq!(table.unwrap().string(voffset(1)).unwrap(), Some(label.as_str()));
        }

        let key = key_from_value(&schema, key_field, &Value::Int(query as i64)).unwrap();
        let found = lookup_by_key(&schema, item_id, &vector, &key).unwrap();
        prop_assert_eq!(found.is_some(), ids.contains(&query));
    }
}

/* Field layout resolution.
 *
 * Derives, for every field of a struct or table, where its bytes live and how
 * they are reached: a static offset from the entity base for fixed structs, or a
 * vtable slot that must be presence-checked for tables. The emitters never
 * recompute any of this; they read the precomputed flags.
 */

use crate::schema::{FieldDef, Schema, StructDef, StructId, Type};

/* Size of every indirect reference (strings, vectors, tables, unions) */
pub const UOFFSET_SIZE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
  /* Byte offset from the start of the fixed struct */
  Static { offset: u64 },
  /* Vtable entry; 0 at runtime means absent */
  Vtable { voffset: u16 },
}

/* How a field's value is represented, one arm per type category */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
  Scalar,
  /* Union discriminant companion */
  UnionType,
  String,
  /* Fixed struct stored inline */
  Struct,
  /* Table reached through an offset */
  Table,
  Union,
  Vector,
  Array,
}

#[derive(Debug, Clone)]
pub struct FieldLayout<'s> {
  pub field: &'s FieldDef,
  pub category: FieldCategory,
  pub addressing: Addressing,
  /* Bytes the field occupies inside its entity */
  pub inline_size: u64,
  pub inline_alignment: u64,
  /* Scalar (or vector/array of scalars), not a union discriminant: a ref accessor is emitted */
  pub directly_referenceable: bool,
  /* Scalar storage that may be overwritten in place */
  pub mutable: bool,
  /* Fixed array of scalars exposed as one span */
  pub span_length: Option<u16>,
}

impl<'s> FieldLayout<'s> {
  pub fn is_static(&self) -> bool {
    matches!(self.addressing, Addressing::Static { .. })
  }
}

#[derive(Debug, Clone)]
pub struct EntityLayout<'s> {
  pub id: StructId,
  pub def: &'s StructDef,
  pub fields: Vec<FieldLayout<'s>>,
}

impl<'s> EntityLayout<'s> {
  pub fn resolve(schema: &'s Schema, id: StructId) -> Self {
    let def = schema.struct_def(id);
    let fields = def.fields.iter().map(|field| FieldLayout::resolve(schema, def, field)).collect();
    EntityLayout { id, def, fields }
  }

  pub fn field(&self, name: &str) -> Option<&FieldLayout<'s>> {
    self.fields.iter().find(|f| f.field.name == name)
  }

  pub fn key(&self) -> Option<&FieldLayout<'s>> {
    self.fields.iter().find(|f| f.field.key)
  }
}

impl<'s> FieldLayout<'s> {
  pub fn resolve(schema: &Schema, owner: &StructDef, field: &'s FieldDef) -> Self {
    let category = categorize(schema, &field.ty);
    let addressing = if owner.fixed {
      Addressing::Static { offset: field.offset }
    } else {
      Addressing::Vtable { voffset: field.voffset() }
    };
    let (inline_size, inline_alignment) = inline_layout(schema, &field.ty);

    let scalar_elements = match &field.ty {
      Type::Vector(e) | Type::Array(e, _) => e.is_scalar() && !matches!(**e, Type::UnionType(_)),
      _ => false,
    };
    let plain_scalar = field.ty.is_scalar() && !matches!(field.ty, Type::UnionType(_));
    let directly_referenceable = plain_scalar || scalar_elements;

    let span_length = match &field.ty {
      Type::Array(e, len) if e.is_scalar() && *len > 1 => Some(*len),
      _ => None,
    };

    FieldLayout {
      field,
      category,
      addressing,
      inline_size,
      inline_alignment,
      directly_referenceable,
      mutable: plain_scalar || scalar_elements,
      span_length,
    }
  }
}

pub fn categorize(schema: &Schema, ty: &Type) -> FieldCategory {
  match ty {
    Type::Scalar(_) | Type::Enum(_) => FieldCategory::Scalar,
    Type::UnionType(_) => FieldCategory::UnionType,
    Type::String => FieldCategory::String,
    Type::Struct(id) if schema.struct_def(*id).fixed => FieldCategory::Struct,
    Type::Struct(_) => FieldCategory::Table,
    Type::Union(_) => FieldCategory::Union,
    Type::Vector(_) => FieldCategory::Vector,
    Type::Array(..) => FieldCategory::Array,
  }
}

/* (size, alignment) of a value stored inline in its container */
pub fn inline_layout(schema: &Schema, ty: &Type) -> (u64, u64) {
  match ty {
    Type::Struct(id) if schema.struct_def(*id).fixed => {
      let def = schema.struct_def(*id);
      (def.bytesize, def.minalign)
    }
    Type::Array(elem, len) => {
      let (size, align) = inline_layout(schema, elem);
      (size * *len as u64, align)
    }
    other => match schema.scalar_kind(other) {
      Some(kind) => (kind.size(), kind.size()),
      None => (UOFFSET_SIZE, UOFFSET_SIZE),
    },
  }
}

/* Width used to group Add calls in single-call constructors */
pub fn base_size(schema: &Schema, ty: &Type) -> u64 {
  schema.scalar_kind(ty).map(|k| k.size()).unwrap_or(UOFFSET_SIZE)
}

/* Element stride inside a vector: inline size for scalars and structs, an offset otherwise */
pub fn element_size(schema: &Schema, elem: &Type) -> u64 {
  inline_layout(schema, elem).0
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::SchemaResolver;
  use idl_types::SchemaFile;

  fn schema() -> Schema {
    let yaml = r#"
definitions:
  - name: Kind
    kind:
      enum:
        underlying: ushort
        values: [{ name: A }, { name: B }]
  - name: Pick
    kind:
      union:
        variants: [{ type: Leaf }]
  - name: Pair
    kind:
      struct:
        fields:
          - { name: a, type: int }
          - { name: b, type: "[short:3]" }
  - name: Leaf
    kind:
      table:
        fields:
          - { name: hp, type: short }
          - { name: kind, type: Kind }
          - { name: label, type: string }
          - { name: pair, type: Pair }
          - { name: pick, type: Pick }
          - { name: bytes, type: "[ubyte]" }
          - { name: leaves, type: "[Leaf]" }
"#;
    let mut resolver = SchemaResolver::new();
    resolver.add_file(SchemaFile::from_yaml(yaml).unwrap()).unwrap();
    resolver.resolve().unwrap()
  }

  #[test]
  fn test_table_fields_use_vtable_addressing() {
    let schema = schema();
    let leaf = EntityLayout::resolve(&schema, schema.find_struct("Leaf").unwrap());

    let hp = leaf.field("hp").unwrap();
    assert_eq!(hp.addressing, Addressing::Vtable { voffset: 4 });
    assert_eq!((hp.inline_size, hp.inline_alignment), (2, 2));
    assert!(hp.directly_referenceable);

    let kind = leaf.field("kind").unwrap();
    assert_eq!(kind.category, FieldCategory::Scalar);
    assert!(kind.directly_referenceable);

    let pick_type = leaf.field("pick_type").unwrap();
    assert_eq!(pick_type.category, FieldCategory::UnionType);
    assert!(!pick_type.directly_referenceable);

    let label = leaf.field("label").unwrap();
    assert_eq!(label.category, FieldCategory::String);
    assert_eq!(label.inline_size, UOFFSET_SIZE);
    assert!(!label.directly_referenceable);

    let pair = leaf.field("pair").unwrap();
    assert_eq!(pair.category, FieldCategory::Struct);
    assert_eq!((pair.inline_size, pair.inline_alignment), (12, 4));

    assert!(leaf.field("bytes").unwrap().directly_referenceable);
    assert!(!leaf.field("leaves").unwrap().directly_referenceable);
    assert_eq!(leaf.field("pick").unwrap().category, FieldCategory::Union);
  }

  #[test]
  fn test_struct_fields_use_static_addressing() {
    let schema = schema();
    let pair = EntityLayout::resolve(&schema, schema.find_struct("Pair").unwrap());

    let b = pair.field("b").unwrap();
    assert_eq!(b.addressing, Addressing::Static { offset: 4 });
    assert_eq!(b.category, FieldCategory::Array);
    assert_eq!(b.inline_size, 6);
    assert_eq!(b.span_length, Some(3));
    assert!(b.is_static());
  }
}

/* Resolved schema model.
 *
 * Built once by `SchemaResolver` and immutable afterwards. Definitions live in
 * declaration-ordered arenas and refer to each other through typed ids, so the
 * emitters only ever hold shared borrows of the model.
 */

pub mod resolve;

pub use idl_types::Streaming;
pub use resolve::{ResolveError, ResolveResult, SchemaResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub usize);

/* ============================================================================
   Types
   ============================================================================ */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
  Bool,
  I8,
  U8,
  I16,
  U16,
  I32,
  U32,
  I64,
  U64,
  F32,
  F64,
}

impl ScalarKind {
  pub fn size(self) -> u64 {
    match self {
      ScalarKind::Bool | ScalarKind::I8 | ScalarKind::U8 => 1,
      ScalarKind::I16 | ScalarKind::U16 => 2,
      ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 4,
      ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => 8,
    }
  }

  pub fn is_float(self) -> bool {
    matches!(self, ScalarKind::F32 | ScalarKind::F64)
  }

  pub fn is_integer(self) -> bool {
    !self.is_float() && self != ScalarKind::Bool
  }

  pub fn is_signed(self) -> bool {
    matches!(self, ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 | ScalarKind::I64)
  }

  /* Inclusive value range of an integer kind */
  pub fn int_range(self) -> (i128, i128) {
    match self {
      ScalarKind::Bool => (0, 1),
      ScalarKind::I8 => (i8::MIN as i128, i8::MAX as i128),
      ScalarKind::U8 => (0, u8::MAX as i128),
      ScalarKind::I16 => (i16::MIN as i128, i16::MAX as i128),
      ScalarKind::U16 => (0, u16::MAX as i128),
      ScalarKind::I32 => (i32::MIN as i128, i32::MAX as i128),
      ScalarKind::U32 => (0, u32::MAX as i128),
      ScalarKind::I64 | ScalarKind::F32 | ScalarKind::F64 => (i64::MIN as i128, i64::MAX as i128),
      ScalarKind::U64 => (0, u64::MAX as i128),
    }
  }
}

impl From<idl_types::ScalarName> for ScalarKind {
  fn from(name: idl_types::ScalarName) -> Self {
    use idl_types::ScalarName as N;
    match name {
      N::Bool => ScalarKind::Bool,
      N::I8 => ScalarKind::I8,
      N::U8 => ScalarKind::U8,
      N::I16 => ScalarKind::I16,
      N::U16 => ScalarKind::U16,
      N::I32 => ScalarKind::I32,
      N::U32 => ScalarKind::U32,
      N::I64 => ScalarKind::I64,
      N::U64 => ScalarKind::U64,
      N::F32 => ScalarKind::F32,
      N::F64 => ScalarKind::F64,
    }
  }
}

/* Closed set of field types. `Enum` and `UnionType` are integer-backed. */
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
  Scalar(ScalarKind),
  Enum(EnumId),
  /* Discriminant of a union */
  UnionType(EnumId),
  String,
  Vector(Box<Type>),
  Array(Box<Type>, u16),
  /* Fixed struct or table, see `StructDef::fixed` */
  Struct(StructId),
  Union(EnumId),
}

impl Type {
  pub fn is_scalar(&self) -> bool {
    matches!(self, Type::Scalar(_) | Type::Enum(_) | Type::UnionType(_))
  }

  pub fn is_series(&self) -> bool {
    matches!(self, Type::Vector(_) | Type::Array(..))
  }

  pub fn element(&self) -> Option<&Type> {
    match self {
      Type::Vector(e) | Type::Array(e, _) => Some(e),
      _ => None,
    }
  }

  pub fn enum_id(&self) -> Option<EnumId> {
    match self {
      Type::Enum(id) | Type::UnionType(id) | Type::Union(id) => Some(*id),
      _ => None,
    }
  }
}

/* ============================================================================
   Definitions
   ============================================================================ */

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespace {
  pub components: Vec<String>,
}

impl Namespace {
  pub fn parse(dotted: &str) -> Self {
    Namespace { components: dotted.split('.').filter(|c| !c.is_empty()).map(str::to_string).collect() }
  }

  pub fn is_global(&self) -> bool {
    self.components.is_empty()
  }

  pub fn dotted(&self) -> String {
    self.components.join(".")
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
  pub name: String,
  pub ty: Type,
  /* Declaration ordinal; vtable slot for tables */
  pub index: u16,
  /* Static byte offset inside a fixed struct */
  pub offset: u64,
  /* Normalized default literal: integers in decimal, bools as 0/1, floats as written or nan/inf/-inf */
  pub default: String,
  pub deprecated: bool,
  pub required: bool,
  pub key: bool,
  pub shared: bool,
  pub optional: bool,
  pub nested_flatbuffer: Option<StructId>,
  pub doc: Vec<String>,
}

impl FieldDef {
  pub fn voffset(&self) -> u16 {
    4 + 2 * self.index
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
  pub name: String,
  pub namespace: NamespaceId,
  pub fields: Vec<FieldDef>,
  pub fixed: bool,
  pub minalign: u64,
  pub bytesize: u64,
  /* Group Add calls by size in single-call constructors */
  pub sortbysize: bool,
  pub private: bool,
  pub partial: bool,
  pub doc: Vec<String>,
}

impl StructDef {
  pub fn key_field(&self) -> Option<&FieldDef> {
    self.fields.iter().find(|f| f.key)
  }

  pub fn field(&self, name: &str) -> Option<&FieldDef> {
    self.fields.iter().find(|f| f.name == name)
  }

  /* Hidden discriminant companion of a union (or union vector) field */
  pub fn union_type_field(&self, union_field: &FieldDef) -> Option<&FieldDef> {
    let name = format!("{}_type", union_field.name);
    self.fields.iter().find(|f| {
      f.name == name
        && match &f.ty {
          Type::UnionType(_) => true,
          Type::Vector(e) => matches!(**e, Type::UnionType(_)),
          _ => false,
        }
    })
  }

  pub fn live_fields(&self) -> impl Iterator<Item = &FieldDef> {
    self.fields.iter().filter(|f| !f.deprecated)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVal {
  pub name: String,
  pub value: i64,
  /* Payload type of a union variant; None for the NONE variant and plain enums */
  pub union_type: Option<Type>,
  pub doc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
  pub name: String,
  pub namespace: NamespaceId,
  pub underlying: ScalarKind,
  pub values: Vec<EnumVal>,
  pub is_union: bool,
  pub bit_flags: bool,
  pub private: bool,
  pub doc: Vec<String>,
}

impl EnumDef {
  pub fn reverse_lookup(&self, value: i64) -> Option<&EnumVal> {
    self.values.iter().find(|v| v.value == value)
  }

  pub fn lookup(&self, name: &str) -> Option<&EnumVal> {
    self.values.iter().find(|v| v.name == name)
  }

  /* Variants with a payload, skipping NONE */
  pub fn variants(&self) -> impl Iterator<Item = &EnumVal> {
    self.values.iter().filter(|v| v.union_type.is_some())
  }

  pub fn has_string_variant(&self) -> bool {
    self.variants().any(|v| v.union_type == Some(Type::String))
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
  pub name: String,
  pub request: StructId,
  pub response: StructId,
  pub streaming: Streaming,
  pub idempotent: bool,
  pub value_task: bool,
  pub doc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDef {
  pub name: String,
  pub namespace: NamespaceId,
  pub calls: Vec<RpcCall>,
  pub doc: Vec<String>,
}

/* ============================================================================
   Schema
   ============================================================================ */

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
  /* Base name of the combined output unit */
  pub name: String,
  pub namespaces: Vec<Namespace>,
  pub structs: Vec<StructDef>,
  pub enums: Vec<EnumDef>,
  pub services: Vec<ServiceDef>,
  pub root_struct: Option<StructId>,
  pub file_identifier: Option<String>,
  pub file_extension: Option<String>,
}

impl Schema {
  pub fn struct_def(&self, id: StructId) -> &StructDef {
    &self.structs[id.0]
  }

  pub fn enum_def(&self, id: EnumId) -> &EnumDef {
    &self.enums[id.0]
  }

  pub fn namespace(&self, id: NamespaceId) -> &Namespace {
    &self.namespaces[id.0]
  }

  pub fn struct_ids(&self) -> impl Iterator<Item = StructId> {
    (0..self.structs.len()).map(StructId)
  }

  pub fn enum_ids(&self) -> impl Iterator<Item = EnumId> {
    (0..self.enums.len()).map(EnumId)
  }

  pub fn find_struct(&self, name: &str) -> Option<StructId> {
    self.structs.iter().position(|s| s.name == name || self.dotted_name(s.namespace, &s.name) == name).map(StructId)
  }

  pub fn find_enum(&self, name: &str) -> Option<EnumId> {
    self.enums.iter().position(|e| e.name == name || self.dotted_name(e.namespace, &e.name) == name).map(EnumId)
  }

  pub fn dotted_name(&self, ns: NamespaceId, name: &str) -> String {
    let ns = self.namespace(ns);
    if ns.is_global() { name.to_string() } else { format!("{}.{}", ns.dotted(), name) }
  }

  pub fn is_fixed(&self, ty: &Type) -> bool {
    matches!(ty, Type::Struct(id) if self.struct_def(*id).fixed)
  }

  pub fn is_table(&self, ty: &Type) -> bool {
    matches!(ty, Type::Struct(id) if !self.struct_def(*id).fixed)
  }

  /* Underlying scalar representation of scalar, enum and discriminant types */
  pub fn scalar_kind(&self, ty: &Type) -> Option<ScalarKind> {
    match ty {
      Type::Scalar(k) => Some(*k),
      Type::Enum(id) | Type::UnionType(id) => Some(self.enum_def(*id).underlying),
      _ => None,
    }
  }

  pub fn is_root(&self, id: StructId) -> bool {
    self.root_struct == Some(id)
  }
}

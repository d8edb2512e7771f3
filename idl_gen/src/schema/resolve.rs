use super::*;
use idl_types::{DefinitionKind, EnumDecl, FieldDecl, SchemaFile, ServiceDecl, StructDecl, TypeExpr, TypeExprError, UnionDecl};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type ResolveResult<T> = Result<T, ResolveError>;

/* Errors raised while turning schema documents into the resolved model */
#[derive(Debug, Error)]
pub enum ResolveError {
  /// Schema file could not be read.
  #[error("failed to read schema '{path}': {source}")]
  Io { path: PathBuf, source: std::io::Error },

  /// Schema file is not valid YAML for the document format.
  #[error("failed to parse schema '{path}': {source}")]
  Parse { path: PathBuf, source: serde_yml::Error },

  #[error("definition '{name}' is declared more than once")]
  DuplicateDefinition { name: String },

  #[error("'{owner}' declares '{name}' more than once")]
  DuplicateMember { owner: String, name: String },

  #[error("field '{owner}.{field}' has an invalid type: {source}")]
  InvalidType { owner: String, field: String, source: TypeExprError },

  #[error("field '{owner}.{field}' references unknown type '{name}'")]
  UnknownType { owner: String, field: String, name: String },

  /// Vectors and arrays may not contain vectors or arrays.
  #[error("field '{owner}.{field}' nests a vector or array inside another")]
  NestedVector { owner: String, field: String },

  #[error("field '{owner}.{field}': fixed-length arrays are only allowed in structs")]
  ArrayOutsideStruct { owner: String, field: String },

  /// Fixed structs may only hold scalars, fixed structs and arrays of those.
  #[error("struct '{owner}' contains variable-size field '{field}'")]
  VariableFieldInStruct { owner: String, field: String },

  #[error("struct '{name}' contains itself")]
  CyclicStruct { name: String },

  #[error("'{owner}' declares more than one key field")]
  MultipleKeys { owner: String },

  #[error("field '{owner}.{field}' cannot be a key: {reason}")]
  InvalidKey { owner: String, field: String, reason: &'static str },

  #[error("field '{owner}.{field}' cannot be required: only non-scalar table fields can")]
  RequiredScalar { owner: String, field: String },

  #[error("field '{owner}.{field}' cannot be optional: only scalar table fields can")]
  InvalidOptional { owner: String, field: String },

  #[error("field '{owner}.{field}' has invalid default '{value}'")]
  InvalidDefault { owner: String, field: String, value: String },

  #[error("'{owner}': explicit field ids must be given for every field (missing on '{field}')")]
  MissingId { owner: String, field: String },

  #[error("'{owner}': field id {id} is invalid or used twice")]
  InvalidSlot { owner: String, id: u16 },

  #[error("field '{owner}.{field}': nested flatbuffer must be a [ubyte] naming a table")]
  InvalidNestedFlatbuffer { owner: String, field: String },

  #[error("enum '{name}' has non-integer underlying type '{underlying}'")]
  InvalidUnderlying { name: String, underlying: String },

  #[error("enum '{name}' value '{value}' does not fit its underlying type")]
  EnumValueOutOfRange { name: String, value: String },

  #[error("union '{name}' variant '{variant}' must be a table, a struct or string")]
  InvalidUnionVariant { name: String, variant: String },

  #[error("service '{service}' call '{call}' references '{name}', which is not a table")]
  InvalidRpcMessage { service: String, call: String, name: String },

  #[error("root type '{name}' is not a table")]
  InvalidRootType { name: String },

  #[error("file identifier '{ident}' must be exactly 4 bytes")]
  InvalidFileIdentifier { ident: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefRef {
  Struct(StructId),
  Enum(EnumId),
}

enum PendingDecl {
  Enum(EnumId, EnumDecl),
  Union(EnumId, UnionDecl),
  Struct(StructId, StructDecl),
}

/* Collects schema documents, then resolves them into one immutable `Schema` */
pub struct SchemaResolver {
  schema: Schema,
  names: IndexMap<String, DefRef>,
  pending: Vec<PendingDecl>,
  services: Vec<(NamespaceId, ServiceDecl)>,
  root_type: Option<(NamespaceId, String)>,
}

impl Default for SchemaResolver {
  fn default() -> Self {
    Self::new()
  }
}

impl SchemaResolver {
  pub fn new() -> Self {
    Self { schema: Schema::default(), names: IndexMap::new(), pending: Vec::new(), services: Vec::new(), root_type: None }
  }

  pub fn load_file(&mut self, path: &Path) -> ResolveResult<()> {
    let contents = std::fs::read_to_string(path).map_err(|source| ResolveError::Io { path: path.to_path_buf(), source })?;
    let file = SchemaFile::from_yaml(&contents).map_err(|source| ResolveError::Parse { path: path.to_path_buf(), source })?;
    if self.schema.name.is_empty() {
      if let Some(stem) = path.file_stem() {
        self.schema.name = stem.to_string_lossy().into_owned();
      }
    }
    tracing::debug!(path = %path.display(), definitions = file.definitions.len(), "loaded schema file");
    self.add_file(file)
  }

  pub fn set_name(&mut self, name: &str) {
    self.schema.name = name.to_string();
  }

  /* Declares every definition of a document; bodies are resolved later so forward references work */
  pub fn add_file(&mut self, file: SchemaFile) -> ResolveResult<()> {
    let ns = self.namespace_id(&file.namespace);

    if let Some(root) = file.root_type {
      self.root_type = Some((ns, root));
    }
    if let Some(ident) = file.file_identifier {
      if ident.len() != 4 {
        return Err(ResolveError::InvalidFileIdentifier { ident });
      }
      self.schema.file_identifier = Some(ident);
    }
    if file.file_extension.is_some() {
      self.schema.file_extension = file.file_extension;
    }

    for def in file.definitions {
      let dotted = self.schema.dotted_name(ns, &def.name);
      if self.names.contains_key(&dotted) {
        return Err(ResolveError::DuplicateDefinition { name: dotted });
      }
      let doc = doc_lines(&def.comment);
      let fixed = matches!(def.kind, DefinitionKind::Struct(_));

      match def.kind {
        DefinitionKind::Enum(decl) => {
          let id = EnumId(self.schema.enums.len());
          self.schema.enums.push(EnumDef {
            name: def.name,
            namespace: ns,
            underlying: ScalarKind::U8,
            values: Vec::new(),
            is_union: false,
            bit_flags: decl.bit_flags,
            private: decl.private,
            doc,
          });
          self.names.insert(dotted, DefRef::Enum(id));
          self.pending.push(PendingDecl::Enum(id, decl));
        }
        DefinitionKind::Union(decl) => {
          let id = EnumId(self.schema.enums.len());
          self.schema.enums.push(EnumDef {
            name: def.name,
            namespace: ns,
            underlying: ScalarKind::U8,
            values: Vec::new(),
            is_union: true,
            bit_flags: false,
            private: decl.private,
            doc,
          });
          self.names.insert(dotted, DefRef::Enum(id));
          self.pending.push(PendingDecl::Union(id, decl));
        }
        DefinitionKind::Struct(decl) | DefinitionKind::Table(decl) => {
          let id = StructId(self.schema.structs.len());
          let attrs = &decl.container_attributes;
          self.schema.structs.push(StructDef {
            name: def.name,
            namespace: ns,
            fields: Vec::new(),
            fixed,
            minalign: 1,
            bytesize: 0,
            sortbysize: !fixed && !attrs.original_order,
            private: attrs.private,
            partial: attrs.partial,
            doc,
          });
          self.names.insert(dotted, DefRef::Struct(id));
          self.pending.push(PendingDecl::Struct(id, decl));
        }
      }
    }

    for service in file.services {
      self.services.push((ns, service));
    }

    Ok(())
  }

  pub fn resolve(mut self) -> ResolveResult<Schema> {
    let pending = std::mem::take(&mut self.pending);

    /* Enum values first: struct defaults may name them */
    for decl in &pending {
      match decl {
        PendingDecl::Enum(id, decl) => self.resolve_enum(*id, decl)?,
        PendingDecl::Union(id, decl) => self.resolve_union(*id, decl)?,
        PendingDecl::Struct(..) => {}
      }
    }

    for decl in &pending {
      if let PendingDecl::Struct(id, decl) = decl {
        self.resolve_fields(*id, decl)?;
      }
    }

    let mut done = vec![false; self.schema.structs.len()];
    for idx in 0..self.schema.structs.len() {
      let id = StructId(idx);
      if self.schema.struct_def(id).fixed {
        self.layout_struct(id, &pending, &mut done, &mut Vec::new())?;
      }
    }

    let services = std::mem::take(&mut self.services);
    for (ns, decl) in services {
      self.resolve_service(ns, decl)?;
    }

    if let Some((ns, name)) = self.root_type.take() {
      match self.lookup(ns, &name) {
        Some(DefRef::Struct(id)) if !self.schema.struct_def(id).fixed => self.schema.root_struct = Some(id),
        _ => return Err(ResolveError::InvalidRootType { name }),
      }
    }

    tracing::debug!(
      structs = self.schema.structs.len(),
      enums = self.schema.enums.len(),
      services = self.schema.services.len(),
      "schema resolved"
    );
    Ok(self.schema)
  }

  /* ==========================================================================
     Lookup
     ========================================================================== */

  fn namespace_id(&mut self, dotted: &str) -> NamespaceId {
    let ns = Namespace::parse(dotted);
    if let Some(pos) = self.schema.namespaces.iter().position(|n| *n == ns) {
      return NamespaceId(pos);
    }
    self.schema.namespaces.push(ns);
    NamespaceId(self.schema.namespaces.len() - 1)
  }

  /* Innermost enclosing namespace wins */
  fn lookup(&self, ns: NamespaceId, name: &str) -> Option<DefRef> {
    let components = &self.schema.namespace(ns).components;
    for depth in (0..=components.len()).rev() {
      let candidate = if depth == 0 { name.to_string() } else { format!("{}.{}", components[..depth].join("."), name) };
      if let Some(found) = self.names.get(&candidate) {
        return Some(*found);
      }
    }
    None
  }

  fn resolve_type(&self, ns: NamespaceId, owner: &str, field: &str, expr: &TypeExpr) -> ResolveResult<Type> {
    Ok(match expr {
      TypeExpr::Scalar(s) => Type::Scalar((*s).into()),
      TypeExpr::String => Type::String,
      TypeExpr::Vector(elem) | TypeExpr::Array(elem, _) => {
        if matches!(**elem, TypeExpr::Vector(_) | TypeExpr::Array(..)) {
          return Err(ResolveError::NestedVector { owner: owner.to_string(), field: field.to_string() });
        }
        let elem = Box::new(self.resolve_type(ns, owner, field, elem)?);
        match expr {
          TypeExpr::Array(_, len) => Type::Array(elem, *len),
          _ => Type::Vector(elem),
        }
      }
      TypeExpr::Named(name) => match self.lookup(ns, name) {
        Some(DefRef::Struct(id)) => Type::Struct(id),
        Some(DefRef::Enum(id)) if self.schema.enum_def(id).is_union => Type::Union(id),
        Some(DefRef::Enum(id)) => Type::Enum(id),
        None => {
          return Err(ResolveError::UnknownType { owner: owner.to_string(), field: field.to_string(), name: name.clone() });
        }
      },
    })
  }

  /* ==========================================================================
     Enums and unions
     ========================================================================== */

  fn resolve_enum(&mut self, id: EnumId, decl: &EnumDecl) -> ResolveResult<()> {
    let name = self.schema.enum_def(id).name.clone();
    let underlying_name = decl.underlying.clone().unwrap_or_else(|| "ubyte".to_string());
    let underlying = match idl_types::ScalarName::parse(&underlying_name) {
      Some(s) if s.is_integer() => ScalarKind::from(s),
      _ => return Err(ResolveError::InvalidUnderlying { name, underlying: underlying_name }),
    };
    let (min, max) = underlying.int_range();

    let mut values: Vec<EnumVal> = Vec::with_capacity(decl.values.len());
    let mut next: i64 = 0;
    for v in &decl.values {
      if values.iter().any(|e| e.name == v.name) {
        return Err(ResolveError::DuplicateMember { owner: name, name: v.name.clone() });
      }
      let declared = v.value.unwrap_or(next);
      let value = if decl.bit_flags {
        /* Bit-flag values name bit positions */
        if declared < 0 || declared as u64 >= underlying.size() * 8 {
          return Err(ResolveError::EnumValueOutOfRange { name, value: v.name.clone() });
        }
        1i128 << declared
      } else {
        declared as i128
      };
      if value < min || value > max {
        return Err(ResolveError::EnumValueOutOfRange { name, value: v.name.clone() });
      }
      values.push(EnumVal { name: v.name.clone(), value: value as i64, union_type: None, doc: doc_lines(&v.comment) });
      next = declared + 1;
    }

    let def = &mut self.schema.enums[id.0];
    def.underlying = underlying;
    def.values = values;
    Ok(())
  }

  fn resolve_union(&mut self, id: EnumId, decl: &UnionDecl) -> ResolveResult<()> {
    let def = self.schema.enum_def(id);
    let (name, ns) = (def.name.clone(), def.namespace);

    let mut values = vec![EnumVal { name: "NONE".to_string(), value: 0, union_type: None, doc: Vec::new() }];
    for (i, variant) in decl.variants.iter().enumerate() {
      let label = variant.label().rsplit('.').next().unwrap_or(variant.label()).to_string();
      if values.iter().any(|e| e.name == label) {
        return Err(ResolveError::DuplicateMember { owner: name, name: label });
      }
      let payload = if variant.variant_type == "string" {
        Type::String
      } else {
        match self.lookup(ns, &variant.variant_type) {
          Some(DefRef::Struct(sid)) => Type::Struct(sid),
          _ => return Err(ResolveError::InvalidUnionVariant { name, variant: variant.variant_type.clone() }),
        }
      };
      if i + 1 > u8::MAX as usize {
        return Err(ResolveError::EnumValueOutOfRange { name, value: label });
      }
      values.push(EnumVal { name: label, value: (i + 1) as i64, union_type: Some(payload), doc: doc_lines(&variant.comment) });
    }

    self.schema.enums[id.0].values = values;
    Ok(())
  }

  /* ==========================================================================
     Fields
     ========================================================================== */

  fn resolve_fields(&mut self, id: StructId, decl: &StructDecl) -> ResolveResult<()> {
    let def = self.schema.struct_def(id);
    let (owner, ns, fixed) = (def.name.clone(), def.namespace, def.fixed);
    let explicit_ids = decl.fields.iter().any(|f| f.id.is_some());

    let mut fields: Vec<FieldDef> = Vec::with_capacity(decl.fields.len());
    let mut next_index: u16 = 0;

    for decl_field in &decl.fields {
      let fname = decl_field.name.clone();
      if fields.iter().any(|f| f.name == fname) {
        return Err(ResolveError::DuplicateMember { owner, name: fname });
      }

      let expr: TypeExpr = decl_field
        .field_type
        .parse()
        .map_err(|source| ResolveError::InvalidType { owner: owner.clone(), field: fname.clone(), source })?;
      let ty = self.resolve_type(ns, &owner, &fname, &expr)?;

      if fixed {
        self.check_fixed_field(&owner, decl_field, &ty)?;
      } else if matches!(ty, Type::Array(..)) {
        return Err(ResolveError::ArrayOutsideStruct { owner, field: fname });
      }

      if decl_field.required && (fixed || ty.is_scalar()) {
        return Err(ResolveError::RequiredScalar { owner, field: fname });
      }
      if decl_field.optional && (fixed || !ty.is_scalar()) {
        return Err(ResolveError::InvalidOptional { owner, field: fname });
      }

      let nested_flatbuffer = match &decl_field.nested_flatbuffer {
        Some(table) => match (&ty, self.lookup(ns, table)) {
          (Type::Vector(e), Some(DefRef::Struct(sid))) if **e == Type::Scalar(ScalarKind::U8) && !self.schema.struct_def(sid).fixed => {
            Some(sid)
          }
          _ => return Err(ResolveError::InvalidNestedFlatbuffer { owner, field: fname }),
        },
        None => None,
      };

      let union_enum = match &ty {
        Type::Union(eid) => Some((*eid, false)),
        Type::Vector(e) => match **e {
          Type::Union(eid) => Some((eid, true)),
          _ => None,
        },
        _ => None,
      };

      let index = if explicit_ids {
        decl_field.id.ok_or_else(|| ResolveError::MissingId { owner: owner.clone(), field: fname.clone() })?
      } else if union_enum.is_some() {
        next_index + 1
      } else {
        next_index
      };

      if let Some((eid, is_vector)) = union_enum {
        if index == 0 {
          return Err(ResolveError::InvalidSlot { owner, id: index });
        }
        let companion_ty = if is_vector { Type::Vector(Box::new(Type::UnionType(eid))) } else { Type::UnionType(eid) };
        fields.push(FieldDef {
          name: format!("{}_type", fname),
          ty: companion_ty,
          index: index - 1,
          offset: 0,
          default: "0".to_string(),
          deprecated: decl_field.deprecated,
          required: decl_field.required && is_vector,
          key: false,
          shared: false,
          optional: false,
          nested_flatbuffer: None,
          doc: Vec::new(),
        });
      }

      let default = self.normalize_default(&owner, decl_field, &ty)?;
      fields.push(FieldDef {
        name: fname,
        ty,
        index,
        offset: 0,
        default,
        deprecated: decl_field.deprecated,
        required: decl_field.required,
        key: decl_field.key,
        shared: decl_field.shared,
        optional: decl_field.optional,
        nested_flatbuffer,
        doc: doc_lines(&decl_field.comment),
      });
      next_index = index + 1;
    }

    if explicit_ids {
      fields.sort_by_key(|f| f.index);
    }
    for (expected, field) in fields.iter().enumerate() {
      if field.index as usize != expected {
        return Err(ResolveError::InvalidSlot { owner, id: field.index });
      }
    }

    let keys: Vec<&FieldDef> = fields.iter().filter(|f| f.key).collect();
    if keys.len() > 1 {
      return Err(ResolveError::MultipleKeys { owner });
    }
    if let Some(key) = keys.first() {
      let reason = if fixed {
        Some("keys are only supported on tables")
      } else if key.deprecated {
        Some("deprecated fields cannot be keys")
      } else if !(key.ty.is_scalar() || key.ty == Type::String || self.schema.is_fixed(&key.ty)) || matches!(key.ty, Type::UnionType(_)) {
        Some("only scalars, strings and structs can be keys")
      } else {
        None
      };
      if let Some(reason) = reason {
        return Err(ResolveError::InvalidKey { owner, field: key.name.clone(), reason });
      }
    }

    self.schema.structs[id.0].fields = fields;
    Ok(())
  }

  fn check_fixed_field(&self, owner: &str, field: &FieldDecl, ty: &Type) -> ResolveResult<()> {
    let allowed = |t: &Type| match t {
      Type::Scalar(_) | Type::Enum(_) => true,
      Type::Struct(sid) => self.schema.struct_def(*sid).fixed,
      _ => false,
    };
    let ok = match ty {
      Type::Array(elem, _) => allowed(elem),
      other => allowed(other),
    };
    if ok {
      Ok(())
    } else {
      Err(ResolveError::VariableFieldInStruct { owner: owner.to_string(), field: field.name.clone() })
    }
  }

  fn normalize_default(&self, owner: &str, field: &FieldDecl, ty: &Type) -> ResolveResult<String> {
    let invalid = |value: &str| ResolveError::InvalidDefault { owner: owner.to_string(), field: field.name.clone(), value: value.to_string() };

    let Some(raw) = field.default.as_deref().map(str::trim) else {
      return Ok("0".to_string());
    };
    if field.optional {
      return if raw == "null" { Ok("0".to_string()) } else { Err(invalid(raw)) };
    }

    match ty {
      Type::Scalar(ScalarKind::Bool) => match raw {
        "true" | "1" => Ok("1".to_string()),
        "false" | "0" => Ok("0".to_string()),
        _ => Err(invalid(raw)),
      },
      Type::Scalar(kind) if kind.is_float() => match raw.to_ascii_lowercase().as_str() {
        "nan" | "+nan" | "-nan" => Ok("nan".to_string()),
        "inf" | "+inf" | "infinity" | "+infinity" => Ok("inf".to_string()),
        "-inf" | "-infinity" => Ok("-inf".to_string()),
        _ => raw.parse::<f64>().map(|_| raw.to_string()).map_err(|_| invalid(raw)),
      },
      Type::Scalar(kind) => parse_int_default(raw, *kind).ok_or_else(|| invalid(raw)),
      Type::Enum(eid) => {
        let def = self.schema.enum_def(*eid);
        if let Some(v) = def.lookup(raw) {
          return Ok(v.value.to_string());
        }
        if def.bit_flags {
          /* Space separated flag names combine */
          let mut acc: i64 = 0;
          for part in raw.split_whitespace() {
            acc |= def.lookup(part).ok_or_else(|| invalid(raw))?.value;
          }
          if !raw.trim().is_empty() {
            return Ok(acc.to_string());
          }
        }
        parse_int_default(raw, def.underlying).ok_or_else(|| invalid(raw))
      }
      _ => Err(invalid(raw)),
    }
  }

  /* ==========================================================================
     Fixed struct layout
     ========================================================================== */

  fn layout_struct(&mut self, id: StructId, pending: &[PendingDecl], done: &mut [bool], visiting: &mut Vec<StructId>) -> ResolveResult<()> {
    if done[id.0] {
      return Ok(());
    }
    if visiting.contains(&id) {
      return Err(ResolveError::CyclicStruct { name: self.schema.struct_def(id).name.clone() });
    }
    visiting.push(id);

    let types: Vec<Type> = self.schema.struct_def(id).fields.iter().map(|f| f.ty.clone()).collect();
    let mut offsets = Vec::with_capacity(types.len());
    let mut cursor: u64 = 0;
    let mut minalign: u64 = 1;

    for ty in &types {
      let (size, align) = self.inline_layout(ty, pending, done, visiting)?;
      let offset = align_up(cursor, align);
      offsets.push(offset);
      cursor = offset + size;
      minalign = minalign.max(align);
    }

    let force_align = pending.iter().find_map(|p| match p {
      PendingDecl::Struct(sid, decl) if *sid == id => decl.container_attributes.force_align,
      _ => None,
    });
    if let Some(force) = force_align {
      if force.is_power_of_two() {
        minalign = minalign.max(force);
      }
    }

    let def = &mut self.schema.structs[id.0];
    for (field, offset) in def.fields.iter_mut().zip(offsets) {
      field.offset = offset;
    }
    def.minalign = minalign;
    def.bytesize = align_up(cursor, minalign);

    visiting.pop();
    done[id.0] = true;
    Ok(())
  }

  fn inline_layout(&mut self, ty: &Type, pending: &[PendingDecl], done: &mut [bool], visiting: &mut Vec<StructId>) -> ResolveResult<(u64, u64)> {
    Ok(match ty {
      Type::Struct(sid) => {
        self.layout_struct(*sid, pending, done, visiting)?;
        let def = self.schema.struct_def(*sid);
        (def.bytesize, def.minalign)
      }
      Type::Array(elem, len) => {
        let (size, align) = self.inline_layout(elem, pending, done, visiting)?;
        (size * *len as u64, align)
      }
      other => {
        let size = self.schema.scalar_kind(other).map(ScalarKind::size).unwrap_or(8);
        (size, size)
      }
    })
  }

  /* ==========================================================================
     Services
     ========================================================================== */

  fn resolve_service(&mut self, ns: NamespaceId, decl: ServiceDecl) -> ResolveResult<()> {
    let mut calls = Vec::with_capacity(decl.calls.len());
    for call in &decl.calls {
      let table = |name: &str| match self.lookup(ns, name) {
        Some(DefRef::Struct(id)) if !self.schema.struct_def(id).fixed => Ok(id),
        _ => Err(ResolveError::InvalidRpcMessage { service: decl.name.clone(), call: call.name.clone(), name: name.to_string() }),
      };
      calls.push(RpcCall {
        name: call.name.clone(),
        request: table(&call.request)?,
        response: table(&call.response)?,
        streaming: call.streaming,
        idempotent: call.idempotent,
        value_task: call.value_task,
        doc: doc_lines(&call.comment),
      });
    }
    self.schema.services.push(ServiceDef { name: decl.name, namespace: ns, calls, doc: doc_lines(&decl.comment) });
    Ok(())
  }
}

fn parse_int_default(raw: &str, kind: ScalarKind) -> Option<String> {
  let value: i128 = if let Some(hex) = raw.strip_prefix("0x") {
    i128::from_str_radix(hex, 16).ok()?
  } else {
    raw.parse().ok()?
  };
  let (min, max) = kind.int_range();
  (value >= min && value <= max).then(|| value.to_string())
}

fn doc_lines(comment: &Option<String>) -> Vec<String> {
  comment.as_deref().map(|c| c.lines().map(|l| l.trim_end().to_string()).collect()).unwrap_or_default()
}

pub fn align_up(value: u64, alignment: u64) -> u64 {
  (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod resolve_tests;

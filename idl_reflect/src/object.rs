/* Reflective Pack/Unpack between `Value` graphs and buffers.
 *
 * Packing follows the order the generated Pack methods use: every out-of-line
 * child (strings, vectors, child tables, union payloads) is written first,
 * then the table is opened and its fields are added in size-grouped order with
 * fixed structs written inline right before their slot. Required fields are
 * checked once the table is closed. Vectors keep the order they are given in;
 * keyed vectors meant for lookup go through `create_sorted_vector_of`.
 */

use idl_gen::codegen::csharp::builders::create_order;
use idl_gen::flatten::{struct_leaves, StructStep};
use idl_gen::layout::inline_layout;
use idl_gen::schema::{EnumId, FieldDef, Schema, StructId, Type};
use indexmap::IndexMap;
use tracing::debug;

use crate::buffer::{Buffer, StructView, TableView, VectorView};
use crate::builder::{BufferBuilder, UOffset};
use crate::errors::{ReflectError, ReflectResult};
use crate::value::{decode_scalar, default_bytes, encode_scalar, Value};

fn mismatch(field: &str, expected: &str, value: &Value) -> ReflectError {
    ReflectError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        found: value.type_name().to_string(),
    }
}

fn unsupported(field: &str, ty: &Type) -> ReflectError {
    ReflectError::TypeMismatch {
        field: field.to_string(),
        expected: "a packable type".to_string(),
        found: format!("{:?}", ty),
    }
}

fn is_companion(ty: &Type) -> bool {
    match ty {
        Type::UnionType(_) => true,
        Type::Vector(elem) => matches!(**elem, Type::UnionType(_)),
        _ => false,
    }
}

/* ============================================================================
   Fixed structs
   ============================================================================ */

/* Shape and array lengths, checked before a single byte is produced */
fn check_struct(schema: &Schema, id: StructId, value: &Value, field: &str) -> ReflectResult<()> {
    let def = schema.struct_def(id);
    let fields = value.as_object().ok_or_else(|| mismatch(field, &def.name, value))?;
    if let Some(unknown) = fields.keys().find(|name| def.field(name).is_none()) {
        return Err(ReflectError::UnknownField {
            entity: def.name.clone(),
            field: unknown.clone(),
        });
    }
    for f in &def.fields {
        match fields.get(&f.name) {
            Some(v) if !v.is_null() => check_inline(schema, f, &f.ty, v)?,
            _ => {}
        }
    }
    Ok(())
}

fn check_inline(schema: &Schema, field: &FieldDef, ty: &Type, value: &Value) -> ReflectResult<()> {
    match ty {
        Type::Struct(sid) => check_struct(schema, *sid, value, &field.name),
        Type::Array(elem, len) => {
            let items = value.as_vector().ok_or_else(|| mismatch(&field.name, "array", value))?;
            if items.len() != *len as usize {
                return Err(ReflectError::ArrayLength {
                    field: field.name.clone(),
                    expected: *len as usize,
                    actual: items.len(),
                });
            }
            items.iter().try_for_each(|item| check_inline(schema, field, elem, item))
        }
        _ => Ok(()),
    }
}

fn follow<'v>(value: &'v Value, path: &[StructStep]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, step| match step {
        StructStep::Field(f) => current.get(&f.name),
        StructStep::Element(i) => current.as_vector()?.get(*i as usize),
    })
}

/// Byte image of a fixed struct. Missing members are zero.
pub fn struct_bytes(schema: &Schema, id: StructId, value: &Value) -> ReflectResult<Vec<u8>> {
    let def = schema.struct_def(id);
    check_struct(schema, id, value, &def.name)?;

    let mut image = vec![0u8; def.bytesize as usize];
    for leaf in struct_leaves(schema, id) {
        let Some(v) = follow(value, &leaf.path).filter(|v| !v.is_null()) else {
            continue;
        };
        let field = leaf.leaf.field;
        let kind = schema.scalar_kind(leaf.leaf.ty).ok_or_else(|| unsupported(&field.name, leaf.leaf.ty))?;
        let enum_def = leaf.leaf.ty.enum_id().map(|e| schema.enum_def(e));
        let bytes = encode_scalar(kind, v, enum_def, &field.name)?;
        let at = leaf.leaf.offset as usize;
        image[at..at + bytes.len()].copy_from_slice(&bytes);
    }
    Ok(image)
}

/* ============================================================================
   Pack
   ============================================================================ */

enum Prepared {
    Scalar(Vec<u8>),
    Offset(UOffset),
    /* image and alignment, written inline at add time */
    Struct(Vec<u8>, u64),
}

fn pack_string(builder: &mut BufferBuilder, field: &FieldDef, value: &Value) -> ReflectResult<UOffset> {
    let s = value.as_str().ok_or_else(|| mismatch(&field.name, "string", value))?;
    if field.shared {
        builder.create_shared_string(s)
    } else {
        builder.create_string(s)
    }
}

/* Payload of one union value and its discriminant */
fn pack_union(builder: &mut BufferBuilder, schema: &Schema, eid: EnumId, field: &FieldDef, value: &Value) -> ReflectResult<(i64, UOffset)> {
    let Value::Union { variant, value: payload } = value else {
        return Err(mismatch(&field.name, "union", value));
    };
    let def = schema.enum_def(eid);
    let unknown = || ReflectError::UnknownVariant {
        owner: def.name.clone(),
        name: variant.clone(),
    };
    let ev = def.lookup(variant).filter(|ev| ev.value != 0).ok_or_else(unknown)?;
    let offset = match &ev.union_type {
        Some(Type::String) => pack_string(builder, field, payload)?,
        Some(Type::Struct(sid)) if schema.struct_def(*sid).fixed => {
            let image = struct_bytes(schema, *sid, payload)?;
            builder.create_struct(schema.struct_def(*sid).minalign as usize, &image)
        }
        Some(Type::Struct(sid)) => pack_table(builder, schema, *sid, payload)?,
        _ => return Err(unknown()),
    };
    Ok((ev.value, offset))
}

fn pack_vector(builder: &mut BufferBuilder, schema: &Schema, field: &FieldDef, elem: &Type, items: &[Value]) -> ReflectResult<UOffset> {
    if let Some(kind) = schema.scalar_kind(elem) {
        let enum_def = elem.enum_id().map(|e| schema.enum_def(e));
        let encoded = items
            .iter()
            .map(|item| encode_scalar(kind, item, enum_def, &field.name))
            .collect::<ReflectResult<Vec<_>>>()?;
        let size = kind.size() as usize;
        builder.start_vector(size, items.len(), size)?;
        for bytes in encoded.iter().rev() {
            builder.push_element_bytes(bytes);
        }
        return builder.end_vector();
    }

    match elem {
        Type::String => {
            let offsets = items
                .iter()
                .map(|item| pack_string(builder, field, item))
                .collect::<ReflectResult<Vec<_>>>()?;
            builder.create_vector_of_offsets(&offsets)
        }
        Type::Struct(sid) if schema.struct_def(*sid).fixed => {
            let def = schema.struct_def(*sid);
            let images = items
                .iter()
                .map(|item| struct_bytes(schema, *sid, item))
                .collect::<ReflectResult<Vec<_>>>()?;
            builder.start_vector(def.bytesize as usize, items.len(), def.minalign as usize)?;
            for image in images.iter().rev() {
                builder.push_element_bytes(image);
            }
            builder.end_vector()
        }
        Type::Struct(sid) => {
            let offsets = items
                .iter()
                .map(|item| pack_table(builder, schema, *sid, item))
                .collect::<ReflectResult<Vec<_>>>()?;
            builder.create_vector_of_offsets(&offsets)
        }
        other => Err(unsupported(&field.name, other)),
    }
}

/// Writes `value` as a table of type `id` and returns its offset.
pub fn pack_table(builder: &mut BufferBuilder, schema: &Schema, id: StructId, value: &Value) -> ReflectResult<UOffset> {
    let def = schema.struct_def(id);
    let fields = value.fields().ok_or_else(|| mismatch(&def.name, "object", value))?;
    if let Some(unknown) = fields.keys().find(|name| def.field(name).is_none()) {
        return Err(ReflectError::UnknownField {
            entity: def.name.clone(),
            field: unknown.clone(),
        });
    }

    let mut prepared: IndexMap<&str, Prepared> = IndexMap::new();
    for field in def.live_fields().filter(|f| !is_companion(&f.ty)) {
        let Some(v) = fields.get(&field.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let item = match &field.ty {
            ty if ty.is_scalar() => {
                let kind = schema.scalar_kind(ty).ok_or_else(|| unsupported(&field.name, ty))?;
                let enum_def = ty.enum_id().map(|e| schema.enum_def(e));
                Prepared::Scalar(encode_scalar(kind, v, enum_def, &field.name)?)
            }
            Type::String => Prepared::Offset(pack_string(builder, field, v)?),
            Type::Struct(sid) if schema.struct_def(*sid).fixed => {
                Prepared::Struct(struct_bytes(schema, *sid, v)?, schema.struct_def(*sid).minalign)
            }
            Type::Struct(sid) => Prepared::Offset(pack_table(builder, schema, *sid, v)?),
            Type::Union(eid) => {
                let (tag, offset) = pack_union(builder, schema, *eid, field, v)?;
                if let Some(companion) = def.union_type_field(field) {
                    let kind = schema.scalar_kind(&companion.ty).ok_or_else(|| unsupported(&companion.name, &companion.ty))?;
                    let tag = encode_scalar(kind, &Value::Int(tag), None, &companion.name)?;
                    prepared.insert(companion.name.as_str(), Prepared::Scalar(tag));
                }
                Prepared::Offset(offset)
            }
            Type::Vector(elem) => {
                let items = v.as_vector().ok_or_else(|| mismatch(&field.name, "vector", v))?;
                match (&**elem, def.union_type_field(field)) {
                    (Type::Union(eid), Some(companion)) => {
                        let mut tags = Vec::with_capacity(items.len());
                        let mut offsets = Vec::with_capacity(items.len());
                        for item in items {
                            let (tag, offset) = pack_union(builder, schema, *eid, field, item)?;
                            tags.push(Value::Int(tag));
                            offsets.push(offset);
                        }
                        let kind_ty = Type::UnionType(*eid);
                        let tag_vector = pack_vector(builder, schema, companion, &kind_ty, &tags)?;
                        prepared.insert(companion.name.as_str(), Prepared::Offset(tag_vector));
                        Prepared::Offset(builder.create_vector_of_offsets(&offsets)?)
                    }
                    (elem, _) => Prepared::Offset(pack_vector(builder, schema, field, elem, items)?),
                }
            }
            other => return Err(unsupported(&field.name, other)),
        };
        prepared.insert(field.name.as_str(), item);
    }

    builder.start_table(def.fields.len())?;
    for field in create_order(schema, def) {
        let Some(item) = prepared.get(field.name.as_str()) else {
            continue;
        };
        match item {
            Prepared::Scalar(bytes) => {
                let default = match schema.scalar_kind(&field.ty) {
                    Some(kind) if !field.optional => Some(default_bytes(kind, &field.default, &field.name)?),
                    _ => None,
                };
                builder.add_scalar_bytes(field.index, bytes, default.as_deref())?;
            }
            Prepared::Offset(offset) => builder.add_offset(field.index, *offset)?,
            Prepared::Struct(image, alignment) => {
                let offset = builder.create_struct(*alignment as usize, image);
                builder.add_struct(field.index, offset)?;
            }
        }
    }
    let table = builder.end_table()?;

    for field in def.live_fields().filter(|f| f.required) {
        builder.required(table, field.voffset(), &def.name, &field.name)?;
    }
    debug!("packed '{}' at {}", def.name, table.0);
    Ok(table)
}

/* ============================================================================
   Unpack
   ============================================================================ */

fn unpack_inline(schema: &Schema, ty: &Type, view: &StructView) -> ReflectResult<Value> {
    match ty {
        Type::Struct(sid) => unpack_struct(schema, *sid, view),
        Type::Array(elem, len) => {
            let stride = inline_layout(schema, elem).0;
            (0..*len as u64)
                .map(|i| unpack_inline(schema, elem, &view.nested(i * stride)))
                .collect::<ReflectResult<Vec<_>>>()
                .map(Value::Vector)
        }
        other => {
            let kind = schema.scalar_kind(other).ok_or_else(|| unsupported("<inline>", other))?;
            Ok(decode_scalar(kind, view.bytes(kind.size())?))
        }
    }
}

/// Reads a fixed struct into an object with one member per field.
pub fn unpack_struct(schema: &Schema, id: StructId, view: &StructView) -> ReflectResult<Value> {
    let def = schema.struct_def(id);
    let mut out = IndexMap::with_capacity(def.fields.len());
    for field in &def.fields {
        out.insert(field.name.clone(), unpack_inline(schema, &field.ty, &view.nested(field.offset))?);
    }
    Ok(Value::Object(out))
}

fn unpack_union_payload(schema: &Schema, eid: EnumId, tag: i64, buf: Buffer, target: u64) -> ReflectResult<Value> {
    if tag == 0 {
        return Ok(Value::Null);
    }
    let def = schema.enum_def(eid);
    let ev = def.reverse_lookup(tag).ok_or_else(|| ReflectError::UnknownVariant {
        owner: def.name.clone(),
        name: tag.to_string(),
    })?;
    let payload = match &ev.union_type {
        Some(Type::String) => Value::String(buf.string_at(target)?.to_string()),
        Some(Type::Struct(sid)) if schema.struct_def(*sid).fixed => unpack_struct(schema, *sid, &StructView { buf, pos: target })?,
        Some(Type::Struct(sid)) => unpack_table(schema, *sid, &buf.table_at(target))?,
        other => return Err(unsupported(&ev.name, other.as_ref().unwrap_or(&Type::Union(eid)))),
    };
    Ok(Value::Union {
        variant: ev.name.clone(),
        value: Box::new(payload),
    })
}

fn tag_value(value: Value) -> i64 {
    match value {
        Value::Int(i) => i,
        Value::UInt(u) => u as i64,
        _ => 0,
    }
}

fn unpack_vector(schema: &Schema, field: &FieldDef, elem: &Type, vector: &VectorView) -> ReflectResult<Vec<Value>> {
    let mut out = Vec::with_capacity(vector.len() as usize);
    for i in 0..vector.len() {
        let item = match elem {
            ty if ty.is_scalar() => {
                let kind = schema.scalar_kind(ty).ok_or_else(|| unsupported(&field.name, ty))?;
                decode_scalar(kind, vector.struct_at(i, kind.size())?.bytes(kind.size())?)
            }
            Type::String => Value::String(vector.string(i)?.to_string()),
            Type::Struct(sid) if schema.struct_def(*sid).fixed => {
                unpack_struct(schema, *sid, &vector.struct_at(i, schema.struct_def(*sid).bytesize)?)?
            }
            Type::Struct(sid) => unpack_table(schema, *sid, &vector.table(i)?)?,
            other => return Err(unsupported(&field.name, other)),
        };
        out.push(item);
    }
    Ok(out)
}

/// Reads a table into an object. Absent scalars take their default (optional
/// scalars read as null); absent references read as null.
pub fn unpack_table(schema: &Schema, id: StructId, table: &TableView) -> ReflectResult<Value> {
    let def = schema.struct_def(id);
    let mut out = IndexMap::with_capacity(def.fields.len());
    for field in def.live_fields().filter(|f| !is_companion(&f.ty)) {
        let voffset = field.voffset();
        let value = match &field.ty {
            ty if ty.is_scalar() => {
                let kind = schema.scalar_kind(ty).ok_or_else(|| unsupported(&field.name, ty))?;
                match table.field_pos(voffset)? {
                    Some(pos) => decode_scalar(kind, table.buf.bytes(pos, kind.size())?),
                    None if field.optional => Value::Null,
                    None => decode_scalar(kind, &default_bytes(kind, &field.default, &field.name)?),
                }
            }
            Type::String => table.string(voffset)?.map(Value::from).unwrap_or(Value::Null),
            Type::Struct(sid) if schema.struct_def(*sid).fixed => match table.struct_at(voffset)? {
                Some(view) => unpack_struct(schema, *sid, &view)?,
                None => Value::Null,
            },
            Type::Struct(sid) => match table.table(voffset)? {
                Some(child) => unpack_table(schema, *sid, &child)?,
                None => Value::Null,
            },
            Type::Union(eid) => {
                let tag = match def.union_type_field(field) {
                    Some(companion) => {
                        let kind = schema.scalar_kind(&companion.ty).ok_or_else(|| unsupported(&companion.name, &companion.ty))?;
                        match table.field_pos(companion.voffset())? {
                            Some(pos) => tag_value(decode_scalar(kind, table.buf.bytes(pos, kind.size())?)),
                            None => 0,
                        }
                    }
                    None => 0,
                };
                match table.field_pos(voffset)? {
                    Some(pos) if tag != 0 => unpack_union_payload(schema, *eid, tag, table.buf, table.buf.indirect(pos)?)?,
                    _ => Value::Null,
                }
            }
            Type::Vector(elem) => match (table.vector(voffset)?, &**elem) {
                (None, _) => Value::Null,
                (Some(values), Type::Union(eid)) => {
                    let companion = def.union_type_field(field);
                    let tags = match companion {
                        Some(c) => table.vector(c.voffset())?,
                        None => None,
                    };
                    let kind = schema.enum_def(*eid).underlying;
                    let mut items = Vec::with_capacity(values.len() as usize);
                    for i in 0..values.len() {
                        let tag = match &tags {
                            Some(t) if i < t.len() => tag_value(decode_scalar(kind, t.struct_at(i, kind.size())?.bytes(kind.size())?)),
                            _ => 0,
                        };
                        items.push(unpack_union_payload(schema, *eid, tag, values.buf, values.indirect(i)?)?);
                    }
                    Value::Vector(items)
                }
                (Some(values), elem) => Value::Vector(unpack_vector(schema, field, elem, &values)?),
            },
            other => return Err(unsupported(&field.name, other)),
        };
        out.insert(field.name.clone(), value);
    }
    Ok(Value::Object(out))
}

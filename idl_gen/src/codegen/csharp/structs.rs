/* Struct and table declarations.
 *
 * Orchestrates one entity: header and model plumbing, equality, root helpers,
 * per-field accessors, the field metadata table, constructors and keyed
 * lookup. With the object API the owned class follows the declaration.
 */

use super::accessors::emit_field;
use super::builders::{emit_root_helpers, emit_start_add_end, emit_struct_create, emit_table_create};
use super::lookup::{emit_compare_to, emit_sorted_vector_and_lookup, is_keyed};
use super::naming::{def_name, member_names};
use super::types::default_value;
use super::{object_api, push_doc};
use crate::codegen::context::EmitContext;
use crate::error::{GenError, GenResult};
use crate::layout::{Addressing, EntityLayout, FieldCategory};
use crate::schema::{StructId, Type};

/* Emitted code plus the non-fatal diagnostics raised on the way */
#[derive(Debug, Clone, Default)]
pub struct StructOutput {
  pub code: String,
  pub warnings: Vec<String>,
}

fn validate(layout: &EntityLayout) -> GenResult<()> {
  let def = layout.def;
  for fl in &layout.fields {
    let field = fl.field;
    if def.fixed {
      match fl.category {
        FieldCategory::Scalar | FieldCategory::Struct | FieldCategory::Array => {}
        other => {
          return Err(GenError::contract(
            &def.name,
            format!("fixed struct field '{}' must have a fixed size, found {:?}", field.name, other),
          ));
        }
      }
    } else if fl.category == FieldCategory::Array {
      return Err(GenError::contract(&def.name, format!("table field '{}' cannot be a fixed array", field.name)));
    }

    let is_union = match &field.ty {
      Type::Union(_) => true,
      Type::Vector(elem) => matches!(**elem, Type::Union(_)),
      _ => false,
    };
    if is_union && def.union_type_field(field).is_none() {
      return Err(GenError::contract(&def.name, format!("union field '{}' has no discriminant companion", field.name)));
    }
  }
  Ok(())
}

fn emit_header(layout: &EntityLayout, keyed: bool, code: &mut String) {
  let def = layout.def;
  let name = def_name(&def.name);
  let visibility = if def.private { "internal" } else { "public" };
  let kind = if def.fixed { "IBigBufferStruct" } else { "IBigBufferTable" };

  push_doc(code, "", &def.doc);
  code.push_str(&format!("{} partial struct {} : {}, IEquatable<{}>", visibility, name, kind, name));
  if def.fixed || keyed {
    code.push_str(&format!(", IComparable<{}>", name));
  }
  code.push_str("\n{\n  internal Model _model;\n");
  code.push_str(&format!("  internal {}(ulong i, ByteBuffer buffer)\n    => _model = new(buffer, i);\n", name));
  code.push_str("  ref Model IBigBufferEntity.Model => ref _model.UnsafeSelfReference();\n");
  code.push_str("  public ref readonly ByteBuffer ByteBuffer => ref _model.ByteBuffer.UnsafeSelfReference();\n");

  if def.fixed {
    code.push_str(&format!("  public static ulong Alignment => {};\n", def.minalign));
    code.push_str(&format!("  public static ulong ByteSize => {};\n", def.bytesize));
    code.push_str("  ulong IBigBufferStruct.Alignment => Alignment;\n");
    code.push_str("  ulong IBigBufferStruct.ByteSize => ByteSize;\n");
  }
}

fn emit_equality(layout: &EntityLayout, keyed: bool, code: &mut String) {
  let name = def_name(&layout.def.name);
  if layout.def.fixed {
    code.push_str(&format!(
      "  public bool Equals({n} other)\n    => _model.Equals(other._model) || CompareTo(other) == 0;\n\n",
      n = name
    ));
    code.push_str(&format!("  public int CompareTo({} other)\n    => CompareTo(other.GetByteSpan());\n\n", name));
    code.push_str(
      "  internal int CompareTo(StirlingLabs.Utilities.ReadOnlyBigSpan<byte> other)\n    => this.GetByteSpan().CompareMemory(other);\n\n",
    );
    code.push_str(
      "  internal StirlingLabs.Utilities.ReadOnlyBigSpan<byte> GetByteSpan()\n    => _model.ByteBuffer.ToReadOnlySpan(_model.Offset, ByteSize);\n\n",
    );
  } else if keyed {
    code.push_str(&format!(
      "  public bool Equals({} other)\n    => _model.Equals(other._model) || CompareTo(other) == 0;\n\n",
      name
    ));
  } else {
    code.push_str(&format!("  public bool Equals({} other)\n    => _model.Equals(other._model);\n\n", name));
  }
  code.push_str(&format!("  public override bool Equals(object obj)\n    => obj is {} other && Equals(other);\n\n", name));
  code.push_str("  public override int GetHashCode()\n    => _model.GetHashCode();\n\n");
  code.push_str(&format!("  public static bool operator ==({n} left, {n} right)\n    => left.Equals(right);\n\n", n = name));
  code.push_str(&format!("  public static bool operator !=({n} left, {n} right)\n    => !left.Equals(right);\n", n = name));
}

fn emit_table_entry_points(cx: &EmitContext, id: StructId, code: &mut String) {
  let def = cx.schema.struct_def(id);
  let name = def_name(&def.name);
  code.push_str("  public static void ValidateVersion() { BigBuffers.Constants.VERSION_2_0_0(); }\n");
  code.push_str(&format!(
    "  public static {n} GetRootAs{r}(ByteBuffer _bb)\n    => new(_bb.Position + _bb.Get<ulong>(_bb.Position), _bb);\n",
    n = name,
    r = def.name
  ));
  code.push_str(&format!(
    "  public static {n} GetSizePrefixedRootAs{r}(ByteBuffer _bb) {{\n    var p = _bb.Position + sizeof(ulong);\n    return new(p + _bb.Get<ulong>(p), _bb);\n  }}\n",
    n = name,
    r = def.name
  ));
  if cx.schema.is_root(id) {
    if let Some(ident) = &cx.schema.file_identifier {
      code.push_str(&format!(
        "  public static bool {}BufferHasIdentifier(ByteBuffer _bb) {{ return SchemaModel.__has_identifier(_bb, \"{}\"); }}\n",
        def.name, ident
      ));
    }
  }
}

/* `(Name, Deprecated, Offset, Size, Align, Default)` for every declared field */
fn emit_metadata(cx: &EmitContext, layout: &EntityLayout, code: &mut String) {
  code.push_str("  public static class Metadata {\n");
  code.push_str(
    "    public static (string Name, bool Deprecated, ushort Offset, ushort Size, ushort Align, object Default)[] Fields = {\n",
  );
  for fl in &layout.fields {
    let field = fl.field;
    let offset = match fl.addressing {
      Addressing::Static { offset } => offset,
      Addressing::Vtable { voffset } => voffset as u64,
    };
    let default = if field.ty.is_scalar() { default_value(cx, field) } else { "null".to_string() };
    code.push_str(&format!(
      "      (@\"{}\",{},{},{},{},{}),\n",
      field.name, field.deprecated, offset, fl.inline_size, fl.inline_alignment, default
    ));
  }
  code.push_str("    };\n  }\n");
}

pub fn emit_struct(cx: &EmitContext, id: StructId) -> GenResult<StructOutput> {
  let layout = EntityLayout::resolve(cx.schema, id);
  validate(&layout)?;
  let def = layout.def;
  let keyed = is_keyed(cx, id);
  let mut out = StructOutput::default();
  let code = &mut out.code;

  emit_header(&layout, keyed, code);
  emit_equality(&layout, keyed, code);
  if !def.fixed {
    emit_table_entry_points(cx, id, code);
  }

  for fl in layout.fields.iter().filter(|fl| !fl.field.deprecated) {
    let names = member_names(def, fl);
    if let Some(message) = &names.collision {
      tracing::warn!("{}", message);
      out.warnings.push(message.clone());
    }
    emit_field(cx, fl, &names, code)?;
  }
  code.push('\n');

  emit_metadata(cx, &layout, code);

  if def.fixed {
    emit_struct_create(cx, id, code)?;
  } else {
    emit_table_create(cx, id, code)?;
    emit_start_add_end(cx, id, code)?;
    emit_root_helpers(cx, id, code);
    if keyed {
      emit_compare_to(cx, id, code)?;
      emit_sorted_vector_and_lookup(cx, id, code)?;
    }
  }

  if cx.options.object_api {
    object_api::emit_pack_unpack(cx, id, code)?;
  }
  code.push_str("}\n\n");

  if cx.options.object_api {
    object_api::emit_object_class(cx, id, code)?;
  }
  Ok(out)
}

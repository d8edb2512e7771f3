/* Reflective runtime for the 64-bit-offset buffer format.
 *
 * Builds and reads buffers with the same layout the generated C# code uses,
 * driven by a resolved schema instead of generated types.
 */

pub mod buffer;
pub mod builder;
pub mod errors;
pub mod lookup;
pub mod object;
pub mod reflect;
pub mod scalar;
pub mod value;

pub use buffer::{Buffer, StructView, TableView, VectorView};
pub use builder::{voffset, BufferBuilder, UOffset};
pub use errors::{ReflectError, ReflectResult};
pub use lookup::{create_sorted_vector_of, key_from_value, key_of, lookup_by_key, KeyValue};
pub use object::{pack_table, struct_bytes, unpack_struct, unpack_table};
pub use reflect::Reflector;
pub use value::Value;

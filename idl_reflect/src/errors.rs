/* Errors raised by the reflective runtime */

use thiserror::Error;

/// Result alias used across the reflection crate.
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Contract violations detected while building or reading a buffer.
#[derive(Debug, Error, PartialEq)]
pub enum ReflectError {
    /// A `required` field was never added before the table was finished.
    #[error("table '{table}' is missing required field '{field}'")]
    MissingRequired { table: String, field: String },

    /// A fixed-length array argument has the wrong number of elements.
    #[error("array '{field}' must have exactly {expected} elements, got {actual}")]
    ArrayLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// Fixed structs must be written immediately before the slot that stores them.
    #[error("struct for slot {slot} must be built inline (at offset {expected}, found {actual})")]
    NotInline { slot: u16, expected: u64, actual: u64 },

    /// A value does not match the schema type it is packed as.
    #[error("field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// The value graph names a field the definition does not have.
    #[error("'{entity}' has no field '{field}'")]
    UnknownField { entity: String, field: String },

    /// A union value or enum name that the enum does not declare.
    #[error("'{name}' is not a variant of '{owner}'")]
    UnknownVariant { owner: String, name: String },

    /// A read would run past the end of the buffer.
    #[error("read of {len} bytes at {offset} is out of bounds (buffer is {size} bytes)")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    /// String payload is not valid UTF-8.
    #[error("string at {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: u64 },

    /// Builder calls issued in an order the wire format cannot express.
    #[error("invalid builder state: {0}")]
    BuilderState(&'static str),

    /// File identifiers are exactly four bytes.
    #[error("file identifier '{0}' must be exactly 4 bytes")]
    InvalidIdentifier(String),

    /// The buffer does not start with the expected file identifier.
    #[error("buffer identifier does not match '{expected}'")]
    IdentifierMismatch { expected: String },

    /// The schema declares no root table.
    #[error("schema has no root table")]
    MissingRoot,
}

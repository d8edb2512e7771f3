//! Schema Document Definitions
//!
//! This crate contains the serializable schema document consumed by the
//! generator: definitions, services and the field type-expression grammar.
//! It performs no resolution and no code generation.

pub mod type_expr;
pub mod types;

pub use type_expr::*;
pub use types::*;

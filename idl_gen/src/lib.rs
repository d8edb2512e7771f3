pub mod cmds;
pub mod codegen;
pub mod error;
pub mod flatten;
pub mod layout;
pub mod schema;

pub use error::{GenError, GenResult};

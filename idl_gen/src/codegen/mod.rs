pub mod context;
pub mod csharp;
pub mod options;
pub mod output;

pub use context::EmitContext;
pub use options::GeneratorOptions;
pub use output::{DirectorySink, GeneratedUnit, MemorySink, OutputSink, UnitKind};

use crate::schema::ResolveError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
  /// An entity breaks a layout rule the emitter relies on; only that entity is abandoned
  #[error("contract violation in '{entity}': {reason}")]
  Contract { entity: String, reason: String },

  /// Generated text could not be persisted; aborts the run
  #[error("failed to write '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Resolve(#[from] ResolveError),
}

impl GenError {
  pub fn contract(entity: impl Into<String>, reason: impl Into<String>) -> Self {
    GenError::Contract { entity: entity.into(), reason: reason.into() }
  }
}

pub type GenResult<T> = Result<T, GenError>;

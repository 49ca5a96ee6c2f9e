//! Error types for `redil-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::entity::EntityKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{kind} not found: {id}")]
  NotFound { kind: EntityKind, id: Uuid },

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// The coarse failure classes every store error falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The requested id does not exist.
  NotFound,
  /// The caller supplied data the store refuses (duplicate username, missing
  /// required field, self-referential pair).
  Validation,
  /// The storage layer failed; nothing the caller sent was wrong.
  BackendUnavailable,
}

/// Implemented by every [`crate::store::Store::Error`] so higher layers can
/// map failures without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound { .. } => ErrorKind::NotFound,
      Self::Validation(_) => ErrorKind::Validation,
      Self::Serialization(_) => ErrorKind::BackendUnavailable,
    }
  }
}

impl StoreError for std::convert::Infallible {
  fn kind(&self) -> ErrorKind { match *self {} }
}

//! Error type for `redil-store-sqlite`.

use redil_core::{EntityKind, ErrorKind, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] redil_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("{kind} not found: {id}")]
  NotFound { kind: EntityKind, id: uuid::Uuid },

  #[error("{kind} with {field} {value:?} already exists")]
  Duplicate {
    kind:  EntityKind,
    field: &'static str,
    value: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::NotFound { .. } => ErrorKind::NotFound,
      Error::Duplicate { .. } => ErrorKind::Validation,
      Error::Database(_) | Error::Json(_) | Error::Uuid(_) | Error::DateParse(_) => {
        ErrorKind::BackendUnavailable
      }
    }
  }
}

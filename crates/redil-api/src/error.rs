//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use redil_core::{ErrorKind, StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("invalid: {0}")]
  Invalid(String),

  #[error("store unavailable: {0}")]
  Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Map a store failure onto its HTTP class.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.kind() {
      ErrorKind::NotFound => ApiError::NotFound(e.to_string()),
      ErrorKind::Validation => ApiError::Invalid(e.to_string()),
      ErrorKind::BackendUnavailable => ApiError::Unavailable(Box::new(e)),
    }
  }
}

impl From<redil_core::Error> for ApiError {
  fn from(e: redil_core::Error) -> Self { Self::from_store(e) }
}

/// Read paths fall back to an empty result when the backend is down; the
/// failure is logged and the caller sees nothing rather than an error.
pub fn degrade<T, E>(result: Result<T, E>, what: &str) -> Result<T, ApiError>
where
  T: Default,
  E: StoreError,
{
  match result {
    Ok(value) => Ok(value),
    Err(e) if e.kind() == ErrorKind::BackendUnavailable => {
      tracing::warn!(error = %e, "{what}: store unavailable, returning empty result");
      Ok(T::default())
    }
    Err(e) => Err(ApiError::from_store(e)),
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"redil\""),
      );
    }
    res
  }
}

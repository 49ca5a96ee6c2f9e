//! Password hashing, credential verification, and the HTTP Basic-auth
//! extractor.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use redil_core::{
  Record,
  store::Store,
  user::{Role, Scope, User},
};

use crate::error::ApiError;

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  if password.is_empty() {
    return Err(ApiError::Invalid("password is required".into()));
  }
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Check `password` against a stored PHC string. Unparseable hashes never
/// verify.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

/// Return the active user whose credentials match, or `None`.
pub async fn authenticate<S: Store>(
  store: &S,
  username: &str,
  password: &str,
) -> Result<Option<Record<User>>, S::Error> {
  let Some(user) = store.find_user_by_username(username).await? else {
    return Ok(None);
  };
  if !user.data.is_active || !verify_password(password, &user.data.password_hash) {
    tracing::debug!(%username, "authentication rejected");
    return Ok(None);
  }
  Ok(Some(user))
}

/// Decode `Authorization: Basic …` into `(username, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (username, password) = creds.split_once(':')?;
  Some((username.to_owned(), password.to_owned()))
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The user a request was authenticated as.
pub struct Authenticated(pub Record<User>);

impl Authenticated {
  pub fn user(&self) -> &User { &self.0.data }

  pub fn is_admin(&self) -> bool { self.user().role == Role::Admin }

  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.is_admin() {
      Ok(())
    } else {
      Err(ApiError::Forbidden("administrator role required".into()))
    }
  }

  /// The caller's scope; non-admins without a related entity have none.
  pub fn scope(&self) -> Result<Scope, ApiError> {
    self.user().scope().ok_or_else(|| {
      ApiError::Forbidden(format!(
        "user {} is not attached to any part of the hierarchy",
        self.user().username
      ))
    })
  }
}

impl<S> FromRequestParts<Arc<S>> for Authenticated
where
  S: Store + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let (username, password) =
      basic_credentials(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let user = authenticate(store.as_ref(), &username, &password)
      .await
      .map_err(ApiError::from_store)?
      .ok_or(ApiError::Unauthorized)?;
    Ok(Authenticated(user))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("secret").unwrap();
    assert!(verify_password("secret", &hash));
    assert!(!verify_password("wrong", &hash));
  }

  #[test]
  fn garbage_hash_never_verifies() {
    assert!(!verify_password("secret", "not-a-phc-string"));
  }

  #[test]
  fn empty_password_is_refused() {
    assert!(matches!(hash_password(""), Err(ApiError::Invalid(_))));
  }

  #[test]
  fn basic_header_decodes() {
    let mut headers = HeaderMap::new();
    let value = format!("Basic {}", B64.encode("ana:pa:ss"));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
    assert_eq!(
      basic_credentials(&headers),
      Some(("ana".to_owned(), "pa:ss".to_owned()))
    );
  }

  #[test]
  fn malformed_headers_are_ignored() {
    let mut headers = HeaderMap::new();
    assert_eq!(basic_credentials(&headers), None);
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
    assert_eq!(basic_credentials(&headers), None);
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
    assert_eq!(basic_credentials(&headers), None);
  }
}

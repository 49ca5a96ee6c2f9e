//! Handlers for `/auth/login`, `/me`, and the admin-only `/users` endpoints.
//!
//! Password hashes never leave the server: every response carries a
//! [`UserView`].

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use redil_core::{
  Record,
  store::Store,
  user::{Role, Scope, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  auth::{Authenticated, authenticate, hash_password},
  error::{ApiError, degrade},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
  pub id:                Uuid,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
  pub username:          String,
  pub role:              Role,
  pub related_entity_id: Option<Uuid>,
  pub is_active:         bool,
}

impl From<Record<User>> for UserView {
  fn from(r: Record<User>) -> Self {
    Self {
      id:                r.id,
      created_at:        r.created_at,
      updated_at:        r.updated_at,
      username:          r.data.username,
      role:              r.data.role,
      related_entity_id: r.data.related_entity_id,
      is_active:         r.data.is_active,
    }
  }
}

fn user_not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("user {id} not found")) }

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<UserView>, ApiError>
where
  S: Store + 'static,
{
  let user = authenticate(store.as_ref(), &body.username, &body.password)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(ApiError::Unauthorized)?;
  tracing::info!(username = %user.data.username, "login");
  Ok(Json(user.into()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeView {
  #[serde(flatten)]
  pub user:  UserView,
  pub scope: Option<Scope>,
}

/// `GET /me`
pub async fn me(caller: Authenticated) -> Json<MeView> {
  let scope = caller.user().scope();
  Json(MeView { user: caller.0.into(), scope })
}

// ─── Administration ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserBody {
  pub username:          String,
  pub password:          String,
  pub role:              Role,
  #[serde(default)]
  pub related_entity_id: Option<Uuid>,
  #[serde(default = "active")]
  pub is_active:         bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
  pub role:              Role,
  #[serde(default)]
  pub related_entity_id: Option<Uuid>,
  #[serde(default = "active")]
  pub is_active:         bool,
}

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
  pub password: String,
}

fn active() -> bool { true }

/// `GET /users`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
) -> Result<Json<Vec<UserView>>, ApiError>
where
  S: Store + 'static,
{
  caller.require_admin()?;
  let users = degrade(store.list::<User>().await, "list users")?;
  Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// `POST /users`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Json(body): Json<NewUserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  caller.require_admin()?;
  let user = User {
    username:          body.username,
    password_hash:     hash_password(&body.password)?,
    role:              body.role,
    related_entity_id: body.related_entity_id,
    is_active:         body.is_active,
  };
  let record = store.create(user).await.map_err(ApiError::from_store)?;
  tracing::info!(username = %record.data.username, role = %record.data.role, "user created");
  Ok((StatusCode::CREATED, Json(UserView::from(record))))
}

/// `GET /users/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError>
where
  S: Store + 'static,
{
  caller.require_admin()?;
  let user = store
    .get::<User>(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| user_not_found(id))?;
  Ok(Json(user.into()))
}

/// `PUT /users/{id}`: role, related entity and active flag only.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateUserBody>,
) -> Result<Json<UserView>, ApiError>
where
  S: Store + 'static,
{
  caller.require_admin()?;
  if id == caller.0.id && (body.role != Role::Admin || !body.is_active) {
    return Err(ApiError::BadRequest(
      "administrators cannot demote or deactivate themselves".into(),
    ));
  }
  let mut user = store
    .get::<User>(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| user_not_found(id))?
    .data;
  user.role = body.role;
  user.related_entity_id = body.related_entity_id;
  user.is_active = body.is_active;

  let record = store.update(id, user).await.map_err(ApiError::from_store)?;
  Ok(Json(record.into()))
}

/// `POST /users/{id}/password`
pub async fn set_password<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<PasswordBody>,
) -> Result<StatusCode, ApiError>
where
  S: Store + 'static,
{
  caller.require_admin()?;
  let mut user = store
    .get::<User>(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| user_not_found(id))?
    .data;
  user.password_hash = hash_password(&body.password)?;
  store.update(id, user).await.map_err(ApiError::from_store)?;
  tracing::info!(%id, "password reset");
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /users/{id}`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Store + 'static,
{
  caller.require_admin()?;
  if id == caller.0.id {
    return Err(ApiError::BadRequest("administrators cannot delete themselves".into()));
  }
  store.delete::<User>(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

//! Generic CRUD handlers shared by every hierarchy and people resource.
//!
//! | Method   | Path                 | Notes |
//! |----------|----------------------|-------|
//! | `GET`    | `/<resource>`        | Optional `?parentId=<uuid>` |
//! | `POST`   | `/<resource>`        | Returns 201 + stored record |
//! | `GET`    | `/<resource>/{id}`   | 404 if not found |
//! | `PUT`    | `/<resource>/{id}`   | Full replace; 404 if not found |
//! | `DELETE` | `/<resource>/{id}`   | 204, also when already gone |
//!
//! Non-admins only see records inside their own scope: organisational records
//! by their own position, members, pairs and reports by their small group.
//! They may only write records whose parent lies inside that scope; on update
//! the stored parent must be in scope as well, so records cannot be moved out
//! of (or into) a subtree the caller does not control.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use redil_core::{
  Entity, Record,
  hierarchy::{Descendants, Hierarchy, resolve_scope},
  store::Store,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  auth::Authenticated,
  error::{ApiError, degrade},
};

// ─── Authorization ───────────────────────────────────────────────────────────

/// Check that `caller` may write a record of kind `E` under each of
/// `parents`.
async fn authorize_write<S, E>(
  store: &S,
  caller: &Authenticated,
  parents: &[Option<Uuid>],
) -> Result<(), ApiError>
where
  S: Store,
  E: Entity,
{
  if caller.is_admin() {
    return Ok(());
  }
  let scope = caller.scope()?;
  let Some(level) = E::KIND.parent_level() else {
    return Err(ApiError::Forbidden(format!(
      "only administrators may modify {} records",
      E::KIND
    )));
  };

  let hierarchy = Hierarchy::load(store).await.map_err(ApiError::from_store)?;
  for parent in parents {
    match parent {
      Some(id) if hierarchy.scope_covers(scope, level, *id) => {}
      _ => {
        return Err(ApiError::Forbidden(format!(
          "{} is outside the caller's scope",
          E::KIND
        )));
      }
    }
  }
  Ok(())
}

/// Whether a record lies inside the resolved scope `visible`.
fn in_scope<E: Entity>(visible: &Descendants, record: &Record<E>) -> bool {
  match (E::KIND.hierarchy_level(), E::KIND.parent_level()) {
    (Some(level), _) => visible.at(level).contains(&record.id),
    (None, Some(level)) => record
      .data
      .parent_id()
      .is_some_and(|parent| visible.at(level).contains(&parent)),
    (None, None) => false,
  }
}

/// The ids a non-admin caller may read; `None` for administrators.
async fn readable<S: Store>(
  store: &S,
  caller: &Authenticated,
) -> Result<Option<Descendants>, ApiError> {
  if caller.is_admin() {
    return Ok(None);
  }
  let scope = caller.scope()?;
  let hierarchy = degrade(Hierarchy::load(store).await, "hierarchy")?;
  Ok(Some(resolve_scope(scope, &hierarchy)))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub parent_id: Option<Uuid>,
}

/// `GET /<resource>[?parentId=<uuid>]`
pub async fn list<S, E>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Record<E>>>, ApiError>
where
  S: Store + 'static,
  E: Entity,
{
  let records = match params.parent_id {
    Some(parent_id) => store.list_by_parent::<E>(parent_id).await,
    None => store.list::<E>().await,
  };
  let mut records = degrade(records, "list")?;
  if let Some(visible) = readable(store.as_ref(), &caller).await? {
    records.retain(|r| in_scope(&visible, r));
  }
  Ok(Json(records))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /<resource>/{id}`
pub async fn get_one<S, E>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Record<E>>, ApiError>
where
  S: Store + 'static,
  E: Entity,
{
  let record = store
    .get::<E>(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("{} {id} not found", E::KIND)))?;
  if let Some(visible) = readable(store.as_ref(), &caller).await?
    && !in_scope(&visible, &record)
  {
    return Err(ApiError::Forbidden(format!(
      "{} {id} is outside the caller's scope",
      E::KIND
    )));
  }
  Ok(Json(record))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /<resource>`
pub async fn create<S, E>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Json(body): Json<E>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
  E: Entity,
{
  authorize_write::<S, E>(&store, &caller, &[body.parent_id()]).await?;
  let record = store.create(body).await.map_err(ApiError::from_store)?;
  tracing::info!(kind = %E::KIND, id = %record.id, by = %caller.user().username, "created");
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /<resource>/{id}`
pub async fn update<S, E>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<E>,
) -> Result<Json<Record<E>>, ApiError>
where
  S: Store + 'static,
  E: Entity,
{
  if !caller.is_admin() {
    let existing = store
      .get::<E>(id)
      .await
      .map_err(ApiError::from_store)?
      .ok_or_else(|| ApiError::NotFound(format!("{} {id} not found", E::KIND)))?;
    authorize_write::<S, E>(
      &store,
      &caller,
      &[existing.data.parent_id(), body.parent_id()],
    )
    .await?;
  }
  let record = store.update(id, body).await.map_err(ApiError::from_store)?;
  tracing::info!(kind = %E::KIND, %id, by = %caller.user().username, "updated");
  Ok(Json(record))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /<resource>/{id}`
pub async fn remove<S, E>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Store + 'static,
  E: Entity,
{
  if !caller.is_admin() {
    let existing = store.get::<E>(id).await.map_err(ApiError::from_store)?;
    let Some(existing) = existing else {
      return Ok(StatusCode::NO_CONTENT);
    };
    authorize_write::<S, E>(&store, &caller, &[existing.data.parent_id()]).await?;
  }
  store.delete::<E>(id).await.map_err(ApiError::from_store)?;
  tracing::info!(kind = %E::KIND, %id, by = %caller.user().username, "deleted");
  Ok(StatusCode::NO_CONTENT)
}

//! JSON REST API for Redil.
//!
//! Exposes an axum [`Router`] backed by any [`redil_core::store::Store`].
//! Every route except `POST /auth/login` authenticates with HTTP Basic
//! credentials checked against the stored users. TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", redil_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod entities;
pub mod error;
pub mod hierarchy;
pub mod stats;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use redil_core::{
  Entity,
  org::{Association, Church, District, SmallGroup, Union, Zone},
  people::{Member, MissionaryPair},
  report::WeeklyReport,
  store::Store,
};

pub use error::ApiError;

/// Mount the five CRUD routes for entity kind `E` under `path`.
fn crud<S, E>(router: Router<Arc<S>>, path: &str) -> Router<Arc<S>>
where
  S: Store + 'static,
  E: Entity,
{
  router
    .route(
      path,
      get(entities::list::<S, E>).post(entities::create::<S, E>),
    )
    .route(
      &format!("{path}/{{id}}"),
      get(entities::get_one::<S, E>)
        .put(entities::update::<S, E>)
        .delete(entities::remove::<S, E>),
    )
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: Store + 'static,
{
  let router = Router::new()
    // Session
    .route("/auth/login", post(users::login::<S>))
    .route("/me", get(users::me))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route(
      "/users/{id}",
      get(users::get_one::<S>)
        .put(users::update::<S>)
        .delete(users::remove::<S>),
    )
    .route("/users/{id}/password", post(users::set_password::<S>))
    // Statistics
    .route("/stats/summary", get(stats::summary::<S>))
    .route("/stats/top-groups", get(stats::top_groups::<S>))
    .route("/stats/top-pairs", get(stats::top_pairs::<S>))
    .route("/hierarchy", get(hierarchy::handler::<S>));

  // Entities
  let router = crud::<S, Union>(router, "/unions");
  let router = crud::<S, Association>(router, "/associations");
  let router = crud::<S, Zone>(router, "/zones");
  let router = crud::<S, District>(router, "/districts");
  let router = crud::<S, Church>(router, "/churches");
  let router = crud::<S, SmallGroup>(router, "/small-groups");
  let router = crud::<S, Member>(router, "/members");
  let router = crud::<S, MissionaryPair>(router, "/missionary-pairs");
  let router = crud::<S, WeeklyReport>(router, "/reports");

  router.with_state(store)
}

//! The `Store` trait: CRUD over every entity kind.
//!
//! The trait is implemented by storage backends (e.g. `redil-store-sqlite`).
//! Higher layers (`redil-api`, `redil-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  entity::{Entity, Record},
  error::StoreError,
  user::User,
};

/// Abstraction over a Redil store backend.
///
/// Every method is generic over the [`Entity`] kind it touches. Writes run
/// [`Entity::prepare`] and [`Entity::validate`] before anything is persisted
/// and enforce [`Entity::unique_key`] within the kind.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Store: Send + Sync {
  type Error: StoreError;

  /// All records of kind `E`.
  fn list<E: Entity>(
    &self,
  ) -> impl Future<Output = Result<Vec<Record<E>>, Self::Error>> + Send + '_;

  /// Records of kind `E` whose parent reference equals `parent_id`.
  fn list_by_parent<E: Entity>(
    &self,
    parent_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Record<E>>, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get<E: Entity>(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Record<E>>, Self::Error>> + Send + '_;

  /// Persist a new record and return it with its assigned id.
  fn create<E: Entity>(
    &self,
    data: E,
  ) -> impl Future<Output = Result<Record<E>, Self::Error>> + Send + '_;

  /// Replace the payload of an existing record. Fails with a
  /// [`crate::ErrorKind::NotFound`] error if `id` does not exist.
  fn update<E: Entity>(
    &self,
    id: Uuid,
    data: E,
  ) -> impl Future<Output = Result<Record<E>, Self::Error>> + Send + '_;

  /// Remove a record. Deleting an id that does not exist succeeds.
  /// Children are left in place.
  fn delete<E: Entity>(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Number of records of kind `E`.
  fn count<E: Entity>(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Look a user up by username, ignoring case and surrounding whitespace.
  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Record<User>>, Self::Error>> + Send + 'a;
}

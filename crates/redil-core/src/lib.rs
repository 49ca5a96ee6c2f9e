//! Core types and trait definitions for Redil, the small-group management
//! store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod entity;
pub mod error;
pub mod hierarchy;
pub mod org;
pub mod people;
pub mod report;
pub mod stats;
pub mod store;
pub mod tree;
pub mod user;

pub use entity::{Entity, EntityKind, Record};
pub use error::{Error, ErrorKind, Result, StoreError};

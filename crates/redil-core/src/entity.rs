//! The record envelope and the [`Entity`] trait shared by every stored type.
//!
//! Every persisted value is a [`Record`]: a store-assigned id and timestamps
//! wrapped around the entity's own fields. On the wire the envelope is
//! flattened, so a record serialises as a single camelCase JSON object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Result, org::HierarchyLevel};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Discriminant stored in the `kind` column of the records table.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Union,
  Association,
  Zone,
  District,
  Church,
  SmallGroup,
  Member,
  MissionaryPair,
  WeeklyReport,
  User,
}

impl EntityKind {
  /// The hierarchy level records of this kind sit at, for the six
  /// organisational kinds.
  pub fn hierarchy_level(self) -> Option<HierarchyLevel> {
    match self {
      Self::Union => Some(HierarchyLevel::Union),
      Self::Association => Some(HierarchyLevel::Association),
      Self::Zone => Some(HierarchyLevel::Zone),
      Self::District => Some(HierarchyLevel::District),
      Self::Church => Some(HierarchyLevel::Church),
      Self::SmallGroup => Some(HierarchyLevel::SmallGroup),
      Self::Member | Self::MissionaryPair | Self::WeeklyReport | Self::User => None,
    }
  }

  /// The hierarchy level of this kind's parent reference. `None` for unions
  /// (no parent) and users (whose reference may point at any level).
  pub fn parent_level(self) -> Option<HierarchyLevel> {
    match self {
      Self::Union | Self::User => None,
      Self::Association => Some(HierarchyLevel::Union),
      Self::Zone => Some(HierarchyLevel::Association),
      Self::District => Some(HierarchyLevel::Zone),
      Self::Church => Some(HierarchyLevel::District),
      Self::SmallGroup => Some(HierarchyLevel::Church),
      Self::Member | Self::MissionaryPair | Self::WeeklyReport => {
        Some(HierarchyLevel::SmallGroup)
      }
    }
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A value the store knows how to persist.
///
/// Implementors describe their place in the hierarchy (`parent_id`), which of
/// their fields must be unique per kind, and how to validate themselves.
pub trait Entity:
  Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
  const KIND: EntityKind;

  /// The id of the parent record, if this kind has one.
  fn parent_id(&self) -> Option<Uuid>;

  /// A `(field, value)` pair that must be unique among records of this kind.
  fn unique_key(&self) -> Option<(&'static str, String)> { None }

  /// Reject values that must never reach storage.
  fn validate(&self) -> Result<()> { Ok(()) }

  /// Normalise derived fields before the value is written.
  fn prepare(&mut self) -> Result<()> { Ok(()) }
}

/// Fail with [`crate::Error::Validation`] if `value` is blank.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(crate::Error::Validation(format!("{field} is required")));
  }
  Ok(())
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted entity: store-assigned identity plus the entity payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<E> {
  pub id:         Uuid,
  /// Informational only; never used for ordering.
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(flatten)]
  pub data:       E,
}

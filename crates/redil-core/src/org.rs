//! The organisational hierarchy: Union → Association → Zone → District →
//! Church → SmallGroup.
//!
//! Each level holds a reference to its parent; together they form a strict
//! tree rooted at the unions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  entity::{Entity, EntityKind, require},
};

// ─── Levels ──────────────────────────────────────────────────────────────────

/// A level of the organisational tree, ordered from root to leaf.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HierarchyLevel {
  Union,
  Association,
  Zone,
  District,
  Church,
  SmallGroup,
}

impl HierarchyLevel {
  /// The level directly below this one, if any.
  pub fn child(self) -> Option<Self> {
    match self {
      Self::Union => Some(Self::Association),
      Self::Association => Some(Self::Zone),
      Self::Zone => Some(Self::District),
      Self::District => Some(Self::Church),
      Self::Church => Some(Self::SmallGroup),
      Self::SmallGroup => None,
    }
  }
}

// ─── Goals ───────────────────────────────────────────────────────────────────

/// Count targets tracked for zones and districts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountGoals {
  pub baptisms:     u32,
  pub churches:     u32,
  pub small_groups: u32,
}

/// The period a small-group goal target is measured over.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GoalPeriod {
  Weekly,
  Monthly,
  Quarterly,
  #[default]
  Annual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goal {
  pub target: u32,
  pub period: GoalPeriod,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupGoals {
  pub baptisms:                  Goal,
  pub weekly_attendance_members: Goal,
  pub weekly_attendance_gp:      Goal,
  pub missionary_pairs:          Goal,
  pub friends:                   Goal,
  pub bible_studies:             Goal,
}

// ─── Union ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Union {
  pub name:            String,
  #[serde(default)]
  pub department_head: Option<String>,
}

impl Entity for Union {
  const KIND: EntityKind = EntityKind::Union;

  fn parent_id(&self) -> Option<Uuid> { None }

  fn validate(&self) -> Result<()> { require("name", &self.name) }
}

// ─── Association ─────────────────────────────────────────────────────────────

/// Administrative settings for an association. The administrator's password
/// lives hashed on the matching [`crate::user::User`], never here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssociationConfig {
  pub username:            Option<String>,
  pub annual_baptism_goal: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
  pub union_id:         Uuid,
  pub name:             String,
  #[serde(default)]
  pub department_head:  Option<String>,
  #[serde(default)]
  pub membership_count: u32,
  #[serde(default)]
  pub config:           AssociationConfig,
}

impl Entity for Association {
  const KIND: EntityKind = EntityKind::Association;

  fn parent_id(&self) -> Option<Uuid> { Some(self.union_id) }

  fn validate(&self) -> Result<()> { require("name", &self.name) }
}

// ─── Zone ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
  pub association_id: Uuid,
  pub name:           String,
  #[serde(default)]
  pub director_id:    Option<Uuid>,
  #[serde(default)]
  pub goals:          CountGoals,
}

impl Entity for Zone {
  const KIND: EntityKind = EntityKind::Zone;

  fn parent_id(&self) -> Option<Uuid> { Some(self.association_id) }

  fn validate(&self) -> Result<()> { require("name", &self.name) }
}

// ─── District ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
  pub zone_id:   Uuid,
  pub name:      String,
  #[serde(default)]
  pub pastor_id: Option<Uuid>,
  #[serde(default)]
  pub goals:     CountGoals,
}

impl Entity for District {
  const KIND: EntityKind = EntityKind::District;

  fn parent_id(&self) -> Option<Uuid> { Some(self.zone_id) }

  fn validate(&self) -> Result<()> { require("name", &self.name) }
}

// ─── Church ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Church {
  pub district_id: Uuid,
  pub name:        String,
  #[serde(default)]
  pub address:     Option<String>,
  #[serde(default)]
  pub director_id: Option<Uuid>,
  #[serde(default)]
  pub pastor_id:   Option<Uuid>,
}

impl Entity for Church {
  const KIND: EntityKind = EntityKind::Church;

  fn parent_id(&self) -> Option<Uuid> { Some(self.district_id) }

  fn validate(&self) -> Result<()> { require("name", &self.name) }
}

// ─── SmallGroup ──────────────────────────────────────────────────────────────

/// A GP (grupo pequeño): the leaf unit with members and a weekly meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmallGroup {
  pub church_id:    Uuid,
  pub name:         String,
  #[serde(default)]
  pub motto:        Option<String>,
  #[serde(default)]
  pub verse:        Option<String>,
  #[serde(default)]
  pub meeting_day:  Option<String>,
  /// Free-form local time, e.g. `"19:30"`.
  #[serde(default)]
  pub meeting_time: Option<String>,
  #[serde(default)]
  pub leader_id:    Option<Uuid>,
  #[serde(default)]
  pub goals:        GroupGoals,
}

impl Entity for SmallGroup {
  const KIND: EntityKind = EntityKind::SmallGroup;

  fn parent_id(&self) -> Option<Uuid> { Some(self.church_id) }

  fn validate(&self) -> Result<()> { require("name", &self.name) }
}

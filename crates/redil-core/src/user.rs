//! Users, their roles, and the slice of the hierarchy each role may see.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{Entity, EntityKind, require},
  org::HierarchyLevel,
};

/// The ten roles a user can hold.
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
  strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  Admin,
  Union,
  Association,
  Zone,
  District,
  Pastor,
  Church,
  Director,
  Leader,
  Member,
}

impl Role {
  /// The hierarchy level a user with this role administers, or `None` for
  /// [`Role::Admin`], who sees everything.
  pub fn level(self) -> Option<HierarchyLevel> {
    match self {
      Self::Admin => None,
      Self::Union => Some(HierarchyLevel::Union),
      Self::Association => Some(HierarchyLevel::Association),
      Self::Zone => Some(HierarchyLevel::Zone),
      Self::District | Self::Pastor => Some(HierarchyLevel::District),
      Self::Church | Self::Director => Some(HierarchyLevel::Church),
      Self::Leader | Self::Member => Some(HierarchyLevel::SmallGroup),
    }
  }
}

/// The part of the hierarchy a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
  /// The whole tree.
  All,
  /// One node and everything below it.
  Node { level: HierarchyLevel, id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub username:          String,
  /// argon2 PHC string.
  pub password_hash:     String,
  pub role:              Role,
  /// The hierarchy entity this user administers.
  #[serde(default)]
  pub related_entity_id: Option<Uuid>,
  #[serde(default = "active")]
  pub is_active:         bool,
}

fn active() -> bool { true }

impl User {
  /// The scope this user's dashboards cover. `None` when a non-admin role
  /// has no related entity to anchor it.
  pub fn scope(&self) -> Option<Scope> {
    match self.role.level() {
      None => Some(Scope::All),
      Some(level) => self
        .related_entity_id
        .map(|id| Scope::Node { level, id }),
    }
  }
}

impl Entity for User {
  const KIND: EntityKind = EntityKind::User;

  fn parent_id(&self) -> Option<Uuid> { self.related_entity_id }

  fn unique_key(&self) -> Option<(&'static str, String)> {
    Some(("username", self.username.trim().to_lowercase()))
  }

  fn validate(&self) -> Result<()> {
    require("username", &self.username)?;
    require("passwordHash", &self.password_hash)?;
    if self.role != Role::Admin && self.related_entity_id.is_none() {
      return Err(Error::Validation(format!(
        "role {} requires a relatedEntityId",
        self.role
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  fn user(role: Role, related: Option<Uuid>) -> User {
    User {
      username: "maria".into(),
      password_hash: "$argon2id$stub".into(),
      role,
      related_entity_id: related,
      is_active: true,
    }
  }

  #[test]
  fn there_are_ten_roles() { assert_eq!(Role::iter().count(), 10); }

  #[test]
  fn admin_scope_is_everything() {
    assert_eq!(user(Role::Admin, None).scope(), Some(Scope::All));
  }

  #[test]
  fn pastor_scope_is_their_district() {
    let id = Uuid::new_v4();
    assert_eq!(
      user(Role::Pastor, Some(id)).scope(),
      Some(Scope::Node { level: HierarchyLevel::District, id })
    );
  }

  #[test]
  fn non_admin_without_entity_is_invalid() {
    assert!(user(Role::Leader, None).validate().is_err());
    assert_eq!(user(Role::Leader, None).scope(), None);
  }

  #[test]
  fn usernames_compare_case_insensitively() {
    let mut u = user(Role::Admin, None);
    u.username = " Maria ".into();
    assert_eq!(u.unique_key(), Some(("username", "maria".to_owned())));
  }
}

//! Members of a small group and the missionary pairs formed from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{Entity, EntityKind, require},
};

// ─── Member ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
}

/// A member's function inside their group.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
  #[default]
  Member,
  Friend,
  Leader,
  AssistantLeader,
  Secretary,
  Host,
}

/// Milestones on the path to group leadership. Each is the date it was
/// reached, or `None` while pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadershipProgress {
  pub discipleship_class: Option<NaiveDate>,
  pub leadership_class:   Option<NaiveDate>,
  pub assistant_since:    Option<NaiveDate>,
  pub leader_since:       Option<NaiveDate>,
}

/// Milestones for a friend (non-member) attending the group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FriendProgress {
  pub first_visit:         Option<NaiveDate>,
  pub bible_study_started: Option<NaiveDate>,
  pub decision:            Option<NaiveDate>,
  pub baptism:             Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
  pub gp_id:               Uuid,
  pub first_name:          String,
  pub last_name:           String,
  /// National identity number; unique across all members.
  pub cedula:              String,
  #[serde(default)]
  pub birth_date:          Option<NaiveDate>,
  #[serde(default)]
  pub gender:              Option<Gender>,
  #[serde(default)]
  pub is_baptized:         bool,
  #[serde(default)]
  pub role:                MemberRole,
  #[serde(default)]
  pub leadership_progress: LeadershipProgress,
  #[serde(default)]
  pub friend_progress:     FriendProgress,
}

impl Entity for Member {
  const KIND: EntityKind = EntityKind::Member;

  fn parent_id(&self) -> Option<Uuid> { Some(self.gp_id) }

  fn unique_key(&self) -> Option<(&'static str, String)> {
    Some(("cedula", self.cedula.trim().to_owned()))
  }

  fn validate(&self) -> Result<()> {
    require("firstName", &self.first_name)?;
    require("lastName", &self.last_name)?;
    require("cedula", &self.cedula)
  }
}

// ─── MissionaryPair ──────────────────────────────────────────────────────────

/// Two members of the same group tracked together for bible-study outreach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionaryPair {
  pub gp_id:         Uuid,
  pub member1_id:    Uuid,
  pub member2_id:    Uuid,
  /// Set at creation and kept as stored. Rankings sum the per-report pair
  /// stats instead of reading this counter.
  #[serde(default)]
  pub studies_given: u32,
}

impl Entity for MissionaryPair {
  const KIND: EntityKind = EntityKind::MissionaryPair;

  fn parent_id(&self) -> Option<Uuid> { Some(self.gp_id) }

  fn validate(&self) -> Result<()> {
    if self.member1_id == self.member2_id {
      return Err(Error::Validation(
        "a missionary pair needs two different members".into(),
      ));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn self_pair_is_rejected() {
    let id = Uuid::new_v4();
    let pair = MissionaryPair {
      gp_id:         Uuid::new_v4(),
      member1_id:    id,
      member2_id:    id,
      studies_given: 0,
    };
    assert!(matches!(pair.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn member_unique_key_is_trimmed_cedula() {
    let member = Member {
      gp_id:               Uuid::new_v4(),
      first_name:          "Ana".into(),
      last_name:           "Rojas".into(),
      cedula:              " 1-234-567 ".into(),
      birth_date:          None,
      gender:              Some(Gender::Female),
      is_baptized:         true,
      role:                MemberRole::Leader,
      leadership_progress: LeadershipProgress::default(),
      friend_progress:     FriendProgress::default(),
    };
    assert_eq!(member.unique_key(), Some(("cedula", "1-234-567".to_owned())));
    assert!(member.validate().is_ok());
  }

  #[test]
  fn member_json_uses_camel_case() {
    let json = serde_json::json!({
      "gpId": Uuid::nil(),
      "firstName": "Luis",
      "lastName": "Mora",
      "cedula": "9",
      "leadershipProgress": { "leaderSince": "2023-05-01" }
    });
    let member: Member = serde_json::from_value(json).unwrap();
    assert_eq!(
      member.leadership_progress.leader_since,
      NaiveDate::from_ymd_opt(2023, 5, 1)
    );
    assert_eq!(member.role, MemberRole::Member);
  }
}

//! In-memory snapshot of the organisational tree and the descendant resolver
//! every report is built on.
//!
//! Resolution is a pure function over the snapshot: it follows parent
//! references downward one level at a time. Dangling references and childless
//! roots produce empty sets, never errors.

use std::collections::BTreeSet;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  entity::{Entity, Record},
  org::{Association, Church, District, HierarchyLevel, SmallGroup, Union, Zone},
  store::Store,
  user::Scope,
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Every hierarchy record, loaded once per request.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
  pub unions:       Vec<Record<Union>>,
  pub associations: Vec<Record<Association>>,
  pub zones:        Vec<Record<Zone>>,
  pub districts:    Vec<Record<District>>,
  pub churches:     Vec<Record<Church>>,
  pub small_groups: Vec<Record<SmallGroup>>,
}

/// A borrowed, level-agnostic view of one hierarchy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node<'a> {
  pub level:     HierarchyLevel,
  pub id:        Uuid,
  pub parent_id: Option<Uuid>,
  pub name:      &'a str,
}

impl Hierarchy {
  /// Read all six levels from `store`.
  pub async fn load<S: Store>(store: &S) -> Result<Self, S::Error> {
    Ok(Self {
      unions:       store.list().await?,
      associations: store.list().await?,
      zones:        store.list().await?,
      districts:    store.list().await?,
      churches:     store.list().await?,
      small_groups: store.list().await?,
    })
  }

  /// All records at `level`, in store order.
  pub fn nodes(&self, level: HierarchyLevel) -> Vec<Node<'_>> {
    fn view<'a, E: Entity>(
      level: HierarchyLevel,
      records: &'a [Record<E>],
      name: impl Fn(&'a E) -> &'a str,
    ) -> Vec<Node<'a>> {
      records
        .iter()
        .map(|r| Node {
          level,
          id: r.id,
          parent_id: r.data.parent_id(),
          name: name(&r.data),
        })
        .collect()
    }

    match level {
      HierarchyLevel::Union => view(level, &self.unions, |e| e.name.as_str()),
      HierarchyLevel::Association => view(level, &self.associations, |e| e.name.as_str()),
      HierarchyLevel::Zone => view(level, &self.zones, |e| e.name.as_str()),
      HierarchyLevel::District => view(level, &self.districts, |e| e.name.as_str()),
      HierarchyLevel::Church => view(level, &self.churches, |e| e.name.as_str()),
      HierarchyLevel::SmallGroup => view(level, &self.small_groups, |e| e.name.as_str()),
    }
  }

  pub fn node(&self, level: HierarchyLevel, id: Uuid) -> Option<Node<'_>> {
    self.nodes(level).into_iter().find(|n| n.id == id)
  }

  /// The direct children of a node, in store order.
  pub fn children(&self, level: HierarchyLevel, id: Uuid) -> Vec<Node<'_>> {
    match level.child() {
      Some(child) => self
        .nodes(child)
        .into_iter()
        .filter(|n| n.parent_id == Some(id))
        .collect(),
      None => Vec::new(),
    }
  }

  /// Whether `scope` includes the node `(level, id)`.
  pub fn scope_covers(&self, scope: Scope, level: HierarchyLevel, id: Uuid) -> bool {
    resolve_scope(scope, self).at(level).contains(&id)
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Ids reachable from a root, grouped by level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Descendants {
  pub union_ids:       BTreeSet<Uuid>,
  pub association_ids: BTreeSet<Uuid>,
  pub zone_ids:        BTreeSet<Uuid>,
  pub district_ids:    BTreeSet<Uuid>,
  pub church_ids:      BTreeSet<Uuid>,
  pub gp_ids:          BTreeSet<Uuid>,
}

impl Descendants {
  pub fn at(&self, level: HierarchyLevel) -> &BTreeSet<Uuid> {
    match level {
      HierarchyLevel::Union => &self.union_ids,
      HierarchyLevel::Association => &self.association_ids,
      HierarchyLevel::Zone => &self.zone_ids,
      HierarchyLevel::District => &self.district_ids,
      HierarchyLevel::Church => &self.church_ids,
      HierarchyLevel::SmallGroup => &self.gp_ids,
    }
  }

  fn at_mut(&mut self, level: HierarchyLevel) -> &mut BTreeSet<Uuid> {
    match level {
      HierarchyLevel::Union => &mut self.union_ids,
      HierarchyLevel::Association => &mut self.association_ids,
      HierarchyLevel::Zone => &mut self.zone_ids,
      HierarchyLevel::District => &mut self.district_ids,
      HierarchyLevel::Church => &mut self.church_ids,
      HierarchyLevel::SmallGroup => &mut self.gp_ids,
    }
  }
}

/// Collect the ids below `(level, root_id)`.
///
/// The root itself is included in its own level's set; levels above the root
/// stay empty.
pub fn resolve_descendants(
  level: HierarchyLevel,
  root_id: Uuid,
  hierarchy: &Hierarchy,
) -> Descendants {
  let mut out = Descendants::default();
  out.at_mut(level).insert(root_id);

  let mut current = level;
  while let Some(child) = current.child() {
    let parents = out.at(current);
    let ids: BTreeSet<Uuid> = hierarchy
      .nodes(child)
      .into_iter()
      .filter(|n| n.parent_id.is_some_and(|p| parents.contains(&p)))
      .map(|n| n.id)
      .collect();
    *out.at_mut(child) = ids;
    current = child;
  }

  out
}

/// [`resolve_descendants`] generalised to a [`Scope`]; `Scope::All` yields
/// every id at every level.
pub fn resolve_scope(scope: Scope, hierarchy: &Hierarchy) -> Descendants {
  match scope {
    Scope::Node { level, id } => resolve_descendants(level, id, hierarchy),
    Scope::All => {
      let mut out = Descendants::default();
      let mut level = Some(HierarchyLevel::Union);
      while let Some(current) = level {
        *out.at_mut(current) =
          hierarchy.nodes(current).into_iter().map(|n| n.id).collect();
        level = current.child();
      }
      out
    }
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use chrono::Utc;

  use super::*;
  use crate::org::{CountGoals, GroupGoals};

  pub fn record<E>(data: E) -> Record<E> {
    let now = Utc::now();
    Record { id: Uuid::new_v4(), created_at: now, updated_at: now, data }
  }

  /// Ids of one zone → district → church → small group chain.
  pub struct Chain {
    pub zone:     Uuid,
    pub district: Uuid,
    pub church:   Uuid,
    pub gp:       Uuid,
  }

  impl Hierarchy {
    pub fn push_union(&mut self, name: &str) -> Uuid {
      let r = record(Union { name: name.into(), department_head: None });
      let id = r.id;
      self.unions.push(r);
      id
    }

    pub fn push_association(&mut self, union_id: Uuid, name: &str) -> Uuid {
      let r = record(Association {
        union_id,
        name: name.into(),
        department_head: None,
        membership_count: 0,
        config: Default::default(),
      });
      let id = r.id;
      self.associations.push(r);
      id
    }

    pub fn push_zone(&mut self, association_id: Uuid, name: &str) -> Uuid {
      let r = record(Zone {
        association_id,
        name: name.into(),
        director_id: None,
        goals: CountGoals::default(),
      });
      let id = r.id;
      self.zones.push(r);
      id
    }

    pub fn push_district(&mut self, zone_id: Uuid, name: &str) -> Uuid {
      let r = record(District {
        zone_id,
        name: name.into(),
        pastor_id: None,
        goals: CountGoals::default(),
      });
      let id = r.id;
      self.districts.push(r);
      id
    }

    pub fn push_church(&mut self, district_id: Uuid, name: &str) -> Uuid {
      let r = record(Church {
        district_id,
        name: name.into(),
        address: None,
        director_id: None,
        pastor_id: None,
      });
      let id = r.id;
      self.churches.push(r);
      id
    }

    pub fn push_gp(&mut self, church_id: Uuid, name: &str) -> Uuid {
      let r = record(SmallGroup {
        church_id,
        name: name.into(),
        motto: None,
        verse: None,
        meeting_day: None,
        meeting_time: None,
        leader_id: None,
        goals: GroupGoals::default(),
      });
      let id = r.id;
      self.small_groups.push(r);
      id
    }

    /// Append a full chain under `association_id`.
    pub fn push_chain(&mut self, association_id: Uuid, tag: &str) -> Chain {
      let zone = self.push_zone(association_id, &format!("Zone {tag}"));
      let district = self.push_district(zone, &format!("District {tag}"));
      let church = self.push_church(district, &format!("Church {tag}"));
      let gp = self.push_gp(church, &format!("GP {tag}"));
      Chain { zone, district, church, gp }
    }
  }
}

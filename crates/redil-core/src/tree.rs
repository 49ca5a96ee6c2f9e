//! Nested hierarchy trees and the expand/collapse state of a tree view.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  hierarchy::{Hierarchy, Node},
  org::HierarchyLevel,
  user::Scope,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
  pub level:    HierarchyLevel,
  pub id:       Uuid,
  pub name:     String,
  pub children: Vec<TreeNode>,
}

/// Build the tree visible to `scope`: every union for [`Scope::All`], or the
/// single scoped node (if it exists) with everything below it.
pub fn build(hierarchy: &Hierarchy, scope: Scope) -> Vec<TreeNode> {
  let roots = match scope {
    Scope::All => hierarchy.nodes(HierarchyLevel::Union),
    Scope::Node { level, id } => hierarchy.node(level, id).into_iter().collect(),
  };
  roots.into_iter().map(|n| subtree(hierarchy, n)).collect()
}

fn subtree(hierarchy: &Hierarchy, node: Node<'_>) -> TreeNode {
  TreeNode {
    level:    node.level,
    id:       node.id,
    name:     node.name.to_owned(),
    children: hierarchy
      .children(node.level, node.id)
      .into_iter()
      .map(|child| subtree(hierarchy, child))
      .collect(),
  }
}

// ─── Expansion state ─────────────────────────────────────────────────────────

/// The set of node ids whose children a view currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpansionState {
  expanded: BTreeSet<Uuid>,
}

impl ExpansionState {
  pub fn is_expanded(&self, id: Uuid) -> bool { self.expanded.contains(&id) }

  /// Flip a node and return whether it is now expanded.
  pub fn toggle(&mut self, id: Uuid) -> bool {
    if self.expanded.remove(&id) {
      false
    } else {
      self.expanded.insert(id);
      true
    }
  }

  pub fn expand(&mut self, id: Uuid) { self.expanded.insert(id); }

  pub fn collapse(&mut self, id: Uuid) { self.expanded.remove(&id); }

  /// Expand every node in `nodes` that has children.
  pub fn expand_all(&mut self, nodes: &[TreeNode]) {
    for node in nodes {
      if !node.children.is_empty() {
        self.expanded.insert(node.id);
        self.expand_all(&node.children);
      }
    }
  }

  pub fn collapse_all(&mut self) { self.expanded.clear(); }
}

impl FromIterator<Uuid> for ExpansionState {
  fn from_iter<I: IntoIterator<Item = Uuid>>(iter: I) -> Self {
    Self { expanded: iter.into_iter().collect() }
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One line of a rendered tree view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow<'a> {
  pub depth:        usize,
  pub level:        HierarchyLevel,
  pub id:           Uuid,
  pub name:         &'a str,
  pub has_children: bool,
  pub expanded:     bool,
}

/// Flatten `nodes` into display order, descending only into expanded nodes.
pub fn visible_rows<'a>(
  nodes: &'a [TreeNode],
  state: &ExpansionState,
) -> Vec<TreeRow<'a>> {
  let mut rows = Vec::new();
  push_rows(nodes, state, 0, &mut rows);
  rows
}

fn push_rows<'a>(
  nodes: &'a [TreeNode],
  state: &ExpansionState,
  depth: usize,
  rows: &mut Vec<TreeRow<'a>>,
) {
  for node in nodes {
    let expanded = state.is_expanded(node.id);
    rows.push(TreeRow {
      depth,
      level: node.level,
      id: node.id,
      name: &node.name,
      has_children: !node.children.is_empty(),
      expanded,
    });
    if expanded {
      push_rows(&node.children, state, depth + 1, rows);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> (Hierarchy, Uuid, Uuid) {
    let mut h = Hierarchy::default();
    let u = h.push_union("Union");
    let a = h.push_association(u, "Assoc");
    h.push_chain(a, "1");
    h.push_chain(a, "2");
    (h, u, a)
  }

  #[test]
  fn build_nests_all_six_levels() {
    let (h, _, _) = sample();
    let tree = build(&h, Scope::All);
    assert_eq!(tree.len(), 1);
    let zones = &tree[0].children[0].children;
    assert_eq!(zones.len(), 2);
    let gp = &zones[0].children[0].children[0].children[0];
    assert_eq!(gp.level, HierarchyLevel::SmallGroup);
    assert!(gp.children.is_empty());
  }

  #[test]
  fn build_for_missing_node_is_empty() {
    let (h, _, _) = sample();
    let scope = Scope::Node { level: HierarchyLevel::Zone, id: Uuid::new_v4() };
    assert!(build(&h, scope).is_empty());
  }

  #[test]
  fn collapsed_tree_shows_roots_only() {
    let (h, _, _) = sample();
    let tree = build(&h, Scope::All);
    let rows = visible_rows(&tree, &ExpansionState::default());
    assert_eq!(rows.len(), 1);
    assert!(rows[0].has_children);
    assert!(!rows[0].expanded);
  }

  #[test]
  fn expanding_reveals_one_level_at_a_time() {
    let (h, u, a) = sample();
    let tree = build(&h, Scope::All);
    let mut state = ExpansionState::default();

    assert!(state.toggle(u));
    let rows = visible_rows(&tree, &state);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].depth, 1);

    state.expand(a);
    assert_eq!(visible_rows(&tree, &state).len(), 4);

    assert!(!state.toggle(u));
    assert_eq!(visible_rows(&tree, &state).len(), 1);
  }

  #[test]
  fn expand_all_then_collapse_all() {
    let (h, _, _) = sample();
    let tree = build(&h, Scope::All);
    let mut state = ExpansionState::default();

    state.expand_all(&tree);
    // union + assoc + 2 × (zone, district, church, gp)
    assert_eq!(visible_rows(&tree, &state).len(), 10);

    state.collapse_all();
    assert_eq!(visible_rows(&tree, &state).len(), 1);
  }
}

//! Interactive tree-browser state and key dispatch.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use redil_core::{
  stats::ScopeSummary,
  tree::{ExpansionState, TreeNode, TreeRow, visible_rows},
};
use uuid::Uuid;

use crate::client::{ApiClient, StatsQuery};

/// What the caller should do after a key has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Continue,
  Quit,
  /// Fetch the summary for the node under the cursor.
  LoadSummary,
}

// ─── App ─────────────────────────────────────────────────────────────────────

pub struct App {
  /// The hierarchy visible to the logged-in user.
  pub nodes: Vec<TreeNode>,

  pub expansion: ExpansionState,

  /// Index into the visible rows.
  pub cursor: usize,

  /// Date range applied to every summary request.
  pub query: StatsQuery,

  /// Summary for [`App::summary_for`], once loaded.
  pub summary: Option<ScopeSummary>,
  pub summary_for: Option<Uuid>,

  pub filter: String,
  pub filter_active: bool,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(client: ApiClient, query: StatsQuery) -> Self {
    Self {
      nodes: Vec::new(),
      expansion: ExpansionState::default(),
      cursor: 0,
      query,
      summary: None,
      summary_for: None,
      filter: String::new(),
      filter_active: false,
      status_msg: String::new(),
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  pub async fn load_tree(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading hierarchy…".into();
    match self.client.hierarchy().await {
      Ok(nodes) => {
        self.nodes = nodes;
        self.cursor = 0;
        self.status_msg.clear();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  async fn load_summary(&mut self) {
    let Some((level, id)) = self.cursor_row().map(|r| (r.level, r.id)) else {
      return;
    };
    self.status_msg = "Loading summary…".into();
    match self.client.summary(&self.query.at(level, id)).await {
      Ok(summary) => {
        self.summary = Some(summary);
        self.summary_for = Some(id);
        self.status_msg.clear();
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  // ── Rows ──────────────────────────────────────────────────────────────────

  pub fn rows(&self) -> Vec<TreeRow<'_>> { visible_rows(&self.nodes, &self.expansion) }

  pub fn cursor_row(&self) -> Option<TreeRow<'_>> { self.rows().get(self.cursor).copied() }

  /// Display name of the node whose summary is shown.
  pub fn summary_name(&self) -> Option<&str> {
    let id = self.summary_for?;
    find_path(&self.nodes, id).and_then(|path| path.last().map(|n| n.name.as_str()))
  }

  fn clamp_cursor(&mut self) {
    let len = self.rows().len();
    self.cursor = self.cursor.min(len.saturating_sub(1));
  }

  fn move_to(&mut self, id: Uuid) {
    if let Some(i) = self.rows().iter().position(|r| r.id == id) {
      self.cursor = i;
    }
  }

  /// Collapse the node under the cursor, or step to its parent if it is
  /// already collapsed.
  fn collapse_or_parent(&mut self) {
    let rows = self.rows();
    let Some(row) = rows.get(self.cursor) else { return };
    let (id, expanded) = (row.id, row.expanded);
    let parent = rows[..self.cursor]
      .iter()
      .rposition(|r| r.depth + 1 == row.depth);

    if expanded {
      self.expansion.collapse(id);
    } else if let Some(parent) = parent {
      self.cursor = parent;
    }
  }

  /// Id of the node under the cursor, if it has children to show.
  fn cursor_parent_id(&self) -> Option<Uuid> {
    self.cursor_row().filter(|r| r.has_children).map(|r| r.id)
  }

  /// Expand every ancestor of the best fuzzy match for the filter and put
  /// the cursor on it.
  pub fn jump_to_match(&mut self) -> bool {
    let matcher = SkimMatcherV2::default();
    let mut best: Option<(i64, Uuid)> = None;
    for_each_node(&self.nodes, &mut |node| {
      if let Some(score) = matcher.fuzzy_match(&node.name, &self.filter)
        && best.is_none_or(|(b, _)| score > b)
      {
        best = Some((score, node.id));
      }
    });

    let Some((_, id)) = best else { return false };
    if let Some(path) = find_path(&self.nodes, id) {
      for ancestor in &path[..path.len() - 1] {
        self.expansion.expand(ancestor.id);
      }
    }
    self.move_to(id);
    true
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match self.apply_key(key) {
      Action::Quit => Ok(false),
      Action::LoadSummary => {
        self.load_summary().await;
        Ok(true)
      }
      Action::Continue => Ok(true),
    }
  }

  /// Apply a key to the local state without touching the network.
  pub fn apply_key(&mut self, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Action::Quit;
    }
    if self.filter_active {
      return self.apply_filter_key(key);
    }

    match key.code {
      KeyCode::Char('q') => return Action::Quit,

      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.rows().len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),

      KeyCode::Char(' ') => {
        if let Some(id) = self.cursor_parent_id() {
          self.expansion.toggle(id);
        }
      }
      KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_parent_id() {
          self.expansion.expand(id);
        }
      }
      KeyCode::Left | KeyCode::Char('h') => self.collapse_or_parent(),

      KeyCode::Char('e') => self.expansion.expand_all(&self.nodes),
      KeyCode::Char('c') => {
        let id = self.cursor_row().map(|r| r.id);
        self.expansion.collapse_all();
        self.cursor = 0;
        // Stay on the same root if the cursor was on one.
        if let Some(id) = id {
          self.move_to(id);
        }
      }

      KeyCode::Enter => return Action::LoadSummary,

      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
      }
      _ => {}
    }
    self.clamp_cursor();
    Action::Continue
  }

  fn apply_filter_key(&mut self, key: KeyEvent) -> Action {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
      }
      KeyCode::Enter => {
        self.filter_active = false;
        if !self.jump_to_match() {
          self.status_msg = format!("no match for {:?}", self.filter);
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
      }
      KeyCode::Char(c) => self.filter.push(c),
      _ => {}
    }
    Action::Continue
  }
}

// ─── Tree helpers ────────────────────────────────────────────────────────────

fn for_each_node<'a>(nodes: &'a [TreeNode], f: &mut impl FnMut(&'a TreeNode)) {
  for node in nodes {
    f(node);
    for_each_node(&node.children, f);
  }
}

/// The chain of nodes from a root down to `id`, inclusive.
fn find_path(nodes: &[TreeNode], id: Uuid) -> Option<Vec<&TreeNode>> {
  for node in nodes {
    if node.id == id {
      return Some(vec![node]);
    }
    if let Some(mut path) = find_path(&node.children, id) {
      path.insert(0, node);
      return Some(path);
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use redil_core::org::HierarchyLevel;

  use super::*;
  use crate::client::ApiConfig;

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  fn node(level: HierarchyLevel, name: &str, children: Vec<TreeNode>) -> TreeNode {
    TreeNode { level, id: Uuid::new_v4(), name: name.into(), children }
  }

  /// Zone Norte → District Centro → {Church Betania, Church Shalom}
  fn app() -> App {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://localhost".into(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap();
    let mut app = App::new(client, StatsQuery::default());
    app.nodes = vec![node(
      HierarchyLevel::Zone,
      "Norte",
      vec![node(
        HierarchyLevel::District,
        "Centro",
        vec![
          node(HierarchyLevel::Church, "Betania", vec![]),
          node(HierarchyLevel::Church, "Shalom", vec![]),
        ],
      )],
    )];
    app
  }

  #[test]
  fn space_toggles_the_node_under_the_cursor() {
    let mut app = app();
    assert_eq!(app.rows().len(), 1);
    app.apply_key(key(KeyCode::Char(' ')));
    assert_eq!(app.rows().len(), 2);
    app.apply_key(key(KeyCode::Char(' ')));
    assert_eq!(app.rows().len(), 1);
  }

  #[test]
  fn cursor_stays_inside_the_visible_rows() {
    let mut app = app();
    app.apply_key(key(KeyCode::Down));
    assert_eq!(app.cursor, 0);
    app.apply_key(key(KeyCode::Char('e')));
    for _ in 0..10 {
      app.apply_key(key(KeyCode::Down));
    }
    assert_eq!(app.cursor, 3);
    app.apply_key(key(KeyCode::Char('c')));
    assert_eq!(app.rows().len(), 1);
    assert_eq!(app.cursor, 0);
  }

  #[test]
  fn left_collapses_then_climbs_to_the_parent() {
    let mut app = app();
    app.apply_key(key(KeyCode::Char('e')));
    app.cursor = 2; // Betania
    app.apply_key(key(KeyCode::Left));
    assert_eq!(app.cursor, 1); // Centro
    app.apply_key(key(KeyCode::Left));
    assert_eq!(app.rows().len(), 2);
    assert_eq!(app.cursor, 1);
  }

  #[test]
  fn filter_expands_ancestors_of_the_match() {
    let mut app = app();
    app.apply_key(key(KeyCode::Char('/')));
    for c in "shal".chars() {
      app.apply_key(key(KeyCode::Char(c)));
    }
    assert!(app.filter_active);
    app.apply_key(key(KeyCode::Enter));

    assert!(!app.filter_active);
    assert_eq!(app.cursor_row().unwrap().name, "Shalom");
    assert_eq!(app.rows().len(), 4);
  }

  #[test]
  fn enter_requests_a_summary_and_q_quits() {
    let mut app = app();
    assert_eq!(app.apply_key(key(KeyCode::Enter)), Action::LoadSummary);
    assert_eq!(app.apply_key(key(KeyCode::Char('q'))), Action::Quit);
  }
}

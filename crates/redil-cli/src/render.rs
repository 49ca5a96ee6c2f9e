//! Plain-text rendering for the non-interactive subcommands.

use std::fmt::Write as _;

use redil_core::{
  stats::{GroupScore, MonthRange, PairScore, ScopeSummary, Totals},
  tree::TreeRow,
};

/// `2024-01-01 – 2024-03-31`; the range end is exclusive, so the last day
/// shown is the one before it.
pub fn range_label(range: &MonthRange) -> String {
  let last = range.end.pred_opt().unwrap_or(range.end);
  format!("{} – {}", range.start, last)
}

fn totals_line(t: &Totals) -> String {
  format!(
    "attendance {:>5}  studies {:>4}  guests {:>4}  baptisms {:>3}",
    t.total_attendance, t.total_studies, t.total_guests, t.total_baptisms
  )
}

pub fn summary(s: &ScopeSummary) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}", range_label(&s.range));
  let _ = writeln!(out, "{}", totals_line(&s.totals));
  if s.breakdown.is_empty() {
    return out;
  }

  let width = s.breakdown.iter().map(|c| c.name.chars().count()).max().unwrap_or(0);
  out.push('\n');
  for child in &s.breakdown {
    let _ = writeln!(
      out,
      "  {:<width$}  {}",
      child.name,
      totals_line(&child.totals)
    );
  }
  out
}

pub fn groups(ranked: &[GroupScore]) -> String {
  if ranked.is_empty() {
    return "no small groups in scope\n".into();
  }
  let width = ranked.iter().map(|g| g.name.chars().count()).max().unwrap_or(0);
  let mut out = String::new();
  for (i, g) in ranked.iter().enumerate() {
    let _ = writeln!(
      out,
      "{:>2}. {:<width$}  score {:>5}  {}",
      i + 1,
      g.name,
      g.score,
      totals_line(&g.totals)
    );
  }
  out
}

pub fn pairs(ranked: &[PairScore]) -> String {
  if ranked.is_empty() {
    return "no missionary pairs in scope\n".into();
  }
  let mut out = String::new();
  for (i, p) in ranked.iter().enumerate() {
    let _ = writeln!(
      out,
      "{:>2}. {}  studies {:>4}  ({} + {})",
      i + 1,
      p.pair_id,
      p.studies_given,
      p.member1_id,
      p.member2_id
    );
  }
  out
}

/// The expand marker shown in front of a tree row.
pub fn marker(row: &TreeRow<'_>) -> &'static str {
  match (row.has_children, row.expanded) {
    (false, _) => "  ",
    (true, false) => "▸ ",
    (true, true) => "▾ ",
  }
}

pub fn tree(rows: &[TreeRow<'_>]) -> String {
  let mut out = String::new();
  for row in rows {
    let _ = writeln!(
      out,
      "{}{}{}  [{}] {}",
      "  ".repeat(row.depth),
      marker(row),
      row.name,
      row.level,
      row.id
    );
  }
  out
}

#[cfg(test)]
mod tests {
  use redil_core::{
    org::HierarchyLevel,
    stats::ChildTotals,
    tree::{ExpansionState, TreeNode, visible_rows},
    user::Scope,
  };
  use uuid::Uuid;

  use super::*;

  fn node(level: HierarchyLevel, name: &str, children: Vec<TreeNode>) -> TreeNode {
    TreeNode { level, id: Uuid::new_v4(), name: name.into(), children }
  }

  #[test]
  fn range_label_shows_the_last_included_day() {
    let range = MonthRange::new(1, 2024, 2, 2024).unwrap();
    assert_eq!(range_label(&range), "2024-01-01 – 2024-02-29");
  }

  #[test]
  fn summary_lists_each_child() {
    let totals = Totals { total_attendance: 15, total_studies: 2, total_guests: 1, total_baptisms: 0 };
    let s = ScopeSummary {
      scope:     Scope::All,
      range:     MonthRange::new(1, 2024, 1, 2024).unwrap(),
      totals,
      breakdown: vec![ChildTotals {
        level: HierarchyLevel::Union,
        id: Uuid::new_v4(),
        name: "Norte".into(),
        totals,
      }],
    };
    let text = summary(&s);
    assert!(text.starts_with("2024-01-01 – 2024-01-31\n"));
    assert!(text.contains("attendance    15"));
    assert!(text.contains("  Norte  attendance"));
  }

  #[test]
  fn empty_rankings_say_so() {
    assert_eq!(groups(&[]), "no small groups in scope\n");
    assert_eq!(pairs(&[]), "no missionary pairs in scope\n");
  }

  #[test]
  fn tree_indents_expanded_children() {
    let gp = node(HierarchyLevel::SmallGroup, "Betel", vec![]);
    let church = node(HierarchyLevel::Church, "Central", vec![gp]);
    let state: ExpansionState = [church.id].into_iter().collect();
    let nodes = vec![church];

    let text = tree(&visible_rows(&nodes, &state));
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("▾ Central  [church]"));
    assert!(lines[1].starts_with("    Betel  [small_group]"));
  }
}

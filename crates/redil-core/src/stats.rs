//! Report statistics: month-range filtering, summation, and Top-N ranking.
//!
//! Everything here is a pure pass over records that are already in memory.
//! Callers resolve the relevant small groups with
//! [`crate::hierarchy::resolve_scope`] first, then narrow the reports by date,
//! then reduce.

use std::{
  cmp::Reverse,
  collections::{BTreeSet, HashMap},
  iter::Sum,
  ops::{Add, AddAssign},
};

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::Record,
  hierarchy::{Hierarchy, resolve_descendants, resolve_scope},
  org::HierarchyLevel,
  people::MissionaryPair,
  report::WeeklyReport,
  user::Scope,
};

// ─── Month range ─────────────────────────────────────────────────────────────

/// A half-open date range `[start, end)` built from whole months: `start` is
/// the first day of the start month and `end` the first day after the end
/// month, so the end month is fully included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRange {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl MonthRange {
  pub fn new(
    start_month: u32,
    start_year: i32,
    end_month: u32,
    end_year: i32,
  ) -> Result<Self> {
    let start = first_of_month(start_year, start_month)?;
    let end = first_of_month(end_year, end_month)?
      .checked_add_months(Months::new(1))
      .ok_or_else(|| Error::Validation(format!("year {end_year} is out of range")))?;
    Ok(Self { start, end })
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && date < self.end
  }

  /// Keep the reports dated inside the range. Reports whose date does not
  /// parse are dropped.
  pub fn filter<'a, I>(&self, reports: I) -> Vec<&'a Record<WeeklyReport>>
  where
    I: IntoIterator<Item = &'a Record<WeeklyReport>>,
  {
    reports
      .into_iter()
      .filter(|r| r.data.parsed_date().is_some_and(|d| self.contains(d)))
      .collect()
  }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
  NaiveDate::from_ymd_opt(year, month, 1)
    .ok_or_else(|| Error::Validation(format!("invalid month {year}-{month:02}")))
}

/// Select reports dated from the first day of `start_month/start_year` up to
/// and including the last day of `end_month/end_year`.
pub fn filter_reports_by_range<'a, I>(
  reports: I,
  start_month: u32,
  start_year: i32,
  end_month: u32,
  end_year: i32,
) -> Result<Vec<&'a Record<WeeklyReport>>>
where
  I: IntoIterator<Item = &'a Record<WeeklyReport>>,
{
  let range = MonthRange::new(start_month, start_year, end_month, end_year)?;
  Ok(range.filter(reports))
}

// ─── Totals ──────────────────────────────────────────────────────────────────

/// Summed report counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
  pub total_attendance: u64,
  pub total_studies:    u64,
  pub total_guests:     u64,
  pub total_baptisms:   u64,
}

impl Totals {
  /// Read one report's stored summary. A missing summary counts as zero and
  /// a missing summary `baptisms` falls back to the report's own field.
  pub fn of_report(report: &WeeklyReport) -> Self {
    let summary = report.summary.clone().unwrap_or_default();
    Self {
      total_attendance: summary.total_attendance.into(),
      total_studies:    summary.total_studies.into(),
      total_guests:     summary.total_guests.into(),
      total_baptisms:   summary.baptisms.unwrap_or(report.baptisms).into(),
    }
  }
}

impl Add for Totals {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      total_attendance: self.total_attendance + rhs.total_attendance,
      total_studies:    self.total_studies + rhs.total_studies,
      total_guests:     self.total_guests + rhs.total_guests,
      total_baptisms:   self.total_baptisms + rhs.total_baptisms,
    }
  }
}

impl AddAssign for Totals {
  fn add_assign(&mut self, rhs: Self) { *self = *self + rhs; }
}

impl Sum for Totals {
  fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
    iter.fold(Self::default(), Add::add)
  }
}

/// Sum the stored summaries of `reports`.
pub fn aggregate<'a, I>(reports: I) -> Totals
where
  I: IntoIterator<Item = &'a Record<WeeklyReport>>,
{
  reports.into_iter().map(|r| Totals::of_report(&r.data)).sum()
}

/// Sum the reports filed by any small group in `gp_ids`.
pub fn aggregate_groups<'a, I>(reports: I, gp_ids: &BTreeSet<Uuid>) -> Totals
where
  I: IntoIterator<Item = &'a Record<WeeklyReport>>,
{
  aggregate(reports.into_iter().filter(|r| gp_ids.contains(&r.data.gp_id)))
}

/// Sum the reports filed anywhere inside `scope`.
pub fn aggregate_scope(
  hierarchy: &Hierarchy,
  reports: &[&Record<WeeklyReport>],
  scope: Scope,
) -> Totals {
  let gp_ids = resolve_scope(scope, hierarchy).gp_ids;
  aggregate_groups(reports.iter().copied(), &gp_ids)
}

/// Totals for one direct child of the node being summarised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildTotals {
  pub level:  HierarchyLevel,
  pub id:     Uuid,
  pub name:   String,
  pub totals: Totals,
}

/// Per-child totals for the direct children of `(level, id)`, in store order.
pub fn breakdown(
  hierarchy: &Hierarchy,
  reports: &[&Record<WeeklyReport>],
  level: HierarchyLevel,
  id: Uuid,
) -> Vec<ChildTotals> {
  hierarchy
    .children(level, id)
    .into_iter()
    .map(|child| {
      let gp_ids = resolve_descendants(child.level, child.id, hierarchy).gp_ids;
      ChildTotals {
        level:  child.level,
        id:     child.id,
        name:   child.name.to_owned(),
        totals: aggregate_groups(reports.iter().copied(), &gp_ids),
      }
    })
    .collect()
}

/// Per-root totals for [`Scope::All`]: one row for each union.
pub fn breakdown_scope(
  hierarchy: &Hierarchy,
  reports: &[&Record<WeeklyReport>],
  scope: Scope,
) -> Vec<ChildTotals> {
  match scope {
    Scope::Node { level, id } => breakdown(hierarchy, reports, level, id),
    Scope::All => hierarchy
      .nodes(HierarchyLevel::Union)
      .into_iter()
      .map(|union| {
        let gp_ids = resolve_descendants(union.level, union.id, hierarchy).gp_ids;
        ChildTotals {
          level:  union.level,
          id:     union.id,
          name:   union.name.to_owned(),
          totals: aggregate_groups(reports.iter().copied(), &gp_ids),
        }
      })
      .collect(),
  }
}

/// The summary a dashboard shows for one scope and date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSummary {
  pub scope:     Scope,
  pub range:     MonthRange,
  pub totals:    Totals,
  pub breakdown: Vec<ChildTotals>,
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

/// Weighted activity score: attendance + 2×guests + 3×studies.
pub fn score(totals: &Totals) -> u64 {
  totals.total_attendance + 2 * totals.total_guests + 3 * totals.total_studies
}

pub trait Scored {
  fn score(&self) -> u64;
}

/// Sort by descending score and keep the first `n`. Equal scores keep their
/// input order.
pub fn rank_top<T: Scored>(mut items: Vec<T>, n: usize) -> Vec<T> {
  items.sort_by_key(|item| Reverse(item.score()));
  items.truncate(n);
  items
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupScore {
  pub gp_id:  Uuid,
  pub name:   String,
  pub totals: Totals,
  pub score:  u64,
}

impl Scored for GroupScore {
  fn score(&self) -> u64 { self.score }
}

/// Score every small group in `gp_ids` from its own reports and return the
/// top `n`.
pub fn rank_groups(
  hierarchy: &Hierarchy,
  reports: &[&Record<WeeklyReport>],
  gp_ids: &BTreeSet<Uuid>,
  n: usize,
) -> Vec<GroupScore> {
  let mut per_group: HashMap<Uuid, Totals> = HashMap::new();
  for report in reports {
    *per_group.entry(report.data.gp_id).or_default() +=
      Totals::of_report(&report.data);
  }

  let scored = hierarchy
    .small_groups
    .iter()
    .filter(|gp| gp_ids.contains(&gp.id))
    .map(|gp| {
      let totals = per_group.get(&gp.id).copied().unwrap_or_default();
      GroupScore {
        gp_id: gp.id,
        name: gp.data.name.clone(),
        score: score(&totals),
        totals,
      }
    })
    .collect();

  rank_top(scored, n)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairScore {
  pub pair_id:       Uuid,
  pub gp_id:         Uuid,
  pub member1_id:    Uuid,
  pub member2_id:    Uuid,
  /// Studies summed from the pair's per-report stats.
  pub studies_given: u64,
}

impl Scored for PairScore {
  fn score(&self) -> u64 { self.studies_given }
}

/// Score each pair by the studies its per-report stats add up to and return
/// the top `n`. The pair's own `studies_given` counter is not consulted.
pub fn rank_pairs(
  pairs: &[Record<MissionaryPair>],
  reports: &[&Record<WeeklyReport>],
  n: usize,
) -> Vec<PairScore> {
  let mut studies: HashMap<Uuid, u64> = HashMap::new();
  for stat in reports.iter().flat_map(|r| &r.data.missionary_pairs_stats) {
    *studies.entry(stat.pair_id).or_default() += u64::from(stat.studies_given);
  }

  let scored = pairs
    .iter()
    .map(|pair| PairScore {
      pair_id:       pair.id,
      gp_id:         pair.data.gp_id,
      member1_id:    pair.data.member1_id,
      member2_id:    pair.data.member2_id,
      studies_given: studies.get(&pair.id).copied().unwrap_or(0),
    })
    .collect();

  rank_top(scored, n)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    hierarchy::fixtures::record,
    report::{PairStat, ReportSummary},
  };

  fn report(
    gp_id: Uuid,
    date: &str,
    attendance: u32,
    studies: u32,
    guests: u32,
  ) -> Record<WeeklyReport> {
    record(WeeklyReport {
      gp_id,
      date: date.into(),
      attendance: vec![],
      missionary_pairs_stats: vec![],
      baptisms: 0,
      summary: Some(ReportSummary {
        total_attendance: attendance,
        total_studies:    studies,
        total_guests:     guests,
        baptisms:         Some(0),
      }),
    })
  }

  fn totals(attendance: u64, studies: u64, guests: u64) -> Totals {
    Totals {
      total_attendance: attendance,
      total_studies:    studies,
      total_guests:     guests,
      total_baptisms:   0,
    }
  }

  // ── Range ─────────────────────────────────────────────────────────────────

  #[test]
  fn range_includes_the_whole_end_month() {
    let range = MonthRange::new(1, 2024, 2, 2024).unwrap();
    assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    assert!(range.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
    assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
  }

  #[test]
  fn december_end_rolls_into_the_next_year() {
    let range = MonthRange::new(12, 2023, 12, 2023).unwrap();
    assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
  }

  #[test]
  fn invalid_month_is_a_validation_error() {
    assert!(matches!(MonthRange::new(13, 2024, 1, 2025), Err(Error::Validation(_))));
    assert!(matches!(MonthRange::new(1, 2024, 0, 2024), Err(Error::Validation(_))));
  }

  #[test]
  fn unparseable_dates_are_excluded() {
    let gp = Uuid::new_v4();
    let reports = [
      report(gp, "2024-01-06", 1, 0, 0),
      report(gp, "sometime", 1, 0, 0),
      report(gp, "", 1, 0, 0),
    ];
    let kept = filter_reports_by_range(&reports, 1, 2024, 12, 2024).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].data.date, "2024-01-06");
  }

  #[test]
  fn filtering_is_idempotent() {
    let gp = Uuid::new_v4();
    let reports = [
      report(gp, "2023-12-30", 1, 0, 0),
      report(gp, "2024-01-06", 2, 0, 0),
      report(gp, "2024-02-03T19:00:00Z", 3, 0, 0),
      report(gp, "2024-03-02", 4, 0, 0),
    ];
    let range = MonthRange::new(1, 2024, 2, 2024).unwrap();
    let once = range.filter(&reports);
    let twice = range.filter(once.iter().copied());
    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
  }

  #[test]
  fn aggregation_is_additive_over_adjacent_ranges() {
    let gp = Uuid::new_v4();
    let reports = [
      report(gp, "2024-01-06", 10, 2, 1),
      report(gp, "2024-02-10", 7, 1, 0),
      report(gp, "2024-03-16", 4, 0, 3),
      report(gp, "2024-04-20", 9, 5, 2),
    ];
    let first = aggregate(filter_reports_by_range(&reports, 1, 2024, 2, 2024).unwrap());
    let second = aggregate(filter_reports_by_range(&reports, 3, 2024, 4, 2024).unwrap());
    let whole = aggregate(filter_reports_by_range(&reports, 1, 2024, 4, 2024).unwrap());
    assert_eq!(first + second, whole);
    assert_eq!(whole, totals(30, 8, 6));
  }

  // ── Aggregation ───────────────────────────────────────────────────────────

  #[test]
  fn missing_summary_counts_as_zero_and_baptisms_fall_back() {
    let gp = Uuid::new_v4();
    let mut bare = report(gp, "2024-01-06", 0, 0, 0);
    bare.data.summary = None;
    let mut legacy = report(gp, "2024-01-13", 5, 1, 1);
    legacy.data.baptisms = 2;
    legacy.data.summary.as_mut().unwrap().baptisms = None;

    let t = aggregate([&bare, &legacy]);
    assert_eq!(t.total_attendance, 5);
    assert_eq!(t.total_baptisms, 2);
  }

  #[test]
  fn stored_summary_is_trusted_over_detail() {
    let gp = Uuid::new_v4();
    let mut r = report(gp, "2024-01-06", 12, 0, 0);
    r.data.missionary_pairs_stats = vec![PairStat { pair_id: Uuid::new_v4(), studies_given: 9 }];
    assert_eq!(aggregate([&r]).total_studies, 0);
  }

  #[test]
  fn zone_totals_cover_both_districts() {
    let mut h = Hierarchy::default();
    let u = h.push_union("U");
    let a = h.push_association(u, "A");
    let zone = h.push_zone(a, "Z");
    let d1 = h.push_district(zone, "D1");
    let d2 = h.push_district(zone, "D2");
    let gp1 = {
      let c = h.push_church(d1, "C1");
      h.push_gp(c, "G1")
    };
    let gp2 = {
      let c = h.push_church(d2, "C2");
      h.push_gp(c, "G2")
    };

    let reports = [
      report(gp1, "2024-01-13", 10, 2, 1),
      report(gp2, "2024-01-20", 5, 0, 0),
      report(gp1, "2024-02-03", 100, 100, 100),
    ];
    let in_january = filter_reports_by_range(&reports, 1, 2024, 1, 2024).unwrap();
    let scope = Scope::Node { level: HierarchyLevel::Zone, id: zone };

    assert_eq!(aggregate_scope(&h, &in_january, scope), totals(15, 2, 1));

    let rows = breakdown(&h, &in_january, HierarchyLevel::Zone, zone);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "D1");
    assert_eq!(rows[0].totals, totals(10, 2, 1));
    assert_eq!(rows[1].totals, totals(5, 0, 0));
  }

  #[test]
  fn breakdown_of_a_small_group_is_empty() {
    let mut h = Hierarchy::default();
    let c = h.push_church(Uuid::new_v4(), "C");
    let gp = h.push_gp(c, "G");
    assert!(breakdown(&h, &[], HierarchyLevel::SmallGroup, gp).is_empty());
  }

  // ── Ranking ───────────────────────────────────────────────────────────────

  #[test]
  fn score_weights_guests_and_studies() {
    assert_eq!(score(&totals(10, 2, 3)), 22);
  }

  struct Item(u64, &'static str);

  impl Scored for Item {
    fn score(&self) -> u64 { self.0 }
  }

  #[test]
  fn rank_top_is_bounded_sorted_and_stable() {
    let items = vec![Item(3, "a"), Item(9, "b"), Item(3, "c"), Item(5, "d")];
    let top = rank_top(items, 3);
    let labels: Vec<_> = top.iter().map(|i| i.1).collect();
    assert_eq!(labels, ["b", "d", "a"]);

    let few = rank_top(vec![Item(1, "x")], 5);
    assert_eq!(few.len(), 1);
    assert!(rank_top(Vec::<Item>::new(), 5).is_empty());
  }

  #[test]
  fn groups_rank_by_weighted_score() {
    let mut h = Hierarchy::default();
    let c = h.push_church(Uuid::new_v4(), "C");
    let quiet = h.push_gp(c, "Quiet");
    let busy = h.push_gp(c, "Busy");
    let idle = h.push_gp(c, "Idle");
    let reports = [
      report(quiet, "2024-01-06", 20, 0, 0),
      report(busy, "2024-01-06", 10, 2, 3),
      report(busy, "2024-01-13", 5, 1, 0),
    ];
    let refs: Vec<_> = reports.iter().collect();
    let ids = BTreeSet::from([quiet, busy, idle]);

    let top = rank_groups(&h, &refs, &ids, 5);
    let names: Vec<_> = top.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["Busy", "Quiet", "Idle"]);
    assert_eq!(top[0].score, 15 + 2 * 3 + 3 * 3);
    assert_eq!(top[2].score, 0);
  }

  #[test]
  fn pairs_rank_by_reported_studies_not_their_counter() {
    let gp = Uuid::new_v4();
    let pair = |stale: u32| {
      record(MissionaryPair {
        gp_id:         gp,
        member1_id:    Uuid::new_v4(),
        member2_id:    Uuid::new_v4(),
        studies_given: stale,
      })
    };
    let stale = pair(50);
    let active = pair(0);

    let mut r1 = report(gp, "2024-01-06", 0, 0, 0);
    r1.data.missionary_pairs_stats = vec![
      PairStat { pair_id: active.id, studies_given: 2 },
      PairStat { pair_id: stale.id, studies_given: 1 },
    ];
    let mut r2 = report(gp, "2024-01-13", 0, 0, 0);
    r2.data.missionary_pairs_stats = vec![PairStat { pair_id: active.id, studies_given: 3 }];

    let top = rank_pairs(&[stale.clone(), active.clone()], &[&r1, &r2], 1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].pair_id, active.id);
    assert_eq!(top[0].studies_given, 5);
  }
}

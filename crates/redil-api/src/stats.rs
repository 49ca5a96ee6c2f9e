//! Handlers for `/stats/*` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stats/summary`    | Totals plus one row per direct child |
//! | `GET`  | `/stats/top-groups` | Small groups by score; `?n=` (default 5) |
//! | `GET`  | `/stats/top-pairs`  | Missionary pairs by studies; `?n=` (default 5) |
//!
//! All three accept `level` + `id` (default: the caller's own scope) and
//! `startMonth`, `startYear`, `endMonth`, `endYear` (default: the current
//! calendar year; a missing end year follows the start year).

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{Datelike as _, Utc};
use redil_core::{
  hierarchy::{Hierarchy, resolve_scope},
  org::HierarchyLevel,
  people::MissionaryPair,
  report::WeeklyReport,
  stats::{
    GroupScore, MonthRange, PairScore, ScopeSummary, aggregate_scope, breakdown_scope,
    rank_groups, rank_pairs,
  },
  store::Store,
  user::Scope,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  auth::Authenticated,
  error::{ApiError, degrade},
};

const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
  pub level:       Option<HierarchyLevel>,
  pub id:          Option<Uuid>,
  pub start_month: Option<u32>,
  pub start_year:  Option<i32>,
  pub end_month:   Option<u32>,
  pub end_year:    Option<i32>,
  pub n:           Option<usize>,
}

impl StatsParams {
  pub fn range(&self) -> Result<MonthRange, ApiError> {
    let this_year = Utc::now().year();
    let start_year = self.start_year.unwrap_or(this_year);
    MonthRange::new(
      self.start_month.unwrap_or(1),
      start_year,
      self.end_month.unwrap_or(12),
      self.end_year.unwrap_or(start_year),
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))
  }

  /// The scope to report on: the requested node, which must lie inside the
  /// caller's own scope, or the caller's scope itself.
  pub fn scope(
    &self,
    caller: &Authenticated,
    hierarchy: &Hierarchy,
  ) -> Result<Scope, ApiError> {
    let own = caller.scope()?;
    match (self.level, self.id) {
      (None, None) => Ok(own),
      (Some(level), Some(id)) => {
        if own != Scope::All && !hierarchy.scope_covers(own, level, id) {
          return Err(ApiError::Forbidden(format!(
            "{level} {id} is outside the caller's scope"
          )));
        }
        Ok(Scope::Node { level, id })
      }
      _ => Err(ApiError::BadRequest("level and id must be given together".into())),
    }
  }

  fn top_n(&self) -> usize { self.n.unwrap_or(DEFAULT_TOP_N) }
}

/// Everything a statistics request reads, loaded once.
struct Snapshot {
  hierarchy: Hierarchy,
  reports:   Vec<redil_core::Record<WeeklyReport>>,
}

async fn snapshot<S: Store>(store: &S) -> Result<Snapshot, ApiError> {
  Ok(Snapshot {
    hierarchy: degrade(Hierarchy::load(store).await, "load hierarchy")?,
    reports:   degrade(store.list::<WeeklyReport>().await, "list reports")?,
  })
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// `GET /stats/summary`
pub async fn summary<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Query(params): Query<StatsParams>,
) -> Result<Json<ScopeSummary>, ApiError>
where
  S: Store + 'static,
{
  let range = params.range()?;
  let snap = snapshot(store.as_ref()).await?;
  let scope = params.scope(&caller, &snap.hierarchy)?;

  let in_range = range.filter(&snap.reports);
  Ok(Json(ScopeSummary {
    scope,
    range,
    totals: aggregate_scope(&snap.hierarchy, &in_range, scope),
    breakdown: breakdown_scope(&snap.hierarchy, &in_range, scope),
  }))
}

// ─── Rankings ────────────────────────────────────────────────────────────────

/// `GET /stats/top-groups`
pub async fn top_groups<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Query(params): Query<StatsParams>,
) -> Result<Json<Vec<GroupScore>>, ApiError>
where
  S: Store + 'static,
{
  let range = params.range()?;
  let snap = snapshot(store.as_ref()).await?;
  let scope = params.scope(&caller, &snap.hierarchy)?;

  let gp_ids = resolve_scope(scope, &snap.hierarchy).gp_ids;
  let in_range = range.filter(&snap.reports);
  Ok(Json(rank_groups(&snap.hierarchy, &in_range, &gp_ids, params.top_n())))
}

/// `GET /stats/top-pairs`
pub async fn top_pairs<S>(
  State(store): State<Arc<S>>,
  caller: Authenticated,
  Query(params): Query<StatsParams>,
) -> Result<Json<Vec<PairScore>>, ApiError>
where
  S: Store + 'static,
{
  let range = params.range()?;
  let snap = snapshot(store.as_ref()).await?;
  let scope = params.scope(&caller, &snap.hierarchy)?;

  let gp_ids = resolve_scope(scope, &snap.hierarchy).gp_ids;
  let pairs: Vec<_> = degrade(store.list::<MissionaryPair>().await, "list pairs")?
    .into_iter()
    .filter(|pair| gp_ids.contains(&pair.data.gp_id))
    .collect();
  let in_range = range.filter(&snap.reports);
  Ok(Json(rank_pairs(&pairs, &in_range, params.top_n())))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn range_defaults_to_the_current_year() {
    let range = StatsParams::default().range().unwrap();
    let year = Utc::now().year();
    assert_eq!(range, MonthRange::new(1, year, 12, year).unwrap());
  }

  #[test]
  fn end_year_follows_start_year() {
    let params = StatsParams {
      start_month: Some(3),
      start_year: Some(2023),
      end_month: Some(5),
      ..Default::default()
    };
    assert_eq!(params.range().unwrap(), MonthRange::new(3, 2023, 5, 2023).unwrap());
  }

  #[test]
  fn bad_month_is_a_bad_request() {
    let params = StatsParams { start_month: Some(13), ..Default::default() };
    assert!(matches!(params.range(), Err(ApiError::BadRequest(_))));
  }
}

//! Weekly reports: one dated submission of attendance and activity per
//! small group.
//!
//! The `summary` block is what every statistic reads. It is recomputed from
//! the attendance and pair detail each time a report is written, so readers
//! can trust it without re-deriving anything.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{Entity, EntityKind},
};

/// One member's line in a weekly report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendanceEntry {
  pub member_id:     Uuid,
  pub present:       bool,
  pub participated:  bool,
  pub studies_given: u32,
  pub guests:        u32,
}

/// Bible studies a missionary pair gave during the reported week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PairStat {
  pub pair_id:       Uuid,
  pub studies_given: u32,
}

/// Precomputed counters for a report. Missing fields read as zero; a missing
/// `baptisms` falls back to the report's own field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSummary {
  pub total_attendance: u32,
  pub total_studies:    u32,
  pub total_guests:     u32,
  pub baptisms:         Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
  pub gp_id:                  Uuid,
  /// `YYYY-MM-DD` or an RFC 3339 timestamp. Kept as written so that rows
  /// with an unreadable date can still be listed.
  pub date:                   String,
  #[serde(default)]
  pub attendance:             Vec<AttendanceEntry>,
  #[serde(default)]
  pub missionary_pairs_stats: Vec<PairStat>,
  #[serde(default)]
  pub baptisms:               u32,
  #[serde(default)]
  pub summary:                Option<ReportSummary>,
}

impl WeeklyReport {
  /// The report's calendar date, if `date` parses.
  pub fn parsed_date(&self) -> Option<NaiveDate> { parse_report_date(&self.date) }

  /// Derive the summary from the attendance and pair detail.
  ///
  /// Fails with [`Error::Validation`] when a counter does not fit in `u32`.
  pub fn compute_summary(&self) -> Result<ReportSummary> {
    let total_attendance = u32::try_from(self.attendance.iter().filter(|a| a.present).count())
      .map_err(|_| overflow("totalAttendance"))?;
    let member_studies = checked_sum(self.attendance.iter().map(|a| a.studies_given));
    let pair_studies = checked_sum(self.missionary_pairs_stats.iter().map(|p| p.studies_given));
    let total_studies = member_studies
      .zip(pair_studies)
      .and_then(|(m, p)| m.checked_add(p))
      .ok_or_else(|| overflow("totalStudies"))?;
    let total_guests = checked_sum(self.attendance.iter().map(|a| a.guests))
      .ok_or_else(|| overflow("totalGuests"))?;

    Ok(ReportSummary {
      total_attendance,
      total_studies,
      total_guests,
      baptisms: Some(self.baptisms),
    })
  }
}

fn checked_sum(mut values: impl Iterator<Item = u32>) -> Option<u32> {
  values.try_fold(0u32, u32::checked_add)
}

fn overflow(field: &str) -> Error {
  Error::Validation(format!("report {field} exceeds {}", u32::MAX))
}

pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

impl Entity for WeeklyReport {
  const KIND: EntityKind = EntityKind::WeeklyReport;

  fn parent_id(&self) -> Option<Uuid> { Some(self.gp_id) }

  /// A group files at most one report per date.
  fn unique_key(&self) -> Option<(&'static str, String)> {
    let day = self
      .parsed_date()
      .map(|d| d.to_string())
      .unwrap_or_else(|| self.date.trim().to_owned());
    Some(("gpId/date", format!("{}/{day}", self.gp_id)))
  }

  fn validate(&self) -> Result<()> {
    if self.parsed_date().is_none() {
      return Err(Error::Validation(format!(
        "report date {:?} is not a valid date",
        self.date
      )));
    }
    Ok(())
  }

  fn prepare(&mut self) -> Result<()> {
    self.summary = Some(self.compute_summary()?);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(present: bool, studies: u32, guests: u32) -> AttendanceEntry {
    AttendanceEntry {
      member_id: Uuid::new_v4(),
      present,
      participated: present,
      studies_given: studies,
      guests,
    }
  }

  #[test]
  fn summary_counts_present_members_and_sums_detail() {
    let report = WeeklyReport {
      gp_id:                  Uuid::new_v4(),
      date:                   "2024-01-13".into(),
      attendance:             vec![entry(true, 1, 2), entry(false, 0, 0), entry(true, 0, 1)],
      missionary_pairs_stats: vec![PairStat { pair_id: Uuid::new_v4(), studies_given: 3 }],
      baptisms:               1,
      summary:                None,
    };
    let summary = report.compute_summary().unwrap();
    assert_eq!(summary.total_attendance, 2);
    assert_eq!(summary.total_studies, 4);
    assert_eq!(summary.total_guests, 3);
    assert_eq!(summary.baptisms, Some(1));
  }

  #[test]
  fn prepare_overwrites_a_stale_summary() {
    let mut report = WeeklyReport {
      gp_id:                  Uuid::new_v4(),
      date:                   "2024-02-03".into(),
      attendance:             vec![entry(true, 0, 0)],
      missionary_pairs_stats: vec![],
      baptisms:               0,
      summary:                Some(ReportSummary { total_attendance: 99, ..Default::default() }),
    };
    report.prepare().unwrap();
    assert_eq!(report.summary.unwrap().total_attendance, 1);
  }

  #[test]
  fn studies_past_u32_are_rejected() {
    let mut report = WeeklyReport {
      gp_id:                  Uuid::new_v4(),
      date:                   "2024-02-10".into(),
      attendance:             vec![entry(true, u32::MAX, 0), entry(true, 1, 0)],
      missionary_pairs_stats: vec![],
      baptisms:               0,
      summary:                None,
    };
    assert!(matches!(report.prepare(), Err(Error::Validation(_))));

    report.attendance = vec![entry(true, u32::MAX, 0)];
    report.missionary_pairs_stats = vec![PairStat { pair_id: Uuid::new_v4(), studies_given: 1 }];
    assert!(matches!(report.compute_summary(), Err(Error::Validation(_))));
  }

  #[test]
  fn dates_parse_in_both_forms() {
    assert_eq!(
      parse_report_date("2024-03-09"),
      NaiveDate::from_ymd_opt(2024, 3, 9)
    );
    assert_eq!(
      parse_report_date("2024-03-09T18:00:00.000Z"),
      NaiveDate::from_ymd_opt(2024, 3, 9)
    );
    assert_eq!(parse_report_date("next saturday"), None);
  }

  #[test]
  fn unique_key_normalises_timestamp_dates() {
    let gp_id = Uuid::new_v4();
    let report = WeeklyReport {
      gp_id,
      date: "2024-03-09T18:00:00Z".into(),
      attendance: vec![],
      missionary_pairs_stats: vec![],
      baptisms: 0,
      summary: None,
    };
    assert_eq!(
      report.unique_key(),
      Some(("gpId/date", format!("{gp_id}/2024-03-09")))
    );
  }
}

//! Dashboard health metrics: per-event completion rates, deadline-derived
//! status, and the delayed-event flag.
//!
//! Everything here is a pure function of stored fields and today's date.
//! In particular the effective status is *derived on every read* and never
//! persisted, so stored and derived status cannot drift.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{Event, EventStatus};

// ─── Filters ─────────────────────────────────────────────────────────────────

pub const DEFAULT_NEAR_DAYS: i64 = 2;
pub const DEFAULT_REVIEW_THRESHOLD: f64 = 70.0;

/// Which effective statuses the delayed-event list should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
  #[default]
  All,
  Draft,
  Active,
  Closed,
}

impl StatusFilter {
  fn matches(self, status: EventStatus) -> bool {
    match self {
      StatusFilter::All => true,
      StatusFilter::Draft => status == EventStatus::Draft,
      StatusFilter::Active => status == EventStatus::Active,
      StatusFilter::Closed => status == EventStatus::Closed,
    }
  }
}

/// Dashboard query parameters. Out-of-range values are clamped, not
/// rejected: the dashboard should degrade to sensible defaults rather than
/// error on a sloppy caller.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilters {
  /// Events due within this many days are "near" their deadline.
  pub near_days:        i64,
  /// Review completion (percent) below which a near-deadline event is
  /// flagged. Clamped into `[1, 100]`.
  pub review_threshold: f64,
  pub status_filter:    StatusFilter,
}

impl Default for DashboardFilters {
  fn default() -> Self {
    DashboardFilters {
      near_days:        DEFAULT_NEAR_DAYS,
      review_threshold: DEFAULT_REVIEW_THRESHOLD,
      status_filter:    StatusFilter::All,
    }
  }
}

impl DashboardFilters {
  pub fn clamped(
    near_days: Option<i64>,
    review_threshold: Option<f64>,
    status_filter: Option<StatusFilter>,
  ) -> Self {
    DashboardFilters {
      near_days:        near_days.unwrap_or(DEFAULT_NEAR_DAYS).max(0),
      review_threshold: review_threshold
        .unwrap_or(DEFAULT_REVIEW_THRESHOLD)
        .clamp(1.0, 100.0),
      status_filter:    status_filter.unwrap_or_default(),
    }
  }
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Raw per-event tallies the aggregator works from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressCounts {
  pub submissions: u64,
  pub judges:      u64,
  pub judgments:   u64,
}

/// Submission counts per department for one event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
  pub department: String,
  pub count:      u64,
}

/// Department breakdown of one event's submissions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDepartmentStats {
  pub event_id:          Uuid,
  pub title:             String,
  pub status:            EventStatus,
  pub total_submissions: u64,
  pub departments:       Vec<DepartmentCount>,
}

/// Everything the storage layer contributes to one dashboard read.
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
  pub counts:           HashMap<Uuid, ProgressCounts>,
  pub department_stats: Vec<EventDepartmentStats>,
}

// ─── Per-event metrics ───────────────────────────────────────────────────────

/// Computed health metrics for one event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProgress {
  pub event_id:        Uuid,
  pub title:           String,
  /// Effective status (deadline-aware), not the stored one.
  pub status:          EventStatus,
  pub end_date:        Option<NaiveDate>,
  /// 100 if the event has any submission, else 0. Presence-based: there is
  /// no expected-submission quota to compare against.
  pub submission_rate: f64,
  /// `100 × judgments / (submissions × judges)`, 0 when no judgments are
  /// expected. Always within `[0, 100]` for consistent data.
  pub review_rate:     f64,
  /// Whole days until the deadline, negative once overdue, `None` when the
  /// event has no end date.
  pub days_left:       Option<i64>,
  pub delayed:         bool,
}

/// Days from `today` to `end_date` at date-only precision.
pub fn days_left(end_date: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
  end_date.map(|end| (end - today).num_days())
}

/// An event whose deadline has passed is treated as closed even if nobody
/// ever closed it explicitly.
pub fn effective_status(stored: EventStatus, days_left: Option<i64>) -> EventStatus {
  match days_left {
    _ if stored == EventStatus::Closed => EventStatus::Closed,
    Some(days) if days < 0 => EventStatus::Closed,
    _ => stored,
  }
}

/// Compute one event's dashboard row.
pub fn event_progress(
  event: &Event,
  counts: ProgressCounts,
  filters: &DashboardFilters,
  today: NaiveDate,
) -> EventProgress {
  let expected_judgments = counts.submissions * counts.judges;
  let submission_rate = if counts.submissions > 0 { 100.0 } else { 0.0 };
  let review_rate = if expected_judgments > 0 {
    round2(counts.judgments as f64 / expected_judgments as f64 * 100.0)
  } else {
    0.0
  };

  let days_left = days_left(event.end_date, today);
  let status = effective_status(event.status, days_left);

  let overdue_incomplete =
    matches!(days_left, Some(d) if d < 0) && review_rate < 100.0;
  let near_below_threshold = matches!(days_left, Some(d) if d <= filters.near_days)
    && review_rate < filters.review_threshold;
  let delayed = overdue_incomplete || near_below_threshold;

  EventProgress {
    event_id: event.event_id,
    title: event.title.clone(),
    status,
    end_date: event.end_date,
    submission_rate,
    review_rate,
    days_left,
    delayed,
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Dashboard headline numbers, computed over effectively-active events only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
  pub active_count:        usize,
  pub avg_submission_rate: f64,
  pub avg_review_rate:     f64,
}

/// Compute every event's row plus the headline aggregates and the delayed
/// subset (sorted soonest-due first, events without a deadline last).
pub fn dashboard(
  events: &[Event],
  snapshot: &ProgressSnapshot,
  filters: &DashboardFilters,
  today: NaiveDate,
) -> (Vec<EventProgress>, DashboardTotals, Vec<EventProgress>) {
  let per_event: Vec<EventProgress> = events
    .iter()
    .map(|event| {
      let counts = snapshot
        .counts
        .get(&event.event_id)
        .copied()
        .unwrap_or_default();
      event_progress(event, counts, filters, today)
    })
    .collect();

  let active: Vec<&EventProgress> = per_event
    .iter()
    .filter(|e| e.status == EventStatus::Active)
    .collect();
  let active_count = active.len();
  let totals = DashboardTotals {
    active_count,
    avg_submission_rate: average(active.iter().map(|e| e.submission_rate)),
    avg_review_rate:     average(active.iter().map(|e| e.review_rate)),
  };

  let mut delayed: Vec<EventProgress> = per_event
    .iter()
    .filter(|e| e.delayed && filters.status_filter.matches(e.status))
    .cloned()
    .collect();
  delayed.sort_by_key(|e| e.days_left.unwrap_or(i64::MAX));

  (per_event, totals, delayed)
}

fn average(rates: impl Iterator<Item = f64>) -> f64 {
  let (sum, count) = rates.fold((0.0, 0usize), |(s, c), r| (s + r, c + 1));
  if count == 0 { 0.0 } else { round2(sum / count as f64) }
}

pub(crate) fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn event(id: u128, status: EventStatus, end_date: Option<NaiveDate>) -> Event {
    Event {
      event_id:         Uuid::from_u128(id),
      title:            format!("event {id}"),
      status,
      end_date,
      created_at:       Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
      result_finalized: false,
      finalized_at:     None,
      ranking_snapshot: None,
    }
  }

  fn counts(submissions: u64, judges: u64, judgments: u64) -> ProgressCounts {
    ProgressCounts { submissions, judges, judgments }
  }

  #[test]
  fn filters_are_clamped_to_valid_ranges() {
    let f = DashboardFilters::clamped(Some(-3), Some(250.0), None);
    assert_eq!(f.near_days, 0);
    assert_eq!(f.review_threshold, 100.0);

    let f = DashboardFilters::clamped(None, Some(0.0), None);
    assert_eq!(f.near_days, DEFAULT_NEAR_DAYS);
    assert_eq!(f.review_threshold, 1.0);
  }

  #[test]
  fn review_rate_stays_in_range() {
    let today = date(2026, 3, 10);
    let filters = DashboardFilters::default();
    let e = event(1, EventStatus::Active, Some(date(2026, 3, 20)));

    let row = event_progress(&e, counts(0, 0, 0), &filters, today);
    assert_eq!(row.review_rate, 0.0);
    assert_eq!(row.submission_rate, 0.0);

    let row = event_progress(&e, counts(4, 3, 6), &filters, today);
    assert_eq!(row.review_rate, 50.0);
    assert_eq!(row.submission_rate, 100.0);

    let row = event_progress(&e, counts(4, 3, 12), &filters, today);
    assert_eq!(row.review_rate, 100.0);
  }

  #[test]
  fn overdue_event_is_effectively_closed_and_delayed() {
    // Deadline yesterday, still stored active, review halfway done.
    let today = date(2026, 3, 10);
    let filters = DashboardFilters::default();
    let e = event(1, EventStatus::Active, Some(date(2026, 3, 9)));

    let row = event_progress(&e, counts(2, 1, 1), &filters, today);
    assert_eq!(row.days_left, Some(-1));
    assert_eq!(row.status, EventStatus::Closed);
    assert_eq!(row.review_rate, 50.0);
    assert!(row.delayed);
  }

  #[test]
  fn near_deadline_threshold_splits_delayed() {
    let today = date(2026, 3, 10);
    let filters = DashboardFilters::clamped(Some(2), Some(70.0), None);
    let e = event(1, EventStatus::Active, Some(date(2026, 3, 11)));

    // days_left = 1, review 60% → delayed.
    let row = event_progress(&e, counts(5, 2, 6), &filters, today);
    assert_eq!(row.days_left, Some(1));
    assert_eq!(row.review_rate, 60.0);
    assert!(row.delayed);

    // Same deadline, review 80% → fine.
    let row = event_progress(&e, counts(5, 2, 8), &filters, today);
    assert_eq!(row.review_rate, 80.0);
    assert!(!row.delayed);
  }

  #[test]
  fn overdue_with_complete_review_is_not_delayed() {
    let today = date(2026, 3, 10);
    let filters = DashboardFilters::default();
    let e = event(1, EventStatus::Closed, Some(date(2026, 3, 1)));

    let row = event_progress(&e, counts(3, 2, 6), &filters, today);
    assert_eq!(row.review_rate, 100.0);
    assert!(!row.delayed);
  }

  #[test]
  fn events_without_deadline_never_expire() {
    let today = date(2026, 3, 10);
    let filters = DashboardFilters::default();
    let e = event(1, EventStatus::Active, None);

    let row = event_progress(&e, counts(1, 1, 0), &filters, today);
    assert_eq!(row.days_left, None);
    assert_eq!(row.status, EventStatus::Active);
    assert!(!row.delayed);
  }

  #[test]
  fn aggregates_cover_effectively_active_events_only() {
    let today = date(2026, 3, 10);
    let filters = DashboardFilters::default();
    let events = vec![
      event(1, EventStatus::Active, Some(date(2026, 3, 20))),
      // Stored active but overdue — excluded from the averages.
      event(2, EventStatus::Active, Some(date(2026, 3, 1))),
      event(3, EventStatus::Draft, None),
    ];
    let mut snapshot = ProgressSnapshot::default();
    snapshot.counts.insert(Uuid::from_u128(1), counts(2, 1, 1));
    snapshot.counts.insert(Uuid::from_u128(2), counts(1, 1, 0));

    let (per_event, totals, _delayed) =
      dashboard(&events, &snapshot, &filters, today);
    assert_eq!(per_event.len(), 3);
    assert_eq!(totals.active_count, 1);
    assert_eq!(totals.avg_submission_rate, 100.0);
    assert_eq!(totals.avg_review_rate, 50.0);
  }

  #[test]
  fn delayed_events_sort_by_urgency_with_no_deadline_last() {
    let today = date(2026, 3, 10);
    let filters = DashboardFilters::clamped(Some(5), Some(100.0), None);
    let events = vec![
      event(1, EventStatus::Active, Some(date(2026, 3, 14))),
      event(2, EventStatus::Active, Some(date(2026, 3, 8))),
      event(3, EventStatus::Active, Some(date(2026, 3, 11))),
    ];
    let mut snapshot = ProgressSnapshot::default();
    for id in 1..=3u128 {
      snapshot.counts.insert(Uuid::from_u128(id), counts(1, 1, 0));
    }

    let (_, _, delayed) = dashboard(&events, &snapshot, &filters, today);
    let order: Vec<i64> = delayed.iter().filter_map(|e| e.days_left).collect();
    assert_eq!(order, vec![-2, 1, 4]);
  }

  #[test]
  fn status_filter_narrows_the_delayed_list() {
    let today = date(2026, 3, 10);
    let filters =
      DashboardFilters::clamped(Some(5), Some(100.0), Some(StatusFilter::Active));
    let events = vec![
      event(1, EventStatus::Active, Some(date(2026, 3, 11))),
      // Overdue → effectively closed → filtered out.
      event(2, EventStatus::Active, Some(date(2026, 3, 8))),
    ];
    let mut snapshot = ProgressSnapshot::default();
    for id in 1..=2u128 {
      snapshot.counts.insert(Uuid::from_u128(id), counts(1, 1, 0));
    }

    let (_, _, delayed) = dashboard(&events, &snapshot, &filters, today);
    assert_eq!(delayed.len(), 1);
    assert_eq!(delayed[0].event_id, Uuid::from_u128(1));
  }
}

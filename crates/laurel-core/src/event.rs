//! Events, submissions, and judgments — the records the admin core reads
//! and, for a small set of privileged actions, mutates.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ranking::RankedEntry;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Stored lifecycle status of an event. Together with `result_finalized`
/// this forms a one-way state machine: draft → active → closed → finalized.
///
/// Note that the status an event is *treated* as having can differ from the
/// stored value once its deadline has passed; see
/// [`crate::metrics::effective_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
  Draft,
  Active,
  Closed,
}

impl EventStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      EventStatus::Draft => "draft",
      EventStatus::Active => "active",
      EventStatus::Closed => "closed",
    }
  }
}

impl std::fmt::Display for EventStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A time-boxed call for submissions.
///
/// `result_finalized` flips false → true exactly once, and only while the
/// event is closed. The ranking snapshot written at that moment is
/// immutable; a later finalize attempt fails rather than recomputing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:         Uuid,
  pub title:            String,
  pub status:           EventStatus,
  /// Submission deadline, date-only. Events without a deadline never expire
  /// implicitly.
  pub end_date:         Option<NaiveDate>,
  pub created_at:       DateTime<Utc>,
  pub result_finalized: bool,
  pub finalized_at:     Option<DateTime<Utc>>,
  pub ranking_snapshot: Option<Vec<RankedEntry>>,
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// A proposal submitted to an event. Immutable once judged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id: Uuid,
  pub event_id:      Uuid,
  pub submitter_id:  Uuid,
  pub title:         String,
  pub created_at:    DateTime<Utc>,
}

// ─── Judging ─────────────────────────────────────────────────────────────────

/// Per-criterion scores for one judgment, e.g. `{"novelty": 8, "impact": 7}`.
/// A judgment's total is the sum of its values.
pub type ScoreMap = BTreeMap<String, f64>;

/// Link establishing that a judge may score an event's submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeAssignment {
  pub event_id: Uuid,
  pub judge_id: Uuid,
}

/// One judge's scoring of one submission. At most one per
/// (submission, judge) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgment {
  pub submission_id: Uuid,
  pub judge_id:      Uuid,
  pub score:         ScoreMap,
}

impl Judgment {
  /// Sum of the per-criterion scores.
  pub fn total(&self) -> f64 {
    self.score.values().sum()
  }
}

// ─── Deletion backup ─────────────────────────────────────────────────────────

/// What was removed by an event deletion, preserved in the audit trail so
/// the action can be reconstructed by an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedEventBackup {
  pub event:             Event,
  pub submissions:       usize,
  pub judgments:         usize,
  pub judge_assignments: usize,
}

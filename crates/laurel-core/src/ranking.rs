//! Deterministic ranking of an event's submissions at finalization time.

use std::{cmp::Ordering, collections::HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  event::{Event, EventStatus, Judgment},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// The slice of a submission the ranking needs: identity, display fields,
/// and the creation timestamp used as the final tie-break.
#[derive(Debug, Clone)]
pub struct RankingSubmission {
  pub submission_id:  Uuid,
  pub title:          String,
  pub submitter_name: String,
  pub created_at:     DateTime<Utc>,
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// One row of a finalized ranking snapshot.
///
/// Only submissions with at least one judgment are ranked; unjudged
/// submissions are omitted entirely, not ranked last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
  pub submission_id:  Uuid,
  pub title:          String,
  pub submitter_name: String,
  pub avg_score:      f64,
  pub best_score:     f64,
  pub judge_count:    usize,
  pub created_at:     DateTime<Utc>,
  /// 1-based position after sorting.
  pub rank:           u32,
}

// ─── Preconditions ───────────────────────────────────────────────────────────

/// Check that an event may be finalized: it must be closed and not yet
/// finalized. The storage layer re-checks the flag at write time; this
/// check exists to give callers a precise error before any work is done.
pub fn ensure_finalizable(event: &Event) -> Result<()> {
  if event.result_finalized {
    return Err(Error::AlreadyFinalized(event.event_id));
  }
  if event.status != EventStatus::Closed {
    return Err(Error::EventNotClosed(event.event_id, event.status));
  }
  Ok(())
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

/// Rank submissions by judgment scores.
///
/// Each judgment contributes its score total (sum over criteria). Per
/// submission: `avg_score` is the mean of totals, `best_score` the maximum,
/// both rounded to 4 decimal places. Sort order is `avg_score` descending,
/// then `best_score` descending, then `created_at` ascending — earlier
/// submissions win ties, making repeated runs over identical input produce
/// identical snapshots.
pub fn rank(
  event_id: Uuid,
  submissions: &[RankingSubmission],
  judgments: &[Judgment],
) -> Result<Vec<RankedEntry>> {
  if submissions.is_empty() {
    return Err(Error::NoSubmissions(event_id));
  }

  let mut totals: HashMap<Uuid, Vec<f64>> = HashMap::new();
  for judgment in judgments {
    totals
      .entry(judgment.submission_id)
      .or_default()
      .push(judgment.total());
  }

  let mut entries: Vec<RankedEntry> = submissions
    .iter()
    .filter_map(|sub| {
      let scores = totals.get(&sub.submission_id)?;
      let avg = scores.iter().sum::<f64>() / scores.len() as f64;
      let best = scores.iter().copied().fold(f64::MIN, f64::max);
      Some(RankedEntry {
        submission_id:  sub.submission_id,
        title:          sub.title.clone(),
        submitter_name: sub.submitter_name.clone(),
        avg_score:      round4(avg),
        best_score:     round4(best),
        judge_count:    scores.len(),
        created_at:     sub.created_at,
        rank:           0,
      })
    })
    .collect();

  entries.sort_by(|a, b| {
    score_desc(a.avg_score, b.avg_score)
      .then_with(|| score_desc(a.best_score, b.best_score))
      .then_with(|| a.created_at.cmp(&b.created_at))
  });

  for (idx, entry) in entries.iter_mut().enumerate() {
    entry.rank = idx as u32 + 1;
  }

  Ok(entries)
}

fn score_desc(a: f64, b: f64) -> Ordering {
  b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn round4(value: f64) -> f64 {
  (value * 10_000.0).round() / 10_000.0
}

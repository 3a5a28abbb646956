//! Per-judge scoring statistics for the admin analytics view.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::{event::ScoreMap, metrics::round2};

/// One judgment as the analytics view sees it: who scored, and the score
/// map itself.
#[derive(Debug, Clone)]
pub struct JudgeScore {
  pub judge_id: Uuid,
  pub score:    ScoreMap,
}

/// Aggregated scoring behaviour of one judge across all their judgments.
/// The spread (population standard deviation) surfaces judges who score
/// everything identically or erratically.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeStats {
  pub judge_id:     Uuid,
  pub judge_name:   String,
  pub department:   String,
  pub count:        usize,
  pub avg_score:    f64,
  pub stddev_score: f64,
}

/// Compute per-judge count / mean / standard deviation over judgment score
/// totals, sorted by judgment count descending. Names and departments are
/// resolved from `names` (judges without an AppUser row fall back to
/// placeholders).
pub fn judge_stats(
  scores: &[JudgeScore],
  names: &HashMap<Uuid, (String, String)>,
) -> Vec<JudgeStats> {
  let mut totals_by_judge: HashMap<Uuid, Vec<f64>> = HashMap::new();
  for score in scores {
    totals_by_judge
      .entry(score.judge_id)
      .or_default()
      .push(score.score.values().sum());
  }

  let mut stats: Vec<JudgeStats> = totals_by_judge
    .into_iter()
    .map(|(judge_id, totals)| {
      let count = totals.len();
      let avg = totals.iter().sum::<f64>() / count as f64;
      let variance =
        totals.iter().map(|t| (t - avg).powi(2)).sum::<f64>() / count as f64;
      let (name, department) = names
        .get(&judge_id)
        .cloned()
        .unwrap_or_else(|| ("unknown".to_string(), String::new()));
      JudgeStats {
        judge_id,
        judge_name: name,
        department,
        count,
        avg_score: round2(avg),
        stddev_score: round2(variance.sqrt()),
      }
    })
    .collect();

  stats.sort_by(|a, b| b.count.cmp(&a.count));
  stats
}

//! Audit trail records for privileged mutations.
//!
//! Entries are strictly append-only: never updated, never deleted. A
//! mutation is not considered complete until its audit entry is durably
//! written — an audit failure after a successful mutation is surfaced to
//! the caller, not swallowed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input for one audit entry; id and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAuditLogEntry {
  pub actor_id:    Uuid,
  /// Machine-readable action name, e.g. `"close_event"`.
  pub action:      String,
  /// Kind of the mutated record, e.g. `"event"` or `"employee"`.
  pub target_type: String,
  pub target_id:   String,
  /// Action-specific context (before/after values, backups).
  pub metadata:    serde_json::Value,
}

/// A stored audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
  pub id:          Uuid,
  pub created_at:  DateTime<Utc>,
  pub actor_id:    Uuid,
  pub action:      String,
  pub target_type: String,
  pub target_id:   String,
  pub metadata:    serde_json::Value,
}

//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, score
//! maps and ranking snapshots as compact JSON. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use laurel_core::{
  audit::AuditLogEntry,
  event::{Event, EventStatus, ScoreMap},
  ranking::RankedEntry,
  user::{AppUser, Identity, PersonnelRecord, Role},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("bad date {s:?}: {e}")))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> {
  Role::parse(s).map_err(|_| Error::Decode(format!("unknown role: {s:?}")))
}

// ─── EventStatus ─────────────────────────────────────────────────────────────

pub fn encode_status(s: EventStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<EventStatus> {
  match s {
    "draft" => Ok(EventStatus::Draft),
    "active" => Ok(EventStatus::Active),
    "closed" => Ok(EventStatus::Closed),
    other => Err(Error::Decode(format!("unknown event status: {other:?}"))),
  }
}

// ─── Score maps / snapshots ──────────────────────────────────────────────────

pub fn encode_score(score: &ScoreMap) -> Result<String> {
  Ok(serde_json::to_string(score)?)
}

pub fn decode_score(s: &str) -> Result<ScoreMap> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_snapshot(entries: &[RankedEntry]) -> Result<String> {
  Ok(serde_json::to_string(entries)?)
}

pub fn decode_snapshot(s: &str) -> Result<Vec<RankedEntry>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `identities` row.
pub struct RawIdentity {
  pub identity_id:      String,
  pub email:            String,
  pub name:             Option<String>,
  pub department:       Option<String>,
  pub metadata_role:    Option<String>,
  pub token_expires_at: Option<String>,
}

impl RawIdentity {
  pub fn into_identity(self) -> Result<(Identity, Option<DateTime<Utc>>)> {
    let identity = Identity {
      identity_id:   decode_uuid(&self.identity_id)?,
      email:         self.email,
      name:          self.name,
      department:    self.department,
      metadata_role: self.metadata_role.as_deref().map(decode_role).transpose()?,
    };
    let expires_at = self
      .token_expires_at
      .as_deref()
      .map(decode_dt)
      .transpose()?;
    Ok((identity, expires_at))
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub email:      String,
  pub name:       Option<String>,
  pub department: Option<String>,
  pub role:       String,
  pub updated_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<AppUser> {
    Ok(AppUser {
      user_id:    decode_uuid(&self.user_id)?,
      email:      self.email,
      name:       self.name,
      department: self.department,
      role:       decode_role(&self.role)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `personnel` row.
pub struct RawPersonnel {
  pub employee_no: String,
  pub name:        String,
  pub department:  String,
  pub role:        String,
}

impl RawPersonnel {
  pub fn into_personnel(self) -> Result<PersonnelRecord> {
    Ok(PersonnelRecord {
      employee_no: self.employee_no,
      name:        self.name,
      department:  self.department,
      role:        decode_role(&self.role)?,
    })
  }
}

/// Raw strings read directly from an `events` row.
pub struct RawEvent {
  pub event_id:         String,
  pub title:            String,
  pub status:           String,
  pub end_date:         Option<String>,
  pub created_at:       String,
  pub result_finalized: bool,
  pub finalized_at:     Option<String>,
  pub ranking_snapshot: Option<String>,
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:         decode_uuid(&self.event_id)?,
      title:            self.title,
      status:           decode_status(&self.status)?,
      end_date:         self.end_date.as_deref().map(decode_date).transpose()?,
      created_at:       decode_dt(&self.created_at)?,
      result_finalized: self.result_finalized,
      finalized_at:     self.finalized_at.as_deref().map(decode_dt).transpose()?,
      ranking_snapshot: self
        .ranking_snapshot
        .as_deref()
        .map(decode_snapshot)
        .transpose()?,
    })
  }
}

/// Raw strings read directly from an `audit_logs` row.
pub struct RawAudit {
  pub id:          String,
  pub created_at:  String,
  pub actor_id:    String,
  pub action:      String,
  pub target_type: String,
  pub target_id:   String,
  pub metadata:    String,
}

impl RawAudit {
  pub fn into_entry(self) -> Result<AuditLogEntry> {
    Ok(AuditLogEntry {
      id:          decode_uuid(&self.id)?,
      created_at:  decode_dt(&self.created_at)?,
      actor_id:    decode_uuid(&self.actor_id)?,
      action:      self.action,
      target_type: self.target_type,
      target_id:   self.target_id,
      metadata:    serde_json::from_str(&self.metadata)?,
    })
  }
}

//! The `PlatformStore` trait — everything the admin core needs from
//! persistence.
//!
//! The trait is implemented by storage backends (e.g.
//! `laurel-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend. Two methods carry correctness requirements
//! beyond plain reads and writes:
//!
//! - [`consume_rate_limit`](PlatformStore::consume_rate_limit) must perform
//!   its read-increment-compare atomically, so concurrent requests sharing
//!   a key cannot lose updates.
//! - [`finalize_event`](PlatformStore::finalize_event) must condition the
//!   write on the event still being unfinalized (compare-and-swap); two
//!   racing finalize calls must not both commit snapshots.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  analytics::JudgeScore,
  audit::{AuditLogEntry, NewAuditLogEntry},
  event::{DeletedEventBackup, Event, Judgment},
  metrics::ProgressSnapshot,
  ranking::{RankedEntry, RankingSubmission},
  ratelimit::RateDecision,
  user::{AppUser, Identity, PersonnelRecord, Role},
};

pub trait PlatformStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identities ────────────────────────────────────────────────────────

  /// Resolve a bearer token to its identity. Returns `None` for unknown
  /// and expired tokens alike.
  fn verify_token<'a>(
    &'a self,
    token: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  fn get_identity_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  /// Overwrite the role stored in an identity's metadata.
  fn set_identity_metadata_role(
    &self,
    identity_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── AppUsers ──────────────────────────────────────────────────────────

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<AppUser>, Self::Error>> + Send + '_;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<AppUser>, Self::Error>> + Send + 'a;

  /// Insert or fully replace the profile row for `user.user_id`.
  fn upsert_user(
    &self,
    user: AppUser,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Update name/department/role on an existing profile row matched by
  /// email. Returns `false` if no such row exists.
  fn update_user_profile_by_email<'a>(
    &'a self,
    email: &'a str,
    name: &'a str,
    department: &'a str,
    role: Role,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn get_users_by_ids<'a>(
    &'a self,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<AppUser>, Self::Error>> + Send + 'a;

  // ── Personnel records ─────────────────────────────────────────────────

  fn get_personnel<'a>(
    &'a self,
    employee_no: &'a str,
  ) -> impl Future<Output = Result<Option<PersonnelRecord>, Self::Error>> + Send + 'a;

  /// All personnel records, ordered by name.
  fn list_personnel(
    &self,
  ) -> impl Future<Output = Result<Vec<PersonnelRecord>, Self::Error>> + Send + '_;

  /// Set the role on a personnel record. Returns the updated record, or
  /// `None` if the employee number is unknown.
  fn update_personnel_role<'a>(
    &'a self,
    employee_no: &'a str,
    role: Role,
  ) -> impl Future<Output = Result<Option<PersonnelRecord>, Self::Error>> + Send + 'a;

  // ── Events ────────────────────────────────────────────────────────────

  fn get_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// All events, newest first.
  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Mark an event closed with the given end date. Returns `false` if the
  /// event does not exist.
  fn close_event(
    &self,
    event_id: Uuid,
    end_date: NaiveDate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove an event and its dependent rows, returning a backup of what
  /// was removed. `None` if the event does not exist.
  fn delete_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Option<DeletedEventBackup>, Self::Error>> + Send + '_;

  /// Write the ranking snapshot and flip `result_finalized`, conditioned
  /// on the event still being closed and unfinalized at write time.
  /// Returns `false` when the condition no longer holds (lost race or
  /// stale precondition check) — the stored snapshot is untouched then.
  fn finalize_event<'a>(
    &'a self,
    event_id: Uuid,
    snapshot: &'a [RankedEntry],
    finalized_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Dashboard inputs ──────────────────────────────────────────────────

  /// Per-event submission/judge/judgment tallies plus department stats,
  /// collected in one pass for a dashboard read.
  fn progress_snapshot(
    &self,
  ) -> impl Future<Output = Result<ProgressSnapshot, Self::Error>> + Send + '_;

  // ── Ranking inputs ────────────────────────────────────────────────────

  /// An event's submissions with submitter names resolved, in creation
  /// order.
  fn ranking_submissions(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RankingSubmission>, Self::Error>> + Send + '_;

  fn judgments_for_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Judgment>, Self::Error>> + Send + '_;

  /// Every judgment's judge and score map, for judge analytics.
  fn list_judgment_scores(
    &self,
  ) -> impl Future<Output = Result<Vec<JudgeScore>, Self::Error>> + Send + '_;

  // ── Audit trail ───────────────────────────────────────────────────────

  /// Append one audit entry. Never updates or deletes existing entries.
  fn append_audit(
    &self,
    entry: NewAuditLogEntry,
  ) -> impl Future<Output = Result<AuditLogEntry, Self::Error>> + Send + '_;

  /// The most recent `limit` audit entries, newest first.
  fn list_audit(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AuditLogEntry>, Self::Error>> + Send + '_;

  // ── Rate limiting ─────────────────────────────────────────────────────

  /// Atomically consume one request from the fixed window identified by
  /// `key`. Creates the window on first contact and resets it once
  /// `window_seconds` have elapsed.
  fn consume_rate_limit<'a>(
    &'a self,
    key: &'a str,
    max_requests: u32,
    window_seconds: i64,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<RateDecision, Self::Error>> + Send + 'a;
}

//! [`SqliteStore`] — the SQLite implementation of [`PlatformStore`].

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

use laurel_core::{
  analytics::JudgeScore,
  audit::{AuditLogEntry, NewAuditLogEntry},
  event::{DeletedEventBackup, Event, Judgment, JudgeAssignment, Submission},
  metrics::{
    DepartmentCount, EventDepartmentStats, ProgressCounts, ProgressSnapshot,
  },
  ranking::{RankedEntry, RankingSubmission},
  ratelimit::RateDecision,
  store::PlatformStore,
  user::{AppUser, Identity, PersonnelRecord, Role},
};

use crate::{
  Error, Result,
  encode::{
    RawAudit, RawEvent, RawIdentity, RawPersonnel, RawUser, decode_dt,
    decode_score, decode_status, decode_uuid, encode_date, encode_dt,
    encode_role, encode_score, encode_snapshot, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

/// Placeholder department for submitters with no profile department.
const UNASSIGNED_DEPARTMENT: &str = "unassigned";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A laurel platform store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// queries for one store run on one dedicated connection thread, which is
/// what makes the rate-limit transaction a true atomic
/// read-increment-compare from the callers' point of view.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
  }
}

// ─── Seeding surface ─────────────────────────────────────────────────────────
//
// Plain inserts used by the submission/judging layer (and tests). The admin
// core itself never creates these records; it only reads and mutates them
// through the `PlatformStore` trait.

impl SqliteStore {
  /// Insert an identity with a bearer token. Only the token's SHA-256
  /// digest is stored.
  pub async fn insert_identity(
    &self,
    identity: &Identity,
    token: &str,
    token_expires_at: Option<DateTime<Utc>>,
  ) -> Result<()> {
    let id_str = encode_uuid(identity.identity_id);
    let email = identity.email.clone();
    let name = identity.name.clone();
    let department = identity.department.clone();
    let role_str = identity.metadata_role.map(encode_role);
    let digest = Self::token_digest(token);
    let expires_str = token_expires_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (
             identity_id, email, name, department, metadata_role,
             token_digest, token_expires_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, email, name, department, role_str, digest, expires_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_personnel(&self, record: &PersonnelRecord) -> Result<()> {
    let employee_no = record.employee_no.clone();
    let name = record.name.clone();
    let department = record.department.clone();
    let role_str = encode_role(record.role);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO personnel (employee_no, name, department, role)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![employee_no, name, department, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_event(&self, event: &Event) -> Result<()> {
    let id_str = encode_uuid(event.event_id);
    let title = event.title.clone();
    let status_str = encode_status(event.status);
    let end_date_str = event.end_date.map(encode_date);
    let created_str = encode_dt(event.created_at);
    let finalized = event.result_finalized;
    let finalized_at_str = event.finalized_at.map(encode_dt);
    let snapshot_str = event
      .ranking_snapshot
      .as_deref()
      .map(encode_snapshot)
      .transpose()?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (
             event_id, title, status, end_date, created_at,
             result_finalized, finalized_at, ranking_snapshot
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            title,
            status_str,
            end_date_str,
            created_str,
            finalized,
            finalized_at_str,
            snapshot_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_submission(&self, submission: &Submission) -> Result<()> {
    let id_str = encode_uuid(submission.submission_id);
    let event_str = encode_uuid(submission.event_id);
    let submitter_str = encode_uuid(submission.submitter_id);
    let title = submission.title.clone();
    let created_str = encode_dt(submission.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO submissions (
             submission_id, event_id, submitter_id, title, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, event_str, submitter_str, title, created_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_judge_assignment(
    &self,
    assignment: &JudgeAssignment,
  ) -> Result<()> {
    let event_str = encode_uuid(assignment.event_id);
    let judge_str = encode_uuid(assignment.judge_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO judge_assignments (event_id, judge_id) VALUES (?1, ?2)",
          rusqlite::params![event_str, judge_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_judgment(&self, judgment: &Judgment) -> Result<()> {
    let submission_str = encode_uuid(judgment.submission_id);
    let judge_str = encode_uuid(judgment.judge_id);
    let score_str = encode_score(&judgment.score)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO judgments (submission_id, judge_id, score)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![submission_str, judge_str, score_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn read_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
  Ok(RawEvent {
    event_id:         row.get(0)?,
    title:            row.get(1)?,
    status:           row.get(2)?,
    end_date:         row.get(3)?,
    created_at:       row.get(4)?,
    result_finalized: row.get(5)?,
    finalized_at:     row.get(6)?,
    ranking_snapshot: row.get(7)?,
  })
}

const EVENT_COLUMNS: &str = "event_id, title, status, end_date, created_at,
   result_finalized, finalized_at, ranking_snapshot";

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:    row.get(0)?,
    email:      row.get(1)?,
    name:       row.get(2)?,
    department: row.get(3)?,
    role:       row.get(4)?,
    updated_at: row.get(5)?,
  })
}

fn read_identity_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawIdentity> {
  Ok(RawIdentity {
    identity_id:      row.get(0)?,
    email:            row.get(1)?,
    name:             row.get(2)?,
    department:       row.get(3)?,
    metadata_role:    row.get(4)?,
    token_expires_at: row.get(5)?,
  })
}

// ─── PlatformStore impl ──────────────────────────────────────────────────────

impl PlatformStore for SqliteStore {
  type Error = Error;

  // ── Identities ───────────────────────────────────────────────────────────

  async fn verify_token<'a>(
    &'a self,
    token: &'a str,
    now: DateTime<Utc>,
  ) -> Result<Option<Identity>> {
    let digest = Self::token_digest(token);

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT identity_id, email, name, department, metadata_role,
                    token_expires_at
               FROM identities WHERE token_digest = ?1",
            rusqlite::params![digest],
            read_identity_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    let Some(raw) = raw else { return Ok(None) };
    let (identity, expires_at) = raw.into_identity()?;

    // An expired token is indistinguishable from an unknown one.
    if let Some(expires_at) = expires_at
      && expires_at <= now
    {
      return Ok(None);
    }
    Ok(Some(identity))
  }

  async fn get_identity_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> Result<Option<Identity>> {
    let email = email.to_string();

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT identity_id, email, name, department, metadata_role,
                    token_expires_at
               FROM identities WHERE email = ?1",
            rusqlite::params![email],
            read_identity_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw
      .map(|raw| raw.into_identity().map(|(identity, _)| identity))
      .transpose()
  }

  async fn set_identity_metadata_role(
    &self,
    identity_id: Uuid,
    role: Role,
  ) -> Result<()> {
    let id_str = encode_uuid(identity_id);
    let role_str = encode_role(role);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE identities SET metadata_role = ?2 WHERE identity_id = ?1",
          rusqlite::params![id_str, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── AppUsers ─────────────────────────────────────────────────────────────

  async fn get_user(&self, user_id: Uuid) -> Result<Option<AppUser>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT user_id, email, name, department, role, updated_at
               FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            read_user_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> Result<Option<AppUser>> {
    let email = email.to_string();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT user_id, email, name, department, role, updated_at
               FROM users WHERE email = ?1",
            rusqlite::params![email],
            read_user_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn upsert_user(&self, user: AppUser) -> Result<()> {
    let id_str = encode_uuid(user.user_id);
    let email = user.email;
    let name = user.name;
    let department = user.department;
    let role_str = encode_role(user.role);
    let updated_str = encode_dt(user.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, email, name, department, role, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(user_id) DO UPDATE SET
             email      = excluded.email,
             name       = excluded.name,
             department = excluded.department,
             role       = excluded.role,
             updated_at = excluded.updated_at",
          rusqlite::params![id_str, email, name, department, role_str, updated_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn update_user_profile_by_email<'a>(
    &'a self,
    email: &'a str,
    name: &'a str,
    department: &'a str,
    role: Role,
    now: DateTime<Utc>,
  ) -> Result<bool> {
    let email = email.to_string();
    let name = name.to_string();
    let department = department.to_string();
    let role_str = encode_role(role);
    let updated_str = encode_dt(now);

    let changed = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users
              SET name = ?2, department = ?3, role = ?4, updated_at = ?5
            WHERE email = ?1",
          rusqlite::params![email, name, department, role_str, updated_str],
        )?;
        Ok(changed)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn get_users_by_ids<'a>(&'a self, ids: &'a [Uuid]) -> Result<Vec<AppUser>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let id_strs: Vec<String> = ids.iter().copied().map(encode_uuid).collect();

    let raw: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let placeholders =
          std::iter::repeat_n("?", id_strs.len()).collect::<Vec<_>>().join(",");
        let sql = format!(
          "SELECT user_id, email, name, department, role, updated_at
             FROM users WHERE user_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), read_user_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw.into_iter().map(RawUser::into_user).collect()
  }

  // ── Personnel records ────────────────────────────────────────────────────

  async fn get_personnel<'a>(
    &'a self,
    employee_no: &'a str,
  ) -> Result<Option<PersonnelRecord>> {
    let employee_no = employee_no.to_string();

    let raw: Option<RawPersonnel> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT employee_no, name, department, role
               FROM personnel WHERE employee_no = ?1",
            rusqlite::params![employee_no],
            |row| {
              Ok(RawPersonnel {
                employee_no: row.get(0)?,
                name:        row.get(1)?,
                department:  row.get(2)?,
                role:        row.get(3)?,
              })
            },
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawPersonnel::into_personnel).transpose()
  }

  async fn list_personnel(&self) -> Result<Vec<PersonnelRecord>> {
    let raw: Vec<RawPersonnel> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT employee_no, name, department, role
             FROM personnel ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPersonnel {
              employee_no: row.get(0)?,
              name:        row.get(1)?,
              department:  row.get(2)?,
              role:        row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw.into_iter().map(RawPersonnel::into_personnel).collect()
  }

  async fn update_personnel_role<'a>(
    &'a self,
    employee_no: &'a str,
    role: Role,
  ) -> Result<Option<PersonnelRecord>> {
    let employee_no = employee_no.to_string();
    let role_str = encode_role(role);

    let raw: Option<RawPersonnel> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE personnel SET role = ?2 WHERE employee_no = ?1",
          rusqlite::params![employee_no, role_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = conn.query_row(
          "SELECT employee_no, name, department, role
             FROM personnel WHERE employee_no = ?1",
          rusqlite::params![employee_no],
          |row| {
            Ok(RawPersonnel {
              employee_no: row.get(0)?,
              name:        row.get(1)?,
              department:  row.get(2)?,
              role:        row.get(3)?,
            })
          },
        )?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawPersonnel::into_personnel).transpose()
  }

  // ── Events ───────────────────────────────────────────────────────────────

  async fn get_event(&self, event_id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(event_id);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
            rusqlite::params![id_str],
            read_event_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self) -> Result<Vec<Event>> {
    let raw: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map([], read_event_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw.into_iter().map(RawEvent::into_event).collect()
  }

  async fn close_event(&self, event_id: Uuid, end_date: NaiveDate) -> Result<bool> {
    let id_str = encode_uuid(event_id);
    let end_date_str = encode_date(end_date);

    let changed = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE events SET status = 'closed', end_date = ?2
            WHERE event_id = ?1",
          rusqlite::params![id_str, end_date_str],
        )?;
        Ok(changed)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_event(&self, event_id: Uuid) -> Result<Option<DeletedEventBackup>> {
    let id_str = encode_uuid(event_id);

    let removed: Option<(RawEvent, usize, usize, usize)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raw = tx
          .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
            rusqlite::params![id_str],
            read_event_row,
          )
          .optional()?;
        let Some(raw) = raw else {
          return Ok(None);
        };

        let judgments = tx.execute(
          "DELETE FROM judgments WHERE submission_id IN
             (SELECT submission_id FROM submissions WHERE event_id = ?1)",
          rusqlite::params![id_str],
        )?;
        let submissions = tx.execute(
          "DELETE FROM submissions WHERE event_id = ?1",
          rusqlite::params![id_str],
        )?;
        let judge_assignments = tx.execute(
          "DELETE FROM judge_assignments WHERE event_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM events WHERE event_id = ?1",
          rusqlite::params![id_str],
        )?;

        tx.commit()?;
        Ok(Some((raw, submissions, judgments, judge_assignments)))
      })
      .await?;

    removed
      .map(|(raw, submissions, judgments, judge_assignments)| {
        Ok(DeletedEventBackup {
          event: raw.into_event()?,
          submissions,
          judgments,
          judge_assignments,
        })
      })
      .transpose()
  }

  async fn finalize_event<'a>(
    &'a self,
    event_id: Uuid,
    snapshot: &'a [RankedEntry],
    finalized_at: DateTime<Utc>,
  ) -> Result<bool> {
    let id_str = encode_uuid(event_id);
    let snapshot_str = encode_snapshot(snapshot)?;
    let finalized_str = encode_dt(finalized_at);

    // Compare-and-swap: the UPDATE carries the precondition, so of two
    // racing finalize calls only one can see result_finalized = 0.
    let changed = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE events
              SET result_finalized = 1, finalized_at = ?2, ranking_snapshot = ?3
            WHERE event_id = ?1
              AND result_finalized = 0
              AND status = 'closed'",
          rusqlite::params![id_str, finalized_str, snapshot_str],
        )?;
        Ok(changed)
      })
      .await?;
    Ok(changed == 1)
  }

  // ── Dashboard inputs ─────────────────────────────────────────────────────

  async fn progress_snapshot(&self) -> Result<ProgressSnapshot> {
    type DeptRow = (String, String, i64);

    let (events, submission_counts, judge_counts, judgment_counts, dept_rows): (
      Vec<(String, String, String)>,
      Vec<(String, i64)>,
      Vec<(String, i64)>,
      Vec<(String, i64)>,
      Vec<DeptRow>,
    ) = self
      .conn
      .call(|conn| {
        let events = conn
          .prepare("SELECT event_id, title, status FROM events ORDER BY created_at DESC")?
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let count_pairs = |conn: &rusqlite::Connection, sql: &str| {
          conn
            .prepare(sql)?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, i64)>>>()
        };

        let submission_counts = count_pairs(
          conn,
          "SELECT event_id, COUNT(*) FROM submissions GROUP BY event_id",
        )?;
        let judge_counts = count_pairs(
          conn,
          "SELECT event_id, COUNT(*) FROM judge_assignments GROUP BY event_id",
        )?;
        let judgment_counts = count_pairs(
          conn,
          "SELECT s.event_id, COUNT(*)
             FROM judgments j
             JOIN submissions s ON s.submission_id = j.submission_id
            GROUP BY s.event_id",
        )?;

        let dept_rows = conn
          .prepare(
            "SELECT s.event_id,
                    COALESCE(NULLIF(u.department, ''), ?1) AS dept,
                    COUNT(*)
               FROM submissions s
               LEFT JOIN users u ON u.user_id = s.submitter_id
              GROUP BY s.event_id, dept
              ORDER BY COUNT(*) DESC",
          )?
          .query_map(rusqlite::params![UNASSIGNED_DEPARTMENT], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((events, submission_counts, judge_counts, judgment_counts, dept_rows))
      })
      .await?;

    let mut counts: HashMap<Uuid, ProgressCounts> = HashMap::new();
    for (id_str, n) in submission_counts {
      counts.entry(decode_uuid(&id_str)?).or_default().submissions = n as u64;
    }
    for (id_str, n) in judge_counts {
      counts.entry(decode_uuid(&id_str)?).or_default().judges = n as u64;
    }
    for (id_str, n) in judgment_counts {
      counts.entry(decode_uuid(&id_str)?).or_default().judgments = n as u64;
    }

    let mut departments: HashMap<Uuid, Vec<DepartmentCount>> = HashMap::new();
    for (id_str, department, count) in dept_rows {
      departments
        .entry(decode_uuid(&id_str)?)
        .or_default()
        .push(DepartmentCount { department, count: count as u64 });
    }

    // One stats row per event, zeroed for events with no submissions.
    let mut department_stats = Vec::with_capacity(events.len());
    for (id_str, title, status_str) in events {
      let event_id = decode_uuid(&id_str)?;
      let event_departments = departments.remove(&event_id).unwrap_or_default();
      department_stats.push(EventDepartmentStats {
        event_id,
        title,
        status: decode_status(&status_str)?,
        total_submissions: event_departments.iter().map(|d| d.count).sum(),
        departments: event_departments,
      });
    }

    Ok(ProgressSnapshot { counts, department_stats })
  }

  // ── Ranking inputs ───────────────────────────────────────────────────────

  async fn ranking_submissions(
    &self,
    event_id: Uuid,
  ) -> Result<Vec<RankingSubmission>> {
    let id_str = encode_uuid(event_id);

    let raw: Vec<(String, String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.submission_id, s.title,
                  COALESCE(NULLIF(u.name, ''), 'anonymous'),
                  s.created_at
             FROM submissions s
             LEFT JOIN users u ON u.user_id = s.submitter_id
            WHERE s.event_id = ?1
            ORDER BY s.created_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw
      .into_iter()
      .map(|(id_str, title, submitter_name, created_str)| {
        Ok(RankingSubmission {
          submission_id: decode_uuid(&id_str)?,
          title,
          submitter_name,
          created_at: decode_dt(&created_str)?,
        })
      })
      .collect()
  }

  async fn judgments_for_event(&self, event_id: Uuid) -> Result<Vec<Judgment>> {
    let id_str = encode_uuid(event_id);

    let raw: Vec<(String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT j.submission_id, j.judge_id, j.score
             FROM judgments j
             JOIN submissions s ON s.submission_id = j.submission_id
            WHERE s.event_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw
      .into_iter()
      .map(|(submission_str, judge_str, score_str)| {
        Ok(Judgment {
          submission_id: decode_uuid(&submission_str)?,
          judge_id:      decode_uuid(&judge_str)?,
          score:         decode_score(&score_str)?,
        })
      })
      .collect()
  }

  async fn list_judgment_scores(&self) -> Result<Vec<JudgeScore>> {
    let raw: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT judge_id, score FROM judgments")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw
      .into_iter()
      .map(|(judge_str, score_str)| {
        Ok(JudgeScore {
          judge_id: decode_uuid(&judge_str)?,
          score:    decode_score(&score_str)?,
        })
      })
      .collect()
  }

  // ── Audit trail ──────────────────────────────────────────────────────────

  async fn append_audit(&self, entry: NewAuditLogEntry) -> Result<AuditLogEntry> {
    let stored = AuditLogEntry {
      id:          Uuid::new_v4(),
      created_at:  Utc::now(),
      actor_id:    entry.actor_id,
      action:      entry.action,
      target_type: entry.target_type,
      target_id:   entry.target_id,
      metadata:    entry.metadata,
    };

    let id_str = encode_uuid(stored.id);
    let created_str = encode_dt(stored.created_at);
    let actor_str = encode_uuid(stored.actor_id);
    let action = stored.action.clone();
    let target_type = stored.target_type.clone();
    let target_id = stored.target_id.clone();
    let metadata_str = serde_json::to_string(&stored.metadata)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_logs (
             id, created_at, actor_id, action, target_type, target_id, metadata
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, created_str, actor_str, action, target_type, target_id,
            metadata_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(stored)
  }

  async fn list_audit(&self, limit: usize) -> Result<Vec<AuditLogEntry>> {
    let limit = limit as i64;
    let raw: Vec<RawAudit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, created_at, actor_id, action, target_type, target_id,
                  metadata
             FROM audit_logs
            ORDER BY created_at DESC
            LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(RawAudit {
              id:          row.get(0)?,
              created_at:  row.get(1)?,
              actor_id:    row.get(2)?,
              action:      row.get(3)?,
              target_type: row.get(4)?,
              target_id:   row.get(5)?,
              metadata:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw.into_iter().map(RawAudit::into_entry).collect()
  }

  // ── Rate limiting ────────────────────────────────────────────────────────

  async fn consume_rate_limit<'a>(
    &'a self,
    key: &'a str,
    max_requests: u32,
    window_seconds: i64,
    now: DateTime<Utc>,
  ) -> Result<RateDecision> {
    let key = key.to_string();
    let max = i64::from(max_requests);
    let now_secs = now.timestamp();

    // The whole read-increment-compare runs in one transaction on the
    // store's single connection thread; concurrent callers serialize here
    // instead of racing a read-then-write pair.
    let decision = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let row: Option<(i64, i64)> = tx
          .query_row(
            "SELECT window_start, count FROM rate_limits WHERE key = ?1",
            rusqlite::params![key],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;

        let decision = match row {
          None => {
            tx.execute(
              "INSERT INTO rate_limits (key, window_start, count)
               VALUES (?1, ?2, 1)",
              rusqlite::params![key, now_secs],
            )?;
            RateDecision { allowed: true, retry_after_seconds: 0 }
          }
          Some((window_start, _count))
            if now_secs - window_start >= window_seconds =>
          {
            // Window elapsed; start a fresh one.
            tx.execute(
              "UPDATE rate_limits SET window_start = ?2, count = 1
                WHERE key = ?1",
              rusqlite::params![key, now_secs],
            )?;
            RateDecision { allowed: true, retry_after_seconds: 0 }
          }
          Some((_, count)) if count < max => {
            tx.execute(
              "UPDATE rate_limits SET count = count + 1 WHERE key = ?1",
              rusqlite::params![key],
            )?;
            RateDecision { allowed: true, retry_after_seconds: 0 }
          }
          Some((window_start, _)) => {
            let remaining = window_seconds - (now_secs - window_start);
            RateDecision {
              allowed:             false,
              retry_after_seconds: remaining.max(1),
            }
          }
        };

        tx.commit()?;
        Ok(decision)
      })
      .await?;
    Ok(decision)
  }
}

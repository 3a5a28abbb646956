//! SQL schema for the laurel SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Auth identities. Tokens are stored as SHA-256 digests, never plaintext.
CREATE TABLE IF NOT EXISTS identities (
    identity_id      TEXT PRIMARY KEY,
    email            TEXT NOT NULL UNIQUE,
    name             TEXT,
    department       TEXT,
    metadata_role    TEXT,            -- 'submitter' | 'judge' | 'admin' | NULL
    token_digest     TEXT UNIQUE,
    token_expires_at TEXT             -- RFC 3339 UTC
);

-- Application profiles, created lazily; user_id equals the identity id.
CREATE TABLE IF NOT EXISTS users (
    user_id    TEXT PRIMARY KEY,
    email      TEXT NOT NULL UNIQUE,
    name       TEXT,
    department TEXT,
    role       TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- HR source of truth, keyed by employee number.
CREATE TABLE IF NOT EXISTS personnel (
    employee_no TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    department  TEXT NOT NULL,
    role        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    event_id         TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    status           TEXT NOT NULL,   -- 'draft' | 'active' | 'closed'
    end_date         TEXT,            -- ISO date, date-only precision
    created_at       TEXT NOT NULL,
    result_finalized INTEGER NOT NULL DEFAULT 0,
    finalized_at     TEXT,
    ranking_snapshot TEXT             -- JSON array, written exactly once
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id TEXT PRIMARY KEY,
    event_id      TEXT NOT NULL REFERENCES events(event_id),
    submitter_id  TEXT NOT NULL,
    title         TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS judge_assignments (
    event_id TEXT NOT NULL REFERENCES events(event_id),
    judge_id TEXT NOT NULL,
    PRIMARY KEY (event_id, judge_id)
);

-- One judgment per (submission, judge) pair.
CREATE TABLE IF NOT EXISTS judgments (
    submission_id TEXT NOT NULL REFERENCES submissions(submission_id),
    judge_id      TEXT NOT NULL,
    score         TEXT NOT NULL,      -- JSON criterion -> number map
    PRIMARY KEY (submission_id, judge_id)
);

-- Audit entries are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS audit_logs (
    id          TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,
    actor_id    TEXT NOT NULL,
    action      TEXT NOT NULL,
    target_type TEXT NOT NULL,
    target_id   TEXT NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}'
);

-- Fixed-window rate-limit counters. Rows are overwritten in place when a
-- window elapses; stale rows are harmless.
CREATE TABLE IF NOT EXISTS rate_limits (
    key          TEXT PRIMARY KEY,
    window_start INTEGER NOT NULL,    -- unix seconds
    count        INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS submissions_event_idx ON submissions(event_id);
CREATE INDEX IF NOT EXISTS judgments_judge_idx   ON judgments(judge_id);
CREATE INDEX IF NOT EXISTS audit_created_idx     ON audit_logs(created_at);

PRAGMA user_version = 1;
";

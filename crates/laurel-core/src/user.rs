//! Principals and the three loosely-synchronized identity records.
//!
//! A person is represented three times: as an [`Identity`] (the
//! credential-bearing auth record), as an [`AppUser`] (the application
//! profile, created lazily), and as a [`PersonnelRecord`] (the HR source of
//! truth, keyed by employee number). The records can lag each other; role
//! resolution treats them as independent signals (see [`crate::role`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Role ────────────────────────────────────────────────────────────────────

/// Application role attached to a person in any of the identity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Submitter,
  Judge,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Submitter => "submitter",
      Role::Judge => "judge",
      Role::Admin => "admin",
    }
  }

  /// Parse a role from its wire form. Unknown values are rejected rather
  /// than defaulted; a typo must never grant or revoke privileges.
  pub fn parse(s: &str) -> Result<Role> {
    match s {
      "submitter" => Ok(Role::Submitter),
      "judge" => Ok(Role::Judge),
      "admin" => Ok(Role::Admin),
      other => Err(Error::UnknownRole(other.to_string())),
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// The authenticated principal produced by verifying a bearer credential.
///
/// Owned by the identity store; the core only ever reads it. The metadata
/// role is a denormalised copy that can drift from the other records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
  pub identity_id:   Uuid,
  pub email:         String,
  pub name:          Option<String>,
  pub department:    Option<String>,
  pub metadata_role: Option<Role>,
}

// ─── AppUser ─────────────────────────────────────────────────────────────────

/// Application-level profile linked to an identity (`user_id == identity_id`).
///
/// Created lazily on first privileged contact, so it may be absent or stale
/// for people who exist in the other two records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUser {
  pub user_id:    Uuid,
  pub email:      String,
  pub name:       Option<String>,
  pub department: Option<String>,
  pub role:       Role,
  pub updated_at: DateTime<Utc>,
}

// ─── PersonnelRecord ─────────────────────────────────────────────────────────

/// The canonical HR-sourced record, keyed by employee number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelRecord {
  pub employee_no: String,
  pub name:        String,
  pub department:  String,
  pub role:        Role,
}

// ─── Employee number derivation ──────────────────────────────────────────────

/// Derive the candidate employee number from an email address: the local
/// part (text before `@`). Returns `None` for addresses with no `@`, which
/// simply leaves the personnel signal unmatched.
pub fn employee_no_from_email(email: &str) -> Option<&str> {
  let (local, _domain) = email.split_once('@')?;
  if local.is_empty() { None } else { Some(local) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn employee_no_is_the_local_part() {
    assert_eq!(employee_no_from_email("12345@corp.internal"), Some("12345"));
  }

  #[test]
  fn employee_no_missing_for_bare_names() {
    assert_eq!(employee_no_from_email("not-an-email"), None);
    assert_eq!(employee_no_from_email("@corp.internal"), None);
  }

  #[test]
  fn role_parse_round_trips() {
    for role in [Role::Submitter, Role::Judge, Role::Admin] {
      assert_eq!(Role::parse(role.as_str()).unwrap(), role);
    }
    assert!(Role::parse("superuser").is_err());
  }
}

//! Admin role resolution across the three identity records.
//!
//! The auth record, the application profile, and the personnel record are
//! synchronized lazily and can disagree. A stale record must never lock out
//! a legitimate administrator, so the admin decision is the logical OR of
//! four independent signals rather than a single source. The decision keeps
//! the matched signals so callers can audit *which* record granted access.

use serde::Serialize;

use crate::user::Role;

// ─── Signals ─────────────────────────────────────────────────────────────────

/// One of the independent places an admin role can be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSignal {
  /// `AppUser` row looked up by identity id.
  UserById,
  /// `AppUser` row looked up by email.
  UserByEmail,
  /// Role embedded in the identity's metadata.
  IdentityMetadata,
  /// `PersonnelRecord` looked up by derived employee number.
  Personnel,
}

/// The outcome of resolving a principal's role signals.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDecision {
  /// Signals that carried the admin role. Empty means not an admin.
  pub matched: Vec<RoleSignal>,
}

impl RoleDecision {
  pub fn is_admin(&self) -> bool {
    !self.matched.is_empty()
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve admin status from the four role signals, in lookup order.
///
/// `None` means the backing record was absent (or had no role), which is
/// treated the same as a non-admin role: only an explicit admin entry
/// matches.
pub fn resolve_role(
  user_by_id: Option<Role>,
  user_by_email: Option<Role>,
  identity_metadata: Option<Role>,
  personnel: Option<Role>,
) -> RoleDecision {
  let signals = [
    (RoleSignal::UserById, user_by_id),
    (RoleSignal::UserByEmail, user_by_email),
    (RoleSignal::IdentityMetadata, identity_metadata),
    (RoleSignal::Personnel, personnel),
  ];

  let matched = signals
    .into_iter()
    .filter(|(_, role)| *role == Some(Role::Admin))
    .map(|(signal, _)| signal)
    .collect();

  RoleDecision { matched }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn no_signals_means_no_admin() {
    let decision = resolve_role(None, None, None, None);
    assert!(!decision.is_admin());
    assert!(decision.matched.is_empty());
  }

  #[test]
  fn non_admin_roles_do_not_match() {
    let decision = resolve_role(
      Some(Role::Submitter),
      Some(Role::Judge),
      Some(Role::Judge),
      Some(Role::Submitter),
    );
    assert!(!decision.is_admin());
  }

  #[test]
  fn any_single_signal_grants_admin() {
    let cases = [
      (Some(Role::Admin), None, None, None, RoleSignal::UserById),
      (None, Some(Role::Admin), None, None, RoleSignal::UserByEmail),
      (None, None, Some(Role::Admin), None, RoleSignal::IdentityMetadata),
      (None, None, None, Some(Role::Admin), RoleSignal::Personnel),
    ];
    for (by_id, by_email, meta, personnel, expected) in cases {
      let decision = resolve_role(by_id, by_email, meta, personnel);
      assert!(decision.is_admin(), "signal {expected:?} should grant");
      assert_eq!(decision.matched, vec![expected]);
    }
  }

  #[test]
  fn all_matching_signals_are_recorded() {
    let decision = resolve_role(
      Some(Role::Admin),
      Some(Role::Submitter),
      Some(Role::Admin),
      None,
    );
    assert_eq!(
      decision.matched,
      vec![RoleSignal::UserById, RoleSignal::IdentityMetadata]
    );
  }
}

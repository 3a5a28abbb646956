//! Credential extraction and the admin authorization guard.
//!
//! The guard resolves a bearer token to a verified identity and decides
//! admin status from four independent role signals (see
//! [`laurel_core::role`]). Rejection paths have no side effects; the only
//! write a successful pass may perform is the lazy creation of a missing
//! `AppUser` row.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use chrono::{DateTime, Utc};
use laurel_core::{
  role::{RoleDecision, resolve_role},
  store::PlatformStore,
  user::{AppUser, Role, employee_no_from_email},
};
use uuid::Uuid;

use crate::error::ApiError;

/// The verified, admin-confirmed caller of a privileged operation.
#[derive(Debug, Clone)]
pub struct AdminContext {
  pub identity_id:   Uuid,
  pub email:         String,
  /// Employee number derived from the email local-part; absent when the
  /// email has no such shape.
  pub employee_no:   Option<String>,
  pub metadata_role: Option<Role>,
  /// Which role signals granted access.
  pub decision:      RoleDecision,
}

/// Pick the credential for a request. An explicit token in the request
/// body wins over the `Authorization` header, for callers whose header
/// propagation is unreliable.
pub fn extract_access_token(
  headers: &HeaderMap,
  body_token: Option<String>,
) -> Option<String> {
  if let Some(token) = body_token
    && !token.is_empty()
  {
    return Some(token);
  }
  headers
    .get(AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::to_string)
}

/// Verify the credential and require admin privileges.
///
/// Admin status is the OR of four signals — AppUser by id, AppUser by
/// email, identity metadata, personnel record — because the backing
/// records synchronize lazily and any one of them can be stale. When the
/// caller is an admin but has no AppUser row yet, one is created with the
/// admin role, healing the desync for subsequent lookups.
pub async fn require_admin<S>(
  store: &S,
  token: Option<String>,
  now: DateTime<Utc>,
) -> Result<AdminContext, ApiError>
where
  S: PlatformStore,
{
  let token = token.ok_or(ApiError::TokenMissing)?;

  let identity = store
    .verify_token(&token, now)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::AuthFailed)?;

  let employee_no = employee_no_from_email(&identity.email).map(str::to_string);

  let user_by_id = store
    .get_user(identity.identity_id)
    .await
    .map_err(ApiError::store)?;
  let user_by_email = store
    .get_user_by_email(&identity.email)
    .await
    .map_err(ApiError::store)?;
  let personnel = match employee_no.as_deref() {
    Some(no) => store.get_personnel(no).await.map_err(ApiError::store)?,
    None => None,
  };

  let decision = resolve_role(
    user_by_id.as_ref().map(|u| u.role),
    user_by_email.as_ref().map(|u| u.role),
    identity.metadata_role,
    personnel.as_ref().map(|p| p.role),
  );

  if !decision.is_admin() {
    return Err(ApiError::AdminRequired);
  }

  // Lazily create the missing profile row, promoted to admin since some
  // other record just vouched for it.
  if user_by_id.is_none() {
    store
      .upsert_user(AppUser {
        user_id:    identity.identity_id,
        email:      identity.email.clone(),
        name:       identity.name.clone(),
        department: identity.department.clone(),
        role:       Role::Admin,
        updated_at: now,
      })
      .await
      .map_err(ApiError::store)?;
    tracing::info!(
      identity_id = %identity.identity_id,
      "created missing admin profile row"
    );
  }

  Ok(AdminContext {
    identity_id: identity.identity_id,
    email: identity.email,
    employee_no,
    metadata_role: identity.metadata_role,
    decision,
  })
}

//! `POST /admin/manage-user-role` — personnel listing and role updates.
//!
//! A role update lands on the personnel record first (the source of
//! truth), then propagates to the AppUser profile and the identity
//! metadata so the other two signals converge instead of drifting.

use axum::{extract::State, http::HeaderMap, response::Response};
use chrono::Utc;
use laurel_core::{
  audit::NewAuditLogEntry,
  store::PlatformStore,
  user::{AppUser, PersonnelRecord, Role},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{extract_access_token, require_admin},
  error::{ApiError, respond},
  handlers::parse_body,
  ratelimit,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManageRoleRequest {
  pub access_token: Option<String>,
  pub action:       Option<String>,
  pub employee_no:  Option<String>,
  pub next_role:    Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ManageRoleResponse {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ok:         Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub employees:  Option<Vec<PersonnelRecord>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub employee:   Option<PersonnelRecord>,
  pub request_id: Uuid,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: String,
) -> Response
where
  S: PlatformStore,
{
  let request_id = Uuid::new_v4();
  let req: ManageRoleRequest = parse_body(&body);
  respond(run(&state, &headers, req, request_id).await, request_id)
}

async fn run<S>(
  state: &AppState<S>,
  headers: &HeaderMap,
  req: ManageRoleRequest,
  request_id: Uuid,
) -> Result<ManageRoleResponse, ApiError>
where
  S: PlatformStore,
{
  let now = Utc::now();
  let token = extract_access_token(headers, req.access_token);
  let ctx = require_admin(state.store.as_ref(), token, now).await?;
  ratelimit::enforce(state, "manage-user-role", ctx.identity_id, now).await?;

  match req.action.as_deref() {
    Some("list") => {
      let employees =
        state.store.list_personnel().await.map_err(ApiError::store)?;
      Ok(ManageRoleResponse {
        ok: None,
        employees: Some(employees),
        employee: None,
        request_id,
      })
    }

    Some("update_role") => {
      let employee_no = req
        .employee_no
        .as_deref()
        .filter(|no| !no.is_empty())
        .ok_or_else(|| ApiError::BadRequest("employeeNo is required".to_string()))?;
      let next_role = req
        .next_role
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("nextRole is required".to_string()))?;
      let next_role = Role::parse(next_role).map_err(ApiError::from_core)?;

      let before = state
        .store
        .get_personnel(employee_no)
        .await
        .map_err(ApiError::store)?;

      let updated = state
        .store
        .update_personnel_role(employee_no, next_role)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::EmployeeNotFound(employee_no.to_string()))?;

      sync_linked_records(state, &updated, next_role).await?;
      tracing::info!(
        %request_id,
        employee_no,
        role = %next_role,
        "employee role updated"
      );

      state
        .store
        .append_audit(NewAuditLogEntry {
          actor_id:    ctx.identity_id,
          action:      "update_user_role".to_string(),
          target_type: "employee".to_string(),
          target_id:   employee_no.to_string(),
          metadata:    json!({
            "employee_no": employee_no,
            "name": updated.name,
            "before_role": before.map(|p| p.role),
            "after_role": next_role,
          }),
        })
        .await
        .map_err(|e| ApiError::AuditLogFailed(Box::new(e)))?;

      Ok(ManageRoleResponse {
        ok: Some(true),
        employees: None,
        employee: Some(updated),
        request_id,
      })
    }

    Some(other) => {
      Err(ApiError::BadRequest(format!("unsupported action: {other:?}")))
    }
    None => Err(ApiError::BadRequest("action is required".to_string())),
  }
}

/// Propagate a personnel role change to the other two identity records.
///
/// If an identity exists for the employee's derived address, both its
/// metadata role and its profile row are rewritten; otherwise only an
/// already-existing profile row (matched by email) is refreshed.
async fn sync_linked_records<S>(
  state: &AppState<S>,
  record: &PersonnelRecord,
  role: Role,
) -> Result<(), ApiError>
where
  S: PlatformStore,
{
  let now = Utc::now();
  let email = format!("{}@{}", record.employee_no, state.config.email_domain);

  let identity = state
    .store
    .get_identity_by_email(&email)
    .await
    .map_err(ApiError::store)?;

  match identity {
    Some(identity) => {
      state
        .store
        .upsert_user(AppUser {
          user_id:    identity.identity_id,
          email:      email.clone(),
          name:       Some(record.name.clone()),
          department: Some(record.department.clone()),
          role,
          updated_at: now,
        })
        .await
        .map_err(ApiError::store)?;
      state
        .store
        .set_identity_metadata_role(identity.identity_id, role)
        .await
        .map_err(ApiError::store)?;
    }
    None => {
      // No identity yet — the person has never logged in. Refresh their
      // profile row if one exists; it will be recreated on first contact
      // otherwise.
      state
        .store
        .update_user_profile_by_email(
          &email,
          &record.name,
          &record.department,
          role,
          now,
        )
        .await
        .map_err(ApiError::store)?;
    }
  }
  Ok(())
}

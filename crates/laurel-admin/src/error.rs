//! API error type and the JSON error envelope.
//!
//! Every failure carries a human-readable message, a stable machine code,
//! and the request id, so a client report can be correlated with server
//! logs. Store and audit failures are logged with their source but never
//! leak internals into the response body.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// An error returned by an admin API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication token was not provided")]
  TokenMissing,

  #[error("token is invalid or the session has expired")]
  AuthFailed,

  #[error("administrator privileges are required")]
  AdminRequired,

  #[error("too many requests")]
  RateLimited { retry_after: i64 },

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("event {0} not found")]
  EventNotFound(Uuid),

  #[error("employee {0} not found")]
  EmployeeNotFound(String),

  #[error("event {0} has no submissions")]
  NoSubmissions(Uuid),

  #[error("event {0} is not closed")]
  EventNotClosed(Uuid),

  #[error("results for event {0} are already finalized")]
  AlreadyFinalized(Uuid),

  /// The mutation succeeded but its audit entry could not be written.
  #[error("failed to record the audit log entry")]
  AuditLogFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Wrap a storage-layer error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    ApiError::Store(Box::new(e))
  }

  /// Map a core precondition failure onto its wire error.
  pub fn from_core(e: laurel_core::Error) -> Self {
    use laurel_core::Error as Core;
    match e {
      Core::EventNotClosed(id, _) => ApiError::EventNotClosed(id),
      Core::AlreadyFinalized(id) => ApiError::AlreadyFinalized(id),
      Core::NoSubmissions(id) => ApiError::NoSubmissions(id),
      Core::UnknownRole(role) => {
        ApiError::BadRequest(format!("role {role:?} is not allowed"))
      }
      Core::Serialization(e) => ApiError::Store(Box::new(e)),
    }
  }

  /// Stable machine-readable code for this error.
  pub fn code(&self) -> &'static str {
    match self {
      ApiError::TokenMissing => "TOKEN_MISSING",
      ApiError::AuthFailed => "AUTH_FAILED",
      ApiError::AdminRequired => "ADMIN_REQUIRED",
      ApiError::RateLimited { .. } => "RATE_LIMITED",
      ApiError::BadRequest(_) => "BAD_REQUEST",
      ApiError::EventNotFound(_) => "EVENT_NOT_FOUND",
      ApiError::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
      ApiError::NoSubmissions(_) => "NO_SUBMISSIONS",
      ApiError::EventNotClosed(_) => "EVENT_NOT_CLOSED",
      ApiError::AlreadyFinalized(_) => "ALREADY_FINALIZED",
      ApiError::AuditLogFailed(_) => "AUDIT_LOG_FAILED",
      ApiError::Store(_) => "INTERNAL_ERROR",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::TokenMissing | ApiError::AuthFailed => StatusCode::UNAUTHORIZED,
      ApiError::AdminRequired => StatusCode::FORBIDDEN,
      ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
      ApiError::BadRequest(_)
      | ApiError::NoSubmissions(_)
      | ApiError::EventNotClosed(_)
      | ApiError::AlreadyFinalized(_) => StatusCode::BAD_REQUEST,
      ApiError::EventNotFound(_) | ApiError::EmployeeNotFound(_) => {
        StatusCode::NOT_FOUND
      }
      ApiError::AuditLogFailed(_) | ApiError::Store(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  /// Render the error envelope, tagging it with the call's request id.
  pub fn into_response_with(self, request_id: Uuid) -> Response {
    let retry_after = match &self {
      ApiError::RateLimited { retry_after } => Some(*retry_after),
      _ => None,
    };
    let detail = match &self {
      ApiError::AuditLogFailed(source) => {
        tracing::warn!(%request_id, error = %source, "audit write failed after mutation");
        Some("the operation completed but its audit record was not written".to_string())
      }
      ApiError::Store(source) => {
        tracing::error!(%request_id, error = %source, "store error");
        None
      }
      _ => None,
    };

    let body = ErrorBody {
      error: self.to_string(),
      code: self.code(),
      request_id,
      detail,
      retry_after,
    };
    (self.status(), Json(body)).into_response()
  }
}

/// JSON error envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub error:       String,
  pub code:        &'static str,
  pub request_id:  Uuid,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub retry_after: Option<i64>,
}

/// Render a handler outcome, attaching the request id to the error path.
/// Success payloads carry their own `request_id` field.
pub fn respond<T: Serialize>(
  result: Result<T, ApiError>,
  request_id: Uuid,
) -> Response {
  match result {
    Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
    Err(e) => e.into_response_with(request_id),
  }
}

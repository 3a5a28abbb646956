//! Admin HTTP API for the laurel event platform.
//!
//! Exposes an axum [`Router`] backed by any
//! [`laurel_core::store::PlatformStore`]. Every operation runs the same
//! gauntlet: credential guard → rate limit → domain logic → audit (for
//! mutations). Responses, including errors, echo a per-call `request_id`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod ratelimit;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::post};
use laurel_core::store::PlatformStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{analytics, audit, dashboard, events, roles};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,

  /// Domain appended to employee numbers to derive account addresses.
  #[serde(default = "default_email_domain")]
  pub email_domain: String,

  /// Requests allowed per operation per actor within one window.
  #[serde(default = "default_rate_limit_max_requests")]
  pub rate_limit_max_requests: u32,

  #[serde(default = "default_rate_limit_window_seconds")]
  pub rate_limit_window_seconds: i64,
}

fn default_email_domain() -> String { "corp.internal".to_string() }

fn default_rate_limit_max_requests() -> u32 { 120 }

fn default_rate_limit_window_seconds() -> i64 { 60 }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: PlatformStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the admin API router. All operations are POST with a JSON body,
/// carrying the bearer credential either in the body (`accessToken`) or
/// the `Authorization` header.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PlatformStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/admin/dashboard-metrics",   post(dashboard::handler::<S>))
    .route("/admin/event-action",        post(events::handler::<S>))
    .route("/admin/manage-user-role",    post(roles::handler::<S>))
    .route("/admin/audit-logs",          post(audit::handler::<S>))
    .route("/admin/judgment-analytics",  post(analytics::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::{Duration, TimeZone, Utc};
  use laurel_core::{
    event::{Event, EventStatus, Judgment, JudgeAssignment, ScoreMap, Submission},
    user::{Identity, PersonnelRecord, Role},
  };
  use laurel_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const ADMIN_ID: Uuid = Uuid::from_u128(0xA1);
  const SUBMITTER_ID: Uuid = Uuid::from_u128(0xB2);

  async fn make_state() -> AppState<SqliteStore> {
    make_state_with_limit(120).await
  }

  async fn make_state_with_limit(max_requests: u32) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();

    // An admin whose only admin signal is the personnel record: no
    // profile row, no metadata role. The guard's OR must still let them
    // through.
    store
      .insert_identity(
        &Identity {
          identity_id:   ADMIN_ID,
          email:         "10001@corp.internal".to_string(),
          name:          Some("Root Admin".to_string()),
          department:    Some("Ops".to_string()),
          metadata_role: None,
        },
        "admin-token",
        None,
      )
      .await
      .unwrap();
    store
      .insert_personnel(&PersonnelRecord {
        employee_no: "10001".to_string(),
        name:        "Root Admin".to_string(),
        department:  "Ops".to_string(),
        role:        Role::Admin,
      })
      .await
      .unwrap();

    // A plain submitter with every signal present and none of them admin.
    store
      .insert_identity(
        &Identity {
          identity_id:   SUBMITTER_ID,
          email:         "20002@corp.internal".to_string(),
          name:          Some("Plain User".to_string()),
          department:    Some("Sales".to_string()),
          metadata_role: Some(Role::Submitter),
        },
        "user-token",
        None,
      )
      .await
      .unwrap();
    store
      .insert_personnel(&PersonnelRecord {
        employee_no: "20002".to_string(),
        name:        "Plain User".to_string(),
        department:  "Sales".to_string(),
        role:        Role::Submitter,
      })
      .await
      .unwrap();

    AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig {
        host:                      "127.0.0.1".to_string(),
        port:                      8080,
        store_path:                PathBuf::from(":memory:"),
        email_domain:              "corp.internal".to_string(),
        rate_limit_max_requests:   max_requests,
        rate_limit_window_seconds: 60,
      }),
    }
  }

  async fn post_json(
    state: AppState<SqliteStore>,
    path: &str,
    body: Value,
  ) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri(path)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  async fn seed_closed_event_with_judgments(state: &AppState<SqliteStore>) -> Uuid {
    let event_id = Uuid::from_u128(0xE1);
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    state
      .store
      .insert_event(&Event {
        event_id,
        title: "Innovation Call".to_string(),
        status: EventStatus::Closed,
        end_date: None,
        created_at: t0,
        result_finalized: false,
        finalized_at: None,
        ranking_snapshot: None,
      })
      .await
      .unwrap();

    for (sub, minute) in [(0x51u128, 0), (0x52, 5)] {
      state
        .store
        .insert_submission(&Submission {
          submission_id: Uuid::from_u128(sub),
          event_id,
          submitter_id:  SUBMITTER_ID,
          title:         format!("proposal {sub}"),
          created_at:    t0 + Duration::minutes(minute),
        })
        .await
        .unwrap();
    }
    state
      .store
      .insert_judge_assignment(&JudgeAssignment {
        event_id,
        judge_id: Uuid::from_u128(0x71),
      })
      .await
      .unwrap();

    // First submission: totals 8 and 6 (avg 7). Second: total 9 (avg 9).
    for (sub, judge, total) in
      [(0x51u128, 0x71u128, 8.0), (0x51, 0x72, 6.0), (0x52, 0x71, 9.0)]
    {
      state
        .store
        .insert_judgment(&Judgment {
          submission_id: Uuid::from_u128(sub),
          judge_id:      Uuid::from_u128(judge),
          score:         ScoreMap::from([("overall".to_string(), total)]),
        })
        .await
        .unwrap();
    }
    event_id
  }

  // ── Authorization ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_token_returns_401_with_request_id() {
    let state = make_state().await;
    let (status, body) =
      post_json(state, "/admin/dashboard-metrics", json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_MISSING");
    assert!(body["request_id"].is_string(), "body: {body}");
  }

  #[tokio::test]
  async fn invalid_token_returns_401_auth_failed() {
    let state = make_state().await;
    let (status, body) = post_json(
      state,
      "/admin/dashboard-metrics",
      json!({ "accessToken": "never-issued" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_FAILED");
  }

  #[tokio::test]
  async fn non_admin_returns_403() {
    let state = make_state().await;
    let (status, body) = post_json(
      state,
      "/admin/dashboard-metrics",
      json!({ "accessToken": "user-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ADMIN_REQUIRED");
  }

  #[tokio::test]
  async fn rejected_callers_leave_no_side_effects() {
    let state = make_state().await;
    let (status, _) = post_json(
      state.clone(),
      "/admin/dashboard-metrics",
      json!({ "accessToken": "user-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // No lazy profile row for a rejected caller, and nothing audited.
    assert!(state.store.get_user(SUBMITTER_ID).await.unwrap().is_none());
    assert!(state.store.list_audit(10).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn personnel_signal_alone_grants_and_heals_profile() {
    let state = make_state().await;
    assert!(state.store.get_user(ADMIN_ID).await.unwrap().is_none());

    let (status, _) = post_json(
      state.clone(),
      "/admin/dashboard-metrics",
      json!({ "accessToken": "admin-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The missing profile row was created with the admin role.
    let healed = state.store.get_user(ADMIN_ID).await.unwrap().unwrap();
    assert_eq!(healed.role, Role::Admin);
    assert_eq!(healed.email, "10001@corp.internal");
  }

  #[tokio::test]
  async fn body_token_wins_over_bad_header() {
    let state = make_state().await;
    let req = Request::builder()
      .method("POST")
      .uri("/admin/dashboard-metrics")
      .header(header::CONTENT_TYPE, "application/json")
      .header(header::AUTHORIZATION, "Bearer stale-or-garbled")
      .body(Body::from(
        json!({ "accessToken": "admin-token" }).to_string(),
      ))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn header_token_works_without_body() {
    let state = make_state().await;
    let req = Request::builder()
      .method("POST")
      .uri("/admin/dashboard-metrics")
      .header(header::AUTHORIZATION, "Bearer admin-token")
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Rate limiting ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn requests_beyond_the_window_budget_get_429() {
    let state = make_state_with_limit(2).await;
    for _ in 0..2 {
      let (status, _) = post_json(
        state.clone(),
        "/admin/dashboard-metrics",
        json!({ "accessToken": "admin-token" }),
      )
      .await;
      assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post_json(
      state,
      "/admin/dashboard-metrics",
      json!({ "accessToken": "admin-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");
    assert!(body["retry_after"].as_i64().unwrap() > 0, "body: {body}");
  }

  #[tokio::test]
  async fn operations_have_independent_budgets() {
    let state = make_state_with_limit(1).await;
    let (status, _) = post_json(
      state.clone(),
      "/admin/dashboard-metrics",
      json!({ "accessToken": "admin-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The dashboard budget is spent, but another operation still works.
    let (status, _) = post_json(
      state,
      "/admin/judgment-analytics",
      json!({ "accessToken": "admin-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }

  // ── Dashboard ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn dashboard_reports_metrics_and_delayed_events() {
    let state = make_state().await;

    // Overdue event with half of its reviews missing.
    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    state
      .store
      .insert_event(&Event {
        event_id:         Uuid::from_u128(0xE9),
        title:            "Overdue".to_string(),
        status:           EventStatus::Active,
        end_date:         Some(yesterday),
        created_at:       Utc::now() - Duration::days(30),
        result_finalized: false,
        finalized_at:     None,
        ranking_snapshot: None,
      })
      .await
      .unwrap();
    state
      .store
      .insert_submission(&Submission {
        submission_id: Uuid::from_u128(0x55),
        event_id:      Uuid::from_u128(0xE9),
        submitter_id:  SUBMITTER_ID,
        title:         "late proposal".to_string(),
        created_at:    Utc::now() - Duration::days(10),
      })
      .await
      .unwrap();
    for judge in [0x71u128, 0x72] {
      state
        .store
        .insert_judge_assignment(&JudgeAssignment {
          event_id: Uuid::from_u128(0xE9),
          judge_id: Uuid::from_u128(judge),
        })
        .await
        .unwrap();
    }
    state
      .store
      .insert_judgment(&Judgment {
        submission_id: Uuid::from_u128(0x55),
        judge_id:      Uuid::from_u128(0x71),
        score:         ScoreMap::from([("overall".to_string(), 5.0)]),
      })
      .await
      .unwrap();

    let (status, body) = post_json(
      state,
      "/admin/dashboard-metrics",
      json!({ "accessToken": "admin-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["request_id"].is_string());
    assert_eq!(body["filters"]["nearDays"], 2);
    assert_eq!(body["filters"]["reviewThreshold"], 70.0);

    let delayed = body["delayedEvents"].as_array().unwrap();
    assert_eq!(delayed.len(), 1, "body: {body}");
    assert_eq!(delayed[0]["title"], "Overdue");
    // Stored active, but the deadline has passed.
    assert_eq!(delayed[0]["status"], "closed");
    assert_eq!(delayed[0]["reviewRate"], 50.0);
    assert_eq!(delayed[0]["daysLeft"], -1);

    // The overdue event is effectively closed, so nothing is active.
    assert_eq!(body["metrics"]["activeCount"], 0);

    let dept = body["eventDepartmentStats"].as_array().unwrap();
    assert_eq!(dept.len(), 1);
    assert_eq!(dept[0]["totalSubmissions"], 1);
  }

  // ── Event actions ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn close_event_mutates_and_audits() {
    let state = make_state().await;
    state
      .store
      .insert_event(&Event {
        event_id:         Uuid::from_u128(0xE2),
        title:            "To Close".to_string(),
        status:           EventStatus::Active,
        end_date:         None,
        created_at:       Utc::now(),
        result_finalized: false,
        finalized_at:     None,
        ranking_snapshot: None,
      })
      .await
      .unwrap();

    let (status, body) = post_json(
      state.clone(),
      "/admin/event-action",
      json!({
        "accessToken": "admin-token",
        "action": "close_event",
        "eventId": Uuid::from_u128(0xE2),
      }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["ok"], true);

    let event = state
      .store
      .get_event(Uuid::from_u128(0xE2))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(event.status, EventStatus::Closed);

    let audit = state.store.list_audit(10).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "close_event");
    assert_eq!(audit[0].actor_id, ADMIN_ID);
    assert_eq!(audit[0].metadata["before_status"], "active");
  }

  #[tokio::test]
  async fn delete_event_returns_backup() {
    let state = make_state().await;
    let event_id = seed_closed_event_with_judgments(&state).await;

    let (status, body) = post_json(
      state.clone(),
      "/admin/event-action",
      json!({
        "accessToken": "admin-token",
        "action": "delete_event",
        "eventId": event_id,
      }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["backup"]["submissions"], 2);
    assert_eq!(body["backup"]["judgments"], 3);

    assert!(state.store.get_event(event_id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn unknown_event_returns_404() {
    let state = make_state().await;
    let (status, body) = post_json(
      state,
      "/admin/event-action",
      json!({
        "accessToken": "admin-token",
        "action": "close_event",
        "eventId": Uuid::from_u128(0xDEAD),
      }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "EVENT_NOT_FOUND");
  }

  #[tokio::test]
  async fn unsupported_action_returns_400() {
    let state = make_state().await;
    let event_id = seed_closed_event_with_judgments(&state).await;
    let (status, body) = post_json(
      state,
      "/admin/event-action",
      json!({
        "accessToken": "admin-token",
        "action": "reopen_event",
        "eventId": event_id,
      }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
  }

  // ── Finalization ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn finalize_ranks_and_is_one_way() {
    let state = make_state().await;
    let event_id = seed_closed_event_with_judgments(&state).await;

    let (status, body) = post_json(
      state.clone(),
      "/admin/event-action",
      json!({
        "accessToken": "admin-token",
        "action": "finalize_results",
        "eventId": event_id,
      }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["rankedCount"], 2);

    let event = state.store.get_event(event_id).await.unwrap().unwrap();
    assert!(event.result_finalized);
    let snapshot = event.ranking_snapshot.clone().unwrap();
    // Second submission wins: avg 9.0 over avg 7.0.
    assert_eq!(snapshot[0].submission_id, Uuid::from_u128(0x52));
    assert_eq!(snapshot[0].rank, 1);
    assert_eq!(snapshot[1].submission_id, Uuid::from_u128(0x51));
    assert_eq!(snapshot[1].avg_score, 7.0);
    assert_eq!(snapshot[1].best_score, 8.0);

    // A second attempt fails and leaves the snapshot untouched.
    let (status, body) = post_json(
      state.clone(),
      "/admin/event-action",
      json!({
        "accessToken": "admin-token",
        "action": "finalize_results",
        "eventId": event_id,
      }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_FINALIZED");

    let event = state.store.get_event(event_id).await.unwrap().unwrap();
    assert_eq!(event.ranking_snapshot.unwrap(), snapshot);
  }

  #[tokio::test]
  async fn finalize_requires_closed_status() {
    let state = make_state().await;
    state
      .store
      .insert_event(&Event {
        event_id:         Uuid::from_u128(0xE3),
        title:            "Still Open".to_string(),
        status:           EventStatus::Active,
        end_date:         None,
        created_at:       Utc::now(),
        result_finalized: false,
        finalized_at:     None,
        ranking_snapshot: None,
      })
      .await
      .unwrap();

    let (status, body) = post_json(
      state,
      "/admin/event-action",
      json!({
        "accessToken": "admin-token",
        "action": "finalize_results",
        "eventId": Uuid::from_u128(0xE3),
      }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EVENT_NOT_CLOSED");
  }

  #[tokio::test]
  async fn finalize_without_submissions_returns_no_submissions() {
    let state = make_state().await;
    state
      .store
      .insert_event(&Event {
        event_id:         Uuid::from_u128(0xE4),
        title:            "Empty".to_string(),
        status:           EventStatus::Closed,
        end_date:         None,
        created_at:       Utc::now(),
        result_finalized: false,
        finalized_at:     None,
        ranking_snapshot: None,
      })
      .await
      .unwrap();

    let (status, body) = post_json(
      state,
      "/admin/event-action",
      json!({
        "accessToken": "admin-token",
        "action": "finalize_results",
        "eventId": Uuid::from_u128(0xE4),
      }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NO_SUBMISSIONS");
  }

  // ── Role management ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_personnel_returns_all_records() {
    let state = make_state().await;
    let (status, body) = post_json(
      state,
      "/admin/manage-user-role",
      json!({ "accessToken": "admin-token", "action": "list" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let employees = body["employees"].as_array().unwrap();
    assert_eq!(employees.len(), 2);
  }

  #[tokio::test]
  async fn update_role_syncs_all_three_records() {
    let state = make_state().await;
    let (status, body) = post_json(
      state.clone(),
      "/admin/manage-user-role",
      json!({
        "accessToken": "admin-token",
        "action": "update_role",
        "employeeNo": "20002",
        "nextRole": "judge",
      }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["employee"]["role"], "judge");

    // Personnel record (source of truth).
    let personnel = state.store.get_personnel("20002").await.unwrap().unwrap();
    assert_eq!(personnel.role, Role::Judge);

    // Identity metadata converged.
    let identity = state
      .store
      .get_identity_by_email("20002@corp.internal")
      .await
      .unwrap()
      .unwrap();
    assert_eq!(identity.metadata_role, Some(Role::Judge));

    // Profile row created/updated from the personnel record.
    let user = state
      .store
      .get_user_by_email("20002@corp.internal")
      .await
      .unwrap()
      .unwrap();
    assert_eq!(user.role, Role::Judge);
    assert_eq!(user.name.as_deref(), Some("Plain User"));

    // And the change is in the audit trail.
    let audit = state.store.list_audit(10).await.unwrap();
    assert_eq!(audit[0].action, "update_user_role");
    assert_eq!(audit[0].metadata["after_role"], "judge");
  }

  #[tokio::test]
  async fn update_role_unknown_employee_returns_404() {
    let state = make_state().await;
    let (status, body) = post_json(
      state,
      "/admin/manage-user-role",
      json!({
        "accessToken": "admin-token",
        "action": "update_role",
        "employeeNo": "99999",
        "nextRole": "judge",
      }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "EMPLOYEE_NOT_FOUND");
  }

  #[tokio::test]
  async fn update_role_rejects_unknown_roles() {
    let state = make_state().await;
    let (status, body) = post_json(
      state,
      "/admin/manage-user-role",
      json!({
        "accessToken": "admin-token",
        "action": "update_role",
        "employeeNo": "20002",
        "nextRole": "superuser",
      }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
  }

  // ── Audit logs ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn audit_logs_are_enriched_with_actor_details() {
    let state = make_state().await;
    state
      .store
      .insert_event(&Event {
        event_id:         Uuid::from_u128(0xE5),
        title:            "Audited".to_string(),
        status:           EventStatus::Active,
        end_date:         None,
        created_at:       Utc::now(),
        result_finalized: false,
        finalized_at:     None,
        ranking_snapshot: None,
      })
      .await
      .unwrap();

    let (status, _) = post_json(
      state.clone(),
      "/admin/event-action",
      json!({
        "accessToken": "admin-token",
        "action": "close_event",
        "eventId": Uuid::from_u128(0xE5),
      }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
      state,
      "/admin/audit-logs",
      json!({ "accessToken": "admin-token", "limit": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logs = body["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action"], "close_event");
    // The guard healed the admin's profile row, so the actor resolves.
    assert_eq!(logs[0]["actor_name"], "Root Admin");
    assert_eq!(logs[0]["actor_employee_no"], "10001");
  }

  // ── Judgment analytics ──────────────────────────────────────────────────

  #[tokio::test]
  async fn judgment_analytics_reports_per_judge_stats() {
    let state = make_state().await;
    seed_closed_event_with_judgments(&state).await;

    let (status, body) = post_json(
      state,
      "/admin/judgment-analytics",
      json!({ "accessToken": "admin-token" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let stats = body["stats"].as_array().unwrap();
    assert_eq!(stats.len(), 2);
    // Judge 0x71 has two judgments (totals 8 and 9), judge 0x72 has one.
    assert_eq!(stats[0]["count"], 2);
    assert_eq!(stats[0]["avgScore"], 8.5);
    assert_eq!(stats[1]["count"], 1);
  }
}

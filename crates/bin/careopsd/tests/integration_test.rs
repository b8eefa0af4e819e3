//! End-to-end smoke tests for the full careopsd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! repositories, real password hashing and tokens, real services and router)
//! and exercises the HTTP layer via `tower::ServiceExt::oneshot`. No TCP port
//! is bound and outbound email/SMS is captured by a spy notifier.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use careops_adapter_http_axum::AppState;
use careops_adapter_security::JwtCredentials;
use careops_adapter_storage_sqlite_sqlx::{Config, SqliteStore};
use careops_app::automation_engine::{AutomationEngine, AutomationSettings};
use careops_app::testing::SpyNotifier;

struct App {
    router: axum::Router,
    notifier: Arc<SpyNotifier>,
    engine: Arc<AutomationEngine<SqliteStore, SpyNotifier>>,
}

/// Build a fully-wired application backed by an in-memory `SQLite` database.
async fn app() -> App {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");

    let store = Arc::new(SqliteStore::new(db.pool().clone()));
    let notifier = Arc::new(SpyNotifier::default());
    let credentials = Arc::new(JwtCredentials::new(&careops_adapter_security::Config {
        jwt_secret: "integration-secret".to_string(),
        token_ttl: Duration::minutes(60),
    }));
    let engine = Arc::new(AutomationEngine::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        AutomationSettings::default(),
    ));

    let state = AppState::new(store, Arc::clone(&notifier), credentials, Arc::clone(&engine));
    App {
        router: careops_adapter_http_axum::build(state, &["http://localhost:3000".to_string()]),
        notifier,
        engine,
    }
}

impl App {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn sign_up(&self, email: &str) -> String {
        let (status, _) = self
            .call(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "secret123",
                    "full_name": "Olive Owner",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": "secret123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Create a workspace with an intake form for consultations and a
    /// contact, returning `(workspace_id, contact_id)`.
    async fn clinic(&self, token: &str) -> (String, String) {
        let (status, workspace) = self
            .call(
                Method::POST,
                "/api/workspace/create",
                Some(token),
                Some(json!({"name": "Clinic", "contact_email": "front@clinic.test"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let workspace = workspace["id"].as_str().unwrap().to_string();

        let (status, _) = self
            .call(
                Method::POST,
                &format!("/api/forms/{workspace}/create"),
                Some(token),
                Some(json!({
                    "name": "Intake",
                    "required_fields": ["allergies"],
                    "booking_types": ["Consultation"],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, contact) = self
            .call(
                Method::POST,
                &format!("/api/contacts/{workspace}/create"),
                Some(token),
                Some(json!({"name": "Grace", "email": "grace@example.com"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let contact = contact["id"].as_str().unwrap().to_string();

        (workspace, contact)
    }

    async fn book(&self, token: &str, workspace: &str, contact: &str, hours_ahead: i64) -> Value {
        let scheduled_at = (Utc::now() + Duration::hours(hours_ahead)).to_rfc3339();
        let (status, booking) = self
            .call(
                Method::POST,
                &format!("/api/bookings/{workspace}/{contact}/create"),
                Some(token),
                Some(json!({
                    "booking_type": "Consultation",
                    "scheduled_at": scheduled_at,
                    "duration_minutes": 30,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        booking
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let app = app().await;

    let resp = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_resolve_current_user_from_issued_token() {
    let app = app().await;
    let token = app.sign_up("olive@clinic.test").await;

    let (status, me) = app.call(Method::GET, "/api/auth/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "olive@clinic.test");
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn should_return_401_when_token_is_forged() {
    let app = app().await;
    app.sign_up("olive@clinic.test").await;

    let (status, body) = app
        .call(Method::GET, "/api/auth/me", Some("not.a.jwt"), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn should_return_401_when_password_is_wrong() {
    let app = app().await;
    app.sign_up("olive@clinic.test").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "olive@clinic.test", "password": "wrong-password"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Workspace lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_run_full_booking_flow_and_activate_workspace() {
    let app = app().await;
    let token = app.sign_up("olive@clinic.test").await;
    let (workspace, contact) = app.clinic(&token).await;

    let (status, blocked) = app
        .call(
            Method::POST,
            &format!("/api/workspace/{workspace}/activate"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(blocked["details"].as_array().unwrap().len(), 1);

    app.call(
        Method::POST,
        &format!("/api/inventory/{workspace}/create"),
        Some(&token),
        Some(json!({"name": "Gloves", "quantity": 20})),
    )
    .await;
    app.notifier.clear();

    let booking = app.book(&token, &workspace, &contact, 72).await;
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["forms_sent"], true);

    let subjects: Vec<String> = app
        .notifier
        .emails()
        .into_iter()
        .map(|email| email.subject)
        .collect();
    assert_eq!(subjects, ["Booking Confirmation", "Reminder: Intake Pending"]);

    let (_, items) = app
        .call(
            Method::GET,
            &format!("/api/inventory/{workspace}/list"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(items[0]["quantity"], 19);

    let (status, activated) = app
        .call(
            Method::POST,
            &format!("/api/workspace/{workspace}/activate"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activated["workspace"]["status"], "active");

    let (status, dashboard) = app
        .call(
            Method::GET,
            &format!("/api/dashboard/{workspace}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["stats"]["pending_forms"], 1);
}

#[tokio::test]
async fn should_refuse_activation_until_form_exists_then_activate() {
    let app = app().await;
    let token = app.sign_up("olive@clinic.test").await;

    let (status, workspace) = app
        .call(
            Method::POST,
            "/api/workspace/create",
            Some(&token),
            Some(json!({"name": "Clinic", "contact_email": "front@clinic.test"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(workspace["status"], "draft");
    let workspace = workspace["id"].as_str().unwrap().to_string();

    let (status, contact) = app
        .call(
            Method::POST,
            &format!("/api/contacts/{workspace}/create"),
            Some(&token),
            Some(json!({"name": "Grace", "email": "grace@example.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let contact = contact["id"].as_str().unwrap().to_string();
    app.book(&token, &workspace, &contact, 72).await;

    let activate = format!("/api/workspace/{workspace}/activate");
    let (status, blocked) = app.call(Method::POST, &activate, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        blocked["details"],
        json!(["At least one form template should be created for customers"])
    );

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/forms/{workspace}/create"),
            Some(&token),
            Some(json!({"name": "Intake", "required_fields": ["allergies"]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, activated) = app.call(Method::POST, &activate, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activated["status"], "activated");
    assert_eq!(activated["workspace"]["status"], "active");
}

#[tokio::test]
async fn should_forbid_staff_without_inbox_capability() {
    let app = app().await;
    let owner = app.sign_up("olive@clinic.test").await;
    let staff = app.sign_up("sam@clinic.test").await;
    let (workspace, _) = app.clinic(&owner).await;

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/workspace/{workspace}/staff"),
            Some(&owner),
            Some(json!({"email": "sam@clinic.test", "can_manage_inbox": false})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (inbox, _) = app
        .call(
            Method::GET,
            &format!("/api/inbox/{workspace}/conversations"),
            Some(&staff),
            None,
        )
        .await;
    let (bookings, _) = app
        .call(
            Method::GET,
            &format!("/api/bookings/{workspace}/list"),
            Some(&staff),
            None,
        )
        .await;

    assert_eq!(inbox, StatusCode::FORBIDDEN);
    assert_eq!(bookings, StatusCode::OK);
}

#[tokio::test]
async fn should_forbid_strangers_from_reading_workspace() {
    let app = app().await;
    let owner = app.sign_up("olive@clinic.test").await;
    let stranger = app.sign_up("eve@elsewhere.test").await;
    let (workspace, _) = app.clinic(&owner).await;

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/contacts/{workspace}/list"),
            Some(&stranger),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Reminder sweep
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_remind_pending_forms_due_within_a_day_when_sweeping() {
    let app = app().await;
    let token = app.sign_up("olive@clinic.test").await;
    let (workspace, contact) = app.clinic(&token).await;
    app.book(&token, &workspace, &contact, 2).await;
    app.book(&token, &workspace, &contact, 72).await;
    app.notifier.clear();

    let report = app.engine.run_reminder_sweep().await;

    assert_eq!(report.sent, 1);
    let emails = app.notifier.emails();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "grace@example.com");
    assert_eq!(emails[0].subject, "Reminder: Intake Pending");
}

//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod auth;
#[allow(clippy::missing_errors_doc)]
pub mod bookings;
#[allow(clippy::missing_errors_doc)]
pub mod contacts;
#[allow(clippy::missing_errors_doc)]
pub mod dashboard;
#[allow(clippy::missing_errors_doc)]
pub mod forms;
#[allow(clippy::missing_errors_doc)]
pub mod inbox;
#[allow(clippy::missing_errors_doc)]
pub mod inventory;
#[allow(clippy::missing_errors_doc)]
pub mod workspace;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, patch, post};

use careops_app::ports::{Credentials, Notifier, Store};
use careops_domain::error::ValidationError;

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a path segment into a typed id, rejecting malformed values with a 400.
pub(crate) fn parse_id<T: FromStr>(kind: &'static str, value: &str) -> Result<T, ApiError> {
    value.parse().map_err(|_| {
        ApiError::from(ValidationError::InvalidId {
            kind,
            value: value.to_string(),
        })
    })
}

/// Build the `/api` sub-router.
pub fn routes<S, N, C>() -> Router<AppState<S, N, C>>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    Router::new()
        // Auth
        .route("/auth/register", post(auth::register::<S, N, C>))
        .route("/auth/login", post(auth::login::<S, N, C>))
        .route("/auth/verify-sms", post(auth::verify_sms::<S, N, C>))
        .route("/auth/resend-sms", post(auth::resend_sms::<S, N, C>))
        .route("/auth/me", get(auth::me::<S, N, C>))
        // Workspaces
        .route("/workspace/create", post(workspace::create::<S, N, C>))
        .route("/workspace/list", get(workspace::list::<S, N, C>))
        .route("/workspace/{id}", get(workspace::get::<S, N, C>))
        .route(
            "/workspace/{id}/activate",
            post(workspace::activate::<S, N, C>),
        )
        .route(
            "/workspace/{id}/staff",
            get(workspace::list_staff::<S, N, C>).post(workspace::add_staff::<S, N, C>),
        )
        .route(
            "/workspace/{id}/staff/{staff_id}",
            patch(workspace::update_staff::<S, N, C>),
        )
        // Contacts
        .route(
            "/contacts/{workspace_id}/create",
            post(contacts::create::<S, N, C>),
        )
        .route(
            "/contacts/{workspace_id}/list",
            get(contacts::list::<S, N, C>),
        )
        .route(
            "/contacts/{workspace_id}/{id}",
            get(contacts::get::<S, N, C>),
        )
        // Bookings
        .route(
            "/bookings/{workspace_id}/{id}/create",
            post(bookings::create::<S, N, C>),
        )
        .route(
            "/bookings/{workspace_id}/list",
            get(bookings::list::<S, N, C>),
        )
        .route(
            "/bookings/{workspace_id}/{id}",
            patch(bookings::update::<S, N, C>),
        )
        // Inbox
        .route(
            "/inbox/{workspace_id}/conversations",
            get(inbox::list::<S, N, C>),
        )
        .route(
            "/inbox/{workspace_id}/conversations/{id}",
            get(inbox::get::<S, N, C>),
        )
        .route(
            "/inbox/{workspace_id}/conversations/{id}/send",
            post(inbox::send::<S, N, C>),
        )
        .route(
            "/inbox/{workspace_id}/conversations/{id}/close",
            post(inbox::close::<S, N, C>),
        )
        .route(
            "/inbox/{workspace_id}/conversations/{id}/reopen",
            post(inbox::reopen::<S, N, C>),
        )
        // Forms
        .route("/forms/{workspace_id}/create", post(forms::create::<S, N, C>))
        .route("/forms/{workspace_id}/list", get(forms::list::<S, N, C>))
        .route(
            "/forms/{workspace_id}/submissions",
            get(forms::list_submissions::<S, N, C>),
        )
        .route(
            "/forms/{workspace_id}/submissions/{id}/complete",
            post(forms::complete_submission::<S, N, C>),
        )
        // Inventory
        .route(
            "/inventory/{workspace_id}/create",
            post(inventory::create::<S, N, C>),
        )
        .route(
            "/inventory/{workspace_id}/list",
            get(inventory::list::<S, N, C>),
        )
        .route(
            "/inventory/{workspace_id}/{id}/restock",
            post(inventory::restock::<S, N, C>),
        )
        // Dashboard
        .route("/dashboard/{workspace_id}", get(dashboard::get::<S, N, C>))
}

//! JSON REST handlers for contacts.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use careops_app::ports::{Credentials, Notifier, Store};
use careops_app::services::contact_service::NewContact;
use careops_domain::contact::Contact;
use careops_domain::id::{ContactId, WorkspaceId};

use super::parse_id;
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a contact.
#[derive(Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Contact>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Contact>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Contact>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `POST /api/contacts/{workspace_id}/create`
pub async fn create<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(workspace_id): Path<String>,
    Json(req): Json<CreateContactRequest>,
) -> Result<CreateResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let contact = state
        .contact_service
        .create(
            &principal,
            workspace_id,
            NewContact {
                name: req.name,
                email: non_blank(req.email),
                phone: non_blank(req.phone),
            },
        )
        .await?;
    Ok(CreateResponse::Created(Json(contact)))
}

/// `GET /api/contacts/{workspace_id}/list`
pub async fn list<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(workspace_id): Path<String>,
) -> Result<ListResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let contacts = state
        .contact_service
        .list(&principal, workspace_id)
        .await?;
    Ok(ListResponse::Ok(Json(contacts)))
}

/// `GET /api/contacts/{workspace_id}/{id}`
pub async fn get<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path((workspace_id, id)): Path<(String, String)>,
) -> Result<GetResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let id: ContactId = parse_id("contact", &id)?;
    let contact = state
        .contact_service
        .get(&principal, workspace_id, id)
        .await?;
    Ok(GetResponse::Ok(Json(contact)))
}

//! JSON REST handlers for forms and their submissions.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use careops_app::ports::{Credentials, Notifier, Store};
use careops_app::services::form_service::{NewForm, SubmissionView};
use careops_domain::form::Form;
use careops_domain::id::{SubmissionId, WorkspaceId};

use super::parse_id;
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a form.
#[derive(Deserialize)]
pub struct CreateFormRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub booking_types: Vec<String>,
}

/// Request body for completing a submission.
#[derive(Deserialize)]
pub struct CompleteSubmissionRequest {
    pub contact_email: Option<String>,
    pub data: serde_json::Value,
}

/// Possible responses from the form endpoints.
pub enum FormResponse {
    Created(Json<Form>),
    List(Json<Vec<Form>>),
}

impl IntoResponse for FormResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::List(json) => json.into_response(),
        }
    }
}

/// Possible responses from the submission endpoints.
pub enum SubmissionResponse {
    Ok(Json<SubmissionView>),
    List(Json<Vec<SubmissionView>>),
}

impl IntoResponse for SubmissionResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::List(json) => json.into_response(),
        }
    }
}

/// `POST /api/forms/{workspace_id}/create`
pub async fn create<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(workspace_id): Path<String>,
    Json(req): Json<CreateFormRequest>,
) -> Result<FormResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let form = state
        .form_service
        .create(
            &principal,
            workspace_id,
            NewForm {
                name: req.name,
                description: req.description,
                required_fields: req.required_fields,
                booking_types: req.booking_types,
            },
        )
        .await?;
    Ok(FormResponse::Created(Json(form)))
}

/// `GET /api/forms/{workspace_id}/list`
pub async fn list<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(workspace_id): Path<String>,
) -> Result<FormResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let forms = state.form_service.list(&principal, workspace_id).await?;
    Ok(FormResponse::List(Json(forms)))
}

/// `GET /api/forms/{workspace_id}/submissions`
pub async fn list_submissions<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(workspace_id): Path<String>,
) -> Result<SubmissionResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let submissions = state
        .form_service
        .list_submissions(&principal, workspace_id)
        .await?;
    Ok(SubmissionResponse::List(Json(submissions)))
}

/// `POST /api/forms/{workspace_id}/submissions/{id}/complete`
pub async fn complete_submission<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path((workspace_id, id)): Path<(String, String)>,
    Json(req): Json<CompleteSubmissionRequest>,
) -> Result<SubmissionResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let id: SubmissionId = parse_id("submission", &id)?;
    let submission = state
        .form_service
        .complete_submission(&principal, workspace_id, id, req.data, req.contact_email)
        .await?;
    Ok(SubmissionResponse::Ok(Json(submission)))
}

//! JSON REST handlers for workspaces and their staff.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use careops_app::ports::{Credentials, Notifier, Store};
use careops_app::services::workspace_service::{NewStaff, NewWorkspace, StaffUpdate};
use careops_domain::id::{StaffId, WorkspaceId};
use careops_domain::staff::{StaffMember, StaffPermissions, StaffRole};
use careops_domain::workspace::Workspace;

use super::parse_id;
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a workspace.
#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub address: Option<String>,
    pub timezone: Option<String>,
    pub contact_email: Option<String>,
}

/// Request body for adding a staff member. Flags default to granted.
#[derive(Deserialize)]
pub struct AddStaffRequest {
    pub email: String,
    pub role: Option<String>,
    pub can_manage_inbox: Option<bool>,
    pub can_manage_bookings: Option<bool>,
    pub can_view_inventory: Option<bool>,
}

/// Request body for changing a staff member; absent fields are kept.
#[derive(Deserialize)]
pub struct UpdateStaffRequest {
    pub role: Option<String>,
    pub can_manage_inbox: Option<bool>,
    pub can_manage_bookings: Option<bool>,
    pub can_view_inventory: Option<bool>,
}

/// Body returned once a workspace is live.
#[derive(Debug, Serialize)]
pub struct Activated {
    pub status: &'static str,
    pub workspace: Workspace,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Workspace>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Workspace>>),
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
    Ok(Json<Workspace>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the activate endpoint.
pub enum ActivateResponse {
    Ok(Json<Activated>),
}

impl IntoResponse for ActivateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the staff endpoints.
pub enum StaffResponse {
    Created(Json<StaffMember>),
    Ok(Json<StaffMember>),
    List(Json<Vec<StaffMember>>),
}

impl IntoResponse for StaffResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::Ok(json) => json.into_response(),
            Self::List(json) => json.into_response(),
        }
    }
}

fn parse_role(role: Option<String>) -> Result<Option<StaffRole>, ApiError> {
    role.map(|r| r.parse::<StaffRole>())
        .transpose()
        .map_err(ApiError::from)
}

/// `POST /api/workspace/create`
pub async fn create<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Result<CreateResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace = state
        .workspace_service
        .create(
            &principal,
            NewWorkspace {
                name: req.name,
                address: req.address,
                timezone: req.timezone,
                contact_email: req.contact_email,
            },
        )
        .await?;
    Ok(CreateResponse::Created(Json(workspace)))
}

/// `GET /api/workspace/list`
pub async fn list<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
) -> Result<ListResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspaces = state.workspace_service.list(&principal).await?;
    Ok(ListResponse::Ok(Json(workspaces)))
}

/// `GET /api/workspace/{id}`
pub async fn get<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let id: WorkspaceId = parse_id("workspace", &id)?;
    let workspace = state.workspace_service.get(&principal, id).await?;
    Ok(GetResponse::Ok(Json(workspace)))
}

/// `POST /api/workspace/{id}/activate`
pub async fn activate<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<ActivateResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let id: WorkspaceId = parse_id("workspace", &id)?;
    let workspace = state.workspace_service.activate(&principal, id).await?;
    Ok(ActivateResponse::Ok(Json(Activated {
        status: "activated",
        workspace,
    })))
}

/// `POST /api/workspace/{id}/staff`
pub async fn add_staff<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
    Json(req): Json<AddStaffRequest>,
) -> Result<StaffResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let id: WorkspaceId = parse_id("workspace", &id)?;
    let defaults = StaffPermissions::default();
    let input = NewStaff {
        email: req.email,
        role: parse_role(req.role)?.unwrap_or_default(),
        permissions: StaffPermissions {
            can_manage_inbox: req.can_manage_inbox.unwrap_or(defaults.can_manage_inbox),
            can_manage_bookings: req
                .can_manage_bookings
                .unwrap_or(defaults.can_manage_bookings),
            can_view_inventory: req.can_view_inventory.unwrap_or(defaults.can_view_inventory),
        },
    };
    let staff = state
        .workspace_service
        .add_staff(&principal, id, input)
        .await?;
    Ok(StaffResponse::Created(Json(staff)))
}

/// `GET /api/workspace/{id}/staff`
pub async fn list_staff<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(id): Path<String>,
) -> Result<StaffResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let id: WorkspaceId = parse_id("workspace", &id)?;
    let staff = state.workspace_service.list_staff(&principal, id).await?;
    Ok(StaffResponse::List(Json(staff)))
}

/// `PATCH /api/workspace/{id}/staff/{staff_id}`
pub async fn update_staff<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path((id, staff_id)): Path<(String, String)>,
    Json(req): Json<UpdateStaffRequest>,
) -> Result<StaffResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let id: WorkspaceId = parse_id("workspace", &id)?;
    let staff_id: StaffId = parse_id("staff", &staff_id)?;
    let update = StaffUpdate {
        role: parse_role(req.role)?,
        can_manage_inbox: req.can_manage_inbox,
        can_manage_bookings: req.can_manage_bookings,
        can_view_inventory: req.can_view_inventory,
    };
    let staff = state
        .workspace_service
        .update_staff(&principal, id, staff_id, update)
        .await?;
    Ok(StaffResponse::Ok(Json(staff)))
}

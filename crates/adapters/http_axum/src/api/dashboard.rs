//! JSON REST handler for the workspace dashboard.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use careops_app::ports::{Credentials, Notifier, Store};
use careops_app::services::dashboard_service::Dashboard;
use careops_domain::id::WorkspaceId;

use super::parse_id;
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the dashboard endpoint.
pub enum GetResponse {
    Ok(Json<Dashboard>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/dashboard/{workspace_id}`
pub async fn get<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(workspace_id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let dashboard = state
        .dashboard_service
        .get(&principal, workspace_id)
        .await?;
    Ok(GetResponse::Ok(Json(dashboard)))
}

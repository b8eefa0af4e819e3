//! JSON REST handlers for inventory.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use careops_app::ports::{Credentials, Notifier, Store};
use careops_app::services::inventory_service::{ItemView, NewItem};
use careops_domain::id::{InventoryItemId, WorkspaceId};

use super::parse_id;
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating an item.
#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub quantity: i64,
    pub quantity_per_booking: Option<i64>,
    pub low_threshold: Option<i64>,
}

/// Request body for restocking an item.
#[derive(Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ItemView>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create and restock endpoints.
pub enum ItemResponse {
    Created(Json<ItemView>),
    Ok(Json<ItemView>),
}

impl IntoResponse for ItemResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /api/inventory/{workspace_id}/create`
pub async fn create<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path(workspace_id): Path<String>,
    Json(req): Json<CreateItemRequest>,
) -> Result<ItemResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let item = state
        .inventory_service
        .create(
            &principal,
            workspace_id,
            NewItem {
                name: req.name,
                quantity: req.quantity,
                quantity_per_booking: req.quantity_per_booking,
                low_threshold: req.low_threshold,
            },
        )
        .await?;
    Ok(ItemResponse::Created(Json(item)))
}

/// `GET /api/inventory/{workspace_id}/list`
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
    let items = state
        .inventory_service
        .list(&principal, workspace_id)
        .await?;
    Ok(ListResponse::Ok(Json(items)))
}

/// `POST /api/inventory/{workspace_id}/{id}/restock`
pub async fn restock<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path((workspace_id, id)): Path<(String, String)>,
    Json(req): Json<RestockRequest>,
) -> Result<ItemResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let id: InventoryItemId = parse_id("inventory item", &id)?;
    let item = state
        .inventory_service
        .restock(&principal, workspace_id, id, req.quantity)
        .await?;
    Ok(ItemResponse::Ok(Json(item)))
}

//! JSON REST handlers for bookings.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use careops_app::ports::{Credentials, Notifier, Store};
use careops_app::services::booking_service::{BookingDetails, BookingUpdate, NewBooking};
use careops_domain::booking::Booking;
use careops_domain::id::{BookingId, ContactId, WorkspaceId};
use careops_domain::time::Timestamp;

use super::parse_id;
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a booking.
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub booking_type: String,
    pub scheduled_at: Timestamp,
    pub duration_minutes: Option<i64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Request body for changing a booking's status.
#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub status: String,
    pub notes: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<BookingDetails>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Booking>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the update endpoint.
pub enum UpdateResponse {
    Ok(Json<Booking>),
}

impl IntoResponse for UpdateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /api/bookings/{workspace_id}/{contact_id}/create`
pub async fn create<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path((workspace_id, contact_id)): Path<(String, String)>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<CreateResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let contact_id: ContactId = parse_id("contact", &contact_id)?;
    let booking = state
        .booking_service
        .create(
            &principal,
            workspace_id,
            contact_id,
            NewBooking {
                booking_type: req.booking_type,
                scheduled_at: req.scheduled_at,
                duration_minutes: req.duration_minutes,
                location: req.location,
                notes: req.notes,
            },
        )
        .await?;
    Ok(CreateResponse::Created(Json(booking)))
}

/// `GET /api/bookings/{workspace_id}/list`
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
    let bookings = state
        .booking_service
        .list(&principal, workspace_id)
        .await?;
    Ok(ListResponse::Ok(Json(bookings)))
}

/// `PATCH /api/bookings/{workspace_id}/{booking_id}`
pub async fn update<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path((workspace_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<UpdateResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let workspace_id: WorkspaceId = parse_id("workspace", &workspace_id)?;
    let id: BookingId = parse_id("booking", &id)?;
    let booking = state
        .booking_service
        .update(
            &principal,
            workspace_id,
            id,
            BookingUpdate {
                status: req.status,
                notes: req.notes,
            },
        )
        .await?;
    Ok(UpdateResponse::Ok(Json(booking)))
}

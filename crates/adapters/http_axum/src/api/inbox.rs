//! JSON REST handlers for the inbox.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use careops_app::ports::{Credentials, Notifier, Store};
use careops_app::services::inbox_service::{
    ConversationDetails, ConversationSummary, OutgoingMessage,
};
use careops_domain::conversation::{Channel, Conversation, Message, SenderType};
use careops_domain::id::{ConversationId, MessageId, WorkspaceId};

use super::parse_id;
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for sending a message. Defaults to a staff message logged
/// on the system channel.
#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub sender_type: Option<String>,
    pub channel: Option<String>,
}

/// Body returned once a message is appended.
#[derive(Debug, Serialize)]
pub struct Sent {
    pub status: &'static str,
    pub message_id: MessageId,
    pub message: Message,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ConversationSummary>>),
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
    Ok(Json<ConversationDetails>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the send endpoint.
pub enum SendResponse {
    Ok(Json<Sent>),
}

impl IntoResponse for SendResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the close and reopen endpoints.
pub enum ToggleResponse {
    Ok(Json<Conversation>),
}

impl IntoResponse for ToggleResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

fn ids(workspace_id: &str, id: &str) -> Result<(WorkspaceId, ConversationId), ApiError> {
    Ok((
        parse_id("workspace", workspace_id)?,
        parse_id("conversation", id)?,
    ))
}

/// `GET /api/inbox/{workspace_id}/conversations`
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
    let conversations = state
        .inbox_service
        .list_conversations(&principal, workspace_id)
        .await?;
    Ok(ListResponse::Ok(Json(conversations)))
}

/// `GET /api/inbox/{workspace_id}/conversations/{id}`
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
    let (workspace_id, id) = ids(&workspace_id, &id)?;
    let conversation = state
        .inbox_service
        .get_conversation(&principal, workspace_id, id)
        .await?;
    Ok(GetResponse::Ok(Json(conversation)))
}

/// `POST /api/inbox/{workspace_id}/conversations/{id}/send`
pub async fn send<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path((workspace_id, id)): Path<(String, String)>,
    Json(req): Json<SendMessageRequest>,
) -> Result<SendResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let (workspace_id, id) = ids(&workspace_id, &id)?;
    let outgoing = OutgoingMessage {
        content: req.content,
        sender_type: req
            .sender_type
            .as_deref()
            .map_or(Ok(SenderType::Staff), str::parse)?,
        channel: req
            .channel
            .as_deref()
            .map_or(Ok(Channel::System), str::parse)?,
    };
    let message = state
        .inbox_service
        .send_message(&principal, workspace_id, id, outgoing)
        .await?;
    Ok(SendResponse::Ok(Json(Sent {
        status: "sent",
        message_id: message.id,
        message,
    })))
}

/// `POST /api/inbox/{workspace_id}/conversations/{id}/close`
pub async fn close<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path((workspace_id, id)): Path<(String, String)>,
) -> Result<ToggleResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let (workspace_id, id) = ids(&workspace_id, &id)?;
    let conversation = state
        .inbox_service
        .set_open(&principal, workspace_id, id, false)
        .await?;
    Ok(ToggleResponse::Ok(Json(conversation)))
}

/// `POST /api/inbox/{workspace_id}/conversations/{id}/reopen`
pub async fn reopen<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
    Path((workspace_id, id)): Path<(String, String)>,
) -> Result<ToggleResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let (workspace_id, id) = ids(&workspace_id, &id)?;
    let conversation = state
        .inbox_service
        .set_open(&principal, workspace_id, id, true)
        .await?;
    Ok(ToggleResponse::Ok(Json(conversation)))
}

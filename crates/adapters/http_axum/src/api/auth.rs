//! JSON REST handlers for accounts and sessions.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use careops_app::ports::{AccessToken, Credentials, Notifier, Store};
use careops_app::services::auth_service::Registration;
use careops_domain::user::User;

use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering an account.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: Option<String>,
}

/// Request body for logging in.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Query string naming the account a verification call is about.
#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// Request body carrying an SMS verification code.
#[derive(Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

/// Acknowledgement body of the phone verification endpoints.
#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    pub status: &'static str,
    pub message: &'static str,
}

/// Possible responses from the register endpoint.
pub enum RegisterResponse {
    Created(Json<User>),
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the login endpoint.
pub enum LoginResponse {
    Ok(Json<AccessToken>),
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the verify and resend endpoints.
pub enum VerificationResponse {
    Ok(Json<Acknowledgement>),
}

impl IntoResponse for VerificationResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the me endpoint.
pub enum MeResponse {
    Ok(Json<User>),
}

impl IntoResponse for MeResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /api/auth/register`
pub async fn register<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Json(req): Json<RegisterRequest>,
) -> Result<RegisterResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let user = state
        .auth_service
        .register(Registration {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            phone_number: req.phone_number.filter(|p| !p.trim().is_empty()),
        })
        .await?;
    Ok(RegisterResponse::Created(Json(user)))
}

/// `POST /api/auth/login`
pub async fn login<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Json(req): Json<LoginRequest>,
) -> Result<LoginResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let token = state.auth_service.login(&req.email, &req.password).await?;
    Ok(LoginResponse::Ok(Json(token)))
}

/// `POST /api/auth/verify-sms?email=..`
pub async fn verify_sms<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Query(query): Query<EmailQuery>,
    Json(req): Json<VerifyRequest>,
) -> Result<VerificationResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    state
        .auth_service
        .verify_sms(&query.email, req.code.trim())
        .await?;
    Ok(VerificationResponse::Ok(Json(Acknowledgement {
        status: "success",
        message: "Phone verified successfully",
    })))
}

/// `POST /api/auth/resend-sms?email=..`
pub async fn resend_sms<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Query(query): Query<EmailQuery>,
) -> Result<VerificationResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    state.auth_service.resend_sms(&query.email).await?;
    Ok(VerificationResponse::Ok(Json(Acknowledgement {
        status: "success",
        message: "Verification code resent",
    })))
}

/// `GET /api/auth/me`
pub async fn me<S, N, C>(
    State(state): State<AppState<S, N, C>>,
    Authenticated(principal): Authenticated,
) -> Result<MeResponse, ApiError>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    let user = state.auth_service.me(&principal).await?;
    Ok(MeResponse::Ok(Json(user)))
}

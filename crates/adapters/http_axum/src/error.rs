//! HTTP error response mapping.

use axum::Json;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use careops_domain::error::{AuthError, CareOpsError, NotFoundError, ValidationError};
use careops_domain::permission::Denied;

/// JSON error body returned by API endpoints.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

/// Maps [`CareOpsError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(CareOpsError);

impl From<CareOpsError> for ApiError {
    fn from(err: CareOpsError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<NotFoundError> for ApiError {
    fn from(err: NotFoundError) -> Self {
        Self(err.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

impl From<Denied> for ApiError {
    fn from(err: Denied) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut details = None;
        let (status, message) = match &self.0 {
            CareOpsError::Validation(err) => {
                if let ValidationError::ActivationBlocked(blockers) = err {
                    details = Some(blockers.iter().map(ToString::to_string).collect());
                }
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            CareOpsError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            CareOpsError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            CareOpsError::Forbidden(err) => (StatusCode::FORBIDDEN, err.to_string()),
            CareOpsError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let mut response = (
            status,
            Json(ErrorBody {
                error: message,
                details,
            }),
        )
            .into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careops_domain::permission::Capability;
    use careops_domain::workspace::ActivationBlocker;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn should_map_each_error_kind_to_its_status() {
        let cases = [
            (
                ApiError::from(ValidationError::EmailTaken),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(NotFoundError::new("Workspace", "w1")),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(AuthError::InvalidToken),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::from(Denied::MissingPermission(Capability::Inbox)),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(CareOpsError::Storage("disk full".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn should_hide_storage_details_from_body() {
        let response = ApiError::from(CareOpsError::Storage("disk full".into())).into_response();

        let body = body_json(response).await;

        assert_eq!(body, serde_json::json!({"error": "internal server error"}));
    }

    #[tokio::test]
    async fn should_list_every_blocker_when_activation_refused() {
        let response = ApiError::from(ValidationError::ActivationBlocked(vec![
            ActivationBlocker::NoBookingTypes,
            ActivationBlocker::NoContactEmail,
        ]))
        .into_response();

        let body = body_json(response).await;

        assert_eq!(
            body["details"],
            serde_json::json!([
                "At least one booking type must be created",
                "Communication channel (email) must be configured",
            ])
        );
    }

    #[test]
    fn should_challenge_with_bearer_when_unauthorized() {
        let response = ApiError::from(AuthError::MissingToken).into_response();

        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }
}

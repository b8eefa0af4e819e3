//! Axum router assembly.

use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use careops_app::ports::{Credentials, Notifier, Store};

use crate::state::AppState;

/// Service banner served at `/`.
#[derive(Debug, Serialize)]
struct Banner {
    name: &'static str,
    version: &'static str,
    status: &'static str,
}

/// Build the top-level axum [`Router`].
///
/// Mounts the API under `/api` next to `/health` and the `/` banner.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level, and a CORS layer admitting `allowed_origins` (`*` admits
/// any origin).
pub fn build<S, N, C>(state: AppState<S, N, C>, allowed_origins: &[String]) -> Router
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring malformed CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn banner() -> Json<Banner> {
    Json(Banner {
        name: "CareOps API",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

async fn health_check() -> &'static str {
    "OK"
}

//! # careops-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON REST API** under `/api` (`/api/auth`, `/api/workspace`,
//!   `/api/contacts`, `/api/bookings`, `/api/inbox`, `/api/forms`,
//!   `/api/inventory`, `/api/dashboard`)
//! - Resolve the caller from a bearer token into a
//!   [`Principal`](careops_domain::permission::Principal) before any
//!   workspace-scoped call
//! - Map [`CareOpsError`](careops_domain::error::CareOpsError) onto status
//!   codes and a `{"error": ...}` body
//!
//! ## Dependency rule
//! Depends on `careops-app` (for port traits and services) and
//! `careops-domain` (for types used in request/response mapping). Never leaks
//! axum types into the domain.

pub mod api;
pub mod auth;
pub mod error;
pub mod router;
pub mod state;

pub use router::build;
pub use state::AppState;

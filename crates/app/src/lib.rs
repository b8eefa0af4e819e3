//! # careops-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Store` and its repositories — persistence per aggregate
//!   - `EmailSender` / `SmsSender` — outbound channels, composed into a `Notifier`
//!   - `Credentials` — password hashing and access tokens
//! - Define **driving/inbound ports** as use-case structs:
//!   - `AuthService` — register, login, phone verification, token resolution
//!   - `AccessControl` — the single workspace permission check
//!   - `WorkspaceService`, `ContactService`, `BookingService`, `InboxService`,
//!     `FormService`, `InventoryService`, `DashboardService`
//!   - `AutomationEngine` — best-effort notification rules and the reminder sweep
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `careops-domain` only (plus `tokio` for timeouts and the sweep lock).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod notifier;
pub mod ports;
pub mod services;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

//! Application services — use-case orchestration.
//!
//! Every workspace-scoped operation takes the calling [`Principal`] and runs
//! one [`AccessControl::authorize`] check before touching data.
//!
//! [`Principal`]: careops_domain::permission::Principal

pub mod access_control;
pub mod auth_service;
pub mod booking_service;
pub mod contact_service;
pub mod dashboard_service;
pub mod form_service;
pub mod inbox_service;
pub mod inventory_service;
pub mod workspace_service;

pub use access_control::AccessControl;
pub use auth_service::AuthService;
pub use booking_service::BookingService;
pub use contact_service::ContactService;
pub use dashboard_service::DashboardService;
pub use form_service::FormService;
pub use inbox_service::InboxService;
pub use inventory_service::InventoryService;
pub use workspace_service::WorkspaceService;

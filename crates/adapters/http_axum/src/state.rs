//! Shared application state for axum handlers.

use std::sync::Arc;

use careops_app::automation_engine::AutomationEngine;
use careops_app::ports::{Credentials, Notifier, Store};
use careops_app::services::{
    AuthService, BookingService, ContactService, DashboardService, FormService, InboxService,
    InventoryService, WorkspaceService,
};

/// Application state shared across all axum handlers.
///
/// Generic over the store, notifier and credentials to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<S, N, C> {
    pub auth_service: Arc<AuthService<S, N, C>>,
    pub workspace_service: Arc<WorkspaceService<S>>,
    pub contact_service: Arc<ContactService<S, N>>,
    pub booking_service: Arc<BookingService<S, N>>,
    pub inbox_service: Arc<InboxService<S, N>>,
    pub form_service: Arc<FormService<S>>,
    pub inventory_service: Arc<InventoryService<S, N>>,
    pub dashboard_service: Arc<DashboardService<S>>,
}

impl<S, N, C> Clone for AppState<S, N, C> {
    fn clone(&self) -> Self {
        Self {
            auth_service: Arc::clone(&self.auth_service),
            workspace_service: Arc::clone(&self.workspace_service),
            contact_service: Arc::clone(&self.contact_service),
            booking_service: Arc::clone(&self.booking_service),
            inbox_service: Arc::clone(&self.inbox_service),
            form_service: Arc::clone(&self.form_service),
            inventory_service: Arc::clone(&self.inventory_service),
            dashboard_service: Arc::clone(&self.dashboard_service),
        }
    }
}

impl<S, N, C> AppState<S, N, C>
where
    S: Store,
    N: Notifier,
    C: Credentials,
{
    /// Build every service over the same store, notifier and automation engine.
    ///
    /// The engine is passed in rather than created here so the caller can
    /// share it with the periodic reminder sweep.
    pub fn new(
        store: Arc<S>,
        notifier: Arc<N>,
        credentials: Arc<C>,
        engine: Arc<AutomationEngine<S, N>>,
    ) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(
                Arc::clone(&store),
                Arc::clone(&notifier),
                credentials,
            )),
            workspace_service: Arc::new(WorkspaceService::new(Arc::clone(&store))),
            contact_service: Arc::new(ContactService::new(
                Arc::clone(&store),
                Arc::clone(&notifier),
                Arc::clone(&engine),
            )),
            booking_service: Arc::new(BookingService::new(
                Arc::clone(&store),
                notifier,
                Arc::clone(&engine),
            )),
            inbox_service: Arc::new(InboxService::new(Arc::clone(&store), Arc::clone(&engine))),
            form_service: Arc::new(FormService::new(Arc::clone(&store))),
            inventory_service: Arc::new(InventoryService::new(Arc::clone(&store), engine)),
            dashboard_service: Arc::new(DashboardService::new(store)),
        }
    }
}

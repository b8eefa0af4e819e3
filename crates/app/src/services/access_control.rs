//! Access control — the single workspace permission check.

use std::sync::Arc;

use careops_domain::error::{CareOpsError, NotFoundError};
use careops_domain::id::WorkspaceId;
use careops_domain::permission::{self, Access, Principal};
use careops_domain::workspace::Workspace;

use crate::ports::{StaffRepository, Store, WorkspaceRepository};

/// Loads the workspace and the caller's membership, then defers to
/// [`permission::evaluate`].
pub struct AccessControl<S> {
    store: Arc<S>,
}

impl<S> Clone for AccessControl<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> AccessControl<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Authorize `principal` for `access` in `workspace_id`.
    ///
    /// Returns the workspace so callers do not load it twice.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] when the workspace does not exist,
    /// [`CareOpsError::Forbidden`] when the caller is refused, or a storage
    /// error.
    pub async fn authorize(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        access: Access,
    ) -> Result<Workspace, CareOpsError> {
        let workspace = self.load(workspace_id).await?;
        self.check(&workspace, principal, access).await?;
        Ok(workspace)
    }

    /// Authorize by capability name, returning the acting user's id.
    ///
    /// Routes use typed [`Access`] through [`authorize`](Self::authorize);
    /// this form mirrors a by-name check. Membership is resolved before the
    /// name: a non-member is refused as not staff whatever the name, while
    /// the owner passes any name.
    ///
    /// # Errors
    ///
    /// As [`authorize`](Self::authorize).
    #[cfg(test)]
    pub(crate) async fn authorize_named(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        capability: &str,
    ) -> Result<careops_domain::id::UserId, CareOpsError> {
        let workspace = self.load(workspace_id).await?;
        if workspace.is_owned_by(principal.user_id) {
            return Ok(principal.user_id);
        }
        let staff = self
            .store
            .staff()
            .find(workspace.id, principal.user_id)
            .await?
            .ok_or(permission::Denied::NotStaff)?;
        let capability: permission::Capability = capability.parse()?;
        permission::evaluate(
            &workspace,
            principal.user_id,
            Some(&staff),
            Access::Capability(capability),
        )?;
        Ok(principal.user_id)
    }

    async fn load(&self, workspace_id: WorkspaceId) -> Result<Workspace, CareOpsError> {
        self.store
            .workspaces()
            .get_by_id(workspace_id)
            .await?
            .ok_or_else(|| NotFoundError::new("Workspace", workspace_id).into())
    }

    async fn check(
        &self,
        workspace: &Workspace,
        principal: &Principal,
        access: Access,
    ) -> Result<(), CareOpsError> {
        let staff = if workspace.is_owned_by(principal.user_id) {
            None
        } else {
            self.store
                .staff()
                .find(workspace.id, principal.user_id)
                .await?
        };

        permission::evaluate(workspace, principal.user_id, staff.as_ref(), access).map_err(
            |denied| {
                tracing::debug!(
                    workspace_id = %workspace.id,
                    user_id = %principal.user_id,
                    reason = %denied,
                    "access denied"
                );
                denied.into()
            },
        )
    }
}

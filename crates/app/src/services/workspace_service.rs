//! Workspace service — tenant lifecycle and staff management.

use std::sync::Arc;

use careops_domain::error::{CareOpsError, NotFoundError, ValidationError};
use careops_domain::id::{StaffId, WorkspaceId};
use careops_domain::permission::{Access, Principal};
use careops_domain::staff::{StaffMember, StaffPermissions, StaffRole};
use careops_domain::workspace::{Workspace, WorkspaceStatus};

use crate::ports::{StaffRepository, Store, UserRepository, WorkspaceRepository};
use crate::services::AccessControl;

/// Input for [`WorkspaceService::create`].
#[derive(Debug, Clone, Default)]
pub struct NewWorkspace {
    pub name: String,
    pub address: Option<String>,
    pub timezone: Option<String>,
    pub contact_email: Option<String>,
}

/// Input for [`WorkspaceService::add_staff`].
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub email: String,
    pub role: StaffRole,
    pub permissions: StaffPermissions,
}

/// Partial update for [`WorkspaceService::update_staff`]; `None` keeps the value.
#[derive(Debug, Clone, Default)]
pub struct StaffUpdate {
    pub role: Option<StaffRole>,
    pub can_manage_inbox: Option<bool>,
    pub can_manage_bookings: Option<bool>,
    pub can_view_inventory: Option<bool>,
}

pub struct WorkspaceService<S> {
    store: Arc<S>,
    access: AccessControl<S>,
}

impl<S: Store> WorkspaceService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            access: AccessControl::new(Arc::clone(&store)),
            store,
        }
    }

    /// Create a draft workspace owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] when the name is blank.
    #[tracing::instrument(skip(self, input), fields(user_id = %principal.user_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        input: NewWorkspace,
    ) -> Result<Workspace, CareOpsError> {
        let workspace = Workspace::builder()
            .owner_id(principal.user_id)
            .name(input.name.trim())
            .address(input.address)
            .timezone(input.timezone)
            .contact_email(input.contact_email)
            .build()?;
        let workspace = self.store.workspaces().create(workspace).await?;
        tracing::info!(workspace_id = %workspace.id, "workspace created");
        Ok(workspace)
    }

    /// Workspaces owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list(&self, principal: &Principal) -> Result<Vec<Workspace>, CareOpsError> {
        self.store
            .workspaces()
            .list_by_owner(principal.user_id)
            .await
    }

    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] or [`CareOpsError::Forbidden`].
    pub async fn get(
        &self,
        principal: &Principal,
        id: WorkspaceId,
    ) -> Result<Workspace, CareOpsError> {
        self.access.authorize(principal, id, Access::Owner).await
    }

    /// Move the workspace to active once every prerequisite holds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ActivationBlocked`] listing every unmet
    /// prerequisite; nothing is written in that case.
    #[tracing::instrument(skip(self, principal), fields(workspace_id = %id))]
    pub async fn activate(
        &self,
        principal: &Principal,
        id: WorkspaceId,
    ) -> Result<Workspace, CareOpsError> {
        let mut workspace = self.access.authorize(principal, id, Access::Owner).await?;
        let checklist = self.store.workspaces().activation_checklist(id).await?;
        let was_active = workspace.status == WorkspaceStatus::Active;
        workspace.activate(checklist)?;
        if was_active {
            return Ok(workspace);
        }
        let workspace = self.store.workspaces().update(workspace).await?;
        tracing::info!("workspace activated");
        Ok(workspace)
    }

    /// Grant an existing user membership in the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] when no user has that email, or
    /// [`CareOpsError::Validation`] when the user is the owner or already staff.
    #[tracing::instrument(skip(self, principal, input), fields(workspace_id = %id))]
    pub async fn add_staff(
        &self,
        principal: &Principal,
        id: WorkspaceId,
        input: NewStaff,
    ) -> Result<StaffMember, CareOpsError> {
        let workspace = self.access.authorize(principal, id, Access::Owner).await?;
        let email = input.email.trim().to_lowercase();
        let user = self
            .store
            .users()
            .find_by_email(&email)
            .await?
            .ok_or_else(|| NotFoundError::new("User", &email))?;
        if workspace.is_owned_by(user.id) {
            return Err(ValidationError::OwnerAsStaff.into());
        }
        if self.store.staff().find(id, user.id).await?.is_some() {
            return Err(ValidationError::AlreadyStaff.into());
        }
        let staff = StaffMember::new(id, user.id, input.role, input.permissions);
        let staff = self.store.staff().create(staff).await?;
        tracing::info!(staff_id = %staff.id, user_id = %user.id, "staff member added");
        Ok(staff)
    }

    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] or [`CareOpsError::Forbidden`].
    pub async fn list_staff(
        &self,
        principal: &Principal,
        id: WorkspaceId,
    ) -> Result<Vec<StaffMember>, CareOpsError> {
        self.access.authorize(principal, id, Access::Owner).await?;
        self.store.staff().list_by_workspace(id).await
    }

    /// Change a staff member's role or capability flags.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::NotFound`] when the membership does not belong
    /// to the workspace.
    pub async fn update_staff(
        &self,
        principal: &Principal,
        id: WorkspaceId,
        staff_id: StaffId,
        update: StaffUpdate,
    ) -> Result<StaffMember, CareOpsError> {
        self.access.authorize(principal, id, Access::Owner).await?;
        let mut staff = self
            .store
            .staff()
            .get_by_id(staff_id)
            .await?
            .filter(|s| s.workspace_id == id)
            .ok_or_else(|| NotFoundError::new("Staff member", staff_id))?;

        if let Some(role) = update.role {
            staff.role = role;
        }
        let flags = &mut staff.permissions;
        flags.can_manage_inbox = update.can_manage_inbox.unwrap_or(flags.can_manage_inbox);
        flags.can_manage_bookings = update
            .can_manage_bookings
            .unwrap_or(flags.can_manage_bookings);
        flags.can_view_inventory = update
            .can_view_inventory
            .unwrap_or(flags.can_view_inventory);

        self.store.staff().update(staff).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careops_domain::contact::Contact;
    use careops_domain::conversation::{Conversation, Message};
    use careops_domain::form::Form;
    use careops_domain::id::UserId;
    use careops_domain::user::User;
    use careops_domain::workspace::ActivationBlocker;

    use crate::ports::{BookingRepository, ContactRepository, FormRepository};
    use crate::testing::InMemoryStore;

    fn owner() -> Principal {
        Principal {
            user_id: UserId::new(),
            email: "owner@clinic.test".to_string(),
        }
    }

    fn make_service() -> (WorkspaceService<InMemoryStore>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::default());
        (WorkspaceService::new(Arc::clone(&store)), store)
    }

    async fn seed_booking(store: &InMemoryStore, workspace_id: WorkspaceId) {
        let contact = Contact::builder()
            .workspace_id(workspace_id)
            .name("Grace")
            .build()
            .unwrap();
        let conversation = Conversation::open(workspace_id, contact.id);
        let welcome = Message::welcome(conversation.id, &contact.name);
        let contact = store
            .contacts()
            .create_with_conversation(contact, conversation, welcome)
            .await
            .unwrap();
        let booking = careops_domain::booking::Booking::builder()
            .workspace_id(workspace_id)
            .contact_id(contact.id)
            .booking_type("Consultation")
            .build()
            .unwrap();
        store
            .bookings()
            .create_with_effects(booking, Vec::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_create_draft_workspace_owned_by_caller() {
        let (service, _) = make_service();
        let principal = owner();
        let ws = service
            .create(
                &principal,
                NewWorkspace {
                    name: "Sunrise Clinic".to_string(),
                    ..NewWorkspace::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(ws.owner_id, principal.user_id);
        assert_eq!(ws.status, WorkspaceStatus::Draft);
        assert_eq!(service.list(&principal).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_refuse_activation_until_form_exists_then_activate() {
        let (service, store) = make_service();
        let principal = owner();
        let ws = service
            .create(
                &principal,
                NewWorkspace {
                    name: "Sunrise Clinic".to_string(),
                    contact_email: Some("desk@clinic.test".to_string()),
                    ..NewWorkspace::default()
                },
            )
            .await
            .unwrap();
        seed_booking(&store, ws.id).await;

        let blocked = service.activate(&principal, ws.id).await;
        let Err(CareOpsError::Validation(ValidationError::ActivationBlocked(blockers))) = blocked
        else {
            panic!("expected activation to be blocked");
        };
        assert_eq!(blockers, vec![ActivationBlocker::NoForms]);

        store
            .forms()
            .create(Form::new(ws.id, "Intake", None, Vec::new(), Vec::new()).unwrap())
            .await
            .unwrap();
        let active = service.activate(&principal, ws.id).await.unwrap();
        assert_eq!(active.status, WorkspaceStatus::Active);

        let again = service.activate(&principal, ws.id).await.unwrap();
        assert_eq!(again.status, WorkspaceStatus::Active);
    }

    #[tokio::test]
    async fn should_add_staff_with_default_flags_and_reject_duplicates() {
        let (service, store) = make_service();
        let principal = owner();
        let ws = service
            .create(
                &principal,
                NewWorkspace {
                    name: "Clinic".to_string(),
                    ..NewWorkspace::default()
                },
            )
            .await
            .unwrap();
        let member = User::builder()
            .email("sam@clinic.test")
            .full_name("Sam Staff")
            .build()
            .unwrap();
        store.users().create(member.clone()).await.unwrap();
        let input = NewStaff {
            email: "Sam@Clinic.test".to_string(),
            role: StaffRole::default(),
            permissions: StaffPermissions::default(),
        };

        let staff = service.add_staff(&principal, ws.id, input.clone()).await.unwrap();
        let duplicate = service.add_staff(&principal, ws.id, input).await;

        assert_eq!(staff.user_id, member.id);
        assert!(staff.permissions.can_view_inventory);
        assert!(matches!(
            duplicate,
            Err(CareOpsError::Validation(ValidationError::AlreadyStaff))
        ));
    }

    #[tokio::test]
    async fn should_update_only_given_staff_flags() {
        let (service, store) = make_service();
        let principal = owner();
        let ws = service
            .create(
                &principal,
                NewWorkspace {
                    name: "Clinic".to_string(),
                    ..NewWorkspace::default()
                },
            )
            .await
            .unwrap();
        let staff = store
            .staff()
            .create(StaffMember::new(
                ws.id,
                UserId::new(),
                StaffRole::Staff,
                StaffPermissions::default(),
            ))
            .await
            .unwrap();

        let updated = service
            .update_staff(
                &principal,
                ws.id,
                staff.id,
                StaffUpdate {
                    role: Some(StaffRole::Manager),
                    can_manage_inbox: Some(false),
                    ..StaffUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.role, StaffRole::Manager);
        assert!(!updated.permissions.can_manage_inbox);
        assert!(updated.permissions.can_manage_bookings);
    }

    #[tokio::test]
    async fn should_forbid_non_owner_from_reading_workspace() {
        let (service, _) = make_service();
        let ws = service
            .create(
                &owner(),
                NewWorkspace {
                    name: "Clinic".to_string(),
                    ..NewWorkspace::default()
                },
            )
            .await
            .unwrap();
        let result = service.get(&owner(), ws.id).await;
        assert!(matches!(result, Err(CareOpsError::Forbidden(_))));
    }
}

//! Form service — templates and the submissions bookings create.

use std::sync::Arc;

use serde::Serialize;

use careops_domain::error::{CareOpsError, NotFoundError};
use careops_domain::form::{Form, FormSubmission};
use careops_domain::id::{SubmissionId, WorkspaceId};
use careops_domain::permission::{Access, Capability, Principal};
use careops_domain::time::now;

use crate::ports::{FormRepository, Store};
use crate::services::AccessControl;

/// Input for [`FormService::create`].
#[derive(Debug, Clone, Default)]
pub struct NewForm {
    pub name: String,
    pub description: Option<String>,
    pub required_fields: Vec<String>,
    pub booking_types: Vec<String>,
}

/// A submission with its derived overdue flag.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    #[serde(flatten)]
    pub submission: FormSubmission,
    pub overdue: bool,
}

impl From<FormSubmission> for SubmissionView {
    fn from(submission: FormSubmission) -> Self {
        Self {
            overdue: submission.is_overdue(now()),
            submission,
        }
    }
}

pub struct FormService<S> {
    store: Arc<S>,
    access: AccessControl<S>,
}

impl<S: Store> FormService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            access: AccessControl::new(Arc::clone(&store)),
            store,
        }
    }

    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] on a blank name, or an access or
    /// storage error.
    #[tracing::instrument(skip(self, principal, input), fields(workspace_id = %workspace_id))]
    pub async fn create(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        input: NewForm,
    ) -> Result<Form, CareOpsError> {
        self.access
            .authorize(principal, workspace_id, Access::Owner)
            .await?;
        let form = Form::new(
            workspace_id,
            input.name.trim(),
            input.description,
            input.required_fields,
            input.booking_types,
        )?;
        let form = self.store.forms().create(form).await?;
        tracing::info!(form_id = %form.id, "form created");
        Ok(form)
    }

    /// Forms of the workspace.
    ///
    /// # Errors
    ///
    /// Returns an access or storage error.
    pub async fn list(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<Form>, CareOpsError> {
        self.access
            .authorize(principal, workspace_id, Access::Capability(Capability::Bookings))
            .await?;
        self.store.forms().list_by_workspace(workspace_id).await
    }

    /// # Errors
    ///
    /// Returns an access or storage error.
    pub async fn list_submissions(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<SubmissionView>, CareOpsError> {
        self.access
            .authorize(principal, workspace_id, Access::Capability(Capability::Bookings))
            .await?;
        let submissions = self.store.forms().list_submissions(workspace_id).await?;
        Ok(submissions.into_iter().map(SubmissionView::from).collect())
    }

    /// Record the customer's answers.
    ///
    /// # Errors
    ///
    /// Returns [`CareOpsError::Validation`] listing every missing required
    /// field or when already completed, [`CareOpsError::NotFound`] for a
    /// submission outside the workspace, or an access or storage error.
    #[tracing::instrument(skip(self, principal, data), fields(workspace_id = %workspace_id, submission_id = %id))]
    pub async fn complete_submission(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
        id: SubmissionId,
        data: serde_json::Value,
        contact_email: Option<String>,
    ) -> Result<SubmissionView, CareOpsError> {
        self.access
            .authorize(principal, workspace_id, Access::Capability(Capability::Bookings))
            .await?;
        let mut submission = self
            .store
            .forms()
            .get_submission(id)
            .await?
            .filter(|s| s.workspace_id == workspace_id)
            .ok_or_else(|| NotFoundError::new("Submission", id))?;
        let form = self
            .store
            .forms()
            .get_by_id(submission.form_id)
            .await?
            .ok_or_else(|| NotFoundError::new("Form", submission.form_id))?;

        submission.complete(&form, data, contact_email, now())?;
        let submission = self.store.forms().update_submission(submission).await?;
        tracing::info!("submission completed");
        Ok(submission.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careops_domain::booking::Booking;
    use careops_domain::error::ValidationError;
    use careops_domain::form::SubmissionStatus;
    use careops_domain::id::UserId;
    use careops_domain::permission::Denied;
    use careops_domain::staff::{StaffMember, StaffPermissions, StaffRole};
    use careops_domain::workspace::Workspace;
    use chrono::Duration;
    use serde_json::json;

    use crate::ports::{BookingRepository, StaffRepository, WorkspaceRepository};
    use crate::testing::InMemoryStore;

    struct Fixture {
        service: FormService<InMemoryStore>,
        store: Arc<InMemoryStore>,
        owner: Principal,
        workspace: Workspace,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::default());
        let owner = Principal {
            user_id: UserId::new(),
            email: "owner@clinic.test".to_string(),
        };
        let workspace = Workspace::builder()
            .owner_id(owner.user_id)
            .name("Clinic")
            .build()
            .unwrap();
        store.workspaces().create(workspace.clone()).await.unwrap();
        Fixture {
            service: FormService::new(Arc::clone(&store)),
            store,
            owner,
            workspace,
        }
    }

    fn intake() -> NewForm {
        NewForm {
            name: "Intake".to_string(),
            description: Some("Before your first visit".to_string()),
            required_fields: vec!["allergies".to_string(), "dob".to_string()],
            booking_types: vec!["Consultation".to_string()],
        }
    }

    async fn pending_submission(f: &Fixture, form: &Form, hours_ahead: i64) -> FormSubmission {
        let booking = Booking::builder()
            .workspace_id(f.workspace.id)
            .booking_type("Consultation")
            .scheduled_at(now() + Duration::hours(hours_ahead))
            .build()
            .unwrap();
        let submission = FormSubmission::pending_for(form, &booking, None);
        f.store
            .bookings()
            .create_with_effects(booking, vec![submission.clone()])
            .await
            .unwrap();
        submission
    }

    #[tokio::test]
    async fn should_create_active_form() {
        let f = fixture().await;
        let form = f
            .service
            .create(&f.owner, f.workspace.id, intake())
            .await
            .unwrap();
        assert!(form.is_active);
        assert_eq!(
            f.service.list(&f.owner, f.workspace.id).await.unwrap(),
            vec![form]
        );
    }

    #[tokio::test]
    async fn should_only_let_owner_create_forms() {
        let f = fixture().await;
        let manager = Principal {
            user_id: UserId::new(),
            email: "manager@clinic.test".to_string(),
        };
        f.store
            .staff()
            .create(StaffMember::new(
                f.workspace.id,
                manager.user_id,
                StaffRole::Manager,
                StaffPermissions::default(),
            ))
            .await
            .unwrap();

        let result = f.service.create(&manager, f.workspace.id, intake()).await;

        assert!(matches!(
            result,
            Err(CareOpsError::Forbidden(Denied::NotOwner))
        ));
    }

    #[tokio::test]
    async fn should_flag_overdue_submissions() {
        let f = fixture().await;
        let form = f
            .service
            .create(&f.owner, f.workspace.id, intake())
            .await
            .unwrap();
        let late = pending_submission(&f, &form, -2).await;
        pending_submission(&f, &form, 2).await;

        let views = f
            .service
            .list_submissions(&f.owner, f.workspace.id)
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        let overdue: Vec<_> = views.iter().filter(|v| v.overdue).collect();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].submission.id, late.id);
    }

    #[tokio::test]
    async fn should_report_every_missing_field_together() {
        let f = fixture().await;
        let form = f
            .service
            .create(&f.owner, f.workspace.id, intake())
            .await
            .unwrap();
        let submission = pending_submission(&f, &form, 24).await;

        let result = f
            .service
            .complete_submission(&f.owner, f.workspace.id, submission.id, json!({}), None)
            .await;

        match result {
            Err(CareOpsError::Validation(ValidationError::MissingFields(fields))) => {
                assert_eq!(fields, ["allergies", "dob"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_complete_submission_once() {
        let f = fixture().await;
        let form = f
            .service
            .create(&f.owner, f.workspace.id, intake())
            .await
            .unwrap();
        let submission = pending_submission(&f, &form, -1).await;
        let data = json!({"allergies": "none", "dob": "1990-01-01"});

        let view = f
            .service
            .complete_submission(
                &f.owner,
                f.workspace.id,
                submission.id,
                data.clone(),
                Some("grace@example.com".to_string()),
            )
            .await
            .unwrap();
        let again = f
            .service
            .complete_submission(&f.owner, f.workspace.id, submission.id, data, None)
            .await;

        assert_eq!(view.submission.status, SubmissionStatus::Completed);
        assert!(view.submission.submitted_at.is_some());
        assert!(!view.overdue);
        assert_eq!(
            view.submission.contact_email.as_deref(),
            Some("grace@example.com")
        );
        assert!(matches!(
            again,
            Err(CareOpsError::Validation(
                ValidationError::SubmissionAlreadyCompleted
            ))
        ));
    }
}

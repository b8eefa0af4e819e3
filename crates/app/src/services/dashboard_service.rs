//! Dashboard service — workspace aggregates and alerts.

use std::sync::Arc;

use serde::Serialize;

use careops_domain::booking::Booking;
use careops_domain::conversation::Conversation;
use careops_domain::dashboard::{Alert, DashboardStats};
use careops_domain::error::CareOpsError;
use careops_domain::id::WorkspaceId;
use careops_domain::permission::{Access, Principal};
use careops_domain::time::{day_bounds, now};

use crate::ports::{
    BookingRepository, ConversationRepository, FormRepository, InventoryRepository, Store,
};
use crate::services::AccessControl;

/// How many recent bookings and conversations the dashboard shows.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub alerts: Vec<Alert>,
    pub recent_bookings: Vec<Booking>,
    pub recent_conversations: Vec<Conversation>,
}

pub struct DashboardService<S> {
    store: Arc<S>,
    access: AccessControl<S>,
}

impl<S: Store> DashboardService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            access: AccessControl::new(Arc::clone(&store)),
            store,
        }
    }

    /// Counts for today (UTC) and onwards, plus the alerts they raise.
    ///
    /// # Errors
    ///
    /// Returns an access or storage error.
    pub async fn get(
        &self,
        principal: &Principal,
        workspace_id: WorkspaceId,
    ) -> Result<Dashboard, CareOpsError> {
        self.access
            .authorize(principal, workspace_id, Access::Owner)
            .await?;

        let at = now();
        let (today, tomorrow) = day_bounds(at);
        let bookings = self.store.bookings();
        let forms = self.store.forms().submission_counts(workspace_id, at).await?;
        let stats = DashboardStats {
            today_bookings: bookings
                .count_scheduled(workspace_id, today, Some(tomorrow))
                .await?,
            upcoming_bookings: bookings.count_scheduled(workspace_id, tomorrow, None).await?,
            open_conversations: self.store.conversations().count_open(workspace_id).await?,
            pending_forms: forms.pending,
            overdue_forms: forms.overdue,
            completed_forms: forms.completed,
            low_inventory_count: self.store.inventory().count_low(workspace_id).await?,
        };

        Ok(Dashboard {
            alerts: stats.alerts(),
            stats,
            recent_bookings: bookings
                .recent_by_workspace(workspace_id, RECENT_LIMIT)
                .await?,
            recent_conversations: self
                .store
                .conversations()
                .recent_by_workspace(workspace_id, RECENT_LIMIT)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careops_domain::contact::Contact;
    use careops_domain::conversation::Message;
    use careops_domain::dashboard::AlertLevel;
    use careops_domain::form::{Form, FormSubmission};
    use careops_domain::id::UserId;
    use careops_domain::inventory::InventoryItem;
    use careops_domain::permission::Denied;
    use careops_domain::staff::{StaffMember, StaffPermissions, StaffRole};
    use careops_domain::workspace::Workspace;
    use chrono::Duration;

    use crate::ports::{ContactRepository, StaffRepository, WorkspaceRepository};
    use crate::testing::InMemoryStore;

    struct Fixture {
        service: DashboardService<InMemoryStore>,
        store: Arc<InMemoryStore>,
        owner: Principal,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::default());
        Fixture {
            service: DashboardService::new(Arc::clone(&store)),
            store,
            owner: Principal {
                user_id: UserId::new(),
                email: "owner@clinic.test".to_string(),
            },
        }
    }

    /// A workspace with a contact, bookings at the given day offsets (each
    /// with one pending intake submission) and inventory levels.
    async fn seed(f: &Fixture, days: &[i64], stock: &[i64]) -> Workspace {
        let workspace = Workspace::builder()
            .owner_id(f.owner.user_id)
            .name("Clinic")
            .build()
            .unwrap();
        f.store.workspaces().create(workspace.clone()).await.unwrap();
        let contact = Contact::builder()
            .workspace_id(workspace.id)
            .name("Grace")
            .build()
            .unwrap();
        let conversation = Conversation::open(workspace.id, contact.id);
        f.store
            .contacts()
            .create_with_conversation(
                contact.clone(),
                conversation.clone(),
                Message::welcome(conversation.id, "Grace"),
            )
            .await
            .unwrap();
        let form = Form::new(workspace.id, "Intake", None, Vec::new(), Vec::new()).unwrap();
        f.store.forms().create(form.clone()).await.unwrap();
        for (i, quantity) in stock.iter().enumerate() {
            let item =
                InventoryItem::new(workspace.id, format!("item-{i}"), *quantity, Some(0), None)
                    .unwrap();
            f.store.inventory().create(item).await.unwrap();
        }
        let (today, _) = day_bounds(now());
        for offset in days {
            let booking = Booking::builder()
                .workspace_id(workspace.id)
                .contact_id(contact.id)
                .booking_type("Consultation")
                .scheduled_at(today + Duration::days(*offset) + Duration::hours(12))
                .build()
                .unwrap();
            let submission = FormSubmission::pending_for(&form, &booking, None);
            f.store
                .bookings()
                .create_with_effects(booking, vec![submission])
                .await
                .unwrap();
        }
        workspace
    }

    #[tokio::test]
    async fn should_count_today_and_upcoming_separately() {
        let f = fixture();
        let ws = seed(&f, &[-1, 0, 1, 7], &[]).await;

        let dashboard = f.service.get(&f.owner, ws.id).await.unwrap();

        assert_eq!(dashboard.stats.today_bookings, 1);
        assert_eq!(dashboard.stats.upcoming_bookings, 2);
        assert_eq!(dashboard.stats.open_conversations, 1);
        assert_eq!(dashboard.stats.pending_forms, 4);
        assert!(dashboard.stats.overdue_forms >= 1);
    }

    #[tokio::test]
    async fn should_not_leak_other_workspace_counts() {
        let f = fixture();
        let busy = seed(&f, &[0, 1, 2], &[1, 2]).await;
        let quiet = seed(&f, &[], &[50]).await;

        let dashboard = f.service.get(&f.owner, quiet.id).await.unwrap();
        let busy_dashboard = f.service.get(&f.owner, busy.id).await.unwrap();

        assert_eq!(dashboard.stats.today_bookings, 0);
        assert_eq!(dashboard.stats.upcoming_bookings, 0);
        assert_eq!(dashboard.stats.pending_forms, 0);
        assert_eq!(dashboard.stats.low_inventory_count, 0);
        assert!(dashboard.recent_bookings.is_empty());
        assert_eq!(busy_dashboard.stats.low_inventory_count, 2);
        assert_eq!(busy_dashboard.recent_bookings.len(), 3);
    }

    #[tokio::test]
    async fn should_raise_alerts_from_counts() {
        let f = fixture();
        let ws = seed(&f, &[-1, 3], &[1]).await;

        let dashboard = f.service.get(&f.owner, ws.id).await.unwrap();

        let alerts: Vec<(AlertLevel, &str)> = dashboard
            .alerts
            .iter()
            .map(|a| (a.level, a.message.as_str()))
            .collect();
        assert_eq!(
            alerts,
            [
                (AlertLevel::Info, "No bookings scheduled for today"),
                (AlertLevel::Warning, "2 forms pending completion"),
                (AlertLevel::Alert, "1 forms overdue"),
                (AlertLevel::Alert, "1 inventory items low"),
            ]
        );
    }

    #[tokio::test]
    async fn should_cap_recent_bookings_at_five() {
        let f = fixture();
        let ws = seed(&f, &[1, 2, 3, 4, 5, 6, 7], &[]).await;

        let dashboard = f.service.get(&f.owner, ws.id).await.unwrap();

        assert_eq!(dashboard.recent_bookings.len(), RECENT_LIMIT);
        assert_eq!(dashboard.recent_conversations.len(), 1);
    }

    #[tokio::test]
    async fn should_restrict_dashboard_to_owner() {
        let f = fixture();
        let ws = seed(&f, &[], &[]).await;
        let manager = Principal {
            user_id: UserId::new(),
            email: "manager@clinic.test".to_string(),
        };
        f.store
            .staff()
            .create(StaffMember::new(
                ws.id,
                manager.user_id,
                StaffRole::Manager,
                StaffPermissions::default(),
            ))
            .await
            .unwrap();

        let result = f.service.get(&manager, ws.id).await;

        assert!(matches!(
            result,
            Err(CareOpsError::Forbidden(Denied::NotOwner))
        ));
    }
}

//! Action contract of a role's notification list.
//!
//! Every notification offers `View`; admins additionally get `Approve` on
//! pending-approval items. Approve is guarded per notification so a second
//! request while the first is still running performs no side effect.
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::error::RemoteError;
use crate::model::{ItemKind, Notification, NotificationType, RelatedItem, Role, RoleScope};
use crate::mutation::MarkRead;
use crate::query::NotificationQueries;
use crate::store::{ApprovalService, ORDER_APPROVED_STATUS};

#[derive(Debug, Error)]
pub enum PanelError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("{role} cannot approve {kind} notification {id}")]
    NotAllowed {
        role: Role,
        kind: NotificationType,
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Approve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveOutcome {
    Approved,
    /// Another approve for the same notification is still running.
    InFlight,
}

/// Receives the item a user chose to open.
pub trait Navigator {
    fn open(&self, item: RelatedItem);
}

impl<F> Navigator for F
where
    F: Fn(RelatedItem),
{
    fn open(&self, item: RelatedItem) {
        self(item)
    }
}

pub struct NotificationPanel {
    scope: RoleScope,
    queries: NotificationQueries,
    mark_read: MarkRead,
    approvals: Arc<dyn ApprovalService>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

struct InFlight {
    set: Arc<Mutex<HashSet<String>>>,
    id: String,
}

impl InFlight {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, id: &str) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string());
        inserted.then(|| Self {
            set: Arc::clone(set),
            id: id.to_string(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl NotificationPanel {
    pub fn new(
        scope: RoleScope,
        queries: NotificationQueries,
        mark_read: MarkRead,
        approvals: Arc<dyn ApprovalService>,
    ) -> Self {
        Self {
            scope,
            queries,
            mark_read,
            approvals,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn scope(&self) -> &RoleScope {
        &self.scope
    }

    pub fn actions(&self, n: &Notification) -> Vec<Action> {
        if self.can_approve(n) {
            vec![Action::View, Action::Approve]
        } else {
            vec![Action::View]
        }
    }

    fn can_approve(&self, n: &Notification) -> bool {
        self.scope.role() == Role::Admin && n.kind.is_pending_approval()
    }

    /// Whether an approve for `id` is currently running.
    pub fn is_approving(&self, id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    pub async fn list(&self) -> Result<Vec<Notification>, RemoteError> {
        self.queries.fetch(&self.scope).await
    }

    pub async fn refresh(&self) -> Result<Vec<Notification>, RemoteError> {
        self.queries.refresh(&self.scope).await
    }

    pub async fn unread_count(&self) -> Result<usize, RemoteError> {
        Ok(self.list().await?.len())
    }

    /// Mark read, then hand the related item to `navigator`. Nothing is
    /// opened if the read fails.
    #[instrument(skip_all, fields(id = %n.id))]
    pub async fn view(
        &self,
        n: &Notification,
        navigator: &dyn Navigator,
    ) -> Result<(), PanelError> {
        self.mark_read.execute(&n.id).await?;
        navigator.open(n.related_item());
        Ok(())
    }

    /// Apply the type-specific approval, then mark the notification read.
    #[instrument(skip_all, fields(id = %n.id, kind = %n.kind))]
    pub async fn approve(&self, n: &Notification) -> Result<ApproveOutcome, PanelError> {
        if !self.can_approve(n) {
            return Err(PanelError::NotAllowed {
                role: self.scope.role(),
                kind: n.kind,
                id: n.id.clone(),
            });
        }
        let Some(_guard) = InFlight::acquire(&self.in_flight, &n.id) else {
            warn!("approve already in flight; ignoring");
            return Ok(ApproveOutcome::InFlight);
        };

        match n.kind.item_kind() {
            ItemKind::Order => {
                self.approvals
                    .set_order_status(&n.related_item_id, ORDER_APPROVED_STATUS)
                    .await?
            }
            ItemKind::PriceList => {
                self.approvals
                    .activate_price_list(&n.related_item_id)
                    .await?
            }
        }
        info!(item = %n.related_item_id, "approval applied");

        self.mark_read.execute(&n.id).await?;
        Ok(ApproveOutcome::Approved)
    }
}

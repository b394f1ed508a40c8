use std::sync::Arc;
use tracing::debug;

use crate::cache::QueryCache;
use crate::error::RemoteError;
use crate::model::{Notification, RoleScope};
use crate::store::NotificationStore;

/// Role-scoped notification queries backed by a shared cache.
#[derive(Clone)]
pub struct NotificationQueries {
    store: Arc<dyn NotificationStore>,
    cache: Arc<QueryCache>,
}

impl NotificationQueries {
    pub fn new(store: Arc<dyn NotificationStore>, cache: Arc<QueryCache>) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Cached list when still fresh, otherwise a refetch.
    pub async fn fetch(&self, scope: &RoleScope) -> Result<Vec<Notification>, RemoteError> {
        if let Some(hit) = self.cache.get_fresh(scope).await {
            debug!(role = %scope.role(), count = hit.len(), "serving notifications from cache");
            return Ok(hit);
        }
        self.refresh(scope).await
    }

    /// Refetch unconditionally. A failure leaves the cached list untouched.
    /// Returns what the cache holds afterwards, which drops anything marked
    /// read while the request was in flight.
    pub async fn refresh(&self, scope: &RoleScope) -> Result<Vec<Notification>, RemoteError> {
        let since = self.cache.generation().await;
        let raw = match scope {
            RoleScope::Admin => self.store.fetch_unread().await?,
            RoleScope::Supplier(id) | RoleScope::Customer(id) => {
                self.store.fetch_for_recipient(id).await?
            }
        };
        let list = filter_for(scope, raw);
        Ok(self.cache.insert(scope.clone(), list, since).await)
    }

    /// Last known list without touching the network.
    pub async fn cached(&self, scope: &RoleScope) -> Option<Vec<Notification>> {
        self.cache.get(scope).await
    }
}

/// Keep only the notifications `scope` should see, preserving order.
pub fn filter_for(scope: &RoleScope, notifications: Vec<Notification>) -> Vec<Notification> {
    notifications
        .into_iter()
        .filter(|n| scope.accepts(n))
        .collect()
}

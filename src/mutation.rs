use std::sync::Arc;
use tracing::{info, instrument};

use crate::cache::QueryCache;
use crate::error::RemoteError;
use crate::store::NotificationStore;

/// The read transition shared by every panel.
#[derive(Clone)]
pub struct MarkRead {
    store: Arc<dyn NotificationStore>,
    cache: Arc<QueryCache>,
}

impl MarkRead {
    pub fn new(store: Arc<dyn NotificationStore>, cache: Arc<QueryCache>) -> Self {
        Self { store, cache }
    }

    /// Mark `id` read on the backend. Only on success is the cache touched:
    /// every query goes stale and `id` disappears from every cached list.
    #[instrument(skip(self))]
    pub async fn execute(&self, id: &str) -> Result<(), RemoteError> {
        self.store.mark_read(id).await?;
        self.cache.invalidate_all().await;
        let lists = self.cache.remove_notification(id).await;
        info!(id, lists, "notification marked read");
        Ok(())
    }
}

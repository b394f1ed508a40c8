#![allow(dead_code)]

use approvals_desk::error::RemoteError;
use approvals_desk::model::{Notification, NotificationType};
use approvals_desk::store::{ApprovalService, NotificationStore};
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

pub fn notification(
    id: &str,
    kind: NotificationType,
    recipient: Option<&str>,
    minute: u32,
) -> Notification {
    Notification {
        id: id.into(),
        kind,
        message: format!("{kind} {id}"),
        created_by_name: "Acme".into(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap(),
        is_read: false,
        related_item_id: format!("item-{id}"),
        recipient_id: recipient.map(str::to_string),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalCall {
    OrderStatus { order_id: String, status: String },
    ActivatePriceList { price_list_id: String },
}

/// In-memory backend that records every call.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    docs: Arc<Mutex<Vec<Notification>>>,
    fail_fetch: Arc<Mutex<bool>>,
    fail_mark_read: Arc<Mutex<bool>>,
    fetches: Arc<Mutex<usize>>,
    mark_read_calls: Arc<Mutex<Vec<String>>>,
    approval_calls: Arc<Mutex<Vec<ApprovalCall>>>,
    fetch_gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl RecordingBackend {
    pub fn with_docs(docs: Vec<Notification>) -> Self {
        Self {
            docs: Arc::new(Mutex::new(docs)),
            ..Default::default()
        }
    }

    pub async fn set_fail_fetch(&self, fail: bool) {
        *self.fail_fetch.lock().await = fail;
    }

    pub async fn set_fail_mark_read(&self, fail: bool) {
        *self.fail_mark_read.lock().await = fail;
    }

    /// The next fetch takes its snapshot, then waits until the returned
    /// `Notify` is signalled before answering.
    pub async fn hold_next_fetch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().await = Some(gate.clone());
        gate
    }

    pub async fn fetches(&self) -> usize {
        *self.fetches.lock().await
    }

    pub async fn mark_read_calls(&self) -> Vec<String> {
        self.mark_read_calls.lock().await.clone()
    }

    pub async fn approval_calls(&self) -> Vec<ApprovalCall> {
        self.approval_calls.lock().await.clone()
    }

    pub async fn doc(&self, id: &str) -> Option<Notification> {
        self.docs.lock().await.iter().find(|n| n.id == id).cloned()
    }

    async fn begin_fetch(&self) -> Result<(), RemoteError> {
        *self.fetches.lock().await += 1;
        if *self.fail_fetch.lock().await {
            return Err(RemoteError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }

    async fn sorted(&self, keep: impl Fn(&Notification) -> bool) -> Vec<Notification> {
        let mut out: Vec<_> = self
            .docs
            .lock()
            .await
            .iter()
            .filter(|n| keep(n))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    async fn wait_gate(&self) {
        let gate = self.fetch_gate.lock().await.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait::async_trait]
impl NotificationStore for RecordingBackend {
    async fn fetch_unread(&self) -> Result<Vec<Notification>, RemoteError> {
        self.begin_fetch().await?;
        let snapshot = self.sorted(|n| !n.is_read).await;
        self.wait_gate().await;
        Ok(snapshot)
    }

    async fn fetch_for_recipient(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<Notification>, RemoteError> {
        self.begin_fetch().await?;
        let snapshot = self
            .sorted(|n| n.recipient_id.as_deref() == Some(recipient_id))
            .await;
        self.wait_gate().await;
        Ok(snapshot)
    }

    async fn mark_read(&self, id: &str) -> Result<(), RemoteError> {
        self.mark_read_calls.lock().await.push(id.to_string());
        if *self.fail_mark_read.lock().await {
            return Err(RemoteError::Rejected {
                status: StatusCode::BAD_REQUEST,
                body: "write rejected".into(),
            });
        }
        let mut docs = self.docs.lock().await;
        let doc = docs
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        doc.is_read = true;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ApprovalService for RecordingBackend {
    async fn set_order_status(&self, order_id: &str, status: &str) -> Result<(), RemoteError> {
        self.approval_calls.lock().await.push(ApprovalCall::OrderStatus {
            order_id: order_id.to_string(),
            status: status.to_string(),
        });
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn activate_price_list(&self, price_list_id: &str) -> Result<(), RemoteError> {
        self.approval_calls.lock().await.push(ApprovalCall::ActivatePriceList {
            price_list_id: price_list_id.to_string(),
        });
        tokio::task::yield_now().await;
        Ok(())
    }
}

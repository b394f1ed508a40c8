use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

use crate::config::Config;
use crate::error::RemoteError;
use crate::model::Notification;
use crate::store::model::{Filter, Order, QueryResp};

pub mod model;

/// Order status an admin approval moves an order into.
pub const ORDER_APPROVED_STATUS: &str = "pending";

/// Read and read-state access to the notifications collection.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// All unread notifications, newest first.
    async fn fetch_unread(&self) -> Result<Vec<Notification>, RemoteError>;

    /// Notifications addressed to `recipient_id` in any read state, newest first.
    async fn fetch_for_recipient(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<Notification>, RemoteError>;

    /// Set `is_read` on one notification. Succeeds again if already read.
    async fn mark_read(&self, id: &str) -> Result<(), RemoteError>;
}

/// Side effects performed when an admin approves a pending item.
#[async_trait]
pub trait ApprovalService: Send + Sync {
    async fn set_order_status(&self, order_id: &str, status: &str) -> Result<(), RemoteError>;

    async fn activate_price_list(&self, price_list_id: &str) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionIds {
    pub notifications: String,
    pub orders: String,
    pub price_lists: String,
}

/// REST client for the hosted document store.
#[derive(Clone)]
pub struct RestStore {
    http: Client,
    base_url: Url,
    project_id: String,
    api_key: String,
    collections: CollectionIds,
}

impl fmt::Debug for RestStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl RestStore {
    pub fn new(
        base_url: Url,
        project_id: String,
        api_key: String,
        collections: CollectionIds,
    ) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .user_agent(concat!("approvals-desk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::Network)?;
        Ok(Self {
            http,
            base_url,
            project_id,
            api_key,
            collections,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, RemoteError> {
        let base_url = cfg
            .backend
            .endpoint_url()
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        let c = &cfg.backend.collections;
        Self::new(
            base_url,
            cfg.backend.project_id.clone(),
            cfg.backend.api_key.clone(),
            CollectionIds {
                notifications: c.notifications.clone(),
                orders: c.orders.clone(),
                price_lists: c.price_lists.clone(),
            },
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::InvalidUrl(format!("{path}: {e}")))
    }

    fn build(
        &self,
        method: Method,
        url: Url,
        body: &Value,
    ) -> Result<reqwest::Request, RemoteError> {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-Project-Id", &self.project_id)
            .header("Content-Type", "application/json")
            .json(body)
            .build()
            .map_err(RemoteError::Network)
    }

    pub fn build_query_request(
        &self,
        collection: &str,
        body: &Value,
    ) -> Result<reqwest::Request, RemoteError> {
        let url = self.endpoint(&format!("v1/collections/{collection}/query"))?;
        self.build(Method::POST, url, body)
    }

    pub fn build_update_request(
        &self,
        collection: &str,
        id: &str,
        body: &Value,
    ) -> Result<reqwest::Request, RemoteError> {
        let url = self.endpoint(&format!("v1/collections/{collection}/documents/{id}"))?;
        self.build(Method::PATCH, url, body)
    }

    async fn execute(
        &self,
        request: reqwest::Request,
        id: Option<&str>,
    ) -> Result<String, RemoteError> {
        debug!(method=%request.method(), url=%request.url(), "sending backend request");
        let res = self
            .http
            .execute(request)
            .await
            .map_err(RemoteError::Network)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            debug!(%status, %body, "backend returned error");
            return Err(RemoteError::from_status(status, body, id));
        }
        res.text().await.map_err(RemoteError::Network)
    }

    async fn query<T: DeserializeOwned>(
        &self,
        collection: &str,
        body: Value,
    ) -> Result<Vec<T>, RemoteError> {
        let request = self.build_query_request(collection, &body)?;
        let text = self.execute(request, None).await?;
        let payload: QueryResp<T> =
            serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))?;
        debug!(
            collection,
            count = payload.documents.len(),
            total = ?payload.total,
            "query returned"
        );
        Ok(payload.documents)
    }

    async fn update(&self, collection: &str, id: &str, body: Value) -> Result<(), RemoteError> {
        let request = self.build_update_request(collection, id, &body)?;
        self.execute(request, Some(id)).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for RestStore {
    async fn fetch_unread(&self) -> Result<Vec<Notification>, RemoteError> {
        self.query(&self.collections.notifications, build_unread_query())
            .await
    }

    async fn fetch_for_recipient(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<Notification>, RemoteError> {
        self.query(
            &self.collections.notifications,
            build_recipient_query(recipient_id),
        )
        .await
    }

    async fn mark_read(&self, id: &str) -> Result<(), RemoteError> {
        self.update(&self.collections.notifications, id, build_mark_read_update())
            .await
    }
}

#[async_trait]
impl ApprovalService for RestStore {
    async fn set_order_status(&self, order_id: &str, status: &str) -> Result<(), RemoteError> {
        self.update(&self.collections.orders, order_id, build_order_status_update(status))
            .await
    }

    async fn activate_price_list(&self, price_list_id: &str) -> Result<(), RemoteError> {
        self.update(
            &self.collections.price_lists,
            price_list_id,
            build_price_list_activation(),
        )
        .await
    }
}

fn query_body(filters: Vec<Filter>) -> Value {
    json!({
        "filters": filters,
        "order": Order::desc("created_at"),
    })
}

pub fn build_unread_query() -> Value {
    query_body(vec![Filter::eq("is_read", false)])
}

pub fn build_recipient_query(recipient_id: &str) -> Value {
    query_body(vec![Filter::eq("recipient_id", recipient_id)])
}

pub fn build_mark_read_update() -> Value {
    json!({ "data": { "is_read": true } })
}

pub fn build_order_status_update(status: &str) -> Value {
    json!({ "data": { "status": status } })
}

pub fn build_price_list_activation() -> Value {
    json!({ "data": { "is_active": true } })
}

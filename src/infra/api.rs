//! Backend contract for the notification resource.
//!
//! [`NotificationApi`] is the seam between the client state machines in
//! `app` and the REST backend. [`crate::infra::client::HttpNotificationApi`]
//! is the production implementation; tests substitute in-memory doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::notification::{NewNotification, Notification, NotificationId, WireNotification};

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

/// List responses come back either as a page object or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PageEnvelope {
    Items(Vec<WireNotification>),
    Page(PageBody),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody {
    #[serde(default)]
    pub content: Vec<WireNotification>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl PageEnvelope {
    pub fn into_items(self) -> Vec<WireNotification> {
        match self {
            PageEnvelope::Items(items) => items,
            PageEnvelope::Page(page) => page.content,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountBody {
    #[serde(default)]
    pub unread_count: Option<u64>,
}

#[async_trait]
pub trait NotificationApi: Send + Sync + 'static {
    /// `GET /notifications?page={n}&size={s}&sortBy=id&sortDir=desc`
    async fn list(&self, request: PageRequest) -> Result<Vec<Notification>, ApiError>;

    /// `GET /notifications/unread-count`
    async fn unread_count(&self) -> Result<u64, ApiError>;

    /// `POST /notifications`
    async fn create(&self, request: &NewNotification) -> Result<Notification, ApiError>;

    /// `PUT /notifications/{id}/read`
    async fn mark_read(&self, id: NotificationId) -> Result<(), ApiError>;

    /// `PUT /notifications/mark-all-read`
    async fn mark_all_read(&self) -> Result<(), ApiError>;

    /// `DELETE /notifications/{id}`
    async fn delete(&self, id: NotificationId) -> Result<(), ApiError>;
}

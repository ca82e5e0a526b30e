use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use time::OffsetDateTime;

use crate::domain::timestamp;

/// Server-assigned notification id. Monotonically increasing, so descending
/// id order is the stable proxy for recency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub i64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const STATUS_READ: &str = "READ";

/// Notification record exactly as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNotification {
    pub id: NotificationId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "type", default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Kept raw: any set value marks the notification read, even one that
    /// does not parse as a timestamp.
    #[serde(default)]
    pub read_at: Option<Value>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

/// Open-ended category tag. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub const GENERAL: &'static str = "GENERAL";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn general() -> Self {
        Self(Self::GENERAL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coarse grouping for icon/label selection. Tags that match no known
    /// family fall back to `General`.
    pub fn kind(&self) -> CategoryKind {
        let tag = self.0.to_ascii_uppercase();
        if tag.contains("CHAT") {
            CategoryKind::Chat
        } else if tag.contains("MESSAGE") {
            CategoryKind::Message
        } else if tag.contains("MENTION") {
            CategoryKind::Mention
        } else if tag.contains("MEMBER") {
            CategoryKind::Member
        } else if tag.contains("PROJECT") {
            CategoryKind::Project
        } else if tag.contains("LEAVE") {
            CategoryKind::Leave
        } else if tag.contains("HR") {
            CategoryKind::Hr
        } else {
            CategoryKind::General
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::general()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Chat,
    Message,
    Mention,
    Member,
    Project,
    Leave,
    Hr,
    General,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Unknown or missing values degrade to `Normal`.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("LOW") => Priority::Low,
            Some(value) if value.eq_ignore_ascii_case("HIGH") => Priority::High,
            Some(value) if value.eq_ignore_ascii_case("URGENT") => Priority::Urgent,
            _ => Priority::Normal,
        }
    }
}

/// Read-model consumed by the bell widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub body: Option<String>,
    pub category: Category,
    pub priority: Priority,
    pub is_read: bool,
    pub created_at: Option<OffsetDateTime>,
    pub link: Option<String>,
}

/// Maps a wire record to the read-model. Never fails: absent optional
/// fields stay absent, and empty `body`/`link` strings are treated as absent.
pub fn to_view_model(wire: WireNotification) -> Notification {
    let is_read = wire.status.as_deref() == Some(STATUS_READ)
        || wire.read_at.as_ref().is_some_and(timestamp::is_set);
    Notification {
        id: wire.id,
        title: wire.title,
        body: non_empty(wire.body),
        category: wire.category.map(Category::new).unwrap_or_default(),
        priority: Priority::from_wire(wire.priority.as_deref()),
        is_read,
        created_at: wire.created_at,
        link: non_empty(wire.link),
    }
}

impl From<WireNotification> for Notification {
    fn from(wire: WireNotification) -> Self {
        to_view_model(wire)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Body of `POST /notifications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub category: Category,
    pub title: String,
    pub body: String,
    pub recipient_id: UserId,
    pub priority: Priority,
    pub link: Option<String>,
    pub send_email: bool,
}

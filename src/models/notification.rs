//! Notification model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification id: numeric for stored notifications, textual for the
/// ones the backend derives on the fly (`admin_caregiver_pending_3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationId {
    Number(i64),
    Text(String),
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationId::Number(n) => write!(f, "{n}"),
            NotificationId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NotificationId {
    fn from(id: i64) -> Self {
        NotificationId::Number(id)
    }
}

impl From<&str> for NotificationId {
    fn from(id: &str) -> Self {
        NotificationId::Text(id.to_string())
    }
}

/// Notification as returned by `/notifications`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendNotification {
    pub id: NotificationId,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Notification in display shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: Option<String>,
    pub message: String,
    pub read: bool,
    pub timestamp: Option<String>,
    pub source: Option<String>,
}

impl From<BackendNotification> for Notification {
    fn from(n: BackendNotification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            priority: n.priority,
            message: n.body,
            read: n.is_read,
            timestamp: n.created_at,
            source: n.source,
        }
    }
}

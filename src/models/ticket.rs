// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Support ticket model: backend shape and display shape.

use serde::{Deserialize, Serialize, Serializer};

use crate::time_utils::now_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Accepts both backend (`in_progress`) and display (`In Progress`) spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(' ', "_").as_str() {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(TicketPriority::Low),
            "medium" => Some(TicketPriority::Medium),
            "high" => Some(TicketPriority::High),
            _ => None,
        }
    }
}

/// Ticket as returned by `/tickets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub assigned_to: Option<i64>,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    pub status: TicketStatus,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<String>,
}

/// Ticket in the shape the dashboards display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(serialize_with = "serialize_status_label")]
    pub status: TicketStatus,
    #[serde(serialize_with = "serialize_priority_label")]
    pub priority: TicketPriority,
    pub category: Option<String>,
    /// Creator name, or the creator's user id when no name is known
    pub created_by: String,
    /// Assignee name, or the assignee id when no name is known
    pub assigned_to: Option<String>,
    pub assigned_to_id: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub resolved_at: Option<String>,
}

impl TicketView {
    /// Change status locally, keeping `resolved_at` set iff the ticket is closed.
    pub fn set_status(&mut self, status: TicketStatus, now: &str) {
        self.status = status;
        if status == TicketStatus::Closed {
            if self.resolved_at.is_none() {
                self.resolved_at = Some(now.to_string());
            }
        } else {
            self.resolved_at = None;
        }
    }
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        let created_by = ticket
            .created_by_name
            .or_else(|| ticket.user_id.map(|id| id.to_string()))
            .unwrap_or_default();
        let assigned_to = ticket
            .assigned_to_name
            .or_else(|| ticket.assigned_to.map(|id| id.to_string()));

        let resolved_at = match ticket.status {
            TicketStatus::Closed => Some(
                ticket
                    .resolved_at
                    .or_else(|| ticket.updated_at.clone())
                    .or_else(|| ticket.created_at.clone())
                    .unwrap_or_else(now_rfc3339),
            ),
            _ => None,
        };

        Self {
            id: ticket.id,
            title: ticket.subject,
            description: ticket.description,
            status: ticket.status,
            priority: ticket.priority.unwrap_or_default(),
            category: ticket.category,
            created_by,
            assigned_to,
            assigned_to_id: ticket.assigned_to,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            resolved_at,
        }
    }
}

fn serialize_status_label<S: Serializer>(status: &TicketStatus, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(status.label())
}

fn serialize_priority_label<S: Serializer>(
    priority: &TicketPriority,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.serialize_str(priority.label())
}

/// New ticket as entered in the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
}

/// Ticket fields accepted by `PUT /tickets/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TicketUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<i64>,
}

impl From<&NewTicket> for TicketUpdate {
    fn from(ticket: &NewTicket) -> Self {
        Self {
            subject: Some(ticket.title.clone()),
            description: Some(ticket.description.clone()),
            priority: ticket.priority,
            ..Self::default()
        }
    }
}

/// Ticket list filters, sent as query parameters and re-applied locally.
///
/// `assigned_to` matches either the assignee id or name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilters {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub assigned_to: Option<String>,
}

impl TicketFilters {
    pub fn matches(&self, ticket: &TicketView) -> bool {
        self.status.is_none_or(|s| ticket.status == s)
            && self.priority.is_none_or(|p| ticket.priority == p)
            && self.assigned_to.as_deref().is_none_or(|a| {
                ticket.assigned_to_id.is_some_and(|id| id.to_string() == a)
                    || ticket.assigned_to.as_deref() == Some(a)
            })
    }
}

/// Staff member a ticket can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignableUser {
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub gmail_id: Option<String>,
    #[serde(default)]
    pub role: Option<crate::models::Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_ticket() -> Ticket {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "user_id": 5,
            "assigned_to": null,
            "subject": "Cannot log in",
            "description": "Popup closes immediately",
            "status": "in_progress",
            "created_at": "2024-05-01T09:00:00"
        }))
        .unwrap()
    }

    #[test]
    fn closed_ticket_always_has_resolved_at() {
        let bare: Ticket = serde_json::from_value(serde_json::json!({
            "id": 1,
            "subject": "s",
            "status": "closed"
        }))
        .unwrap();
        let view = TicketView::from(bare);
        assert_eq!(view.status, TicketStatus::Closed);
        assert!(view.resolved_at.is_some());

        let mut created_only = backend_ticket();
        created_only.status = TicketStatus::Closed;
        let view = TicketView::from(created_only);
        assert_eq!(view.resolved_at.as_deref(), Some("2024-05-01T09:00:00"));

        assert_eq!(TicketView::from(backend_ticket()).resolved_at, None);
    }

    #[test]
    fn maps_backend_ticket_to_view() {
        let view = TicketView::from(backend_ticket());
        assert_eq!(view.title, "Cannot log in");
        assert_eq!(view.created_by, "5");
        assert_eq!(view.priority, TicketPriority::Medium);
        assert_eq!(view.assigned_to, None);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "In Progress");
        assert_eq!(json["priority"], "Medium");
        assert_eq!(json["createdAt"], "2024-05-01T09:00:00");
    }

    #[test]
    fn resolved_at_tracks_closed_status() {
        let mut view = TicketView::from(backend_ticket());
        assert!(view.resolved_at.is_none());

        view.set_status(TicketStatus::Closed, "2024-05-02T00:00:00Z");
        assert_eq!(view.resolved_at.as_deref(), Some("2024-05-02T00:00:00Z"));

        view.set_status(TicketStatus::Open, "2024-05-03T00:00:00Z");
        assert!(view.resolved_at.is_none());
    }

    #[test]
    fn status_parse_accepts_labels() {
        assert_eq!(
            TicketStatus::parse("In Progress"),
            Some(TicketStatus::InProgress)
        );
        assert_eq!(TicketStatus::parse("closed"), Some(TicketStatus::Closed));
        assert_eq!(TicketStatus::parse("archived"), None);
    }

    #[test]
    fn update_skips_unset_fields() {
        let update = TicketUpdate {
            status: Some(TicketStatus::InProgress),
            ..TicketUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "status": "in_progress" })
        );
    }
}

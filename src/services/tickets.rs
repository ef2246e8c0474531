// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Support ticket endpoints.

use serde_json::json;

use crate::models::{NewTicket, TicketFilters, TicketStatus, TicketUpdate};
use crate::services::api::{segment, ApiClient, ApiResponse, RequestOptions};

#[derive(Clone)]
pub struct TicketsService {
    api: ApiClient,
}

impl TicketsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `data.tickets`
    pub async fn list(&self, filters: &TicketFilters) -> ApiResponse {
        let options = RequestOptions::new()
            .query("status", filters.status.map(|s| s.as_str()))
            .query("priority", filters.priority.map(|p| p.as_str()))
            .query("assigned_to", filters.assigned_to.as_deref());
        self.api.get("/tickets", options).await
    }

    /// `data.ticket`
    pub async fn get(&self, id: i64) -> ApiResponse {
        self.api
            .get(&format!("/tickets/{}", segment(id)), RequestOptions::new())
            .await
    }

    /// `data.ticket_id`
    pub async fn create(&self, ticket: &NewTicket) -> ApiResponse {
        let mut body = json!({
            "subject": ticket.title,
            "description": ticket.description,
        });
        if let Some(priority) = ticket.priority {
            body["priority"] = json!(priority);
        }
        if let Some(category) = &ticket.category {
            body["category"] = json!(category);
        }
        self.api
            .post("/tickets", RequestOptions::new().body(body))
            .await
    }

    pub async fn update(&self, id: i64, update: &TicketUpdate) -> ApiResponse {
        self.api
            .put(
                &format!("/tickets/{}", segment(id)),
                RequestOptions::new().json(update),
            )
            .await
    }

    pub async fn update_status(&self, id: i64, status: TicketStatus) -> ApiResponse {
        let update = TicketUpdate {
            status: Some(status),
            ..TicketUpdate::default()
        };
        self.update(id, &update).await
    }

    pub async fn assign(&self, id: i64, user_id: i64) -> ApiResponse {
        let update = TicketUpdate {
            assigned_to: Some(user_id),
            ..TicketUpdate::default()
        };
        self.update(id, &update).await
    }

    /// `data.users`
    pub async fn assignable_users(&self) -> ApiResponse {
        self.api
            .get("/tickets/assignable-users", RequestOptions::new())
            .await
    }
}

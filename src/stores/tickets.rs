// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Support tickets store.

use serde::Serialize;
use tokio::sync::RwLock;

use crate::models::{
    AssignableUser, NewTicket, Ticket, TicketFilters, TicketPriority, TicketStatus, TicketView,
};
use crate::services::api::ApiError;
use crate::services::TicketsService;
use crate::stores::FetchGeneration;
use crate::time_utils::now_rfc3339;

/// Counters shown on the ticket dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub closed: usize,
    pub high_priority: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketsState {
    pub tickets: Vec<TicketView>,
    pub current_ticket: Option<TicketView>,
    pub assignable_users: Vec<AssignableUser>,
    pub filters: TicketFilters,
    pub loading: bool,
    pub error: Option<String>,
}

impl TicketsState {
    fn count(&self, status: TicketStatus) -> usize {
        self.tickets.iter().filter(|t| t.status == status).count()
    }

    pub fn open_count(&self) -> usize {
        self.count(TicketStatus::Open)
    }

    pub fn in_progress_count(&self) -> usize {
        self.count(TicketStatus::InProgress)
    }

    pub fn closed_count(&self) -> usize {
        self.count(TicketStatus::Closed)
    }

    pub fn high_priority_count(&self) -> usize {
        self.tickets
            .iter()
            .filter(|t| t.priority == TicketPriority::High)
            .count()
    }

    pub fn filtered_tickets(&self) -> Vec<&TicketView> {
        self.tickets
            .iter()
            .filter(|t| self.filters.matches(t))
            .collect()
    }

    pub fn stats(&self) -> TicketStats {
        TicketStats {
            total: self.tickets.len(),
            open: self.open_count(),
            in_progress: self.in_progress_count(),
            closed: self.closed_count(),
            high_priority: self.high_priority_count(),
        }
    }

    fn patch(&mut self, id: i64, f: impl Fn(&mut TicketView)) {
        if let Some(ticket) = self.tickets.iter_mut().find(|t| t.id == id) {
            f(ticket);
        }
        if let Some(ticket) = self.current_ticket.as_mut().filter(|t| t.id == id) {
            f(ticket);
        }
    }
}

pub struct TicketsStore {
    service: TicketsService,
    state: RwLock<TicketsState>,
    list_generation: FetchGeneration,
    detail_generation: FetchGeneration,
}

impl TicketsStore {
    pub fn new(service: TicketsService) -> Self {
        Self {
            service,
            state: RwLock::new(TicketsState::default()),
            list_generation: FetchGeneration::default(),
            detail_generation: FetchGeneration::default(),
        }
    }

    pub async fn snapshot(&self) -> TicketsState {
        self.state.read().await.clone()
    }

    /// Fetch tickets matching the current filters.
    pub async fn fetch_tickets(&self) -> Result<(), ApiError> {
        let generation = self.list_generation.begin();
        let filters = {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
            state.filters.clone()
        };

        let result = self
            .service
            .list(&filters)
            .await
            .extract::<Vec<Ticket>>("tickets");

        let mut state = self.state.write().await;
        if !self.list_generation.is_current(generation) {
            tracing::debug!(generation, "Discarding stale ticket list");
            return result.map(|_| ());
        }
        state.loading = false;
        match result {
            Ok(tickets) => {
                tracing::debug!(count = tickets.len(), "Fetched tickets");
                state.tickets = tickets.into_iter().map(TicketView::from).collect();
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Fetch one ticket as the current ticket, refreshing its list entry.
    pub async fn fetch_ticket(&self, id: i64) -> Result<TicketView, ApiError> {
        let generation = self.detail_generation.begin();
        let result = self
            .service
            .get(id)
            .await
            .extract::<Ticket>("ticket")
            .map(TicketView::from);

        let mut state = self.state.write().await;
        match result {
            Ok(view) => {
                if let Some(entry) = state.tickets.iter_mut().find(|t| t.id == id) {
                    *entry = view.clone();
                }
                if self.detail_generation.is_current(generation) {
                    state.current_ticket = Some(view.clone());
                }
                Ok(view)
            }
            Err(e) => {
                if self.detail_generation.is_current(generation) {
                    state.error = Some(e.message());
                }
                Err(e)
            }
        }
    }

    /// Create a ticket and put it at the head of the list.
    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketView, ApiError> {
        let response = self.service.create(ticket).await;
        let ticket_id = match response.extract::<i64>("ticket_id") {
            Ok(id) => id,
            Err(e) => {
                self.state.write().await.error = Some(e.message());
                return Err(e);
            }
        };

        let view = match self.service.get(ticket_id).await.extract::<Ticket>("ticket") {
            Ok(created) => TicketView::from(created),
            Err(e) => {
                tracing::warn!(ticket_id, error = %e, "Created ticket could not be fetched");
                let now = now_rfc3339();
                TicketView {
                    id: ticket_id,
                    title: ticket.title.clone(),
                    description: ticket.description.clone(),
                    status: TicketStatus::Open,
                    priority: ticket.priority.unwrap_or_default(),
                    category: ticket.category.clone(),
                    created_by: String::new(),
                    assigned_to: None,
                    assigned_to_id: None,
                    created_at: Some(now.clone()),
                    updated_at: Some(now),
                    resolved_at: None,
                }
            }
        };

        tracing::info!(ticket_id, "Created ticket");
        let mut state = self.state.write().await;
        state.tickets.insert(0, view.clone());
        state.error = None;
        Ok(view)
    }

    pub async fn update_ticket_status(
        &self,
        id: i64,
        status: TicketStatus,
    ) -> Result<(), ApiError> {
        let response = self.service.update_status(id, status).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone());
        }

        let now = now_rfc3339();
        state.patch(id, |ticket| {
            ticket.set_status(status, &now);
            ticket.updated_at = Some(now.clone());
        });
        state.error = None;
        tracing::info!(ticket_id = id, status = status.as_str(), "Updated ticket status");
        Ok(())
    }

    /// Assign a ticket, then refetch it for the assignee's name.
    pub async fn assign_ticket(&self, id: i64, user_id: i64) -> Result<TicketView, ApiError> {
        let response = self.service.assign(id, user_id).await;
        if let Some(err) = response.error() {
            self.state.write().await.error = Some(err.message());
            return Err(err.clone());
        }
        tracing::info!(ticket_id = id, user_id, "Assigned ticket");
        self.fetch_ticket(id).await
    }

    pub async fn fetch_assignable_users(&self) -> Result<Vec<AssignableUser>, ApiError> {
        let result = self
            .service
            .assignable_users()
            .await
            .extract::<Vec<AssignableUser>>("users");

        let mut state = self.state.write().await;
        match result {
            Ok(users) => {
                state.assignable_users = users.clone();
                Ok(users)
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn update_filters(&self, filters: TicketFilters) {
        self.state.write().await.filters = filters;
    }

    pub async fn clear_filters(&self) {
        self.state.write().await.filters = TicketFilters::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: i64, status: TicketStatus, priority: TicketPriority) -> TicketView {
        TicketView {
            id,
            title: format!("Ticket {id}"),
            description: String::new(),
            status,
            priority,
            category: None,
            created_by: "5".to_string(),
            assigned_to: None,
            assigned_to_id: if id % 2 == 0 { Some(11) } else { None },
            created_at: None,
            updated_at: None,
            resolved_at: None,
        }
    }

    fn state() -> TicketsState {
        TicketsState {
            tickets: vec![
                view(1, TicketStatus::Open, TicketPriority::High),
                view(2, TicketStatus::InProgress, TicketPriority::Low),
                view(3, TicketStatus::Closed, TicketPriority::High),
                view(4, TicketStatus::Open, TicketPriority::Medium),
            ],
            ..TicketsState::default()
        }
    }

    #[test]
    fn stats_count_statuses() {
        let stats = state().stats();
        assert_eq!(
            stats,
            TicketStats {
                total: 4,
                open: 2,
                in_progress: 1,
                closed: 1,
                high_priority: 2,
            }
        );
    }

    #[test]
    fn filters_apply_locally() {
        let mut state = state();
        state.filters = TicketFilters {
            status: Some(TicketStatus::Open),
            ..TicketFilters::default()
        };
        let ids: Vec<i64> = state.filtered_tickets().iter().map(|t| t.id).collect();
        assert_eq!(ids, [1, 4]);

        state.filters = TicketFilters {
            assigned_to: Some("11".to_string()),
            ..TicketFilters::default()
        };
        let ids: Vec<i64> = state.filtered_tickets().iter().map(|t| t.id).collect();
        assert_eq!(ids, [2, 4]);
    }

    #[test]
    fn patch_updates_list_and_current() {
        let mut state = state();
        state.current_ticket = Some(view(2, TicketStatus::InProgress, TicketPriority::Low));
        state.patch(2, |t| t.set_status(TicketStatus::Closed, "2024-06-01T00:00:00Z"));

        assert_eq!(state.tickets[1].status, TicketStatus::Closed);
        assert!(state.tickets[1].resolved_at.is_some());
        assert_eq!(
            state.current_ticket.as_ref().unwrap().status,
            TicketStatus::Closed
        );
    }
}

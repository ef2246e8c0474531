// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin store: system users and pending applicant reviews.

use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::models::{AdminStats, AdminUser, Caregiver, InterestGroupAdmin, ReviewDecision, Role, Status};
use crate::services::api::ApiError;
use crate::services::AdminService;
use crate::stores::FetchGeneration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilters {
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    pub status: Option<Status>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminState {
    pub users: Vec<AdminUser>,
    pub caregivers: Vec<Caregiver>,
    pub interest_group_admins: Vec<InterestGroupAdmin>,
    pub stats: AdminStats,
    pub filters: UserFilters,
    pub loading: bool,
    pub error: Option<String>,
}

impl AdminState {
    pub fn filtered_users(&self) -> Vec<&AdminUser> {
        let search = self
            .filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.users
            .iter()
            .filter(|u| {
                search.as_deref().is_none_or(|needle| {
                    u.full_name.to_lowercase().contains(needle)
                        || u.gmail_id.to_lowercase().contains(needle)
                })
            })
            .filter(|u| self.filters.status.as_ref().is_none_or(|s| &u.status == s))
            .filter(|u| self.filters.role.as_ref().is_none_or(|r| &u.role == r))
            .collect()
    }

    /// Caregivers ready for review.
    pub fn pending_caregivers(&self) -> Vec<&Caregiver> {
        self.caregivers
            .iter()
            .filter(|c| c.has_complete_profile())
            .collect()
    }

    pub fn pending_interest_group_admins(&self) -> Vec<&InterestGroupAdmin> {
        self.interest_group_admins
            .iter()
            .filter(|a| a.has_complete_profile())
            .collect()
    }

    pub fn users_by_role(&self) -> BTreeMap<&str, Vec<&AdminUser>> {
        let mut groups: BTreeMap<&str, Vec<&AdminUser>> = BTreeMap::new();
        for user in &self.users {
            groups.entry(user.role.as_str()).or_default().push(user);
        }
        groups
    }

    pub fn users_by_status(&self) -> BTreeMap<&str, Vec<&AdminUser>> {
        let mut groups: BTreeMap<&str, Vec<&AdminUser>> = BTreeMap::new();
        for user in &self.users {
            groups.entry(user.status.as_str()).or_default().push(user);
        }
        groups
    }
}

pub struct AdminStore {
    service: AdminService,
    state: RwLock<AdminState>,
    users_generation: FetchGeneration,
    caregivers_generation: FetchGeneration,
    igas_generation: FetchGeneration,
}

impl AdminStore {
    pub fn new(service: AdminService) -> Self {
        Self {
            service,
            state: RwLock::new(AdminState::default()),
            users_generation: FetchGeneration::default(),
            caregivers_generation: FetchGeneration::default(),
            igas_generation: FetchGeneration::default(),
        }
    }

    pub async fn snapshot(&self) -> AdminState {
        self.state.read().await.clone()
    }

    pub async fn fetch_users(&self) -> Result<(), ApiError> {
        let generation = self.users_generation.begin();
        let result = self.service.users().await.extract::<Vec<AdminUser>>("users");

        let mut state = self.state.write().await;
        if !self.users_generation.is_current(generation) {
            return result.map(|_| ());
        }
        match result {
            Ok(users) => {
                tracing::debug!(count = users.len(), "Fetched users");
                state.users = users;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        let response = self.service.delete_user(user_id).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone());
        }
        state.users.retain(|u| u.id != user_id);
        tracing::info!(user_id, "Deleted user");
        Ok(())
    }

    pub async fn fetch_caregivers(&self) -> Result<(), ApiError> {
        let generation = self.caregivers_generation.begin();
        let result = self
            .service
            .caregivers()
            .await
            .extract::<Vec<Caregiver>>("caregivers");

        let mut state = self.state.write().await;
        if !self.caregivers_generation.is_current(generation) {
            return result.map(|_| ());
        }
        match result {
            Ok(caregivers) => {
                state.caregivers = caregivers;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Approved caregivers leave the pending list.
    pub async fn verify_caregiver(&self, id: i64, decision: ReviewDecision) -> Result<(), ApiError> {
        let response = self.service.verify_caregiver(id, decision).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone());
        }
        if decision == ReviewDecision::Active {
            state.caregivers.retain(|c| c.id != id);
        }
        tracing::info!(caregiver_id = id, ?decision, "Reviewed caregiver");
        Ok(())
    }

    pub async fn fetch_interest_group_admins(&self) -> Result<(), ApiError> {
        let generation = self.igas_generation.begin();
        let result = self
            .service
            .interest_group_admins()
            .await
            .extract::<Vec<InterestGroupAdmin>>("interest_group_admins");

        let mut state = self.state.write().await;
        if !self.igas_generation.is_current(generation) {
            return result.map(|_| ());
        }
        match result {
            Ok(admins) => {
                state.interest_group_admins = admins;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn verify_interest_group_admin(
        &self,
        id: i64,
        decision: ReviewDecision,
    ) -> Result<(), ApiError> {
        let response = self.service.verify_interest_group_admin(id, decision).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone());
        }
        if decision == ReviewDecision::Active {
            state.interest_group_admins.retain(|a| a.id != id);
        }
        tracing::info!(iga_id = id, ?decision, "Reviewed interest group admin");
        Ok(())
    }

    /// Refresh all three collections concurrently and recompute the stats.
    pub async fn fetch_stats(&self) -> Result<AdminStats, ApiError> {
        self.state.write().await.loading = true;
        let (users, caregivers, igas) = tokio::join!(
            self.fetch_users(),
            self.fetch_caregivers(),
            self.fetch_interest_group_admins()
        );

        let mut state = self.state.write().await;
        state.loading = false;
        users?;
        caregivers?;
        igas?;

        state.stats =
            AdminStats::compute(&state.users, &state.caregivers, &state.interest_group_admins);
        state.error = None;
        Ok(state.stats)
    }

    pub async fn update_filters(&self, filters: UserFilters) {
        self.state.write().await.filters = filters;
    }

    pub async fn clear_filters(&self) {
        self.state.write().await.filters = UserFilters::default();
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }
}

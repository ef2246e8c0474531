// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interest groups store.

use tokio::sync::RwLock;
use validator::Validate;

use crate::models::interest_group::{Category, CATEGORIES};
use crate::models::{InterestGroup, InterestGroupInput};
use crate::services::api::ApiError;
use crate::services::InterestGroupsService;
use crate::stores::FetchGeneration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterestGroupError {
    /// Input rejected before any request was sent
    #[error("Invalid interest group: {0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterestGroupsState {
    pub groups: Vec<InterestGroup>,
    pub current_group: Option<InterestGroup>,
    pub loading: bool,
    pub error: Option<String>,
}

impl InterestGroupsState {
    pub fn by_category(&self, category: &str) -> Vec<&InterestGroup> {
        self.groups
            .iter()
            .filter(|g| g.category.as_deref() == Some(category))
            .collect()
    }
}

pub struct InterestGroupsStore {
    service: InterestGroupsService,
    state: RwLock<InterestGroupsState>,
    generation: FetchGeneration,
}

impl InterestGroupsStore {
    pub fn new(service: InterestGroupsService) -> Self {
        Self {
            service,
            state: RwLock::new(InterestGroupsState::default()),
            generation: FetchGeneration::default(),
        }
    }

    /// Categories offered when creating a group.
    pub fn categories(&self) -> &'static [Category] {
        CATEGORIES
    }

    pub async fn snapshot(&self) -> InterestGroupsState {
        self.state.read().await.clone()
    }

    pub async fn fetch_groups(&self, public: bool) -> Result<(), ApiError> {
        let generation = self.generation.begin();
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .service
            .list(public)
            .await
            .extract::<Vec<InterestGroup>>("interest_groups");

        let mut state = self.state.write().await;
        if !self.generation.is_current(generation) {
            return result.map(|_| ());
        }
        state.loading = false;
        match result {
            Ok(groups) => {
                tracing::debug!(count = groups.len(), public, "Fetched interest groups");
                state.groups = groups;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn fetch_group(&self, id: i64) -> Result<InterestGroup, ApiError> {
        let result = self
            .service
            .get(id)
            .await
            .extract::<InterestGroup>("interest_group");

        let mut state = self.state.write().await;
        match result {
            Ok(group) => {
                if let Some(entry) = state.groups.iter_mut().find(|g| g.id == id) {
                    *entry = group.clone();
                }
                state.current_group = Some(group.clone());
                Ok(group)
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Validate and create a group, returning its id.
    pub async fn create_group(&self, input: &InterestGroupInput) -> Result<i64, InterestGroupError> {
        self.validate(input).await?;

        let group_id = match self.service.create(input).await.extract::<i64>("group_id") {
            Ok(id) => id,
            Err(e) => {
                self.state.write().await.error = Some(e.message());
                return Err(e.into());
            }
        };
        tracing::info!(group_id, "Created interest group");

        match self.service.get(group_id).await.extract::<InterestGroup>("interest_group") {
            Ok(group) => {
                self.state.write().await.groups.push(group);
            }
            Err(e) => {
                tracing::warn!(group_id, error = %e, "Created group could not be fetched, reloading list");
                self.fetch_groups(false).await?;
            }
        }
        Ok(group_id)
    }

    pub async fn update_group(
        &self,
        id: i64,
        input: &InterestGroupInput,
    ) -> Result<(), InterestGroupError> {
        self.validate(input).await?;

        let response = self.service.update(id, input).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone().into());
        }

        let apply = |group: &mut InterestGroup| {
            group.title = input.title.clone();
            group.description = input.description.clone();
            group.whatsapp_link = input.whatsapp_link.clone();
            if input.category.is_some() {
                group.category = input.category.clone();
            }
            if input.status.is_some() {
                group.status = input.status.clone();
            }
            if input.timing.is_some() {
                group.timing = input.timing.clone();
            }
        };
        if let Some(group) = state.groups.iter_mut().find(|g| g.id == id) {
            apply(group);
        }
        if let Some(group) = state.current_group.as_mut().filter(|g| g.id == id) {
            apply(group);
        }
        state.error = None;
        tracing::info!(group_id = id, "Updated interest group");
        Ok(())
    }

    pub async fn delete_group(&self, id: i64) -> Result<(), ApiError> {
        let response = self.service.delete(id).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone());
        }
        state.groups.retain(|g| g.id != id);
        if state.current_group.as_ref().is_some_and(|g| g.id == id) {
            state.current_group = None;
        }
        tracing::info!(group_id = id, "Deleted interest group");
        Ok(())
    }

    async fn validate(&self, input: &InterestGroupInput) -> Result<(), InterestGroupError> {
        if let Err(e) = input.validate() {
            let message = e.to_string();
            self.state.write().await.error = Some(message.clone());
            return Err(InterestGroupError::Validation(message));
        }
        Ok(())
    }
}

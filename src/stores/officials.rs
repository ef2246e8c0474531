// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Government officials store.

use serde_json::Value;
use std::collections::BTreeSet;
use tokio::sync::RwLock;

use crate::models::Official;
use crate::services::api::ApiError;
use crate::services::OfficialsService;
use crate::stores::{merge_patch, FetchGeneration};
use crate::time_utils::now_rfc3339;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfficialFilters {
    /// Case-insensitive match on name, email or department
    pub search: Option<String>,
    pub status: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfficialsState {
    pub officials: Vec<Official>,
    pub filters: OfficialFilters,
    pub loading: bool,
    pub error: Option<String>,
}

impl OfficialsState {
    pub fn filtered_officials(&self) -> Vec<&Official> {
        let search = self
            .filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.officials
            .iter()
            .filter(|o| {
                search.as_deref().is_none_or(|needle| {
                    o.name.to_lowercase().contains(needle)
                        || o.email.to_lowercase().contains(needle)
                        || o.department
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(needle))
                })
            })
            .filter(|o| {
                self.filters
                    .status
                    .as_deref()
                    .is_none_or(|s| o.status.as_deref() == Some(s))
            })
            .filter(|o| {
                self.filters
                    .department
                    .as_deref()
                    .is_none_or(|d| o.department.as_deref() == Some(d))
            })
            .collect()
    }

    pub fn total(&self) -> usize {
        self.officials.len()
    }

    pub fn active_count(&self) -> usize {
        self.officials
            .iter()
            .filter(|o| o.status.as_deref() == Some("active"))
            .count()
    }

    /// Distinct departments, sorted.
    pub fn departments(&self) -> Vec<String> {
        self.officials
            .iter()
            .filter_map(|o| o.department.clone())
            .filter(|d| !d.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

pub struct OfficialsStore {
    service: OfficialsService,
    state: RwLock<OfficialsState>,
    generation: FetchGeneration,
}

impl OfficialsStore {
    pub fn new(service: OfficialsService) -> Self {
        Self {
            service,
            state: RwLock::new(OfficialsState::default()),
            generation: FetchGeneration::default(),
        }
    }

    pub async fn snapshot(&self) -> OfficialsState {
        self.state.read().await.clone()
    }

    pub async fn fetch_officials(&self) -> Result<(), ApiError> {
        let generation = self.generation.begin();
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .service
            .list()
            .await
            .extract::<Vec<Official>>("officials");

        let mut state = self.state.write().await;
        if !self.generation.is_current(generation) {
            return result.map(|_| ());
        }
        state.loading = false;
        match result {
            Ok(officials) => {
                tracing::debug!(count = officials.len(), "Fetched officials");
                state.officials = officials;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Create an official from arbitrary fields and append it.
    pub async fn add_official(&self, official: Value) -> Result<Official, ApiError> {
        let result = self
            .service
            .create(official)
            .await
            .extract::<Official>("official");

        let mut state = self.state.write().await;
        match result {
            Ok(created) => {
                tracing::info!(official_id = created.id, "Added official");
                state.officials.push(created.clone());
                state.error = None;
                Ok(created)
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Send `patch` and merge it into the local record.
    pub async fn update_official(&self, id: i64, patch: Value) -> Result<(), ApiError> {
        let response = self.service.update(id, patch.clone()).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone());
        }

        let merged = match state.officials.iter().position(|o| o.id == id) {
            Some(index) => merge_patch(&state.officials[index], &patch).map(|m| Some((index, m))),
            None => Ok(None),
        };
        match merged {
            Ok(merged) => {
                if let Some((index, mut official)) = merged {
                    official
                        .extra
                        .insert("updated_at".to_string(), Value::String(now_rfc3339()));
                    state.officials[index] = official;
                }
                state.error = None;
                tracing::info!(official_id = id, "Updated official");
                Ok(())
            }
            Err(e) => {
                // The backend already applied the update, so reload.
                tracing::warn!(
                    official_id = id,
                    error = %e,
                    "Cannot merge official update locally, refetching"
                );
                state.error = Some(e.message());
                drop(state);
                self.fetch_officials().await
            }
        }
    }

    pub async fn delete_official(&self, id: i64) -> Result<(), ApiError> {
        let response = self.service.delete(id).await;
        let mut state = self.state.write().await;
        if let Some(err) = response.error() {
            state.error = Some(err.message());
            return Err(err.clone());
        }
        state.officials.retain(|o| o.id != id);
        state.error = None;
        tracing::info!(official_id = id, "Deleted official");
        Ok(())
    }

    pub async fn update_filters(&self, filters: OfficialFilters) {
        self.state.write().await.filters = filters;
    }

    pub async fn clear_filters(&self) {
        self.state.write().await.filters = OfficialFilters::default();
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }
}

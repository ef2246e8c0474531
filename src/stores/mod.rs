// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resource stores mirroring backend collections.
//!
//! Each store owns its state behind an async lock and mutates it only
//! after the backend confirms a change. Overlapping fetches are sequenced
//! with a [`FetchGeneration`]: a response is applied only if no newer
//! fetch of the same collection has started since.

pub mod admin;
pub mod interest_groups;
pub mod notifications;
pub mod officials;
pub mod tickets;

pub use admin::{AdminState, AdminStore, UserFilters};
pub use interest_groups::{InterestGroupError, InterestGroupsState, InterestGroupsStore};
pub use notifications::{NotificationsState, NotificationsStore};
pub use officials::{OfficialFilters, OfficialsState, OfficialsStore};
pub use tickets::{TicketStats, TicketsState, TicketsStore};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::services::api::ApiError;

/// Monotonic request-generation counter for one collection.
#[derive(Debug, Default)]
pub struct FetchGeneration(AtomicU64);

impl FetchGeneration {
    /// Start a fetch; returns its generation.
    pub fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `generation` is still the latest fetch.
    pub fn is_current(&self, generation: u64) -> bool {
        self.0.load(Ordering::SeqCst) == generation
    }
}

/// Shallow-merge the object `patch` into `record`.
pub fn merge_patch<T: Serialize + DeserializeOwned>(record: &T, patch: &Value) -> Result<T, ApiError> {
    let mut value =
        serde_json::to_value(record).map_err(|e| ApiError::Unexpected(e.to_string()))?;
    if let (Value::Object(target), Value::Object(fields)) = (&mut value, patch) {
        for (key, field) in fields {
            target.insert(key.clone(), field.clone());
        }
    }
    serde_json::from_value(value).map_err(|e| ApiError::Unexpected(e.to_string()))
}

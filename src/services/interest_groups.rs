// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Interest group endpoints.

use crate::models::InterestGroupInput;
use crate::services::api::{segment, ApiClient, ApiResponse, RequestOptions};

#[derive(Clone)]
pub struct InterestGroupsService {
    api: ApiClient,
}

impl InterestGroupsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `data.interest_groups`; `public` selects the unauthenticated listing.
    pub async fn list(&self, public: bool) -> ApiResponse {
        let endpoint = if public {
            "/interest-groups/public"
        } else {
            "/interest-groups"
        };
        self.api.get(endpoint, RequestOptions::new()).await
    }

    /// `data.interest_group`
    pub async fn get(&self, id: i64) -> ApiResponse {
        self.api
            .get(&format!("/interest-groups/{}", segment(id)), RequestOptions::new())
            .await
    }

    /// `data.group_id`
    pub async fn create(&self, input: &InterestGroupInput) -> ApiResponse {
        self.api
            .post("/interest-groups", RequestOptions::new().json(input))
            .await
    }

    pub async fn update(&self, id: i64, input: &InterestGroupInput) -> ApiResponse {
        self.api
            .put(
                &format!("/interest-groups/{}", segment(id)),
                RequestOptions::new().json(input),
            )
            .await
    }

    pub async fn delete(&self, id: i64) -> ApiResponse {
        self.api
            .delete(&format!("/interest-groups/{}", segment(id)), RequestOptions::new())
            .await
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin endpoints: users, caregiver and interest group admin review.

use serde_json::json;

use crate::models::ReviewDecision;
use crate::services::api::{segment, ApiClient, ApiResponse, RequestOptions};

#[derive(Clone)]
pub struct AdminService {
    api: ApiClient,
}

impl AdminService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `data.users`
    pub async fn users(&self) -> ApiResponse {
        self.api.get("/admin/users", RequestOptions::new()).await
    }

    pub async fn delete_user(&self, user_id: i64) -> ApiResponse {
        let token = self.api.current_token().await;
        self.api
            .delete(
                &format!("/admin/users/{}", segment(user_id)),
                RequestOptions::new().body(json!({ "id_token": token })),
            )
            .await
    }

    /// `data.caregivers`
    pub async fn caregivers(&self) -> ApiResponse {
        self.api.get("/admin/caregivers", RequestOptions::new()).await
    }

    pub async fn verify_caregiver(&self, id: i64, decision: ReviewDecision) -> ApiResponse {
        self.verify("/admin/caregivers", id, decision).await
    }

    /// `data.interest_group_admins`
    pub async fn interest_group_admins(&self) -> ApiResponse {
        self.api
            .get("/admin/interest-group-admins", RequestOptions::new())
            .await
    }

    pub async fn verify_interest_group_admin(
        &self,
        id: i64,
        decision: ReviewDecision,
    ) -> ApiResponse {
        self.verify("/admin/interest-group-admins", id, decision)
            .await
    }

    async fn verify(&self, collection: &str, id: i64, decision: ReviewDecision) -> ApiResponse {
        let token = self.api.current_token().await;
        self.api
            .post(
                &format!("{collection}/{}/verify", segment(id)),
                RequestOptions::new().body(json!({
                    "id_token": token,
                    "status": decision,
                })),
            )
            .await
    }
}

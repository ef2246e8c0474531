// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification endpoints.

use serde_json::json;

use crate::models::NotificationId;
use crate::services::api::{segment, ApiClient, ApiResponse, RequestOptions};

#[derive(Clone)]
pub struct NotificationsService {
    api: ApiClient,
}

impl NotificationsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `data.notifications`
    pub async fn list(&self) -> ApiResponse {
        self.api.get("/notifications", RequestOptions::new()).await
    }

    pub async fn mark_as_read(&self, id: &NotificationId) -> ApiResponse {
        let token = self.api.current_token().await;
        self.api
            .post(
                &format!("/notifications/{}/read", segment(id)),
                RequestOptions::new().body(json!({ "id_token": token })),
            )
            .await
    }

    pub async fn delete(&self, id: &NotificationId) -> ApiResponse {
        self.api
            .delete(
                &format!("/notifications/{}", segment(id)),
                RequestOptions::new(),
            )
            .await
    }
}

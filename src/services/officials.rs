//! Government officials endpoints under `/admin/officials`.

use serde_json::Value;

use crate::services::api::{segment, ApiClient, ApiResponse, RequestOptions};

const OFFICIALS: &str = "/admin/officials";

#[derive(Clone)]
pub struct OfficialsService {
    api: ApiClient,
}

impl OfficialsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `data.officials`
    pub async fn list(&self) -> ApiResponse {
        self.api.get(OFFICIALS, RequestOptions::new()).await
    }

    /// `data.official`
    pub async fn get(&self, id: i64) -> ApiResponse {
        self.api
            .get(&format!("{OFFICIALS}/{}", segment(id)), RequestOptions::new())
            .await
    }

    /// `data.official`
    pub async fn create(&self, official: Value) -> ApiResponse {
        self.api
            .post(OFFICIALS, RequestOptions::new().body(official))
            .await
    }

    pub async fn update(&self, id: i64, patch: Value) -> ApiResponse {
        self.api
            .put(
                &format!("{OFFICIALS}/{}", segment(id)),
                RequestOptions::new().body(patch),
            )
            .await
    }

    pub async fn delete(&self, id: i64) -> ApiResponse {
        self.api
            .delete(&format!("{OFFICIALS}/{}", segment(id)), RequestOptions::new())
            .await
    }
}

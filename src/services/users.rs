// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication and profile endpoints.

use serde::Serialize;
use serde_json::json;
use validator::{Validate, ValidationError};

use crate::models::Role;
use crate::services::api::{ApiClient, ApiResponse, RequestOptions};

/// Registration form for a new account.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Registration {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub role: Role,
    #[validate(custom(function = "validate_date_of_birth"))]
    pub date_of_birth: Option<String>,
    pub youtube_url: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize)]
struct RegistrationBody<'a> {
    id_token: &'a str,
    full_name: &'a str,
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_of_birth: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    youtube_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a str>,
}

impl Registration {
    /// Profile fields are only sent for roles that have a public profile.
    fn body<'a>(&'a self, id_token: &'a str) -> RegistrationBody<'a> {
        let with_profile = matches!(self.role, Role::Caregiver | Role::InterestGroupAdmin);
        let profile = |field: &'a Option<String>| {
            field
                .as_deref()
                .filter(|v| with_profile && !v.trim().is_empty())
        };

        RegistrationBody {
            id_token,
            full_name: &self.full_name,
            role: self.role.as_str(),
            date_of_birth: self.date_of_birth.as_deref(),
            youtube_url: profile(&self.youtube_url),
            description: profile(&self.description),
            tags: profile(&self.tags),
        }
    }
}

fn validate_date_of_birth(raw: &str) -> Result<(), ValidationError> {
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| {
            let mut err = ValidationError::new("date_of_birth");
            err.message = Some("Date of birth must be YYYY-MM-DD".into());
            err
        })
}

/// Wrapper for `/auth` and `/user`.
#[derive(Clone)]
pub struct UsersService {
    api: ApiClient,
}

impl UsersService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// 200 with `data.user` for a known account, 201 with `data.user_info`
    /// for one that still has to register.
    pub async fn verify_token(&self, id_token: &str) -> ApiResponse {
        self.api
            .post(
                "/auth/verify-token",
                RequestOptions::new().body(json!({ "id_token": id_token })),
            )
            .await
    }

    pub async fn register(&self, id_token: &str, registration: &Registration) -> ApiResponse {
        self.api
            .post(
                "/auth/register",
                RequestOptions::new().json(&registration.body(id_token)),
            )
            .await
    }

    pub async fn refresh_profile(&self, id_token: &str) -> ApiResponse {
        self.api
            .post(
                "/user/profile",
                RequestOptions::new().body(json!({ "id_token": id_token })),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(role: Role) -> Registration {
        Registration {
            full_name: "Asha Rao".to_string(),
            role,
            date_of_birth: Some("1960-04-12".to_string()),
            youtube_url: Some("https://youtu.be/abc".to_string()),
            description: Some("Retired teacher".to_string()),
            tags: None,
        }
    }

    #[test]
    fn profile_fields_only_for_profile_roles() {
        let caregiver = registration(Role::Caregiver);
        let body = serde_json::to_value(caregiver.body("tok")).unwrap();
        assert_eq!(body["youtube_url"], "https://youtu.be/abc");
        assert_eq!(body["role"], "caregiver");
        assert!(body.get("tags").is_none());

        let family = registration(Role::FamilyMember);
        let body = serde_json::to_value(family.body("tok")).unwrap();
        assert!(body.get("youtube_url").is_none());
        assert_eq!(body["date_of_birth"], "1960-04-12");
    }

    #[test]
    fn validates_date_of_birth() {
        let mut reg = registration(Role::SeniorCitizen);
        assert!(reg.validate().is_ok());

        reg.date_of_birth = Some("12/04/1960".to_string());
        assert!(reg.validate().is_err());

        reg.date_of_birth = None;
        assert!(reg.validate().is_ok());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Records served by the `/admin` endpoints.

use serde::{Deserialize, Serialize};

use crate::models::{Role, Status};

/// System user as listed by `/admin/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    #[serde(default)]
    pub gmail_id: String,
    #[serde(default)]
    pub full_name: String,
    pub role: Role,
    pub status: Status,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Applicant awaiting review (caregiver or interest group admin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub gmail_id: String,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Applicant {
    /// Whether the applicant submitted everything a review needs.
    pub fn has_complete_profile(&self) -> bool {
        [&self.youtube_url, &self.description, &self.tags]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

pub type Caregiver = Applicant;
pub type InterestGroupAdmin = Applicant;

/// Review decision sent to the `/verify` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Active,
    Blocked,
}

/// Dashboard counters computed from the admin collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: usize,
    pub active_users: usize,
    pub pending_users: usize,
    pub blocked_users: usize,
    pub pending_caregivers: usize,
    pub total_caregivers: usize,
    pub pending_interest_group_admins: usize,
    pub total_interest_group_admins: usize,
    pub admin_users: usize,
    pub support_users: usize,
    pub iga_users: usize,
}

impl AdminStats {
    /// The caregiver and IGA listings only contain pending applicants, so
    /// their totals equal their pending counts.
    pub fn compute(
        users: &[AdminUser],
        caregivers: &[Caregiver],
        interest_group_admins: &[InterestGroupAdmin],
    ) -> Self {
        let with_status = |s: Status| users.iter().filter(|u| u.status == s).count();
        let with_role = |r: Role| users.iter().filter(|u| u.role == r).count();

        Self {
            total_users: users.len(),
            active_users: with_status(Status::Active),
            pending_users: with_status(Status::PendingApproval),
            blocked_users: with_status(Status::Blocked),
            pending_caregivers: caregivers.len(),
            total_caregivers: caregivers.len(),
            pending_interest_group_admins: interest_group_admins.len(),
            total_interest_group_admins: interest_group_admins.len(),
            admin_users: with_role(Role::Admin),
            support_users: with_role(Role::SupportUser),
            iga_users: with_role(Role::InterestGroupAdmin),
        }
    }
}

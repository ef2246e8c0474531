//! User record, roles and account status.
//!
//! Role and status branching lives here and nowhere else: the guard, the
//! session and permission checks all consult [`Role::home_route`],
//! [`Status::gate`] and [`Role::permissions`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Route a session without a role is sent to.
pub const ROLE_SELECTION_ROUTE: &str = "/role-selection";

/// Backend user role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    SupportUser,
    InterestGroupAdmin,
    Caregiver,
    FamilyMember,
    SeniorCitizen,
    /// Role string the client does not know about
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::SupportUser => "support_user",
            Role::InterestGroupAdmin => "interest_group_admin",
            Role::Caregiver => "caregiver",
            Role::FamilyMember => "family_member",
            Role::SeniorCitizen => "senior_citizen",
            Role::Other(raw) => raw,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            Role::Admin => "Admin",
            Role::SupportUser => "Support User",
            Role::InterestGroupAdmin => "Interest Group Admin",
            Role::Caregiver => "Caregiver",
            Role::FamilyMember => "Family Member",
            Role::SeniorCitizen => "Senior Citizen",
            Role::Other(raw) => raw,
        }
    }

    /// Landing route for a signed-in user with this role.
    pub fn home_route(&self) -> &'static str {
        match self {
            Role::Admin => "/dashboard",
            Role::SupportUser => "/support/dashboard",
            Role::InterestGroupAdmin => "/iga/dashboard",
            _ => ROLE_SELECTION_ROUTE,
        }
    }

    pub fn permissions(&self) -> Permissions {
        match self {
            Role::Admin => Permissions {
                can_manage_officials: true,
                can_view_all_tickets: true,
                can_manage_notifications: true,
                can_approve_caregivers: true,
                can_manage_iga: true,
                can_view_dashboard: true,
            },
            Role::SupportUser => Permissions {
                can_view_all_tickets: true,
                can_view_dashboard: true,
                ..Permissions::default()
            },
            Role::InterestGroupAdmin => Permissions {
                can_manage_iga: true,
                can_view_dashboard: true,
                ..Permissions::default()
            },
            _ => Permissions::default(),
        }
    }
}

/// Home route for an optional role (no role → role selection).
pub fn home_route_for(role: Option<&Role>) -> &'static str {
    role.map(Role::home_route).unwrap_or(ROLE_SELECTION_ROUTE)
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "support_user" => Role::SupportUser,
            "interest_group_admin" => Role::InterestGroupAdmin,
            "caregiver" => Role::Caregiver,
            "family_member" => Role::FamilyMember,
            "senior_citizen" => Role::SeniorCitizen,
            _ => Role::Other(raw),
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Role::from(raw.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status as reported by the backend.
///
/// Parsing is case-insensitive; the canned test users report `ACTIVE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Active,
    PendingApproval,
    Blocked,
    Unregistered,
    Unknown(String),
}

/// Outcome of checking a status before granting access to a role-gated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGate {
    Allowed,
    Blocked,
    Invalid,
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Active => "active",
            Status::PendingApproval => "pending_approval",
            Status::Blocked => "blocked",
            Status::Unregistered => "unregistered",
            Status::Unknown(raw) => raw,
        }
    }

    /// Whether a session with this status counts as authenticated.
    pub fn grants_access(&self) -> bool {
        matches!(self, Status::Active | Status::PendingApproval)
    }

    pub fn gate(status: Option<&Status>) -> StatusGate {
        match status {
            Some(Status::Blocked) => StatusGate::Blocked,
            Some(s) if s.grants_access() => StatusGate::Allowed,
            _ => StatusGate::Invalid,
        }
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Status::Active,
            "pending_approval" => Status::PendingApproval,
            "blocked" => Status::Blocked,
            "unregistered" => Status::Unregistered,
            _ => Status::Unknown(raw),
        }
    }
}

impl From<&str> for Status {
    fn from(raw: &str) -> Self {
        Status::from(raw.to_string())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature permissions derived from a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub can_manage_officials: bool,
    pub can_view_all_tickets: bool,
    pub can_manage_notifications: bool,
    pub can_approve_caregivers: bool,
    pub can_manage_iga: bool,
    pub can_view_dashboard: bool,
}

/// Backend user record, owned by the session once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub full_name: String,
    /// Google account email
    #[serde(default, alias = "email")]
    pub gmail_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firebase_uid: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl UserRecord {
    pub fn grants_access(&self) -> bool {
        self.status.as_ref().is_some_and(Status::grants_access)
    }

    pub fn home_route(&self) -> &'static str {
        home_route_for(self.role.as_ref())
    }

    /// Apply a local profile edit.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.full_name {
            self.full_name = name.clone();
        }
        if let Some(dob) = &update.date_of_birth {
            self.date_of_birth = Some(dob.clone());
        }
        if let Some(url) = &update.youtube_url {
            self.youtube_url = Some(url.clone());
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(tags) = &update.tags {
            self.tags = Some(tags.clone());
        }
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub youtube_url: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

/// Identity of a not-yet-registered user, pre-filled into registration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistrationPrefill {
    #[serde(default)]
    pub gmail_id: String,
    #[serde(default)]
    pub firebase_uid: String,
    #[serde(default)]
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(Status::from("ACTIVE"), Status::Active);
        assert_eq!(Status::from("Pending_Approval"), Status::PendingApproval);
        assert_eq!(
            Status::from("suspended"),
            Status::Unknown("suspended".to_string())
        );
    }

    #[test]
    fn status_gate_table() {
        assert_eq!(Status::gate(Some(&Status::Active)), StatusGate::Allowed);
        assert_eq!(
            Status::gate(Some(&Status::PendingApproval)),
            StatusGate::Allowed
        );
        assert_eq!(Status::gate(Some(&Status::Blocked)), StatusGate::Blocked);
        assert_eq!(
            Status::gate(Some(&Status::Unregistered)),
            StatusGate::Invalid
        );
        assert_eq!(Status::gate(None), StatusGate::Invalid);
    }

    #[test]
    fn role_home_routes() {
        assert_eq!(Role::Admin.home_route(), "/dashboard");
        assert_eq!(Role::SupportUser.home_route(), "/support/dashboard");
        assert_eq!(Role::InterestGroupAdmin.home_route(), "/iga/dashboard");
        assert_eq!(Role::Caregiver.home_route(), ROLE_SELECTION_ROUTE);
        assert_eq!(home_route_for(None), ROLE_SELECTION_ROUTE);
    }

    #[test]
    fn support_permissions() {
        let perms = Role::SupportUser.permissions();
        assert!(perms.can_view_all_tickets);
        assert!(!perms.can_manage_officials);
        assert!(!Role::FamilyMember.permissions().can_view_dashboard);
    }

    #[test]
    fn user_record_roundtrips_backend_spelling() {
        let json = serde_json::json!({
            "id": 1,
            "full_name": "Test Admin One",
            "gmail_id": "admin1@test.com",
            "role": "admin",
            "status": "ACTIVE"
        });
        let user: UserRecord = serde_json::from_value(json).unwrap();
        assert_eq!(user.role, Some(Role::Admin));
        assert_eq!(user.status, Some(Status::Active));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["role"], "admin");
        assert_eq!(back["status"], "active");
    }
}

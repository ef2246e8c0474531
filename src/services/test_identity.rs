//! Canned identities for development and test mode.
//!
//! Each fixed bearer token maps to a user the backend's test mode also
//! knows about. The token doubles as the identity token, so no provider
//! is contacted.

use async_trait::async_trait;

use crate::models::{Role, Status, UserRecord};
use crate::services::identity::{IdentityError, IdentityProvider, IdentityUser, SignInResult};
use crate::storage::{keys, KeyValueStore};

const TEST_USER_CREATED_AT: &str = "2024-01-01T00:00:00Z";

/// A canned test account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    pub token: &'static str,
    pub email: &'static str,
    pub full_name: &'static str,
    pub firebase_uid: &'static str,
    pub role: Option<&'static str>,
    pub status: &'static str,
    pub id: Option<i64>,
    pub date_of_birth: Option<&'static str>,
}

impl TestUser {
    pub fn identity_user(&self) -> IdentityUser {
        IdentityUser {
            uid: self.firebase_uid.to_string(),
            email: Some(self.email.to_string()),
            display_name: Some(self.full_name.to_string()),
            photo_url: None,
        }
    }

    /// The record the backend keeps for this account.
    pub fn user_record(&self) -> UserRecord {
        UserRecord {
            id: self.id,
            full_name: self.full_name.to_string(),
            gmail_id: Some(self.email.to_string()),
            firebase_uid: Some(self.firebase_uid.to_string()),
            role: self.role.map(Role::from),
            status: Some(Status::from(self.status)),
            date_of_birth: self.date_of_birth.map(str::to_string),
            youtube_url: None,
            description: None,
            tags: None,
            created_at: self.id.map(|_| TEST_USER_CREATED_AT.to_string()),
            updated_at: None,
        }
    }
}

macro_rules! test_user {
    ($token:literal, $email:literal, $name:literal, $uid:literal, $role:expr, $status:literal, $id:expr, $dob:expr) => {
        TestUser {
            token: $token,
            email: $email,
            full_name: $name,
            firebase_uid: $uid,
            role: $role,
            status: $status,
            id: $id,
            date_of_birth: $dob,
        }
    };
}

pub const TEST_USERS: &[TestUser] = &[
    test_user!("test_admin_token_001", "admin1@test.com", "Test Admin One", "test_admin_uid_001", Some("admin"), "ACTIVE", Some(1), Some("1980-01-01")),
    test_user!("test_admin_token_002", "admin2@test.com", "Test Admin Two", "test_admin_uid_002", Some("admin"), "ACTIVE", Some(2), Some("1981-01-01")),
    test_user!("test_caregiver_token_001", "caregiver1@test.com", "Test Caregiver One", "test_caregiver_uid_001", Some("caregiver"), "ACTIVE", Some(3), Some("1985-01-01")),
    test_user!("test_caregiver_token_002", "caregiver2@test.com", "Test Caregiver Two", "test_caregiver_uid_002", Some("caregiver"), "PENDING_APPROVAL", Some(4), Some("1986-01-01")),
    test_user!("test_family_token_001", "family1@test.com", "Test Family Member One", "test_family_uid_001", Some("family_member"), "ACTIVE", Some(5), Some("1990-01-01")),
    test_user!("test_family_token_002", "family2@test.com", "Test Family Member Two", "test_family_uid_002", Some("family_member"), "ACTIVE", Some(6), Some("1991-01-01")),
    test_user!("test_senior_token_001", "senior1@test.com", "Test Senior Citizen One", "test_senior_uid_001", Some("senior_citizen"), "ACTIVE", Some(7), Some("1950-01-01")),
    test_user!("test_senior_token_002", "senior2@test.com", "Test Senior Citizen Two", "test_senior_uid_002", Some("senior_citizen"), "ACTIVE", Some(8), Some("1951-01-01")),
    test_user!("test_groupadmin_token_001", "groupadmin1@test.com", "Test Group Admin One", "test_groupadmin_uid_001", Some("interest_group_admin"), "ACTIVE", Some(9), Some("1975-01-01")),
    test_user!("test_groupadmin_token_002", "groupadmin2@test.com", "Test Group Admin Two", "test_groupadmin_uid_002", Some("interest_group_admin"), "PENDING_APPROVAL", Some(10), Some("1976-01-01")),
    test_user!("test_support_token_001", "support1@test.com", "Test Support User One", "test_support_uid_001", Some("support_user"), "ACTIVE", Some(11), Some("1988-01-01")),
    test_user!("test_support_token_002", "support2@test.com", "Test Support User Two", "test_support_uid_002", Some("support_user"), "ACTIVE", Some(12), Some("1989-01-01")),
    test_user!("test_unregistered_token_001", "unregistered1@test.com", "Test Unregistered User One", "test_unregistered_uid_001", None, "UNREGISTERED", None, None),
    test_user!("test_unregistered_token_002", "unregistered2@test.com", "Test Unregistered User Two", "test_unregistered_uid_002", None, "UNREGISTERED", None, None),
];

/// Display order of the role groups, with labels.
const ROLE_GROUPS: &[(&str, &str)] = &[
    ("admin", "Admin"),
    ("support_user", "Support User"),
    ("interest_group_admin", "Interest Group Admin"),
    ("caregiver", "Caregiver"),
    ("family_member", "Family Member"),
    ("senior_citizen", "Senior Citizen"),
    ("unregistered", "Unregistered"),
];

pub fn find_test_user(token: &str) -> Option<&'static TestUser> {
    TEST_USERS.iter().find(|u| u.token == token)
}

/// Test users of one role, for a user picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUserGroup {
    pub role: &'static str,
    pub label: &'static str,
    pub users: Vec<&'static TestUser>,
}

pub fn test_users_by_role() -> Vec<TestUserGroup> {
    ROLE_GROUPS
        .iter()
        .map(|&(role, label)| TestUserGroup {
            role,
            label,
            users: TEST_USERS
                .iter()
                .filter(|u| u.role.unwrap_or("unregistered") == role)
                .collect(),
        })
        .filter(|group| !group.users.is_empty())
        .collect()
}

/// Identity adapter backed by the canned test users.
///
/// The selected token lives in durable storage under `testToken`.
pub struct TestIdentity {
    storage: KeyValueStore,
}

impl TestIdentity {
    pub fn new(storage: KeyValueStore) -> Self {
        Self { storage }
    }

    /// Sign in as the test user owning `token`.
    pub fn sign_in_with_token(&self, token: &str) -> Result<SignInResult, IdentityError> {
        let user = find_test_user(token).ok_or(IdentityError::InvalidTestToken)?;
        tracing::info!(uid = user.firebase_uid, "Signed in with test identity");
        Ok(SignInResult {
            user: user.identity_user(),
            id_token: user.token.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for TestIdentity {
    async fn sign_in(&self) -> Result<SignInResult, IdentityError> {
        let token = self
            .storage
            .get(keys::TEST_TOKEN)
            .ok_or(IdentityError::InvalidTestToken)?;
        self.sign_in_with_token(&token)
    }

    async fn current_id_token(&self) -> Option<String> {
        self.storage.get(keys::TEST_TOKEN)
    }

    async fn current_user(&self) -> Option<IdentityUser> {
        let token = self.storage.get(keys::TEST_TOKEN)?;
        find_test_user(&token).map(TestUser::identity_user)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state machine.
//!
//! ```text
//! Anonymous ──sign-in──▶ PendingBackendVerification ──200──▶ Authenticated
//!                                   │
//!                                   └──201──▶ NewUnregistered ──register──▶ Authenticated
//! Authenticated ──logout / blocked or invalid status──▶ Anonymous
//! ```
//!
//! The authenticated user record is mirrored into durable storage so a
//! restart can restore it without contacting the identity provider.

use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;

use crate::models::{
    home_route_for, Permissions, ProfileUpdate, RegistrationPrefill, Role, Status, StatusGate,
    UserRecord,
};
use crate::services::api::{ApiError, ApiResponse};
use crate::services::identity::{IdentityError, IdentityProvider, IdentityUser, SignInResult};
use crate::services::test_identity::find_test_user;
use crate::services::users::{Registration, UsersService};
use crate::storage::{keys, KeyValueStore, StorageError};

/// Route a new user is sent to after sign-in.
pub const REGISTER_ROUTE: &str = "/register";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Anonymous,
    PendingBackendVerification,
    NewUnregistered(RegistrationPrefill),
    Authenticated(UserRecord),
}

/// Session failures surfaced to callers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{context} (unexpected status {status})")]
    UnexpectedStatus { status: u16, context: &'static str },

    #[error("Test mode is not enabled")]
    TestModeDisabled,

    #[error("No user session found")]
    NotSignedIn,

    #[error("No registration in progress")]
    NotRegistering,

    #[error("Invalid registration: {0}")]
    Validation(String),

    #[error("Failed to save session: {0}")]
    Storage(String),
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::Storage(err.to_string())
    }
}

/// Result of a sign-in attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SignInOutcome {
    ExistingUser {
        user: UserRecord,
        redirect_to: &'static str,
    },
    NewUser {
        prefill: RegistrationPrefill,
        redirect_to: &'static str,
    },
    Failed(SessionError),
}

impl SignInOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, SignInOutcome::Failed(_))
    }
}

/// Point-in-time copy of the session; every derived getter lives here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub identity_user: Option<IdentityUser>,
    pub is_authenticated: bool,
}

impl SessionView {
    pub fn user(&self) -> Option<&UserRecord> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<&Role> {
        self.user().and_then(|u| u.role.as_ref())
    }

    pub fn status(&self) -> Option<&Status> {
        self.user().and_then(|u| u.status.as_ref())
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user().and_then(|u| u.id)
    }

    /// Full name from the backend record, else the provider display name.
    pub fn user_name(&self) -> Option<&str> {
        self.user()
            .map(|u| u.full_name.as_str())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                self.identity_user
                    .as_ref()
                    .and_then(|u| u.display_name.as_deref())
            })
    }

    pub fn user_email(&self) -> Option<&str> {
        self.user()
            .and_then(|u| u.gmail_id.as_deref())
            .or_else(|| self.identity_user.as_ref().and_then(|u| u.email.as_deref()))
    }

    pub fn is_new_user(&self) -> bool {
        matches!(self.state, SessionState::NewUnregistered(_))
    }

    pub fn can_access(&self) -> bool {
        Status::gate(self.status()) == StatusGate::Allowed
    }

    pub fn is_blocked(&self) -> bool {
        self.status() == Some(&Status::Blocked)
    }

    pub fn is_pending_approval(&self) -> bool {
        self.status() == Some(&Status::PendingApproval)
    }

    pub fn permissions(&self) -> Permissions {
        self.role().map(Role::permissions).unwrap_or_default()
    }

    pub fn home_route(&self) -> &'static str {
        home_route_for(self.role())
    }
}

#[derive(Debug, Default)]
struct SessionData {
    view: SessionView,
    /// Identity token from the last sign-in, used to complete registration
    id_token: Option<String>,
    last_error: Option<String>,
}

/// Authenticated session shared by the guard and the views.
pub struct Session {
    storage: KeyValueStore,
    identity: Arc<dyn IdentityProvider>,
    users: UsersService,
    test_mode: bool,
    data: RwLock<SessionData>,
}

impl Session {
    pub fn new(
        storage: KeyValueStore,
        identity: Arc<dyn IdentityProvider>,
        users: UsersService,
        test_mode: bool,
    ) -> Self {
        Self {
            storage,
            identity,
            users,
            test_mode,
            data: RwLock::new(SessionData::default()),
        }
    }

    pub async fn view(&self) -> SessionView {
        self.data.read().await.view.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.data.read().await.last_error.clone()
    }

    /// Sign in through the identity provider and verify with the backend.
    pub async fn sign_in(&self) -> SignInOutcome {
        match self.identity.sign_in().await {
            Ok(result) => self.verify(result).await,
            Err(e) => self.fail(e.into()).await,
        }
    }

    /// Sign in as a canned test user.
    pub async fn sign_in_with_test_user(&self, token: &str) -> SignInOutcome {
        if !self.test_mode {
            return self.fail(SessionError::TestModeDisabled).await;
        }
        if find_test_user(token).is_none() {
            return self.fail(IdentityError::InvalidTestToken.into()).await;
        }
        if let Err(e) = self.storage.set(keys::TEST_TOKEN, token) {
            return self.fail(e.into()).await;
        }
        self.sign_in().await
    }

    async fn verify(&self, result: SignInResult) -> SignInOutcome {
        {
            let mut data = self.data.write().await;
            data.view = SessionView {
                state: SessionState::PendingBackendVerification,
                identity_user: Some(result.user.clone()),
                is_authenticated: false,
            };
            data.id_token = Some(result.id_token.clone());
            data.last_error = None;
        }

        let response = self.users.verify_token(&result.id_token).await;
        match response.status() {
            200 if response.is_success() => match response.extract::<UserRecord>("user") {
                Ok(user) => {
                    if let Err(e) = self.storage.save_user_record(&user) {
                        return self.fail(e.into()).await;
                    }
                    tracing::info!(
                        user_id = ?user.id,
                        role = ?user.role.as_ref().map(Role::as_str),
                        "Signed in existing user"
                    );
                    let redirect_to = user.home_route();
                    self.set_authenticated(user.clone(), true).await;
                    SignInOutcome::ExistingUser { user, redirect_to }
                }
                Err(e) => self.fail(e.into()).await,
            },
            201 if response.is_success() => {
                match response.extract::<RegistrationPrefill>("user_info") {
                    Ok(mut prefill) => {
                        if prefill.full_name.trim().is_empty() {
                            prefill.full_name =
                                result.user.display_name.clone().unwrap_or_default();
                        }
                        if prefill.gmail_id.is_empty() {
                            prefill.gmail_id = result.user.email.clone().unwrap_or_default();
                        }
                        if prefill.firebase_uid.is_empty() {
                            prefill.firebase_uid = result.user.uid.clone();
                        }
                        tracing::info!(firebase_uid = %prefill.firebase_uid, "New user must register");
                        self.data.write().await.view.state =
                            SessionState::NewUnregistered(prefill.clone());
                        SignInOutcome::NewUser {
                            prefill,
                            redirect_to: REGISTER_ROUTE,
                        }
                    }
                    Err(e) => self.fail(e.into()).await,
                }
            }
            status => match response {
                ApiResponse::Failure(err) => self.fail(err.into()).await,
                ApiResponse::Success { .. } => {
                    self.fail(SessionError::UnexpectedStatus {
                        status,
                        context: "Authentication failed",
                    })
                    .await
                }
            },
        }
    }

    /// Register the signed-in new user and log them in.
    pub async fn complete_registration(
        &self,
        registration: &Registration,
    ) -> Result<UserRecord, SessionError> {
        let stored_token = {
            let data = self.data.read().await;
            if !data.view.is_new_user() {
                return Err(SessionError::NotRegistering);
            }
            data.id_token.clone()
        };

        registration
            .validate()
            .map_err(|e| SessionError::Validation(e.to_string()))?;

        let id_token = match self.identity.current_id_token().await.or(stored_token) {
            Some(token) => token,
            None => return Err(SessionError::NotSignedIn),
        };

        let response = self.users.register(&id_token, registration).await;
        let user = match &response {
            ApiResponse::Success { status: 201, .. } => response.extract::<UserRecord>("user")?,
            ApiResponse::Success { status, .. } => {
                return Err(SessionError::UnexpectedStatus {
                    status: *status,
                    context: "Registration failed",
                })
            }
            ApiResponse::Failure(err) => {
                self.data.write().await.last_error = Some(err.message());
                return Err(err.clone().into());
            }
        };

        self.storage.save_user_record(&user)?;
        self.set_authenticated(user.clone(), true).await;
        tracing::info!(user_id = ?user.id, "Registration completed");

        // The registration record stands if the follow-up refresh fails.
        let refreshed = self.users.refresh_profile(&id_token).await;
        match refreshed.extract::<UserRecord>("user") {
            Ok(fresh) if refreshed.status() == 200 => {
                self.storage.save_user_record(&fresh)?;
                self.set_authenticated(fresh.clone(), true).await;
                Ok(fresh)
            }
            Ok(_) => Ok(user),
            Err(e) => {
                tracing::warn!(error = %e, "Could not refresh profile after registration");
                Ok(user)
            }
        }
    }

    /// Restore the session from durable storage at startup.
    pub async fn restore(&self) -> SessionView {
        let state = match self.storage.load_user_record() {
            Ok(Some(user)) if self.storage.is_logged_in() => {
                tracing::info!(
                    user_id = ?user.id,
                    status = ?user.status.as_ref().map(Status::as_str),
                    "Restored session from storage"
                );
                SessionState::Authenticated(user)
            }
            Ok(_) => SessionState::Anonymous,
            Err(e) => {
                tracing::warn!(error = %e, "Stored session is corrupt, clearing it");
                if let Err(e) = self.storage.clear_user() {
                    tracing::warn!(error = %e, "Failed to clear corrupt session");
                }
                SessionState::Anonymous
            }
        };

        let is_authenticated = matches!(&state, SessionState::Authenticated(u) if u.grants_access());
        let identity_user = self.identity.current_user().await;

        let mut data = self.data.write().await;
        data.view = SessionView {
            state,
            identity_user,
            is_authenticated,
        };
        data.view.clone()
    }

    /// Re-fetch the profile with a fresh identity token.
    pub async fn refresh_profile(&self) -> Result<UserRecord, SessionError> {
        if self.data.read().await.view.user().is_none() {
            return Err(SessionError::NotSignedIn);
        }
        let token = self
            .identity
            .current_id_token()
            .await
            .ok_or(SessionError::NotSignedIn)?;

        let response = self.users.refresh_profile(&token).await;
        let user = response.extract::<UserRecord>("user")?;

        self.storage.save_user_record(&user)?;
        let is_authenticated = user.grants_access();
        self.set_authenticated(user.clone(), is_authenticated).await;
        Ok(user)
    }

    /// Merge a local profile edit into the stored record.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserRecord, SessionError> {
        let mut data = self.data.write().await;
        let SessionState::Authenticated(user) = &mut data.view.state else {
            return Err(SessionError::NotSignedIn);
        };
        let mut updated = user.clone();
        updated.apply(update);
        self.storage.save_user_record(&updated)?;
        *user = updated.clone();
        Ok(updated)
    }

    /// Sign out of the provider and forget the session.
    ///
    /// Local state and storage are cleared even if the provider fails.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let provider_result = self.identity.sign_out().await;
        if let Err(e) = &provider_result {
            tracing::warn!(error = %e, "Identity provider sign-out failed");
        }

        self.clear().await;
        tracing::info!("Logged out");
        provider_result.map_err(Into::into)
    }

    async fn set_authenticated(&self, user: UserRecord, is_authenticated: bool) {
        let mut data = self.data.write().await;
        data.view.state = SessionState::Authenticated(user);
        data.view.is_authenticated = is_authenticated;
        data.last_error = None;
    }

    async fn clear(&self) {
        if let Err(e) = self.storage.clear_user() {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }
        let mut data = self.data.write().await;
        let last_error = data.last_error.take();
        *data = SessionData {
            last_error,
            ..SessionData::default()
        };
    }

    async fn fail(&self, err: SessionError) -> SignInOutcome {
        tracing::warn!(error = %err, "Sign-in failed");
        self.clear().await;
        self.data.write().await.last_error = Some(err.to_string());
        SignInOutcome::Failed(err)
    }
}

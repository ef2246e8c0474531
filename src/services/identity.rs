// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider adapters.
//!
//! [`FirebaseIdentity`] signs in through the Firebase Auth REST API: a
//! Google credential from a [`CredentialPrompt`] is exchanged for a Firebase
//! session, and identity tokens are force-refreshed through the Secure Token
//! API. The refresh token is persisted so the principal survives a restart.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::{Config, ConfigError};
use crate::error::AppError;
use crate::storage::{keys, KeyValueStore};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const GOOGLE_PROVIDER_ID: &str = "google.com";

/// Principal as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Successful provider sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    pub user: IdentityUser,
    /// Short-lived identity token for backend verification
    pub id_token: String,
}

/// Classified, user-readable sign-in failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Sign-in was cancelled")]
    Cancelled,

    #[error("Sign-in popup was blocked by your browser")]
    PopupBlocked,

    #[error("Network error occurred. Please check your connection")]
    Network,

    #[error("An internal error occurred. Please try again")]
    Internal,

    #[error("Invalid test token")]
    InvalidTestToken,

    #[error("{0}")]
    Other(String),
}

impl IdentityError {
    /// Map a provider error code (`auth/popup-blocked`, `USER_CANCELLED`, ...).
    pub fn from_provider_code(code: &str) -> Self {
        let normalized = code
            .trim()
            .trim_start_matches("auth/")
            .to_ascii_uppercase()
            .replace('-', "_");

        match normalized.as_str() {
            "USER_CANCELLED" | "POPUP_CLOSED_BY_USER" | "CANCELLED_POPUP_REQUEST" => {
                IdentityError::Cancelled
            }
            "POPUP_BLOCKED" => IdentityError::PopupBlocked,
            "NETWORK_REQUEST_FAILED" => IdentityError::Network,
            "INTERNAL_ERROR" => IdentityError::Internal,
            _ => IdentityError::Other(format!("Sign-in failed: {}", code.trim())),
        }
    }

    fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            IdentityError::Network
        } else {
            IdentityError::Other(err.to_string())
        }
    }
}

/// Sign-in, token retrieval and sign-out against an identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<SignInResult, IdentityError>;

    /// Force-refreshed identity token for the current principal.
    async fn current_id_token(&self) -> Option<String>;

    async fn current_user(&self) -> Option<IdentityUser>;

    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Credential obtained from the federated provider (the "popup").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCredential {
    pub provider_id: String,
    pub id_token: String,
}

/// Interactive step that yields a federated credential.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    async fn prompt(&self) -> Result<FederatedCredential, IdentityError>;
}

/// Prompt answered with a preconfigured Google ID token.
///
/// With no token the prompt behaves like a closed popup.
pub struct StaticCredentialPrompt(pub Option<String>);

#[async_trait]
impl CredentialPrompt for StaticCredentialPrompt {
    async fn prompt(&self) -> Result<FederatedCredential, IdentityError> {
        match &self.0 {
            Some(token) => Ok(FederatedCredential {
                provider_id: GOOGLE_PROVIDER_ID.to_string(),
                id_token: token.clone(),
            }),
            None => Err(IdentityError::Cancelled),
        }
    }
}

/// Base URLs of the Firebase Auth REST APIs.
#[derive(Debug, Clone)]
pub struct FirebaseEndpoints {
    pub identity_toolkit: String,
    pub secure_token: String,
}

impl Default for FirebaseEndpoints {
    fn default() -> Self {
        Self {
            identity_toolkit: IDENTITY_TOOLKIT_URL.to_string(),
            secure_token: SECURE_TOKEN_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct FirebaseSession {
    user: IdentityUser,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    id_token: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    user_id: Option<String>,
}

/// Claims read from a Firebase identity token.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Firebase Auth adapter.
pub struct FirebaseIdentity {
    http: reqwest::Client,
    api_key: String,
    endpoints: FirebaseEndpoints,
    prompt: Arc<dyn CredentialPrompt>,
    storage: KeyValueStore,
    session: RwLock<Option<FirebaseSession>>,
}

impl FirebaseIdentity {
    /// Create the adapter, restoring a persisted principal if one exists.
    pub fn new(
        config: &Config,
        storage: KeyValueStore,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> Result<Self, AppError> {
        let api_key = config
            .firebase_api_key
            .clone()
            .ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed building identity HTTP client: {e}")))?;

        let session = restore_session(&storage);
        if let Some(s) = &session {
            tracing::debug!(uid = %s.user.uid, "Restored identity provider principal");
        }

        Ok(Self {
            http,
            api_key,
            endpoints: FirebaseEndpoints::default(),
            prompt,
            storage,
            session: RwLock::new(session),
        })
    }

    pub fn with_endpoints(mut self, endpoints: FirebaseEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    async fn exchange_credential(
        &self,
        credential: &FederatedCredential,
    ) -> Result<SignInWithIdpResponse, IdentityError> {
        let url = format!(
            "{}/accounts:signInWithIdp?key={}",
            self.endpoints.identity_toolkit,
            urlencoding::encode(&self.api_key)
        );
        let body = serde_json::json!({
            "postBody": format!(
                "id_token={}&providerId={}",
                urlencoding::encode(&credential.id_token),
                urlencoding::encode(&credential.provider_id)
            ),
            "requestUri": "http://localhost",
            "returnSecureToken": true,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::from_transport(&e))?;

        read_provider_response(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, IdentityError> {
        let url = format!(
            "{}/token?key={}",
            self.endpoints.secure_token,
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::from_transport(&e))?;

        read_provider_response(response).await
    }

    fn persist(&self, session: Option<&FirebaseSession>) {
        let result = match session {
            Some(s) => serde_json::to_string(&s.user)
                .map_err(Into::into)
                .and_then(|user| self.storage.set(keys::IDENTITY_USER, user))
                .and_then(|()| self.storage.set(keys::IDENTITY_REFRESH_TOKEN, s.refresh_token.as_str())),
            None => self
                .storage
                .remove(keys::IDENTITY_USER)
                .and_then(|()| self.storage.remove(keys::IDENTITY_REFRESH_TOKEN)),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist identity provider session");
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self) -> Result<SignInResult, IdentityError> {
        let credential = self.prompt.prompt().await?;
        let response = self.exchange_credential(&credential).await?;

        let user = IdentityUser {
            uid: response.local_id,
            email: response.email,
            display_name: response.display_name,
            photo_url: response.photo_url,
        };
        let session = FirebaseSession {
            user: user.clone(),
            refresh_token: response.refresh_token,
        };
        self.persist(Some(&session));
        *self.session.write().await = Some(session);

        tracing::info!(uid = %user.uid, "Identity provider sign-in succeeded");
        Ok(SignInResult {
            user,
            id_token: response.id_token,
        })
    }

    async fn current_id_token(&self) -> Option<String> {
        let refresh_token = self.session.read().await.as_ref()?.refresh_token.clone();

        let refreshed = match self.refresh(&refresh_token).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh identity token");
                return None;
            }
        };

        let mut guard = self.session.write().await;
        let session = guard.as_mut()?;
        session.refresh_token = refreshed.refresh_token;

        // Reconcile the principal with what the fresh token says.
        if let Some(claims) = read_claims(&refreshed.id_token) {
            if let Some(uid) = claims.user_id.or(claims.sub).or(refreshed.user_id) {
                session.user.uid = uid;
            }
            session.user.email = claims.email.or(session.user.email.take());
            session.user.display_name = claims.name.or(session.user.display_name.take());
            session.user.photo_url = claims.picture.or(session.user.photo_url.take());
        }
        let snapshot = session.clone();
        drop(guard);

        self.persist(Some(&snapshot));
        Some(refreshed.id_token)
    }

    async fn current_user(&self) -> Option<IdentityUser> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        *self.session.write().await = None;
        self.persist(None);
        tracing::info!("Signed out of identity provider");
        Ok(())
    }
}

fn restore_session(storage: &KeyValueStore) -> Option<FirebaseSession> {
    let refresh_token = storage.get(keys::IDENTITY_REFRESH_TOKEN)?;
    let user = storage
        .get(keys::IDENTITY_USER)
        .and_then(|raw| serde_json::from_str::<IdentityUser>(&raw).ok())?;
    Some(FirebaseSession {
        user,
        refresh_token,
    })
}

/// Decode a successful provider response or classify its error body.
async fn read_provider_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, IdentityError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| IdentityError::from_transport(&e))?;

    if !status.is_success() {
        let code = provider_error_code(&text).unwrap_or_else(|| status.to_string());
        tracing::warn!(status = status.as_u16(), code = %code, "Identity provider error");
        return Err(IdentityError::from_provider_code(&code));
    }

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(error = %e, "Unexpected identity provider response");
        IdentityError::Internal
    })
}

/// `{"error": {"message": "CODE : detail"}}` or `{"error": "code"}`.
fn provider_error_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())?;
    message
        .split(':')
        .next()
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
}

/// Read identity token claims without verifying the signature.
///
/// The token came straight from the provider over TLS; the backend does
/// the real verification.
fn read_claims(token: &str) -> Option<IdTokenClaims> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<IdTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Second Innings admin client.
//!
//! Client-side core of the Second Innings administration dashboard: an
//! HTTP wrapper for the backend, identity provider adapters, the session
//! state machine, the route guard and the resource stores the dashboard
//! views read from.

pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;
pub mod stores;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use error::AppError;
use guard::Navigator;
use services::{
    AdminService, ApiClient, FirebaseIdentity, IdentityProvider, InterestGroupsService,
    NotificationsService, OfficialsService, SessionTokens, StaticCredentialPrompt, TestIdentity,
    TicketsService, UsersService,
};
use session::Session;
use storage::KeyValueStore;
use stores::{AdminStore, InterestGroupsStore, NotificationsStore, OfficialsStore, TicketsStore};

/// Everything the dashboard needs, wired once at startup.
pub struct AdminContext {
    pub config: Config,
    pub storage: KeyValueStore,
    pub identity: Arc<dyn IdentityProvider>,
    pub api: ApiClient,
    pub session: Arc<Session>,
    pub navigator: Navigator,
    pub tickets: TicketsStore,
    pub officials: OfficialsStore,
    pub notifications: Arc<NotificationsStore>,
    pub admin: AdminStore,
    pub interest_groups: InterestGroupsStore,
}

impl AdminContext {
    /// Build the context from configuration.
    ///
    /// Test mode selects the canned test identities; otherwise Firebase is
    /// used with `GOOGLE_ID_TOKEN` answering the sign-in prompt.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let storage = match &config.session_file {
            Some(path) => KeyValueStore::open(path)?,
            None => KeyValueStore::in_memory(),
        };
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: Config, storage: KeyValueStore) -> Result<Self, AppError> {
        let identity: Arc<dyn IdentityProvider> = if config.test_mode {
            tracing::info!("Using test identity provider");
            Arc::new(TestIdentity::new(storage.clone()))
        } else {
            let prompt = Arc::new(StaticCredentialPrompt(config.google_id_token.clone()));
            Arc::new(FirebaseIdentity::new(&config, storage.clone(), prompt)?)
        };
        Self::with_identity(config, storage, identity)
    }

    /// Build the context around an existing identity provider.
    pub fn with_identity(
        config: Config,
        storage: KeyValueStore,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, AppError> {
        let tokens = Arc::new(SessionTokens::new(storage.clone(), identity.clone()));
        let api = ApiClient::new(&config, tokens)?;

        let session = Arc::new(Session::new(
            storage.clone(),
            identity.clone(),
            UsersService::new(api.clone()),
            config.test_mode,
        ));

        tracing::debug!(
            base_url = %config.endpoint_url(""),
            test_mode = config.test_mode,
            "Admin context initialized"
        );

        Ok(Self {
            navigator: Navigator::new(session.clone()),
            tickets: TicketsStore::new(TicketsService::new(api.clone())),
            officials: OfficialsStore::new(OfficialsService::new(api.clone())),
            notifications: Arc::new(NotificationsStore::new(NotificationsService::new(
                api.clone(),
            ))),
            admin: AdminStore::new(AdminService::new(api.clone())),
            interest_groups: InterestGroupsStore::new(InterestGroupsService::new(api.clone())),
            config,
            storage,
            identity,
            api,
            session,
        })
    }
}

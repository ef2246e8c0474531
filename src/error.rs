// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Library error types.
//!
//! Backend failures never show up here: the HTTP wrapper reports them as
//! [`crate::services::api::ApiResponse::Failure`]. These errors cover the
//! local machinery around it (configuration, durable storage, identity
//! provider, client construction).

use crate::config::ConfigError;
use crate::services::identity::IdentityError;
use crate::storage::StorageError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, AppError>;

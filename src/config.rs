//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local
//! development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_API_PREFIX: &str = "/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_FILE: &str = ".second-innings-session.json";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend origin, without the API prefix
    pub api_base_url: String,
    /// Path prefix prepended to every endpoint
    pub api_prefix: String,
    /// Per-request timeout for backend calls
    pub request_timeout: Duration,
    /// Use canned test identities instead of Firebase
    pub test_mode: bool,
    /// Firebase Web API key (required unless in test mode)
    pub firebase_api_key: Option<String>,
    /// Google credential handed to the Firebase sign-in exchange
    pub google_id_token: Option<String>,
    /// Durable session storage file; `None` keeps the session in memory
    pub session_file: Option<PathBuf>,
    /// Test bearer token used by the binary in test mode
    pub test_token: Option<String>,
}

impl Config {
    /// Config for tests: test mode on, in-memory storage.
    pub fn test_default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            request_timeout: Duration::from_secs(5),
            test_mode: true,
            firebase_api_key: None,
            google_id_token: None,
            session_file: None,
            test_token: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let test_mode = env::var("TEST_MODE")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let firebase_api_key = env::var("FIREBASE_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if !test_mode && firebase_api_key.is_none() {
            return Err(ConfigError::Missing("FIREBASE_API_KEY"));
        }

        let request_timeout = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS", raw))?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            api_prefix: env::var("API_PREFIX")
                .map(|v| normalize_prefix(&v))
                .unwrap_or_else(|_| DEFAULT_API_PREFIX.to_string()),
            request_timeout,
            test_mode,
            firebase_api_key,
            google_id_token: env::var("GOOGLE_ID_TOKEN").ok(),
            session_file: Some(
                env::var("SESSION_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE)),
            ),
            test_token: env::var("TEST_TOKEN").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Full URL of an endpoint such as `/tickets/3`.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.api_base_url, self.api_prefix, endpoint)
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

//! Application configuration loaded from environment variables.
//!
//! The Eventbrite client secret doubles as the OAuth state signing key
//! unless `OAUTH_STATE_KEY` is set explicitly.

use std::env;
use std::time::Duration;

/// Default OAuth redirect page registered with Eventbrite for the mobile app.
pub const DEFAULT_REDIRECT_URI: &str =
    "https://star-check-in-oauth-redirect.onrender.com/eventbrite-callback.html";

/// Where attendee records and the active credential are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Durable storage in Firestore.
    Firestore { project_id: String },
    /// Process-local storage; a restart drops the credential and the mirror.
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Eventbrite OAuth client ID (public)
    pub eventbrite_client_id: String,
    /// Redirect URI registered with the Eventbrite app
    pub eventbrite_redirect_uri: String,
    /// Eventbrite REST API base URL (no trailing slash)
    pub eventbrite_api_url: String,
    /// Eventbrite OAuth base URL (no trailing slash)
    pub eventbrite_oauth_url: String,
    /// Frontend origin allowed by CORS; any origin when unset
    pub frontend_url: Option<String>,
    /// Storage backend selection
    pub storage: StorageBackend,
    /// Client-wide timeout for outbound Eventbrite calls
    pub upstream_timeout: Duration,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Eventbrite OAuth client secret
    pub eventbrite_client_secret: String,
    /// HMAC key for the OAuth `state` parameter (raw bytes)
    pub oauth_state_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            eventbrite_client_id: "test_client_id".to_string(),
            eventbrite_redirect_uri: "http://localhost:5173/eventbrite-callback.html".to_string(),
            eventbrite_api_url: "http://127.0.0.1:9/v3".to_string(),
            eventbrite_oauth_url: "http://127.0.0.1:9/oauth".to_string(),
            frontend_url: None,
            storage: StorageBackend::Memory,
            upstream_timeout: Duration::from_secs(5),
            port: 3000,
            eventbrite_client_secret: "test_secret".to_string(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let eventbrite_client_secret = env::var("EVENTBRITE_CLIENT_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("EVENTBRITE_CLIENT_SECRET"))?;

        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|_| eventbrite_client_secret.clone())
            .into_bytes();

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .as_str()
        {
            "firestore" => StorageBackend::Firestore {
                project_id: env::var("GCP_PROJECT_ID")
                    .unwrap_or_else(|_| "local-dev".to_string()),
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let upstream_timeout_secs = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "UPSTREAM_TIMEOUT_SECS",
                value: raw,
            })?,
            Err(_) => 30,
        };

        Ok(Self {
            eventbrite_client_id: env::var("EVENTBRITE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("EVENTBRITE_CLIENT_ID"))?,
            eventbrite_redirect_uri: env::var("EVENTBRITE_REDIRECT_URI")
                .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string()),
            eventbrite_api_url: trim_base(
                env::var("EVENTBRITE_API_URL")
                    .unwrap_or_else(|_| "https://www.eventbriteapi.com/v3".to_string()),
            ),
            eventbrite_oauth_url: trim_base(
                env::var("EVENTBRITE_OAUTH_URL")
                    .unwrap_or_else(|_| "https://www.eventbrite.com/oauth".to_string()),
            ),
            frontend_url: env::var("FRONTEND_URL").ok().filter(|v| !v.is_empty()),
            storage,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            eventbrite_client_secret,
            oauth_state_key,
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

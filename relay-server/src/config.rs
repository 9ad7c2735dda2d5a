//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup into an immutable [`Config`] that is
//! shared by the handlers and the reply dispatcher.

use std::env;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

/// Environment variable holding the Cloud API access token.
pub const ACCESS_TOKEN_VAR: &str = "WHATSAPP_ACCESS_TOKEN";

/// Environment variable holding the sending phone number id.
pub const PHONE_NUMBER_ID_VAR: &str = "WHATSAPP_PHONE_NUMBER_ID";

/// Environment variable holding the webhook verify token.
pub const VERIFY_TOKEN_VAR: &str = "WHATSAPP_VERIFY_TOKEN";

const DEFAULT_GRAPH_API_BASE_URL: &str = "https://graph.facebook.com";
const DEFAULT_GRAPH_API_VERSION: &str = "v21.0";

/// Raised when required settings are absent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingRequired(Vec<&'static str>),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cloud API bearer token used for outbound replies
    pub access_token: Option<String>,

    /// Phone number id replies are sent from
    pub phone_number_id: Option<String>,

    /// Shared secret checked during the subscription handshake
    pub verify_token: Option<String>,

    /// Port for the web server to listen on
    pub port: u16,

    /// Graph API origin, overridable for tests and proxies
    pub graph_api_base_url: String,

    /// Graph API version path segment, e.g. `v21.0`
    pub graph_api_version: String,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Optional append-only JSONL log of received messages
    pub message_log_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            port: 8080,
            graph_api_base_url: DEFAULT_GRAPH_API_BASE_URL.to_string(),
            graph_api_version: DEFAULT_GRAPH_API_VERSION.to_string(),
            request_timeout_ms: 10_000,
            message_log_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            access_token: parse_secret(ACCESS_TOKEN_VAR),

            phone_number_id: parse_secret(PHONE_NUMBER_ID_VAR),

            verify_token: parse_secret(VERIFY_TOKEN_VAR),

            port: parse_number("PORT", defaults.port),

            graph_api_base_url: env::var("GRAPH_API_BASE_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.graph_api_base_url),

            graph_api_version: env::var("GRAPH_API_VERSION")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.graph_api_version),

            request_timeout_ms: parse_number("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),

            message_log_path: parse_secret("MESSAGE_LOG_PATH").map(PathBuf::from),
        }
    }

    /// Check that every required value is present.
    ///
    /// All missing variables are reported together so a misconfigured
    /// deployment can be fixed in one pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = [
            (ACCESS_TOKEN_VAR, self.access_token.is_some()),
            (PHONE_NUMBER_ID_VAR, self.phone_number_id.is_some()),
            (VERIFY_TOKEN_VAR, self.verify_token.is_some()),
        ]
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingRequired(missing))
        }
    }

    /// Access token and phone number id, when both are present.
    pub fn send_credentials(&self) -> Option<SendCredentials<'_>> {
        Some(SendCredentials {
            access_token: self.access_token.as_deref()?,
            phone_number_id: self.phone_number_id.as_deref()?,
        })
    }
}

/// Everything needed to call the send-message endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendCredentials<'a> {
    pub access_token: &'a str,
    pub phone_number_id: &'a str,
}

/// Short, log-safe prefix of a secret.
///
/// Never more than 6 characters and never more than half the secret.
pub fn token_prefix(token: &str) -> String {
    let shown = (token.chars().count() / 2).min(6);
    let prefix: String = token.chars().take(shown).collect();
    format!("{}...", prefix)
}

/// Read an optional string, treating blank values as unset.
fn parse_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a numeric variable, falling back to the default on bad input.
fn parse_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

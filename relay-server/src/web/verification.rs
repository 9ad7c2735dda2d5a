//! Webhook subscription handshake.
//!
//! The platform sends `hub.mode=subscribe`, the verify token configured in
//! the app dashboard, and a random `hub.challenge`. Echoing the challenge
//! proves we own the endpoint.
//! Reference: https://developers.facebook.com/docs/graph-api/webhooks/getting-started#verification-requests

use serde::Deserialize;
use tracing::{info, warn};

/// Mode value the platform sends when subscribing.
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Query parameters of a verification request.
#[derive(Debug, Default, Deserialize)]
pub struct VerificationRequest {
    #[serde(default, rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(default, rename = "hub.verify_token")]
    pub token: Option<String>,
    #[serde(default, rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Check a verification request against the configured secret.
///
/// Returns the challenge to echo back on success. Missing parameters, an
/// empty challenge or an unconfigured secret all fail.
pub fn verify_subscription<'a>(
    request: &'a VerificationRequest,
    expected_token: Option<&str>,
) -> Option<&'a str> {
    let mode = request.mode.as_deref();
    let token = request.token.as_deref();
    let challenge = request.challenge.as_deref().filter(|c| !c.is_empty());

    let Some(expected) = expected_token.filter(|t| !t.is_empty()) else {
        warn!("webhook_verify_token_not_configured");
        return None;
    };

    let mode_ok = mode == Some(SUBSCRIBE_MODE);
    let token_ok = token.is_some_and(|t| constant_time_compare(t, expected));

    match challenge {
        Some(challenge) if mode_ok && token_ok => Some(challenge),
        _ => {
            info!(
                mode = ?mode,
                mode_ok = mode_ok,
                token_ok = token_ok,
                has_challenge = challenge.is_some(),
                "webhook_verification_rejected"
            );
            None
        }
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

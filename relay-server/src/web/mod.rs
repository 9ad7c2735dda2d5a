//! Web server module for the Cloud API webhook.
//!
//! This module provides a thin, fast web server that:
//! - Answers the subscription handshake on `GET /webhook`
//! - Accepts message notifications on `POST /webhook`
//! - Returns 200 before any reply reaches the platform
//!
//! Replies are sent by detached tasks owned by the reply dispatcher.

pub mod handlers;
pub mod verification;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, receive_notification, verify_webhook, AppState, HealthResponse, ACK_BODY,
    MAX_NOTIFICATION_BYTES, VERIFICATION_FAILED_BODY,
};
pub use verification::{verify_subscription, VerificationRequest, SUBSCRIBE_MODE};

/// Path the platform calls for both the handshake and notifications.
pub const WEBHOOK_PATH: &str = "/webhook";

/// Build the router with all routes and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            WEBHOOK_PATH,
            get(verify_webhook).post(receive_notification),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

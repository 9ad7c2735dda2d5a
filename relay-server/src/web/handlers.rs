//! Webhook endpoint handlers.
//!
//! The notification handler only parses and classifies the body, spawns
//! the reply and returns. It acknowledges with 200 for anything it can
//! read and for anything it cannot: a non-2xx makes the platform redeliver,
//! which would duplicate replies.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::notification::{
    classify, is_business_account, object_tag, parse_notification, Incoming,
};
use crate::reply::{OutboundReply, ReplyDispatcher};
use crate::sink::{self, MessageRecord, MessageSink};
use crate::web::verification::{verify_subscription, VerificationRequest};
use crate::Config;

/// Body returned for every acknowledged notification.
pub const ACK_BODY: &str = "EVENT_RECEIVED";

/// Largest notification body read; anything bigger is acknowledged unread.
pub const MAX_NOTIFICATION_BYTES: usize = 2 * 1024 * 1024;

/// Body returned for a failed handshake.
pub const VERIFICATION_FAILED_BODY: &str = "Verification failed";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: ReplyDispatcher,
    pub sink: Arc<dyn MessageSink>,
}

impl AppState {
    /// Build the state from configuration: HTTP client and message log.
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let dispatcher =
            ReplyDispatcher::new(config.clone()).context("Failed to build HTTP client")?;
        let sink = sink::from_path(config.message_log_path.as_deref())
            .context("Failed to open message log")?;

        Ok(Self {
            config,
            dispatcher,
            sink,
        })
    }

    /// Replace the message sink.
    pub fn with_sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = sink;
        self
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Subscription Handshake
// =============================================================================

/// `GET /webhook` verification endpoint.
///
/// Echoes `hub.challenge` with 200 when mode and token match, 403 otherwise.
/// A query string that does not deserialize is treated as empty.
pub async fn verify_webhook(
    State(state): State<AppState>,
    query: Option<Query<VerificationRequest>>,
) -> impl IntoResponse {
    let request = query.map(|Query(q)| q).unwrap_or_default();

    match verify_subscription(&request, state.config.verify_token.as_deref()) {
        Some(challenge) => {
            info!(challenge_length = challenge.len(), "webhook_verified");
            (StatusCode::OK, challenge.to_string())
        }
        None => (StatusCode::FORBIDDEN, VERIFICATION_FAILED_BODY.to_string()),
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// `POST /webhook` notification endpoint.
///
/// Reads the body itself instead of using the `Bytes` extractor so that an
/// oversized or broken body still gets the 200 acknowledgement.
pub async fn receive_notification(State(state): State<AppState>, body: Body) -> impl IntoResponse {
    let body = match to_bytes(body, MAX_NOTIFICATION_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            warn!(
                limit_bytes = MAX_NOTIFICATION_BYTES,
                error = %e,
                "notification_body_unreadable"
            );
            return acknowledge();
        }
    };

    let Some(notification) = parse_notification(&body) else {
        warn!(body_length = body.len(), "notification_unparseable");
        return acknowledge();
    };

    info!(
        object = ?object_tag(&notification),
        body_length = body.len(),
        "notification_received"
    );

    if !is_business_account(&notification) {
        debug!(object = ?object_tag(&notification), "notification_unexpected_object");
    }

    match classify(&notification) {
        Incoming::Text { from, body: text } => {
            info!(from = %from, text_length = text.len(), "notification_text_message");
            record_detached(&state, MessageRecord::new(&from, "text", Some(&text), notification));

            state.dispatcher.dispatch(OutboundReply::echo(&from, &text));
            debug!(from = %from, "notification_reply_spawned");
        }
        Incoming::Unsupported { from, kind } => {
            info!(from = %from, kind = %kind, "notification_unsupported_kind");
            record_detached(&state, MessageRecord::new(&from, &kind, None, notification));
        }
        Incoming::Nothing => {
            debug!("notification_without_message");
        }
    }

    acknowledge()
}

fn acknowledge() -> (StatusCode, &'static str) {
    (StatusCode::OK, ACK_BODY)
}

/// Write a record from a detached task; failures are logged and dropped.
fn record_detached(state: &AppState, record: MessageRecord) {
    let sink = state.sink.clone();

    tokio::spawn(async move {
        if let Err(e) = sink.record(&record).await {
            warn!(from = %record.from, error = %e, "message_log_write_failed");
        }
    });
}

//! Reply dispatch through the Cloud API send-message endpoint.
//!
//! [`ReplyDispatcher::send`] performs one request and reports the outcome.
//! [`ReplyDispatcher::dispatch`] detaches that request onto the runtime and
//! only reports through logs, so the webhook acknowledgement never waits on
//! the platform. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};
use url::Url;

use super::types::{GraphError, OutboundReply, SendMessageRequest, SendMessageResponse, SendReceipt};
use crate::config::{token_prefix, Config};

/// Ways a reply can fail to go out.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply sending is not configured (access token or phone number id missing)")]
    NotConfigured,

    #[error("invalid Graph API endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Graph API rejected the reply with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Graph API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ReplyError {
    /// Structured platform error for rejected replies.
    pub fn graph_error(&self) -> Option<GraphError> {
        match self {
            ReplyError::Rejected { body, .. } => GraphError::from_body(body),
            _ => None,
        }
    }
}

/// Sends replies through the Graph API.
///
/// Cheap to clone; all clones share one pooled HTTP client.
#[derive(Clone)]
pub struct ReplyDispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    client: Client,
    config: Arc<Config>,
}

impl ReplyDispatcher {
    /// Create a dispatcher with a client honoring the configured timeout.
    pub fn new(config: Arc<Config>) -> Result<Self, ReplyError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Create a dispatcher around an existing client.
    pub fn with_client(client: Client, config: Arc<Config>) -> Self {
        Self {
            inner: Arc::new(DispatcherInner { client, config }),
        }
    }

    /// Send-message URL for the configured phone number.
    pub fn endpoint(&self) -> Result<Url, ReplyError> {
        let config = &self.inner.config;
        let credentials = config.send_credentials().ok_or(ReplyError::NotConfigured)?;

        let mut url = Url::parse(&config.graph_api_base_url)
            .map_err(|e| ReplyError::InvalidEndpoint(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| ReplyError::InvalidEndpoint(config.graph_api_base_url.clone()))?
            .pop_if_empty()
            .push(&config.graph_api_version)
            .push(credentials.phone_number_id)
            .push("messages");

        Ok(url)
    }

    /// Send one reply and wait for the platform's answer.
    pub async fn send(&self, reply: &OutboundReply) -> Result<SendReceipt, ReplyError> {
        let token = self
            .inner
            .config
            .send_credentials()
            .ok_or(ReplyError::NotConfigured)?
            .access_token;

        let url = self.endpoint()?;

        info!(
            recipient = %reply.recipient,
            body_length = reply.body.len(),
            token_prefix = %token_prefix(token),
            "reply_send_starting"
        );

        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(token)
            .json(&SendMessageRequest::from(reply))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ReplyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let message_id = serde_json::from_str::<SendMessageResponse>(&body)
            .ok()
            .and_then(|r| r.messages.into_iter().next())
            .map(|m| m.id)
            .filter(|id| !id.is_empty());

        Ok(SendReceipt { message_id })
    }

    /// Send a reply in a detached task.
    ///
    /// The outcome is only observable through logs: one `info` event on
    /// success, one `error` event on failure. The returned handle may be
    /// dropped.
    pub fn dispatch(&self, reply: OutboundReply) -> JoinHandle<()> {
        let dispatcher = self.clone();

        tokio::spawn(async move {
            match dispatcher.send(&reply).await {
                Ok(receipt) => info!(
                    recipient = %reply.recipient,
                    message_id = ?receipt.message_id,
                    "reply_dispatch_complete"
                ),
                Err(e) => log_failure(&reply, &e),
            }
        })
    }
}

fn log_failure(reply: &OutboundReply, e: &ReplyError) {
    match e {
        ReplyError::NotConfigured | ReplyError::InvalidEndpoint(_) => {
            error!(
                recipient = %reply.recipient,
                error = %e,
                "reply_dispatch_misconfigured"
            );
        }
        ReplyError::Rejected { status, body } => {
            let graph = e.graph_error().unwrap_or_default();
            error!(
                recipient = %reply.recipient,
                status_code = status,
                graph_code = ?graph.code,
                graph_type = ?graph.kind,
                graph_message = %graph.message,
                fbtrace_id = ?graph.fbtrace_id,
                body = %body,
                "reply_dispatch_rejected"
            );
        }
        ReplyError::Transport(inner) => {
            error!(
                recipient = %reply.recipient,
                is_timeout = inner.is_timeout(),
                is_connect = inner.is_connect(),
                error = %inner,
                "reply_dispatch_transport_error"
            );
        }
    }
}

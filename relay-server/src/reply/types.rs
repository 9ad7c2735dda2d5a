//! Outbound reply types and Graph API wire formats.

use serde::{Deserialize, Serialize};

/// Product tag required on every send-message request.
pub const MESSAGING_PRODUCT: &str = "whatsapp";

/// A reply waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    /// Recipient phone number, the inbound sender
    pub recipient: String,
    /// Reply text
    pub body: String,
}

impl OutboundReply {
    pub fn new(recipient: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            body: body.into(),
        }
    }

    /// Build the reply for a received text message.
    pub fn echo(recipient: impl Into<String>, received: &str) -> Self {
        Self::new(recipient, format!("You said: {}", received))
    }
}

/// JSON body for `POST /{version}/{phone_number_id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub messaging_product: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: TextBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextBody {
    pub body: String,
}

impl From<&OutboundReply> for SendMessageRequest {
    fn from(reply: &OutboundReply) -> Self {
        Self {
            messaging_product: MESSAGING_PRODUCT.to_string(),
            to: reply.recipient.clone(),
            kind: "text".to_string(),
            text: TextBody {
                body: reply.body.clone(),
            },
        }
    }
}

/// Successful send-message response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentMessage {
    #[serde(default)]
    pub id: String,
}

/// Error envelope returned by the Graph API on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorEnvelope {
    pub error: GraphError,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct GraphError {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub error_subcode: Option<i64>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

impl GraphError {
    /// Parse the error envelope out of a raw response body.
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str::<GraphErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error)
    }
}

/// Result of a successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// Platform message id (`wamid...`) when the response carried one
    pub message_id: Option<String>,
}

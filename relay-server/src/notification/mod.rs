//! Inbound notification parsing.
//!
//! ## Processing Flow
//!
//! ```text
//! raw body → parse_notification() → first_message() → classify() → Incoming
//! ```
//!
//! Only the first message of the first change of the first entry is looked
//! at. Batched payloads with several messages are not drained; later
//! messages are dropped with a debug log. Nothing outside that path is
//! type-checked.

pub mod types;

use serde_json::Value;
use tracing::{debug, info};

pub use types::{InboundMessage, MESSAGES_POINTER, TEXT_MESSAGE, WHATSAPP_BUSINESS_ACCOUNT};

/// What a notification asks the receiver to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A text message that should be answered.
    Text { from: String, body: String },
    /// A message of another kind; acknowledged and ignored.
    Unsupported { from: String, kind: String },
    /// No message at the expected path (status updates, empty batches, junk).
    Nothing,
}

/// Parse a raw request body.
///
/// Returns `None` only when the body is not JSON; callers treat that the
/// same as an empty notification.
pub fn parse_notification(body: &[u8]) -> Option<Value> {
    serde_json::from_slice(body).ok()
}

/// The `object` tag of a notification, when it is a string.
pub fn object_tag(notification: &Value) -> Option<&str> {
    notification.get("object").and_then(Value::as_str)
}

/// Whether the notification comes from a business account subscription.
pub fn is_business_account(notification: &Value) -> bool {
    object_tag(notification) == Some(WHATSAPP_BUSINESS_ACCOUNT)
}

/// Walk `entry[0].changes[0].value.messages[0]`.
pub fn first_message(notification: &Value) -> Option<InboundMessage> {
    let messages = notification.pointer(MESSAGES_POINTER)?.as_array()?;

    if messages.len() > 1 {
        debug!(message_count = messages.len(), "notification_batch_truncated");
    }

    messages.first().and_then(InboundMessage::from_value)
}

/// Decide what to do with a notification.
pub fn classify(notification: &Value) -> Incoming {
    let Some(message) = first_message(notification) else {
        return Incoming::Nothing;
    };

    if !message.is_text() {
        return Incoming::Unsupported {
            from: message.from,
            kind: message.kind,
        };
    }

    match message.text {
        Some(body) if !message.from.is_empty() => Incoming::Text {
            from: message.from,
            body,
        },
        _ => {
            info!(
                has_from = !message.from.is_empty(),
                "notification_text_incomplete"
            );
            Incoming::Nothing
        }
    }
}

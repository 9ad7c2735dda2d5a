//! Message types extracted from Cloud API webhook notifications.
//!
//! The envelope is navigated as a `serde_json::Value`; only the consulted
//! message is lifted into [`InboundMessage`], field by field, so junk in
//! any other part of the payload cannot hide it.

use serde_json::Value;

/// Object tag sent by the platform for business account notifications.
pub const WHATSAPP_BUSINESS_ACCOUNT: &str = "whatsapp_business_account";

/// Message kind that triggers a reply.
pub const TEXT_MESSAGE: &str = "text";

/// JSON pointer to the messages list that is consulted.
pub const MESSAGES_POINTER: &str = "/entry/0/changes/0/value/messages";

/// A single message sent by a user to the business number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender phone number in international format without `+`
    pub from: String,
    pub id: Option<String>,
    /// Message kind tag (`text`, `image`, `reaction`, ...)
    pub kind: String,
    /// `text.body` for text messages
    pub text: Option<String>,
}

impl InboundMessage {
    /// Lift a message out of its JSON object.
    ///
    /// Fields with an unexpected type are treated as absent. Returns `None`
    /// when the value is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let string = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Some(Self {
            from: string("from").unwrap_or_default(),
            id: string("id"),
            kind: string("type").unwrap_or_default(),
            text: value
                .pointer("/text/body")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Whether this message is a plain text message.
    pub fn is_text(&self) -> bool {
        self.kind == TEXT_MESSAGE
    }

    /// Text body, if the message carries one.
    pub fn text_body(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

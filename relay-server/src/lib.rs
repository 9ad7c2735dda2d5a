//! WABA relay - WhatsApp Cloud API webhook receiver.
//!
//! The `waba-relay` binary answers the webhook subscription handshake and
//! acknowledges message notifications immediately, sending a text reply
//! back through the Graph API from a detached task.
//!
//! ## Architecture
//!
//! ```text
//! Platform → POST /webhook → parse → 200 EVENT_RECEIVED
//!                                 └→ spawn → Graph API /{phone_number_id}/messages
//! ```

pub mod config;
pub mod notification;
pub mod reply;
pub mod sink;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError, SendCredentials};
pub use notification::{classify, parse_notification, InboundMessage, Incoming};
pub use reply::{OutboundReply, ReplyDispatcher, ReplyError};
pub use sink::{JsonlFileSink, MessageRecord, MessageSink, NoopSink};
pub use web::{router, AppState};

//! Outbound replies to the Cloud API.

pub mod dispatcher;
pub mod types;

pub use dispatcher::{ReplyDispatcher, ReplyError};
pub use types::{
    GraphError, OutboundReply, SendMessageRequest, SendReceipt, MESSAGING_PRODUCT,
};

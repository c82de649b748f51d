//! Wire messages: typed inbound decoding, outbound envelopes.

use perpmatch_types::{PerpmatchError, Result};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::subscription::SubscriptionFilter;

/// Everything a client may send, decoded by tag.
///
/// Anything that fails to decode (bad JSON, unknown type, unknown channel,
/// missing fields) is a `MalformedMessage`; there is no loosely-typed
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    #[serde(rename_all = "camelCase")]
    Subscribe {
        request_id: String,
        channel: Channel,
        #[serde(default)]
        payload: SubscriptionFilter,
    },
    #[serde(rename_all = "camelCase")]
    Unsubscribe { request_id: String },
}

impl InboundMessage {
    /// Decode one inbound frame.
    ///
    /// # Errors
    /// `MalformedMessage` carrying the decoder's reason.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| PerpmatchError::MalformedMessage {
            reason: err.to_string(),
        })
    }
}

/// Outbound update: coalesced payload items for one subscription.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessage {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub channel: Channel,
    pub payload: Vec<serde_json::Value>,
    pub request_id: String,
}

impl UpdateMessage {
    #[must_use]
    pub fn new(channel: Channel, payload: Vec<serde_json::Value>, request_id: String) -> Self {
        Self {
            message_type: "update",
            channel,
            payload,
            request_id,
        }
    }
}

/// Outbound error notice, sent before a connection is terminated.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub message: String,
}

impl ErrorMessage {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message_type: "error",
            message: message.into(),
        }
    }
}

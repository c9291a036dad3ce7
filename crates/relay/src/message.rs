//! Messages submitted to, and acknowledgements returned from, the broker.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;

use crate::{DedupKey, Subject};

/// Header carrying the dedup key. JetStream drops repeated ids within the
/// stream's duplicate window.
pub const MSG_ID_HEADER: &str = "Nats-Msg-Id";

/// One webhook delivery on its way to the broker.
///
/// Built per inbound request and dropped once the publish sequence ends,
/// whichever way it ends. Never persisted locally.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    subject: Subject,
    payload: Bytes,
    headers: BTreeMap<String, String>,
}

impl OutboundMessage {
    /// Creates a message with no headers.
    pub fn new(subject: Subject, payload: impl Into<Bytes>) -> Self {
        Self {
            subject,
            payload: payload.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a metadata header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attaches the dedup key as [`MSG_ID_HEADER`]. `None` leaves the message
    /// without a dedup hint.
    #[must_use]
    pub fn with_dedup_key(self, key: Option<DedupKey>) -> Self {
        match key {
            Some(key) => self.with_header(MSG_ID_HEADER, key.as_str()),
            None => self,
        }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The dedup key, if one was attached.
    pub fn dedup_key(&self) -> Option<&str> {
        self.headers.get(MSG_ID_HEADER).map(String::as_str)
    }
}

/// Broker acknowledgement for a single accepted publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAck {
    /// Stream that stored the message.
    pub stream: String,
    /// Stream sequence number assigned to the message.
    pub sequence: u64,
    /// `true` when the broker recognised the dedup key and kept the earlier copy.
    pub duplicate: bool,
}

/// Outcome of a successful [`crate::ReliablePublisher::publish_with_retry`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub ack: PublishAck,
    /// Attempts made, including the successful one (1-based).
    pub attempts: u32,
    /// Wall-clock time from the start of the call to the ack.
    pub elapsed: Duration,
}

//! Error types for the relay domain.
//!
//! Errors are split by who sees them:
//!
//! - [`TransportError`] describes one failed publish attempt. It never leaves
//!   [`crate::ReliablePublisher`]; it is only carried inside
//!   [`PublishError::Exhausted`] for diagnostics.
//! - [`PublishError`] is the only error a publish caller observes.
//! - [`StreamLookupError`] and [`ProvisionError`] belong to startup.
//! - [`PolicyError`] rejects an unusable retry configuration.

use std::time::Duration;

use thiserror::Error;

use crate::{StreamName, Subject};

// ---------------------------------------------------------------------------
// Publish path
// ---------------------------------------------------------------------------

/// A single publish attempt failed. Every variant is transient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection was not healthy, so no request was sent.
    #[error("Broker connection is not healthy")]
    NotConnected,

    /// The broker did not acknowledge within the remaining budget.
    #[error("Broker did not acknowledge within {after:?}")]
    Timeout {
        /// How long the attempt was allowed to run.
        after: Duration,
    },

    /// The client or server reported an error for this publish.
    #[error("Broker rejected publish: {message}")]
    Rejected {
        /// Transport-provided description.
        message: String,
    },
}

/// Errors returned by [`crate::ReliablePublisher::publish_with_retry`].
///
/// `InvalidMessage` is an input problem and is returned before any attempt.
/// `Exhausted` means the broker could not be reached in time; the caller
/// should ask the provider to redeliver.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The message cannot be published as given.
    #[error("Invalid outbound message: {reason}")]
    InvalidMessage {
        /// What is wrong with the message.
        reason: String,
    },

    /// All attempts failed or the time budget ran out.
    #[error("Failed to publish to '{subject}' after {attempts} attempt(s) in {elapsed:?}")]
    Exhausted {
        /// Subject the message was destined for.
        subject: Subject,
        /// Attempts actually made.
        attempts: u32,
        /// Wall-clock time spent in the call.
        elapsed: Duration,
        /// Failure of the final attempt; `None` if the budget ran out before
        /// the first attempt.
        #[source]
        last_error: Option<TransportError>,
    },
}

// ---------------------------------------------------------------------------
// Startup path
// ---------------------------------------------------------------------------

/// Result of looking up a stream that could not be returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamLookupError {
    /// The broker confirmed the stream does not exist.
    #[error("Stream not found")]
    NotFound,

    /// Any other failure (permissions, timeouts, JetStream disabled, ...).
    #[error("{message}")]
    Other {
        /// Transport-provided description.
        message: String,
    },
}

/// Stream provisioning failed. Fatal: the service must not start without its streams.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    /// Checking whether the stream exists failed for a reason other than "not found".
    #[error("Failed to look up stream '{stream}': {message}")]
    Lookup {
        /// Stream being checked.
        stream: StreamName,
        /// Underlying failure.
        message: String,
    },

    /// The stream was missing and creating it failed.
    #[error("Failed to create stream '{stream}': {message}")]
    Create {
        /// Stream being created.
        stream: StreamName,
        /// Underlying failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// A retry policy or stream retention value is out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}: {message}")]
pub struct PolicyError {
    /// Name of the offending setting.
    pub field: &'static str,
    /// Why it was rejected.
    pub message: String,
}

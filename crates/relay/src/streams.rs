//! Stream descriptors and startup provisioning.
//!
//! One stream per provider, each capturing that provider's whole subject
//! namespace (`gitlab.>`, `github.>`) with bounded retention. Provisioning runs
//! once, before the service accepts traffic, and never modifies a stream that
//! already exists.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{PolicyError, Provider, ProvisionError, StreamLookupError, StreamName};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// What the broker does when a stream reaches a retention limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardPolicy {
    /// Evict the oldest messages to make room.
    #[default]
    Old,
    /// Refuse new messages.
    New,
}

/// Retention limits applied to every provisioned stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub max_messages: u64,
    pub discard: DiscardPolicy,
}

impl RetentionPolicy {
    /// Builds a discard-oldest policy from a day count and message cap.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if either limit is zero.
    pub fn new(max_age_days: u64, max_messages: u64) -> Result<Self, PolicyError> {
        if max_age_days == 0 {
            return Err(PolicyError {
                field: "max_age_days",
                message: "must be greater than zero".to_string(),
            });
        }
        if max_messages == 0 {
            return Err(PolicyError {
                field: "max_messages",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            max_age: Duration::from_secs(max_age_days.saturating_mul(SECONDS_PER_DAY)),
            max_messages,
            discard: DiscardPolicy::Old,
        })
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(7 * SECONDS_PER_DAY),
            max_messages: 1_000_000,
            discard: DiscardPolicy::Old,
        }
    }
}

/// A stream the service requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: StreamName,
    pub subjects: Vec<String>,
    pub retention: RetentionPolicy,
}

impl StreamDescriptor {
    /// The stream holding every subject published for `provider`.
    pub fn for_provider(provider: Provider, retention: RetentionPolicy) -> Self {
        Self {
            name: provider.stream_name(),
            subjects: vec![provider.subject_pattern()],
            retention,
        }
    }
}

/// Whether provisioning found or created a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Existing,
    Created,
}

/// Broker-side stream administration.
#[async_trait]
pub trait StreamCatalog: Send + Sync {
    /// Checks that the named stream exists.
    ///
    /// Implementations must map the broker's "not found" signal to
    /// [`StreamLookupError::NotFound`] and everything else to
    /// [`StreamLookupError::Other`].
    async fn lookup(&self, name: &StreamName) -> Result<(), StreamLookupError>;

    /// Creates the stream described by `descriptor`.
    async fn create(&self, descriptor: &StreamDescriptor) -> Result<(), ProvisionError>;
}

/// Ensures every descriptor's stream exists, creating missing ones.
///
/// Stops at the first failure. A lookup error other than "not found" is fatal
/// so the service never runs without its streams.
#[instrument(skip_all, fields(streams = descriptors.len()))]
pub async fn initialize_streams(
    catalog: &dyn StreamCatalog,
    descriptors: &[StreamDescriptor],
) -> Result<Vec<(StreamName, StreamStatus)>, ProvisionError> {
    let mut report = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let status = match catalog.lookup(&descriptor.name).await {
            Ok(()) => {
                info!(stream = %descriptor.name, "Stream already exists");
                StreamStatus::Existing
            }
            Err(StreamLookupError::NotFound) => {
                catalog.create(descriptor).await?;
                info!(
                    stream = %descriptor.name,
                    subjects = ?descriptor.subjects,
                    max_age_secs = descriptor.retention.max_age.as_secs(),
                    max_messages = descriptor.retention.max_messages,
                    "Stream created"
                );
                StreamStatus::Created
            }
            Err(StreamLookupError::Other { message }) => {
                return Err(ProvisionError::Lookup {
                    stream: descriptor.name.clone(),
                    message,
                });
            }
        };
        report.push((descriptor.name.clone(), status));
    }

    Ok(report)
}

#[cfg(test)]
#[path = "streams_tests.rs"]
mod tests;

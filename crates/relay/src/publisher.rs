//! Bounded-retry publishing.
//!
//! [`ReliablePublisher::publish_with_retry`] is the boundary between "webhook
//! accepted" and "webhook durable". It retries transient failures with
//! jittered exponential backoff but never spends more than the policy's total
//! budget (plus the tail of one in-flight attempt), so the HTTP layer can set
//! its own response timeout a fixed margin above that budget.
//!
//! Each call owns its attempt context (start instant, counter, remaining
//! budget). Concurrent calls share only the connection handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, instrument, warn};

use crate::{
    jittered_backoff, BrokerConnection, OutboundMessage, PublishAck, PublishError, PublishPolicy,
    PublishReceipt, TransportError,
};

/// Publishes messages through a shared [`BrokerConnection`] under a [`PublishPolicy`].
#[derive(Clone)]
pub struct ReliablePublisher {
    connection: Arc<dyn BrokerConnection>,
    policy: PublishPolicy,
}

impl ReliablePublisher {
    pub fn new(connection: Arc<dyn BrokerConnection>, policy: PublishPolicy) -> Self {
        Self { connection, policy }
    }

    pub fn policy(&self) -> &PublishPolicy {
        &self.policy
    }

    /// Whether the underlying connection is currently usable.
    pub fn is_ready(&self) -> bool {
        self.connection.is_connected()
    }

    /// Publishes `message`, retrying until it is acknowledged, `max_retries`
    /// attempts have failed, or the time budget is spent.
    ///
    /// Attempts run strictly one after another. An attempt against an
    /// unhealthy connection fails immediately instead of waiting out its
    /// timeout.
    ///
    /// # Errors
    ///
    /// - [`PublishError::InvalidMessage`] if the subject is unusable; no attempt is made.
    /// - [`PublishError::Exhausted`] once the attempt or time budget runs out.
    #[instrument(
        name = "publish_with_retry",
        skip_all,
        fields(subject = %message.subject(), dedup_key = message.dedup_key())
    )]
    pub async fn publish_with_retry(
        &self,
        message: &OutboundMessage,
    ) -> Result<PublishReceipt, PublishError> {
        validate(message)?;

        let started_at = Instant::now();
        let budget = self.policy.total_budget();
        let max_retries = self.policy.max_retries();

        let mut attempts = 0;
        let mut last_error = None;

        for attempt in 0..max_retries {
            let remaining = budget.saturating_sub(started_at.elapsed());
            if remaining.is_zero() {
                debug!(attempts, "Publish budget exhausted before next attempt");
                break;
            }

            attempts += 1;
            match self.attempt_once(message, remaining).await {
                Ok(ack) => {
                    let elapsed = started_at.elapsed();
                    debug!(
                        attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        stream = %ack.stream,
                        sequence = ack.sequence,
                        duplicate = ack.duplicate,
                        "Message published"
                    );
                    return Ok(PublishReceipt {
                        ack,
                        attempts,
                        elapsed,
                    });
                }
                Err(err) if attempt + 1 == max_retries => {
                    last_error = Some(err);
                }
                Err(err) => {
                    let remaining = budget.saturating_sub(started_at.elapsed());
                    let delay = jittered_backoff(attempt, self.policy.retry_base_delay(), remaining);
                    warn!(
                        attempt = attempts,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "Publish attempt failed, retrying"
                    );
                    last_error = Some(err);

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let elapsed = started_at.elapsed();
        error!(
            attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            error = last_error.as_ref().map(tracing::field::display),
            "Failed to publish message"
        );

        Err(PublishError::Exhausted {
            subject: message.subject().clone(),
            attempts,
            elapsed,
            last_error,
        })
    }

    /// One publish raced against the remaining budget.
    async fn attempt_once(
        &self,
        message: &OutboundMessage,
        remaining: Duration,
    ) -> Result<PublishAck, TransportError> {
        if !self.connection.is_connected() {
            return Err(TransportError::NotConnected);
        }

        // Dropping the losing branch cancels it; no timer outlives the attempt.
        match tokio::time::timeout(remaining, self.connection.publish(message)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout { after: remaining }),
        }
    }
}

impl std::fmt::Debug for ReliablePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReliablePublisher")
            .field("policy", &self.policy)
            .field("connected", &self.connection.is_connected())
            .finish()
    }
}

fn validate(message: &OutboundMessage) -> Result<(), PublishError> {
    let subject = message.subject().as_str();
    if subject.is_empty() {
        return Err(PublishError::InvalidMessage {
            reason: "subject is empty".to_string(),
        });
    }
    if subject.chars().any(char::is_whitespace) {
        return Err(PublishError::InvalidMessage {
            reason: format!("subject '{subject}' contains whitespace"),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;

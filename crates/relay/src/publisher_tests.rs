use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::{derive_subject, Provider, Subject};

/// What the scripted connection does on one `publish` call.
#[derive(Debug, Clone)]
enum Step {
    Ack,
    Reject,
    /// Never resolves; only the attempt timeout ends it.
    Hang,
    /// Acknowledges after the given delay.
    SlowAck(Duration),
}

struct ScriptedConnection {
    healthy: AtomicBool,
    script: Mutex<VecDeque<Step>>,
    /// Used once the script runs out.
    fallback: Step,
    publishes: AtomicU32,
}

impl ScriptedConnection {
    fn new(script: impl IntoIterator<Item = Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            healthy: AtomicBool::new(true),
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            publishes: AtomicU32::new(0),
        })
    }

    fn always(step: Step) -> Arc<Self> {
        Self::new([], step)
    }

    fn unhealthy() -> Arc<Self> {
        let connection = Self::always(Step::Ack);
        connection.healthy.store(false, Ordering::SeqCst);
        connection
    }

    fn publishes(&self) -> u32 {
        self.publishes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerConnection for ScriptedConnection {
    fn is_connected(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn publish(&self, message: &OutboundMessage) -> Result<PublishAck, TransportError> {
        let sequence = u64::from(self.publishes.fetch_add(1, Ordering::SeqCst)) + 1;
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let ack = PublishAck {
            stream: "GITLAB".to_string(),
            sequence,
            duplicate: message.dedup_key() == Some("gitlab-dup"),
        };

        match step {
            Step::Ack => Ok(ack),
            Step::Reject => Err(TransportError::Rejected {
                message: "no responders available for request".to_string(),
            }),
            Step::Hang => std::future::pending().await,
            Step::SlowAck(delay) => {
                tokio::time::sleep(delay).await;
                Ok(ack)
            }
        }
    }
}

fn policy(max_retries: u32, base_ms: u64, budget_ms: u64) -> PublishPolicy {
    PublishPolicy::new(
        max_retries,
        Duration::from_millis(base_ms),
        Duration::from_millis(budget_ms),
    )
    .unwrap()
}

fn message() -> OutboundMessage {
    OutboundMessage::new(
        derive_subject(Provider::GitLab, "push", Some("group/myproject")),
        &b"{\"object_kind\":\"push\"}"[..],
    )
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

// ---------------------------------------------------------------------------
// Success paths
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_first_attempt_success_returns_immediately() {
    let connection = ScriptedConnection::always(Step::Ack);
    let publisher = ReliablePublisher::new(connection.clone(), policy(3, 100, 5_000));

    let receipt = publisher.publish_with_retry(&message()).await.unwrap();

    assert_eq!(receipt.attempts, 1);
    assert_eq!(receipt.elapsed, Duration::ZERO);
    assert_eq!(receipt.ack.sequence, 1);
    assert_eq!(connection.publishes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_success_after_transient_failures_stays_within_backoff_bounds() {
    let connection = ScriptedConnection::new([Step::Reject, Step::Reject], Step::Ack);
    let publisher = ReliablePublisher::new(connection.clone(), policy(3, 100, 5_000));

    let receipt = publisher.publish_with_retry(&message()).await.unwrap();

    assert_eq!(receipt.attempts, 3);
    assert_eq!(connection.publishes(), 3);
    // Two backoffs: 100ms and 200ms nominal, each within ±25%.
    assert!(receipt.elapsed >= ms(225), "elapsed {:?}", receipt.elapsed);
    assert!(receipt.elapsed <= ms(375), "elapsed {:?}", receipt.elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_slow_ack_within_budget_succeeds() {
    let connection = ScriptedConnection::always(Step::SlowAck(ms(300)));
    let publisher = ReliablePublisher::new(connection.clone(), policy(3, 100, 1_000));

    let receipt = publisher.publish_with_retry(&message()).await.unwrap();

    assert_eq!(receipt.attempts, 1);
    assert_eq!(receipt.elapsed, ms(300));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_flag_is_passed_through() {
    let connection = ScriptedConnection::always(Step::Ack);
    let publisher = ReliablePublisher::new(connection, policy(3, 100, 5_000));
    let message = message().with_header(crate::MSG_ID_HEADER, "gitlab-dup");

    let receipt = publisher.publish_with_retry(&message).await.unwrap();

    assert!(receipt.ack.duplicate);
}

// ---------------------------------------------------------------------------
// Exhaustion
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_rejected_every_time_makes_exactly_max_attempts() {
    let connection = ScriptedConnection::always(Step::Reject);
    let publisher = ReliablePublisher::new(connection.clone(), policy(4, 100, 10_000));

    let err = publisher.publish_with_retry(&message()).await.unwrap_err();

    assert_eq!(connection.publishes(), 4);
    match err {
        PublishError::Exhausted {
            subject,
            attempts,
            elapsed,
            last_error,
        } => {
            assert_eq!(subject.as_str(), "gitlab.group~myproject.push");
            assert_eq!(attempts, 4);
            // Three backoffs (100 + 200 + 400 nominal); none after the last attempt.
            assert!(elapsed >= ms(525), "elapsed {elapsed:?}");
            assert!(elapsed <= ms(875), "elapsed {elapsed:?}");
            assert!(matches!(last_error, Some(TransportError::Rejected { .. })));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_unhealthy_connection_fails_fast_without_publishing() {
    let connection = ScriptedConnection::unhealthy();
    let publisher = ReliablePublisher::new(connection.clone(), policy(3, 100, 5_000));

    let err = publisher.publish_with_retry(&message()).await.unwrap_err();

    assert_eq!(connection.publishes(), 0);
    match err {
        PublishError::Exhausted {
            attempts,
            elapsed,
            last_error,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert!(elapsed < ms(5_000));
            assert_eq!(last_error, Some(TransportError::NotConnected));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_hanging_publish_is_cut_off_at_budget() {
    let connection = ScriptedConnection::always(Step::Hang);
    let publisher = ReliablePublisher::new(connection.clone(), policy(3, 100, 2_000));

    let err = publisher.publish_with_retry(&message()).await.unwrap_err();

    match err {
        PublishError::Exhausted {
            attempts,
            elapsed,
            last_error,
            ..
        } => {
            // The first attempt consumes the whole budget; no time is left for another.
            assert_eq!(attempts, 1);
            assert_eq!(elapsed, ms(2_000));
            assert_eq!(last_error, Some(TransportError::Timeout { after: ms(2_000) }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_backoff_never_sleeps_past_budget() {
    // Nominal backoffs (200, 400, ...) are larger than the whole budget.
    let connection = ScriptedConnection::always(Step::Reject);
    let publisher = ReliablePublisher::new(connection.clone(), policy(10, 200, 150));

    let err = publisher.publish_with_retry(&message()).await.unwrap_err();

    match err {
        PublishError::Exhausted {
            attempts, elapsed, ..
        } => {
            assert!(elapsed <= ms(150), "elapsed {elapsed:?}");
            assert!(attempts < 10);
            assert_eq!(connection.publishes(), attempts);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_total_time_bounded_by_budget_plus_one_attempt() {
    // The ack would take 10s; the attempt timer cuts it off at the budget.
    let connection = ScriptedConnection::always(Step::SlowAck(ms(10_000)));
    let publisher = ReliablePublisher::new(connection, policy(5, 50, 1_000));

    let started = Instant::now();
    let result = publisher.publish_with_retry(&message()).await;

    assert!(result.is_err());
    assert!(started.elapsed() <= ms(1_000));
}

// ---------------------------------------------------------------------------
// Recovery and concurrency
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_recovers_when_connection_comes_back() {
    let connection = ScriptedConnection::unhealthy();
    let publisher = ReliablePublisher::new(connection.clone(), policy(5, 100, 5_000));

    let reconnect = {
        let connection = connection.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ms(120)).await;
            connection.healthy.store(true, Ordering::SeqCst);
        })
    };

    let receipt = publisher.publish_with_retry(&message()).await.unwrap();
    reconnect.await.unwrap();

    assert!(receipt.attempts >= 2);
    assert_eq!(connection.publishes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_calls_are_independent() {
    let connection = ScriptedConnection::new([Step::Reject, Step::Reject], Step::Ack);
    let publisher = ReliablePublisher::new(connection.clone(), policy(3, 100, 5_000));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let publisher = publisher.clone();
            tokio::spawn(async move { publisher.publish_with_retry(&message()).await })
        })
        .collect();

    let mut total_attempts = 0;
    for handle in handles {
        let receipt = handle.await.unwrap().unwrap();
        total_attempts += receipt.attempts;
    }

    // Two calls each absorbed one scripted rejection.
    assert_eq!(total_attempts, 10);
    assert_eq!(connection.publishes(), 10);
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_subject_is_rejected_without_attempts() {
    let connection = ScriptedConnection::always(Step::Ack);
    let publisher = ReliablePublisher::new(connection.clone(), policy(3, 100, 5_000));
    let message = OutboundMessage::new(Subject(String::new()), &b"{}"[..]);

    let err = publisher.publish_with_retry(&message).await.unwrap_err();

    assert!(matches!(err, PublishError::InvalidMessage { .. }));
    assert_eq!(connection.publishes(), 0);
}

#[tokio::test]
async fn test_subject_with_whitespace_is_rejected() {
    let connection = ScriptedConnection::always(Step::Ack);
    let publisher = ReliablePublisher::new(connection.clone(), policy(3, 100, 5_000));
    let message = OutboundMessage::new(Subject::new("gitlab.a b.push").unwrap(), &b"{}"[..]);

    let err = publisher.publish_with_retry(&message).await.unwrap_err();

    assert!(matches!(err, PublishError::InvalidMessage { .. }));
    assert_eq!(connection.publishes(), 0);
}

#[tokio::test]
async fn test_is_ready_tracks_connection() {
    let connection = ScriptedConnection::unhealthy();
    let publisher = ReliablePublisher::new(connection.clone(), PublishPolicy::default());
    assert!(!publisher.is_ready());

    connection.healthy.store(true, Ordering::SeqCst);
    assert!(publisher.is_ready());
}

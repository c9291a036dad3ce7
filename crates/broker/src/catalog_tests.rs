use std::time::Duration;

use async_nats::jetstream::context::{GetStreamError, GetStreamErrorKind};
use relay::{Provider, RetentionPolicy};

use super::*;

fn api_error(code: u64, err_code: u64, description: &str) -> jetstream::Error {
    serde_json::from_value(serde_json::json!({
        "code": code,
        "err_code": err_code,
        "description": description,
    }))
    .unwrap()
}

// ---------------------------------------------------------------------------
// classify_lookup_error
// ---------------------------------------------------------------------------

#[test]
fn test_structured_not_found_code_is_not_found() {
    let err = GetStreamError::from(GetStreamErrorKind::JetStream(api_error(
        404,
        10059,
        "stream not found",
    )));
    assert_eq!(classify_lookup_error(&err), StreamLookupError::NotFound);
}

#[test]
fn test_structured_code_wins_over_message_text() {
    // A different code whose description happens to mention the phrase.
    let err = GetStreamError::from(GetStreamErrorKind::JetStream(api_error(
        503,
        10076,
        "jetstream not enabled, stream not found",
    )));
    assert!(matches!(
        classify_lookup_error(&err),
        StreamLookupError::Other { .. }
    ));
}

#[test]
fn test_other_structured_errors_are_other() {
    let err = GetStreamError::from(GetStreamErrorKind::JetStream(api_error(
        503,
        10039,
        "jetstream not enabled for account",
    )));
    match classify_lookup_error(&err) {
        StreamLookupError::Other { message } => assert!(message.contains("not enabled")),
        other => panic!("expected Other, got {other:?}"),
    }
}

#[test]
fn test_uncoded_request_failure_is_other() {
    let err = GetStreamError::from(GetStreamErrorKind::Request);
    assert!(matches!(
        classify_lookup_error(&err),
        StreamLookupError::Other { .. }
    ));
}

#[test]
fn test_message_fallback_is_case_insensitive() {
    assert!(message_indicates_not_found("nats: Stream Not Found"));
    assert!(message_indicates_not_found("STREAM NOT FOUND"));
    assert!(!message_indicates_not_found("consumer not found"));
    assert!(!message_indicates_not_found("request timed out"));
}

// ---------------------------------------------------------------------------
// stream_config
// ---------------------------------------------------------------------------

#[test]
fn test_stream_config_for_gitlab() {
    let descriptor = StreamDescriptor::for_provider(Provider::GitLab, RetentionPolicy::default());
    let config = stream_config(&descriptor);

    assert_eq!(config.name, "GITLAB");
    assert_eq!(config.subjects, vec!["gitlab.>".to_string()]);
    assert_eq!(config.max_age, Duration::from_secs(7 * 24 * 60 * 60));
    assert_eq!(config.max_messages, 1_000_000);
    assert_eq!(config.discard, stream::DiscardPolicy::Old);
    assert_eq!(config.retention, NatsRetention::Limits);
    assert_eq!(config.storage, StorageType::File);
}

#[test]
fn test_stream_config_saturates_message_cap() {
    let retention = RetentionPolicy::new(1, u64::MAX).unwrap();
    let descriptor = StreamDescriptor::for_provider(Provider::GitHub, retention);
    let config = stream_config(&descriptor);

    assert_eq!(config.name, "GITHUB");
    assert_eq!(config.max_messages, i64::MAX);
    assert_eq!(config.max_age, Duration::from_secs(24 * 60 * 60));
}

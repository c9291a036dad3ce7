use std::collections::HashMap;

use super::*;

fn lookup<'a>(headers: &'a HashMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<&'a str> {
    move |name| headers.get(name).copied()
}

#[test]
fn test_idempotency_header_wins_over_event_id() {
    let headers = HashMap::from([
        ("idempotency-key", "abc123"),
        ("x-gitlab-event-uuid", "c1f2e7d0-0000-4000-8000-000000000001"),
    ]);

    let key = derive_dedup_key(Provider::GitLab, lookup(&headers));

    assert_eq!(key.map(|k| k.as_str().to_string()), Some("gitlab-abc123".to_string()));
}

#[test]
fn test_event_id_used_when_no_idempotency_header() {
    let headers = HashMap::from([("x-gitlab-event-uuid", "c1f2e7d0")]);

    let key = derive_dedup_key(Provider::GitLab, lookup(&headers));

    assert_eq!(key.map(|k| k.as_str().to_string()), Some("gitlab-c1f2e7d0".to_string()));
}

#[test]
fn test_github_uses_delivery_header() {
    let headers = HashMap::from([("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958")]);

    let key = derive_dedup_key(Provider::GitHub, lookup(&headers));

    assert_eq!(
        key.map(|k| k.as_str().to_string()),
        Some("github-72d3162e-cc78-11e3-81ab-4c9367dc0958".to_string())
    );
}

#[test]
fn test_no_headers_yields_no_key() {
    let headers = HashMap::new();

    assert!(derive_dedup_key(Provider::GitLab, lookup(&headers)).is_none());
    assert!(derive_dedup_key(Provider::GitHub, lookup(&headers)).is_none());
}

#[test]
fn test_other_providers_event_header_is_ignored() {
    // A GitHub delivery id on a GitLab request is not a GitLab event id.
    let headers = HashMap::from([("x-github-delivery", "abc")]);

    assert!(derive_dedup_key(Provider::GitLab, lookup(&headers)).is_none());
}

#[test]
fn test_blank_idempotency_header_falls_through() {
    let headers = HashMap::from([("idempotency-key", "   "), ("x-github-delivery", "d-1")]);

    let key = derive_dedup_key(Provider::GitHub, lookup(&headers));

    assert_eq!(key.map(|k| k.as_str().to_string()), Some("github-d-1".to_string()));
}

#[test]
fn test_values_are_trimmed() {
    let headers = HashMap::from([("idempotency-key", " abc123 ")]);

    let key = derive_dedup_key(Provider::GitLab, lookup(&headers));

    assert_eq!(key.map(|k| k.as_str().to_string()), Some("gitlab-abc123".to_string()));
}

#[test]
fn test_same_raw_value_differs_across_providers() {
    let headers = HashMap::from([("idempotency-key", "same")]);

    let gitlab = derive_dedup_key(Provider::GitLab, lookup(&headers));
    let github = derive_dedup_key(Provider::GitHub, lookup(&headers));

    assert_ne!(gitlab, github);
}

//! Idempotency-key derivation.
//!
//! The broker discards a publish whose `Nats-Msg-Id` matches one it has already
//! stored within its duplicate window. The key is taken, in order, from:
//!
//! 1. the caller-supplied `Idempotency-Key` header;
//! 2. the provider's own delivery identifier header
//!    ([`Provider::event_id_header`]);
//! 3. nothing; the message is published without a dedup hint.
//!
//! Both sources are prefixed with the provider name so identical raw values
//! from different providers never collide.

use crate::{DedupKey, Provider};

/// Header a caller may set to control deduplication explicitly.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Derives the dedup key for a delivery.
///
/// `header` looks up a request header by lowercase name. Blank values are
/// treated as absent.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use relay::{derive_dedup_key, Provider};
///
/// let headers = HashMap::from([
///     ("idempotency-key", "abc123"),
///     ("x-gitlab-event-uuid", "4f1b"),
/// ]);
/// let key = derive_dedup_key(Provider::GitLab, |name| headers.get(name).copied());
/// assert_eq!(key.unwrap().as_str(), "gitlab-abc123");
/// ```
pub fn derive_dedup_key<'a, F>(provider: Provider, header: F) -> Option<DedupKey>
where
    F: Fn(&str) -> Option<&'a str>,
{
    [IDEMPOTENCY_KEY_HEADER, provider.event_id_header()]
        .into_iter()
        .filter_map(|name| header(name).map(str::trim))
        .find(|value| !value.is_empty())
        .map(|value| DedupKey(format!("{}-{}", provider.as_str(), value)))
}

#[cfg(test)]
#[path = "dedup_tests.rs"]
mod tests;

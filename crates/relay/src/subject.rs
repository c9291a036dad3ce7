//! Routing-key derivation.
//!
//! Subjects have exactly three dot-delimited tokens:
//!
//! ```text
//! {provider}.{scope}.{event}
//! gitlab.group~myproject.push
//! github.octo-org~hello-world.pull_request
//! ```
//!
//! The scope path (`owner/repo`, `group/subgroup/project`) is flattened into a
//! single token by rewriting `/` to `~`, so consumers can filter positionally
//! with `gitlab.*.push` regardless of nesting depth. Missing or empty segments
//! become `?` rather than disappearing. Characters that would split the token
//! or alias the separator and placeholder are percent-escaped, which keeps the
//! mapping injective over scope paths.

use crate::{Provider, Subject};

/// Rendered in place of a missing or empty scope segment or event type.
pub const PLACEHOLDER: char = '?';

/// Replaces `/` between scope segments.
pub const SCOPE_SEPARATOR: char = '~';

/// Builds the subject for one webhook delivery.
///
/// Pure and deterministic: identical inputs always yield an identical subject.
///
/// # Examples
///
/// ```rust
/// use relay::{derive_subject, Provider};
///
/// let subject = derive_subject(Provider::GitLab, "push", Some("group/myproject"));
/// assert_eq!(subject.as_str(), "gitlab.group~myproject.push");
///
/// let subject = derive_subject(Provider::GitHub, "ping", None);
/// assert_eq!(subject.as_str(), "github.?.ping");
/// ```
pub fn derive_subject(provider: Provider, event_type: &str, scope_path: Option<&str>) -> Subject {
    let mut subject = String::with_capacity(
        provider.as_str().len() + event_type.len() + scope_path.map_or(1, str::len) + 2,
    );

    subject.push_str(provider.as_str());
    subject.push('.');
    push_scope(scope_path.unwrap_or_default(), &mut subject);
    subject.push('.');
    push_token(event_type, &mut subject);

    Subject(subject)
}

fn push_scope(scope_path: &str, out: &mut String) {
    if scope_path.is_empty() {
        out.push(PLACEHOLDER);
        return;
    }

    for (index, segment) in scope_path.split('/').enumerate() {
        if index > 0 {
            out.push(SCOPE_SEPARATOR);
        }
        push_token(segment, out);
    }
}

fn push_token(raw: &str, out: &mut String) {
    if raw.is_empty() {
        out.push(PLACEHOLDER);
        return;
    }

    for ch in raw.chars() {
        if is_reserved(ch) {
            push_escaped(ch, out);
        } else {
            out.push(ch);
        }
    }
}

/// Characters that cannot appear verbatim inside a subject token.
fn is_reserved(ch: char) -> bool {
    matches!(ch, '.' | '/' | '*' | '>' | '%')
        || ch == SCOPE_SEPARATOR
        || ch == PLACEHOLDER
        || ch.is_whitespace()
        || ch.is_control()
}

fn push_escaped(ch: char, out: &mut String) {
    let mut buf = [0u8; 4];
    for byte in ch.encode_utf8(&mut buf).bytes() {
        out.push('%');
        out.push(hex_digit(byte >> 4));
        out.push(hex_digit(byte & 0x0f));
    }
}

fn hex_digit(nibble: u8) -> char {
    char::from_digit(u32::from(nibble), 16)
        .unwrap_or('0')
        .to_ascii_uppercase()
}

#[cfg(test)]
#[path = "subject_tests.rs"]
mod tests;

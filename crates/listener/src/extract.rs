//! Event type and scope extraction from parsed webhook payloads.

use serde_json::Value;

/// GitLab event type: `object_kind`, then `event_name`, then the `X-Gitlab-Event` header.
pub fn gitlab_event_type<'a>(payload: &'a Value, header: Option<&'a str>) -> Option<&'a str> {
    non_empty_str(payload, &["object_kind"])
        .or_else(|| non_empty_str(payload, &["event_name"]))
        .or_else(|| header.map(str::trim).filter(|h| !h.is_empty()))
}

/// GitLab scope: `project.path_with_namespace`.
pub fn gitlab_scope(payload: &Value) -> Option<&str> {
    non_empty_str(payload, &["project", "path_with_namespace"])
}

/// GitHub scope: `repository.full_name`, then `organization.login`.
///
/// Organization-level events (`organization`, `member`) carry no repository.
pub fn github_scope(payload: &Value) -> Option<&str> {
    non_empty_str(payload, &["repository", "full_name"])
        .or_else(|| non_empty_str(payload, &["organization", "login"]))
}

fn non_empty_str<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(payload, |value, key| value.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;

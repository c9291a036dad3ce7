use serde_json::json;

use super::*;

#[test]
fn test_gitlab_event_type_prefers_object_kind() {
    let payload = json!({ "object_kind": "push", "event_name": "push_event" });
    assert_eq!(gitlab_event_type(&payload, Some("Push Hook")), Some("push"));
}

#[test]
fn test_gitlab_event_type_falls_back_to_event_name_then_header() {
    let payload = json!({ "event_name": "project_create" });
    assert_eq!(
        gitlab_event_type(&payload, Some("System Hook")),
        Some("project_create")
    );

    let payload = json!({ "object_kind": "" });
    assert_eq!(
        gitlab_event_type(&payload, Some(" System Hook ")),
        Some("System Hook")
    );

    assert_eq!(gitlab_event_type(&payload, Some("  ")), None);
    assert_eq!(gitlab_event_type(&payload, None), None);
}

#[test]
fn test_gitlab_event_type_ignores_non_string_values() {
    let payload = json!({ "object_kind": 42 });
    assert_eq!(gitlab_event_type(&payload, None), None);
}

#[test]
fn test_gitlab_scope_reads_project_path() {
    let payload = json!({ "project": { "path_with_namespace": "group/sub/proj" } });
    assert_eq!(gitlab_scope(&payload), Some("group/sub/proj"));
    assert_eq!(gitlab_scope(&json!({ "project": {} })), None);
    assert_eq!(gitlab_scope(&json!([1, 2, 3])), None);
}

#[test]
fn test_github_scope_prefers_repository() {
    let payload = json!({
        "repository": { "full_name": "octo-org/hello-world" },
        "organization": { "login": "octo-org" }
    });
    assert_eq!(github_scope(&payload), Some("octo-org/hello-world"));
}

#[test]
fn test_github_scope_falls_back_to_organization() {
    let payload = json!({ "organization": { "login": "octo-org" } });
    assert_eq!(github_scope(&payload), Some("octo-org"));
    assert_eq!(github_scope(&json!({})), None);
}

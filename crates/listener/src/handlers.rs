//! Route handlers.
//!
//! Every webhook handler runs the same three steps in order: authenticate,
//! parse the body as JSON, publish. A failure at one step skips the rest, so an
//! unauthenticated request never reaches the broker.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use relay::{derive_dedup_key, derive_subject, OutboundMessage, Provider};
use serde_json::{json, Value};
use tracing::{info, instrument, warn, Span};

use crate::auth::{GITHUB_SIGNATURE_HEADER, GITLAB_TOKEN_HEADER};
use crate::extract::{github_scope, gitlab_event_type, gitlab_scope};
use crate::{AppState, IngressError};

pub const GITLAB_EVENT_HEADER: &str = "x-gitlab-event";
pub const GITHUB_EVENT_HEADER: &str = "x-github-event";

pub const PROVIDER_HEADER: &str = "X-Webhook-Provider";
pub const EVENT_HEADER: &str = "X-Webhook-Event";
pub const RECEIVED_AT_HEADER: &str = "X-Webhook-Received-At";

/// `POST /webhooks/gitlab`
#[instrument(
    name = "gitlab_webhook",
    skip_all,
    fields(provider = "gitlab", subject = tracing::field::Empty)
)]
pub async fn gitlab_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, IngressError> {
    let authorized = state
        .gitlab
        .as_ref()
        .is_some_and(|auth| auth.verify(header_str(&headers, GITLAB_TOKEN_HEADER)));
    if !authorized {
        warn!("Rejected GitLab webhook with invalid token");
        return Err(IngressError::Unauthorized);
    }

    let payload = parse_payload(&body)?;
    let event_type = gitlab_event_type(&payload, header_str(&headers, GITLAB_EVENT_HEADER));
    let scope = gitlab_scope(&payload);

    relay_delivery(&state, Provider::GitLab, event_type, scope, &headers, body).await
}

/// `POST /webhooks/github`
#[instrument(
    name = "github_webhook",
    skip_all,
    fields(provider = "github", subject = tracing::field::Empty)
)]
pub async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, IngressError> {
    let signature = header_str(&headers, GITHUB_SIGNATURE_HEADER);
    let authorized = state
        .github
        .as_ref()
        .is_some_and(|auth| auth.verify(signature, &body));
    if !authorized {
        warn!(
            signature_present = signature.is_some(),
            "Rejected GitHub webhook with invalid signature"
        );
        return Err(IngressError::Unauthorized);
    }

    let payload = parse_payload(&body)?;
    let event_type = header_str(&headers, GITHUB_EVENT_HEADER)
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let scope = github_scope(&payload);

    relay_delivery(&state, Provider::GitHub, event_type, scope, &headers, body).await
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    if state.publisher.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded" })),
        )
            .into_response()
    }
}

fn parse_payload(body: &[u8]) -> Result<Value, IngressError> {
    serde_json::from_slice(body).map_err(|err| {
        warn!(error = %err, body_len = body.len(), "Rejected webhook with invalid JSON");
        IngressError::InvalidPayload(err)
    })
}

async fn relay_delivery(
    state: &AppState,
    provider: Provider,
    event_type: Option<&str>,
    scope: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, IngressError> {
    let subject = derive_subject(provider, event_type.unwrap_or_default(), scope);
    Span::current().record("subject", subject.as_str());

    let dedup_key = derive_dedup_key(provider, |name| header_str(headers, name));

    let mut message = OutboundMessage::new(subject, body)
        .with_dedup_key(dedup_key)
        .with_header(PROVIDER_HEADER, provider.as_str())
        .with_header(RECEIVED_AT_HEADER, Utc::now().to_rfc3339());
    if let Some(event_type) = event_type {
        message = message.with_header(EVENT_HEADER, event_type);
    }

    let receipt = state.publisher.publish_with_retry(&message).await?;
    info!(
        stream = %receipt.ack.stream,
        sequence = receipt.ack.sequence,
        duplicate = receipt.ack.duplicate,
        attempts = receipt.attempts,
        "Webhook published"
    );
    Ok(Json(json!({ "status": "ok" })))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

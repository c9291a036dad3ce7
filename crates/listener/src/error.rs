//! Ingress errors and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use relay::PublishError;
use serde_json::json;
use thiserror::Error;

/// A webhook delivery the service refused or could not make durable.
///
/// The response bodies are part of the provider-facing contract and do not
/// expose internal detail; the full error is logged by the handler instead.
#[derive(Debug, Error)]
pub enum IngressError {
    /// Token or signature missing or wrong. The broker is never contacted.
    #[error("Webhook authentication failed")]
    Unauthorized,

    /// Body is not valid JSON.
    #[error("Webhook payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The reliable publisher gave up. The provider should redeliver.
    #[error(transparent)]
    PublishFailed(#[from] PublishError),
}

impl IngressError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::PublishFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Invalid token",
            Self::InvalidPayload(_) => "Invalid JSON payload",
            Self::PublishFailed(_) => "Failed to publish webhook",
        }
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}

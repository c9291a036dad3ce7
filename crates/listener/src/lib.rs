//! hookstream webhook ingress.
//!
//! Receives GitLab and GitHub webhook deliveries over HTTP, authenticates
//! them, and hands each one to [`relay::ReliablePublisher`]. A 200 response
//! means the broker acknowledged the message; a 503 asks the provider to
//! redeliver later.
//!
//! | Route | Auth |
//! |-------|------|
//! | `POST /webhooks/gitlab` | `X-Gitlab-Token` shared token |
//! | `POST /webhooks/github` | `X-Hub-Signature-256` HMAC-SHA256 |
//! | `GET /health` | none |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP framing, credentials and payload field extraction
//! live here. Routing keys, dedup keys and retry decisions come from
//! [`relay`].

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;
pub mod state;

pub use auth::{GitHubAuth, GitLabAuth};
pub use error::IngressError;
pub use server::{create_router, serve};
pub use state::AppState;

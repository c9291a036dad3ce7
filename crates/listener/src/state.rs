//! Shared handler state.

use std::time::Duration;

use relay::ReliablePublisher;

use crate::{GitHubAuth, GitLabAuth};

/// Everything a request handler needs. Cheap to clone; cloned per request by axum.
#[derive(Debug, Clone)]
pub struct AppState {
    pub publisher: ReliablePublisher,
    /// `None` leaves `POST /webhooks/gitlab` unrouted.
    pub gitlab: Option<GitLabAuth>,
    /// `None` leaves `POST /webhooks/github` unrouted.
    pub github: Option<GitHubAuth>,
}

impl AppState {
    pub fn new(publisher: ReliablePublisher) -> Self {
        Self {
            publisher,
            gitlab: None,
            github: None,
        }
    }

    #[must_use]
    pub fn with_gitlab(mut self, auth: GitLabAuth) -> Self {
        self.gitlab = Some(auth);
        self
    }

    #[must_use]
    pub fn with_github(mut self, auth: GitHubAuth) -> Self {
        self.github = Some(auth);
        self
    }

    /// HTTP response deadline: the publish budget plus a fixed margin, so a
    /// publish that ends in 503 is never cut off by the server first.
    pub fn request_timeout(&self) -> Duration {
        self.publisher.policy().total_budget() + REQUEST_TIMEOUT_MARGIN
    }
}

pub const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(2);

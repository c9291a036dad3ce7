//! Upstream code-hosting providers.

use serde::{Deserialize, Serialize};

use crate::StreamName;

/// A webhook source. Each provider owns one stream and one subject namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    GitLab,
}

impl Provider {
    /// All supported providers, in a stable order.
    pub const ALL: [Provider; 2] = [Provider::GitHub, Provider::GitLab];

    /// Lowercase provider name; the first subject token and the dedup-key prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
        }
    }

    /// Header carrying the provider's own unique delivery identifier.
    pub fn event_id_header(self) -> &'static str {
        match self {
            Self::GitHub => "x-github-delivery",
            Self::GitLab => "x-gitlab-event-uuid",
        }
    }

    /// Name of the JetStream stream holding this provider's events.
    pub fn stream_name(self) -> StreamName {
        let name = match self {
            Self::GitHub => "GITHUB",
            Self::GitLab => "GITLAB",
        };
        StreamName(name.to_string())
    }

    /// Wildcard subject pattern covering every subject this provider publishes.
    pub fn subject_pattern(self) -> String {
        format!("{}.>", self.as_str())
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

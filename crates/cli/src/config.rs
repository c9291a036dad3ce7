//! Service configuration.
//!
//! Values come from three layers, later ones winning:
//!
//! 1. built-in defaults;
//! 2. an optional TOML file named by `HOOKSTREAM_CONFIG`;
//! 3. environment variables (`PORT`, `NATS_URL`, `GITLAB_WEBHOOK_TOKEN`, ...).
//!
//! The merged result is validated before anything connects.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use broker::BrokerSettings;
use relay::{PolicyError, Provider, PublishPolicy, RetentionPolicy, StreamDescriptor};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the optional TOML file.
pub const CONFIG_PATH_ENV: &str = "HOOKSTREAM_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key} ('{value}'): {message}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        message: String,
    },

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub publish: PublishConfig,
    pub streams: StreamsConfig,
    pub gitlab: GitLabConfig,
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub servers: Vec<String>,
    pub token: Option<String>,
    pub reconnect_wait_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            token: None,
            reconnect_wait_ms: 2000,
        }
    }
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("servers", &self.servers)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .field("reconnect_wait_ms", &self.reconnect_wait_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub timeout_ms: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_ms: 100,
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamsConfig {
    pub max_age_days: u64,
    pub max_messages: u64,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            max_age_days: 7,
            max_messages: 1_000_000,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// Shared `X-Gitlab-Token` value. Unset disables the GitLab route.
    pub token: Option<String>,
}

impl std::fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabConfig")
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// HMAC secret for `X-Hub-Signature-256`. Unset disables the GitHub route.
    pub secret: Option<String>,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl AppConfig {
    /// Loads the process configuration from `HOOKSTREAM_CONFIG` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overrides fields from variables returned by `lookup`.
    ///
    /// Blank values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }

        if let Some(urls) = get("NATS_URL") {
            self.broker.servers = urls
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(token) = get("NATS_TOKEN") {
            self.broker.token = Some(token);
        }
        if let Some(wait) = get("NATS_RECONNECT_WAIT_MS") {
            self.broker.reconnect_wait_ms = parse_env("NATS_RECONNECT_WAIT_MS", &wait)?;
        }

        if let Some(retries) = get("PUBLISH_MAX_RETRIES") {
            self.publish.max_retries = parse_env("PUBLISH_MAX_RETRIES", &retries)?;
        }
        if let Some(delay) = get("PUBLISH_RETRY_BASE_DELAY_MS") {
            self.publish.retry_base_delay_ms = parse_env("PUBLISH_RETRY_BASE_DELAY_MS", &delay)?;
        }
        if let Some(timeout) = get("PUBLISH_TIMEOUT_MS") {
            self.publish.timeout_ms = parse_env("PUBLISH_TIMEOUT_MS", &timeout)?;
        }

        if let Some(days) = get("STREAM_MAX_AGE_DAYS") {
            self.streams.max_age_days = parse_env("STREAM_MAX_AGE_DAYS", &days)?;
        }
        if let Some(max) = get("STREAM_MAX_MESSAGES") {
            self.streams.max_messages = parse_env("STREAM_MAX_MESSAGES", &max)?;
        }

        if let Some(token) = get("GITLAB_WEBHOOK_TOKEN") {
            self.gitlab.token = Some(token);
        }
        if let Some(secret) = get("GITHUB_WEBHOOK_SECRET") {
            self.github.secret = Some(secret);
        }

        Ok(())
    }

    /// Rejects configurations the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.servers.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one broker server is required".to_string(),
            ));
        }
        if self.enabled_providers().is_empty() {
            return Err(ConfigError::Invalid(
                "no webhook provider configured; set GITLAB_WEBHOOK_TOKEN or GITHUB_WEBHOOK_SECRET"
                    .to_string(),
            ));
        }
        self.publish_policy()?;
        self.retention()?;
        Ok(())
    }

    pub fn publish_policy(&self) -> Result<PublishPolicy, PolicyError> {
        PublishPolicy::new(
            self.publish.max_retries,
            Duration::from_millis(self.publish.retry_base_delay_ms),
            Duration::from_millis(self.publish.timeout_ms),
        )
    }

    pub fn retention(&self) -> Result<RetentionPolicy, PolicyError> {
        RetentionPolicy::new(self.streams.max_age_days, self.streams.max_messages)
    }

    pub fn broker_settings(&self) -> BrokerSettings {
        BrokerSettings {
            servers: self.broker.servers.clone(),
            token: self.broker.token.clone(),
            reconnect_wait: Duration::from_millis(self.broker.reconnect_wait_ms),
            ..BrokerSettings::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// GitLab token, if set and not blank.
    pub fn gitlab_token(&self) -> Option<&str> {
        non_blank(&self.gitlab.token)
    }

    /// GitHub secret, if set and not blank.
    pub fn github_secret(&self) -> Option<&str> {
        non_blank(&self.github.secret)
    }

    /// Providers whose credential is set.
    pub fn enabled_providers(&self) -> Vec<Provider> {
        let mut providers = Vec::with_capacity(Provider::ALL.len());
        if self.gitlab_token().is_some() {
            providers.push(Provider::GitLab);
        }
        if self.github_secret().is_some() {
            providers.push(Provider::GitHub);
        }
        providers
    }

    /// Streams to provision, one per enabled provider.
    pub fn stream_descriptors(&self) -> Result<Vec<StreamDescriptor>, PolicyError> {
        let retention = self.retention()?;
        Ok(self
            .enabled_providers()
            .into_iter()
            .map(|provider| StreamDescriptor::for_provider(provider, retention))
            .collect())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

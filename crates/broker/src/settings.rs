//! Connection settings for the NATS client.

use std::time::Duration;

/// Everything needed to open the broker session.
#[derive(Clone)]
pub struct BrokerSettings {
    /// Server URLs, e.g. `nats://localhost:4222`. The client picks among them
    /// on every (re)connect.
    pub servers: Vec<String>,
    /// Optional auth token.
    pub token: Option<String>,
    /// Fixed wait between reconnect attempts. Reconnects are unlimited.
    pub reconnect_wait: Duration,
    /// Client name reported to the server (visible in monitoring endpoints).
    pub client_name: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            token: None,
            reconnect_wait: Duration::from_secs(2),
            client_name: "hookstream".to_string(),
        }
    }
}

impl std::fmt::Debug for BrokerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerSettings")
            .field("servers", &self.servers)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .field("reconnect_wait", &self.reconnect_wait)
            .field("client_name", &self.client_name)
            .finish()
    }
}

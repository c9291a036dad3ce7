//! Errors raised while establishing or closing the broker session.
//!
//! Per-publish and provisioning failures use the [`relay`] error types so the
//! domain never sees `async-nats` types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// No server addresses were configured.
    #[error("No broker servers configured")]
    NoServers,

    /// A configured server address could not be parsed.
    #[error("Invalid broker server address '{server}': {message}")]
    InvalidServer { server: String, message: String },

    /// The initial connection could not be established.
    #[error("Failed to connect to broker: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// Flushing or draining the session on shutdown failed.
    #[error("Failed to close broker connection: {message}")]
    Close { message: String },
}

//! Broker connection port and health tracking.
//!
//! The publisher never holds a transport client directly. It receives an
//! `Arc<dyn BrokerConnection>` at construction, which lets the infrastructure
//! swap the underlying session on reconnect without callers noticing, and lets
//! tests substitute an in-memory double.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::{OutboundMessage, PublishAck, TransportError};

/// A shared, concurrently usable broker session.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    /// `true` when the session is open *and* the status tracker considers it healthy.
    ///
    /// Must be cheap and non-blocking; the publisher calls it before every attempt.
    fn is_connected(&self) -> bool;

    /// Sends one message and waits for the broker's acknowledgement.
    ///
    /// Must be safe to call from many tasks at once. Implementations do not
    /// retry; [`crate::ReliablePublisher`] owns retry decisions.
    async fn publish(&self, message: &OutboundMessage) -> Result<PublishAck, TransportError>;
}

/// Status change reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Session established or re-established.
    Connected,
    /// Session lost; the client is reconnecting.
    Disconnected,
    /// Client or server reported an error. Health is left as is.
    Error(String),
    /// Non-fatal condition (slow consumer, lame-duck notice). Health is left as is.
    Warning(String),
    /// Client is draining or has closed; no further reconnects.
    Closed,
}

/// Health flag shared between the status tracker (sole writer) and every
/// publisher (readers).
#[derive(Debug, Clone, Default)]
pub struct ConnectionHealth(Arc<AtomicBool>);

impl ConnectionHealth {
    /// Creates a flag with the given initial state.
    pub fn new(healthy: bool) -> Self {
        Self(Arc::new(AtomicBool::new(healthy)))
    }

    pub fn is_healthy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Forces the flag, e.g. on shutdown.
    pub fn set(&self, healthy: bool) {
        self.0.store(healthy, Ordering::Release);
    }

    /// Applies one transport event and logs it. Returns the resulting health.
    pub fn observe(&self, event: &ConnectionEvent) -> bool {
        match event {
            ConnectionEvent::Connected => {
                let was_healthy = self.0.swap(true, Ordering::AcqRel);
                if !was_healthy {
                    info!("Broker connection established");
                }
                true
            }
            ConnectionEvent::Disconnected => {
                self.set(false);
                warn!("Broker connection lost, reconnecting");
                false
            }
            ConnectionEvent::Error(message) => {
                error!(error = %message, "Broker connection error");
                self.is_healthy()
            }
            ConnectionEvent::Warning(message) => {
                warn!(detail = %message, "Broker connection warning");
                self.is_healthy()
            }
            ConnectionEvent::Closed => {
                self.set(false);
                info!("Broker connection closed");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;

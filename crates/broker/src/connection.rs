//! NATS implementation of [`relay::BrokerConnection`].

use async_nats::connection::State;
use async_nats::jetstream;
use async_nats::{Client, ConnectOptions, Event, HeaderMap, ServerAddr};
use async_trait::async_trait;
use relay::{
    BrokerConnection, ConnectionEvent, ConnectionHealth, OutboundMessage, PublishAck,
    TransportError,
};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::{BrokerError, BrokerSettings, StatusTracker};

/// Long-lived session with a NATS server and its JetStream context.
///
/// One instance is shared by all request handlers. The client reconnects on its
/// own, forever, waiting [`BrokerSettings::reconnect_wait`] between attempts.
/// In-flight publishes during an outage fail and are retried by the publisher.
pub struct NatsConnection {
    client: Client,
    jetstream: jetstream::Context,
    health: ConnectionHealth,
    tracker: StatusTracker,
}

impl NatsConnection {
    /// Opens the session and starts the status tracker.
    ///
    /// Fails if no server is configured, an address does not parse, or the
    /// first connection attempt is refused. Only later disconnects are retried.
    #[instrument(skip_all, fields(servers = ?settings.servers))]
    pub async fn connect(settings: &BrokerSettings) -> Result<Self, BrokerError> {
        let servers = parse_servers(&settings.servers)?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let health = ConnectionHealth::default();
        let tracker = StatusTracker::spawn(events_rx, health.clone());

        let reconnect_wait = settings.reconnect_wait;
        let mut options = ConnectOptions::new()
            .name(&settings.client_name)
            .max_reconnects(None::<usize>)
            .reconnect_delay_callback(move |_attempts| reconnect_wait)
            .event_callback(move |event| {
                // The tracker may already be gone during shutdown.
                let _ = events_tx.send(map_event(&event));
                std::future::ready(())
            });
        if let Some(token) = &settings.token {
            options = options.token(token.clone());
        }

        let client = options.connect(servers.as_slice()).await?;
        health.set(client.connection_state() == State::Connected);
        info!(healthy = health.is_healthy(), "Connected to broker");

        let jetstream = jetstream::new(client.clone());
        Ok(Self {
            client,
            jetstream,
            health,
            tracker,
        })
    }

    /// JetStream context for stream management.
    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }

    /// Shared health flag, as maintained by the status tracker.
    pub fn health(&self) -> &ConnectionHealth {
        &self.health
    }

    /// Flushes pending publishes, drains the session and stops the tracker.
    ///
    /// Health is `false` afterwards even when draining fails.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<(), BrokerError> {
        let flushed = self.client.flush().await.map_err(|e| BrokerError::Close {
            message: e.to_string(),
        });
        let drained = self.client.drain().await.map_err(|e| BrokerError::Close {
            message: e.to_string(),
        });

        self.tracker.stop();
        self.health.set(false);

        if let Err(err) = &flushed {
            warn!(error = %err, "Flush before close failed");
        }
        flushed.and(drained)?;
        info!("Broker connection closed");
        Ok(())
    }
}

impl std::fmt::Debug for NatsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsConnection")
            .field("state", &self.client.connection_state())
            .field("healthy", &self.health.is_healthy())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BrokerConnection for NatsConnection {
    fn is_connected(&self) -> bool {
        self.client.connection_state() == State::Connected && self.health.is_healthy()
    }

    async fn publish(&self, message: &OutboundMessage) -> Result<PublishAck, TransportError> {
        let ack_future = self
            .jetstream
            .publish_with_headers(
                message.subject().to_string(),
                header_map(message),
                message.payload().clone(),
            )
            .await
            .map_err(|e| TransportError::Rejected {
                message: e.to_string(),
            })?;

        let ack = ack_future.await.map_err(|e| TransportError::Rejected {
            message: e.to_string(),
        })?;

        Ok(PublishAck {
            stream: ack.stream,
            sequence: ack.sequence,
            duplicate: ack.duplicate,
        })
    }
}

/// Translates a client status callback into the domain event.
pub fn map_event(event: &Event) -> ConnectionEvent {
    match event {
        Event::Connected => ConnectionEvent::Connected,
        Event::Disconnected => ConnectionEvent::Disconnected,
        Event::Draining | Event::Closed => ConnectionEvent::Closed,
        Event::LameDuckMode | Event::SlowConsumer(_) => ConnectionEvent::Warning(event.to_string()),
        Event::ServerError(_) | Event::ClientError(_) => ConnectionEvent::Error(event.to_string()),
    }
}

/// Copies the message's metadata headers into a NATS header map.
pub fn header_map(message: &OutboundMessage) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in message.headers() {
        headers.insert(name.as_str(), value.as_str());
    }
    headers
}

fn parse_servers(servers: &[String]) -> Result<Vec<ServerAddr>, BrokerError> {
    if servers.is_empty() {
        return Err(BrokerError::NoServers);
    }
    servers
        .iter()
        .map(|server| {
            server
                .trim()
                .parse::<ServerAddr>()
                .map_err(|e| BrokerError::InvalidServer {
                    server: server.clone(),
                    message: e.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;

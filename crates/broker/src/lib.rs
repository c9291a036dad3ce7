//! hookstream NATS JetStream adapter.
//!
//! Implements the broker-facing traits defined in the [`relay`] crate
//! ([`relay::BrokerConnection`], [`relay::StreamCatalog`]) using
//! [`async_nats`](https://github.com/nats-io/nats.rs).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Reconnects,
//! header encoding and JetStream error codes are handled here; the [`relay`]
//! crate never sees them. Publish retries belong to [`relay::ReliablePublisher`]
//! and are not duplicated here.

pub mod catalog;
pub mod connection;
pub mod error;
pub mod settings;
pub mod tracker;

pub use catalog::{
    classify_lookup_error, message_indicates_not_found, stream_config, JetStreamCatalog,
};
pub use connection::{header_map, map_event, NatsConnection};
pub use error::BrokerError;
pub use settings::BrokerSettings;
pub use tracker::StatusTracker;

//! Core relay domain for hookstream.
//!
//! This crate holds everything that decides *what* gets published and *how
//! hard* to try: subject and dedup-key derivation, the retry policy, the
//! reliable publisher, connection-health tracking, and the startup stream
//! provisioning algorithm. Infrastructure crates implement the port traits
//! defined here; they never add retry or routing rules of their own.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** No network I/O. The broker is reached
//! only through [`BrokerConnection`] and [`StreamCatalog`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Subject`, `DedupKey`, `StreamName`) |
//! | [`provider`] | Supported webhook sources |
//! | [`subject`] | Routing-key derivation |
//! | [`dedup`] | Idempotency-key derivation |
//! | [`message`] | Outbound messages, acks, receipts |
//! | [`backoff`] | Publish policy and jittered backoff |
//! | [`connection`] | Broker connection port and health flag |
//! | [`publisher`] | Reliable publisher |
//! | [`streams`] | Stream descriptors and provisioning |
//! | [`errors`] | Error types |

pub mod backoff;
pub mod connection;
pub mod dedup;
pub mod errors;
pub mod identifiers;
pub mod message;
pub mod provider;
pub mod publisher;
pub mod streams;
pub mod subject;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use backoff::{backoff_delay, jittered_backoff, PublishPolicy};
pub use connection::{BrokerConnection, ConnectionEvent, ConnectionHealth};
pub use dedup::{derive_dedup_key, IDEMPOTENCY_KEY_HEADER};
pub use errors::{PolicyError, ProvisionError, PublishError, StreamLookupError, TransportError};
pub use identifiers::{DedupKey, StreamName, Subject};
pub use message::{OutboundMessage, PublishAck, PublishReceipt, MSG_ID_HEADER};
pub use provider::Provider;
pub use publisher::ReliablePublisher;
pub use streams::{
    initialize_streams, DiscardPolicy, RetentionPolicy, StreamCatalog, StreamDescriptor,
    StreamStatus,
};
pub use subject::derive_subject;

//! JetStream implementation of [`relay::StreamCatalog`].

use async_nats::jetstream::context::{GetStreamError, GetStreamErrorKind};
use async_nats::jetstream::stream::{self, RetentionPolicy as NatsRetention, StorageType};
use async_nats::jetstream::{self, ErrorCode};
use async_trait::async_trait;
use relay::{
    DiscardPolicy, ProvisionError, StreamCatalog, StreamDescriptor, StreamLookupError, StreamName,
};
use tracing::debug;

/// Substring checked when a lookup failure carries no structured error code.
const NOT_FOUND_TEXT: &str = "stream not found";

/// Stream administration through a JetStream context.
#[derive(Debug, Clone)]
pub struct JetStreamCatalog {
    context: jetstream::Context,
}

impl JetStreamCatalog {
    pub fn new(context: jetstream::Context) -> Self {
        Self { context }
    }
}

#[async_trait]
impl StreamCatalog for JetStreamCatalog {
    async fn lookup(&self, name: &StreamName) -> Result<(), StreamLookupError> {
        match self.context.get_stream(name.as_str()).await {
            Ok(_) => Ok(()),
            Err(err) => {
                let classified = classify_lookup_error(&err);
                debug!(stream = %name, error = %err, classified = ?classified, "Stream lookup failed");
                Err(classified)
            }
        }
    }

    async fn create(&self, descriptor: &StreamDescriptor) -> Result<(), ProvisionError> {
        self.context
            .create_stream(stream_config(descriptor))
            .await
            .map(|_| ())
            .map_err(|e| ProvisionError::Create {
                stream: descriptor.name.clone(),
                message: e.to_string(),
            })
    }
}

/// Maps a descriptor onto the JetStream stream configuration.
///
/// Retention is limits-based with file storage; the message cap saturates at
/// the broker's signed limit.
pub fn stream_config(descriptor: &StreamDescriptor) -> stream::Config {
    let retention = &descriptor.retention;
    stream::Config {
        name: descriptor.name.to_string(),
        subjects: descriptor.subjects.clone(),
        max_age: retention.max_age,
        max_messages: i64::try_from(retention.max_messages).unwrap_or(i64::MAX),
        discard: match retention.discard {
            DiscardPolicy::Old => stream::DiscardPolicy::Old,
            DiscardPolicy::New => stream::DiscardPolicy::New,
        },
        retention: NatsRetention::Limits,
        storage: StorageType::File,
        ..Default::default()
    }
}

/// Decides whether a failed lookup means "the stream does not exist".
///
/// The JetStream error code is authoritative. Only when the failure carries no
/// code does the message text decide.
pub fn classify_lookup_error(err: &GetStreamError) -> StreamLookupError {
    match err.kind() {
        GetStreamErrorKind::JetStream(api) => {
            if api.error_code() == ErrorCode::STREAM_NOT_FOUND {
                StreamLookupError::NotFound
            } else {
                StreamLookupError::Other {
                    message: api.to_string(),
                }
            }
        }
        _ => {
            let message = err.to_string();
            if message_indicates_not_found(&message) {
                StreamLookupError::NotFound
            } else {
                StreamLookupError::Other { message }
            }
        }
    }
}

/// Case-insensitive "stream not found" check for uncoded failures.
pub fn message_indicates_not_found(message: &str) -> bool {
    message.to_ascii_lowercase().contains(NOT_FOUND_TEXT)
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;

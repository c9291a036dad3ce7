//! Background connection-status tracker.
//!
//! The NATS client reports status changes through a callback. The callback only
//! forwards a [`ConnectionEvent`] into a channel; a detached worker task drains
//! the channel and updates the shared [`ConnectionHealth`]. A second task
//! supervises the worker so that a panic is logged instead of silently leaving
//! the health flag frozen. Nothing here returns an error to a caller.

use relay::{ConnectionEvent, ConnectionHealth};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error};

/// Handle to the running tracker. Stops the worker when dropped.
#[derive(Debug)]
pub struct StatusTracker {
    worker: AbortHandle,
    supervisor: JoinHandle<()>,
}

impl StatusTracker {
    /// Starts tracking `events` into `health`. Must be called inside a Tokio runtime.
    pub fn spawn(
        mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
        health: ConnectionHealth,
    ) -> Self {
        let worker = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                health.observe(&event);
            }
            debug!("Connection event channel closed, status tracker exiting");
        });
        let abort = worker.abort_handle();

        let supervisor = tokio::spawn(async move {
            match worker.await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => debug!("Status tracker stopped"),
                Err(err) => error!(error = %err, "Status tracker failed"),
            }
        });

        Self {
            worker: abort,
            supervisor,
        }
    }

    /// Stops the worker. Idempotent.
    pub fn stop(&self) {
        self.worker.abort();
    }

    /// `true` once the worker and its supervisor have both exited.
    pub fn is_finished(&self) -> bool {
        self.supervisor.is_finished()
    }
}

impl Drop for StatusTracker {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;

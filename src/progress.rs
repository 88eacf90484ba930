//! Per-installation progress channel.
//!
//! Each installation owns one bounded channel. The producing side is a
//! [`ProgressSender`] that is consumed by [`ProgressSender::complete`] or
//! [`ProgressSender::fail`], so a channel carries exactly one terminal event
//! and is closed right after it. A consumer that stops reading pauses the
//! producer once the buffer is full.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::GpmError;

/// Events buffered before the producer waits for the consumer.
pub const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Bytes written since the previous event.
    BytesRead(u64),
    /// Size announced by the server.
    TotalSize(u64),
    /// Bytes written so far.
    CurrentSize(u64),
    Completed,
    Failed(Arc<GpmError>),
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Completed | ProgressEvent::Failed(_))
    }
}

pub struct ProgressSender {
    tx: mpsc::Sender<ProgressEvent>,
}

pub struct ProgressReceiver {
    rx: mpsc::Receiver<ProgressEvent>,
}

pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    (ProgressSender { tx }, ProgressReceiver { rx })
}

impl ProgressSender {
    /// Send a non-terminal event. A receiver that went away is not an
    /// error: the installation carries on unobserved.
    pub async fn emit(&self, event: ProgressEvent) {
        debug_assert!(!event.is_terminal());
        let _ = self.tx.send(event).await;
    }

    pub async fn complete(self) {
        let _ = self.tx.send(ProgressEvent::Completed).await;
    }

    pub async fn fail(self, error: impl Into<Arc<GpmError>>) {
        let _ = self.tx.send(ProgressEvent::Failed(error.into())).await;
    }
}

impl ProgressReceiver {
    /// Next event, `None` once the terminal event has been read.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }
}

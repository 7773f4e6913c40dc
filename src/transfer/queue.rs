//! Transfer Queue - at-least-once message channel between intake and the
//! settlement workers.
//!
//! The queue carries the serialized wire-format payload, not the in-memory
//! record. Consumers form a single consumer group: exactly one member
//! receives a given message, which is what allows settlement capacity to be
//! scaled out horizontally. Delivery is at-least-once; a consumer may
//! [`TransferConsumer::requeue`] a message on infrastructure failure, so the
//! worker must be safe to re-run for the same transfer id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

use super::types::Transfer;

/// Queue infrastructure errors.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is full")]
    Full,

    #[error("queue is closed")]
    Closed,

    #[error("malformed payload: {0}")]
    Codec(String),
}

/// Producer side of the transfer topic.
#[async_trait]
pub trait TransferQueue: Send + Sync {
    /// Publish a serialized transfer. Fails fast when the broker is
    /// unavailable so intake can compensate the Pending record.
    async fn publish(&self, transfer: &Transfer) -> Result<(), QueueError>;

    /// Join the consumer group. Each subscription competes for messages;
    /// a given message is delivered to exactly one member.
    fn subscribe(&self) -> Box<dyn TransferConsumer>;
}

/// One consumer-group member.
#[async_trait]
pub trait TransferConsumer: Send {
    /// Blocking pull with timeout. `Ok(None)` means the timeout elapsed
    /// with nothing to deliver; the worker uses a short timeout (~1s) to
    /// stay responsive to shutdown.
    async fn poll(&mut self, timeout: Duration) -> Result<Option<Transfer>, QueueError>;

    /// Put a message back on the topic for redelivery.
    async fn requeue(&mut self, transfer: &Transfer) -> Result<(), QueueError>;
}

/// In-process broker backed by a bounded channel.
///
/// All subscriptions share the single receiver, which gives consumer-group
/// semantics for free: whichever member holds the receiver when a message
/// arrives takes it.
pub struct InMemoryQueue {
    tx: mpsc::Sender<Vec<u8>>,
    rx: Arc<Mutex<mpsc::Receiver<Vec<u8>>>>,
}

impl InMemoryQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

fn encode(transfer: &Transfer) -> Result<Vec<u8>, QueueError> {
    serde_json::to_vec(transfer).map_err(|e| QueueError::Codec(e.to_string()))
}

fn offer(tx: &mpsc::Sender<Vec<u8>>, payload: Vec<u8>) -> Result<(), QueueError> {
    tx.try_send(payload).map_err(|e| match e {
        mpsc::error::TrySendError::Full(_) => QueueError::Full,
        mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
    })
}

#[async_trait]
impl TransferQueue for InMemoryQueue {
    async fn publish(&self, transfer: &Transfer) -> Result<(), QueueError> {
        offer(&self.tx, encode(transfer)?)
    }

    fn subscribe(&self) -> Box<dyn TransferConsumer> {
        Box::new(InMemoryConsumer {
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
        })
    }
}

struct InMemoryConsumer {
    tx: mpsc::Sender<Vec<u8>>,
    rx: Arc<Mutex<mpsc::Receiver<Vec<u8>>>>,
}

#[async_trait]
impl TransferConsumer for InMemoryConsumer {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<Transfer>, QueueError> {
        let received = tokio::time::timeout(timeout, async {
            let mut rx = self.rx.lock().await;
            rx.recv().await
        })
        .await;

        match received {
            Ok(Some(payload)) => serde_json::from_slice(&payload)
                .map(Some)
                .map_err(|e| QueueError::Codec(e.to_string())),
            Ok(None) => Err(QueueError::Closed),
            Err(_) => Ok(None),
        }
    }

    async fn requeue(&mut self, transfer: &Transfer) -> Result<(), QueueError> {
        offer(&self.tx, encode(transfer)?)
    }
}

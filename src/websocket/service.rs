//! Notifier service - drains push events and fans them out to clients.
//!
//! The settlement worker never talks to sockets directly: it pushes
//! [`PushEvent`]s onto a lock-free queue and this service, running on the
//! gateway runtime, forwards them to the owner's connection group. A full
//! queue or a dead connection costs a log line, never a settlement failure.

use crossbeam_queue::ArrayQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;

use super::connection::ConnectionManager;
use super::messages::{PushEvent, WsMessage};

const DRAIN_INTERVAL: Duration = Duration::from_millis(10);
const MAX_BATCH: usize = 256;

pub struct NotifierService {
    manager: Arc<ConnectionManager>,
    push_events: Arc<ArrayQueue<PushEvent>>,
    shutdown: watch::Receiver<bool>,
}

impl NotifierService {
    pub fn new(
        manager: Arc<ConnectionManager>,
        push_events: Arc<ArrayQueue<PushEvent>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            manager,
            push_events,
            shutdown,
        }
    }

    /// Poll the push-event queue until shutdown, batching sends per tick.
    pub async fn run(mut self) {
        let mut tick = interval(DRAIN_INTERVAL);
        tracing::info!("Notifier service started");

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let mut count = 0;
                    while let Some(event) = self.push_events.pop() {
                        self.handle_event(event);
                        count += 1;
                        if count >= MAX_BATCH {
                            break;
                        }
                    }
                }
                // A dropped sender counts as shutdown too.
                _ = self.shutdown.changed() => {
                    // Deliver whatever is already queued before stopping.
                    while let Some(event) = self.push_events.pop() {
                        self.handle_event(event);
                    }
                    break;
                }
            }
        }

        tracing::info!("Notifier service stopped");
    }

    fn handle_event(&self, event: PushEvent) {
        match event {
            PushEvent::StatusUpdate {
                owner,
                transfer_id,
                status,
                message,
            } => {
                let frame = WsMessage::status_updated(transfer_id, status, message);
                self.manager.send_to_owner(&owner, frame);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::TransferId;
    use crate::transfer::state::TransferStatus;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_events_reach_subscribed_owner() {
        let manager = Arc::new(ConnectionManager::new());
        let push_events = Arc::new(ArrayQueue::new(16));
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.add_connection("alice@example.com", tx);

        let transfer_id = TransferId::new();
        push_events
            .push(PushEvent::StatusUpdate {
                owner: "alice@example.com".into(),
                transfer_id,
                status: TransferStatus::Processing,
                message: None,
            })
            .unwrap();

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let service = NotifierService::new(manager, push_events, shutdown_rx);
        tokio::spawn(service.run());

        let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match frame {
            WsMessage::TransactionStatusUpdated {
                transfer_id: id,
                status,
                ..
            } => {
                assert_eq!(id, transfer_id.to_string());
                assert_eq!(status, TransferStatus::Processing);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_event_for_unsubscribed_owner_is_dropped() {
        let manager = Arc::new(ConnectionManager::new());
        let push_events = Arc::new(ArrayQueue::new(16));
        push_events
            .push(PushEvent::StatusUpdate {
                owner: "nobody@example.com".into(),
                transfer_id: TransferId::new(),
                status: TransferStatus::Completed,
                message: None,
            })
            .unwrap();

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let service = NotifierService::new(manager, push_events.clone(), shutdown_rx);
        tokio::spawn(service.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        // Drained without anyone listening; nothing left behind.
        assert!(push_events.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_service_after_final_drain() {
        let manager = Arc::new(ConnectionManager::new());
        let push_events = Arc::new(ArrayQueue::new(16));
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.add_connection("alice@example.com", tx);

        push_events
            .push(PushEvent::StatusUpdate {
                owner: "alice@example.com".into(),
                transfer_id: TransferId::new(),
                status: TransferStatus::Completed,
                message: None,
            })
            .unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let service = NotifierService::new(manager, push_events.clone(), shutdown_rx);
        let handle = tokio::spawn(service.run());

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("notifier should stop on shutdown")
            .unwrap();

        // The queued event was delivered on the way out.
        assert!(rx.recv().await.is_some());
        assert!(push_events.is_empty());
    }
}

//! Settlement Worker - the queue consumer that applies transfers.
//!
//! Each dequeued message walks the state machine
//! `Pending -> Processing -> {Completed | Failed}`. The ledger mutation runs
//! under the ledger mutex with no I/O inside the critical section;
//! persistence and notification happen after the lock is released. One
//! message's failure never stops the loop, and a redelivered message whose
//! id is already terminal is skipped rather than re-applied.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_queue::ArrayQueue;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::queue::{QueueError, TransferConsumer};
use super::state::TransferStatus;
use super::types::{Direction, HistoryEntry, Transfer};
use crate::ledger::Ledger;
use crate::store::StatusHistoryStore;
use crate::websocket::messages::PushEvent;

/// Worker loop tuning.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Queue pull timeout; short enough to stay responsive to shutdown.
    pub poll_timeout: Duration,
    /// Backoff after an infrastructure-level queue error.
    pub error_backoff: Duration,
    /// Synthetic settlement latency after the Processing broadcast, so
    /// clients get early feedback. Zero in tests.
    pub processing_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(1),
            error_backoff: Duration::from_millis(500),
            processing_delay: Duration::ZERO,
        }
    }
}

/// One consumer-group member. Run several for horizontal scale-out; the
/// queue guarantees each message lands on exactly one of them.
pub struct SettlementWorker {
    ledger: Arc<Ledger>,
    store: Arc<StatusHistoryStore>,
    push_events: Arc<ArrayQueue<PushEvent>>,
    consumer: Box<dyn TransferConsumer>,
    config: WorkerConfig,
    shutdown: watch::Receiver<bool>,
}

impl SettlementWorker {
    pub fn new(
        ledger: Arc<Ledger>,
        store: Arc<StatusHistoryStore>,
        push_events: Arc<ArrayQueue<PushEvent>>,
        consumer: Box<dyn TransferConsumer>,
        config: WorkerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            ledger,
            store,
            push_events,
            consumer,
            config,
            shutdown,
        }
    }

    /// Consume until shutdown. The flag is observed between messages only:
    /// an in-flight transfer always settles before the loop exits.
    pub async fn run(mut self) {
        info!(
            poll_timeout_ms = self.config.poll_timeout.as_millis() as u64,
            "Settlement worker started"
        );

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            match self.consumer.poll(self.config.poll_timeout).await {
                Ok(Some(transfer)) => {
                    // A panic inside settlement is contained: the transfer
                    // is forced to Failed and the loop keeps consuming.
                    let mut fallback = transfer.clone();
                    let outcome = AssertUnwindSafe(self.process(transfer)).catch_unwind().await;
                    if outcome.is_err() {
                        error!(transfer_id = %fallback.id, "Settlement panicked, forcing Failed");
                        let already_terminal = self
                            .store
                            .get_status(&fallback.id)
                            .is_some_and(|t| t.status.is_terminal());
                        if !already_terminal {
                            fallback.fail("internal settlement error");
                            self.store.set_status(&fallback);
                            self.push_status(&fallback);
                        }
                    }
                }
                Ok(None) => {}
                Err(QueueError::Codec(e)) => {
                    error!(error = %e, "Dropping malformed queue payload");
                }
                Err(e) => {
                    error!(
                        error = %e,
                        backoff_ms = self.config.error_backoff.as_millis() as u64,
                        "Queue unavailable, backing off"
                    );
                    tokio::time::sleep(self.config.error_backoff).await;
                }
            }
        }

        info!("Settlement worker stopped");
    }

    async fn process(&mut self, mut transfer: Transfer) {
        // At-least-once dedup: a redelivered message whose id already
        // reached a terminal state must not double-apply the mutation.
        if let Some(existing) = self.store.get_status(&transfer.id) {
            if existing.status.is_terminal() {
                debug!(
                    transfer_id = %transfer.id,
                    status = %existing.status,
                    "Redelivered terminal transfer skipped"
                );
                return;
            }
        }

        transfer.mark_processing();
        self.store.set_status(&transfer);
        self.push_status(&transfer);

        if !self.config.processing_delay.is_zero() {
            tokio::time::sleep(self.config.processing_delay).await;
        }

        // Critical section lives entirely inside Ledger::settle: both
        // lookups, the funds check, and both mutations.
        let outcome = self.ledger.settle(
            &transfer.from_account_owner,
            &transfer.recipient_ref(),
            transfer.amount,
        );

        match outcome {
            Ok(settlement) => {
                transfer.complete();
                self.store.set_status(&transfer);
                self.store
                    .set_balance(&settlement.sender.owner, settlement.sender.balance_after);
                self.store.set_balance(
                    &settlement.recipient.owner,
                    settlement.recipient.balance_after,
                );
                self.store.append_history(HistoryEntry::new(
                    settlement.sender.owner.clone(),
                    transfer.id,
                    Direction::Sent,
                    -transfer.amount,
                    settlement.recipient.display_name.clone(),
                    TransferStatus::Completed,
                ));
                self.store.append_history(HistoryEntry::new(
                    settlement.recipient.owner.clone(),
                    transfer.id,
                    Direction::Received,
                    transfer.amount,
                    settlement.sender.display_name.clone(),
                    TransferStatus::Completed,
                ));
                info!(
                    transfer_id = %transfer.id,
                    amount = %transfer.amount,
                    sender = %settlement.sender.owner,
                    recipient = %settlement.recipient.owner,
                    "Transfer settled"
                );
            }
            Err(e) => {
                // Ledger untouched; record the specific reason.
                let reason = TransferError::from(e);
                transfer.fail(reason.to_string());
                self.store.set_status(&transfer);
                warn!(
                    transfer_id = %transfer.id,
                    code = reason.code(),
                    reason = %reason,
                    "Transfer failed"
                );
            }
        }

        self.push_status(&transfer);
    }

    /// Best-effort: a full push queue drops the event with a log line and
    /// never propagates into settlement.
    fn push_status(&self, transfer: &Transfer) {
        let event = PushEvent::StatusUpdate {
            owner: transfer.from_account_owner.clone(),
            transfer_id: transfer.id,
            status: transfer.status,
            message: transfer.error_message.clone(),
        };
        if self.push_events.push(event).is_err() {
            warn!(transfer_id = %transfer.id, "Push-event queue full, notification dropped");
        }
    }
}

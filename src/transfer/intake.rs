//! Transfer Intake - validates a request, records intent, and enqueues it.
//!
//! Intake returns as soon as the Pending record is durable and the message
//! is on the queue; settlement is asynchronous and callers learn the outcome
//! through the real-time notifier or by polling. A failed enqueue removes
//! the Pending record before the error is returned, so a Pending status is
//! never visible without a corresponding queued message.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{error, info};

use super::error::TransferError;
use super::queue::TransferQueue;
use super::types::Transfer;
use crate::core_types::{AccountRef, OwnerId, RecipientRef, TransferId};
use crate::ledger::Ledger;
use crate::store::StatusHistoryStore;

/// Validated submit parameters. The recipient is named either by owner
/// alias or by the full account-pair.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub from_owner: OwnerId,
    pub to_owner: Option<OwnerId>,
    pub to_routing_id: Option<String>,
    pub to_account_number: Option<String>,
    pub amount: Decimal,
    pub currency: Option<String>,
}

impl SubmitRequest {
    fn recipient_ref(&self) -> Result<RecipientRef, TransferError> {
        if let Some(owner) = &self.to_owner {
            if !owner.is_empty() {
                return Ok(RecipientRef::Owner(owner.clone()));
            }
        }
        match (&self.to_routing_id, &self.to_account_number) {
            (Some(routing), Some(number)) if !routing.is_empty() && !number.is_empty() => Ok(
                RecipientRef::Account(AccountRef::new(routing.clone(), number.clone())),
            ),
            _ => Err(TransferError::MissingRecipient),
        }
    }
}

/// Front door of the pipeline.
pub struct TransferIntake {
    ledger: Arc<Ledger>,
    store: Arc<StatusHistoryStore>,
    queue: Arc<dyn TransferQueue>,
    /// Local record cache; the store wins on conflict (see
    /// [`TransferIntake::resolve_status`]).
    cache: DashMap<TransferId, Transfer>,
}

impl TransferIntake {
    pub fn new(
        ledger: Arc<Ledger>,
        store: Arc<StatusHistoryStore>,
        queue: Arc<dyn TransferQueue>,
    ) -> Self {
        Self {
            ledger,
            store,
            queue,
            cache: DashMap::new(),
        }
    }

    /// Accept a transfer: validate, assign an id, persist Pending, enqueue.
    ///
    /// Validation and recipient resolution fail fast here, before anything
    /// is persisted or enqueued; the worker re-checks authoritatively.
    pub async fn submit(&self, req: SubmitRequest) -> Result<Transfer, TransferError> {
        if req.amount <= Decimal::ZERO {
            return Err(TransferError::InvalidAmount);
        }
        let recipient_ref = req.recipient_ref()?;

        // Cheap fail-fast resolution; keeps unresolvable requests out of
        // the queue entirely.
        let recipient = self
            .ledger
            .resolve_recipient(&recipient_ref)
            .ok_or(TransferError::RecipientNotFound)?;

        let transfer = Transfer::new(
            req.from_owner,
            recipient.account,
            recipient.display_name,
            req.amount,
            req.currency.unwrap_or_else(|| "BRL".to_string()),
        );

        self.store.set_status(&transfer);
        self.cache.insert(transfer.id, transfer.clone());

        if let Err(e) = self.queue.publish(&transfer).await {
            // Compensate: no dangling Pending record without a queued
            // message behind it.
            self.store.remove_status(&transfer.id);
            self.cache.remove(&transfer.id);
            error!(transfer_id = %transfer.id, error = %e, "Enqueue failed, Pending record rolled back");
            return Err(e.into());
        }

        info!(
            transfer_id = %transfer.id,
            from = %transfer.from_account_owner,
            to = %recipient.owner,
            amount = %transfer.amount,
            "Transfer accepted"
        );
        Ok(transfer)
    }

    /// Reconcile the local cache against the store: the store is the source
    /// of truth and wins when both have a record.
    pub fn resolve_status(&self, id: &TransferId) -> Option<Transfer> {
        if let Some(record) = self.store.get_status(id) {
            return Some(record);
        }
        self.cache.get(id).map(|r| r.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Account;
    use crate::transfer::queue::{InMemoryQueue, TransferConsumer};
    use crate::transfer::state::TransferStatus;
    use rust_decimal::prelude::FromPrimitive;

    fn dec(v: i64) -> Decimal {
        Decimal::from_i64(v).unwrap()
    }

    fn seeded_ledger() -> Arc<Ledger> {
        let ledger = Ledger::new();
        ledger.register(Account {
            account: AccountRef::new("001", "1000-1"),
            owner: "alice@example.com".into(),
            display_name: "Alice".into(),
            balance: dec(1000),
            currency: "BRL".into(),
        });
        ledger.register(Account {
            account: AccountRef::new("001", "2000-2"),
            owner: "bob@example.com".into(),
            display_name: "Bob".into(),
            balance: dec(0),
            currency: "BRL".into(),
        });
        Arc::new(ledger)
    }

    fn intake_with_queue(capacity: usize) -> (TransferIntake, Arc<InMemoryQueue>) {
        let queue = Arc::new(InMemoryQueue::new(capacity));
        let intake = TransferIntake::new(
            seeded_ledger(),
            Arc::new(StatusHistoryStore::new()),
            queue.clone(),
        );
        (intake, queue)
    }

    fn request(amount: i64) -> SubmitRequest {
        SubmitRequest {
            from_owner: "alice@example.com".into(),
            to_owner: Some("bob@example.com".into()),
            to_routing_id: None,
            to_account_number: None,
            amount: dec(amount),
            currency: None,
        }
    }

    #[tokio::test]
    async fn test_submit_records_pending_and_enqueues() {
        let (intake, queue) = intake_with_queue(16);
        let transfer = intake.submit(request(100)).await.unwrap();

        assert_eq!(transfer.status, TransferStatus::Pending);
        assert_eq!(transfer.to_owner_name, "Bob");
        assert_eq!(
            intake.resolve_status(&transfer.id).unwrap().status,
            TransferStatus::Pending
        );

        let mut consumer = queue.subscribe();
        let queued = consumer
            .poll(std::time::Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(queued.id, transfer.id);
    }

    #[tokio::test]
    async fn test_submit_rejects_non_positive_amount() {
        let (intake, _queue) = intake_with_queue(16);
        let err = intake.submit(request(0)).await.unwrap_err();
        assert!(matches!(err, TransferError::InvalidAmount));

        let mut negative = request(1);
        negative.amount = dec(-5);
        let err = intake.submit(negative).await.unwrap_err();
        assert!(matches!(err, TransferError::InvalidAmount));
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_recipient() {
        let (intake, _queue) = intake_with_queue(16);
        let mut req = request(100);
        req.to_owner = None;
        let err = intake.submit(req).await.unwrap_err();
        assert!(matches!(err, TransferError::MissingRecipient));
    }

    #[tokio::test]
    async fn test_submit_fails_fast_on_unknown_recipient() {
        let (intake, queue) = intake_with_queue(16);
        let mut req = request(100);
        req.to_owner = Some("nobody@example.com".into());
        let err = intake.submit(req).await.unwrap_err();
        assert!(matches!(err, TransferError::RecipientNotFound));

        // Nothing was enqueued.
        let mut consumer = queue.subscribe();
        assert!(
            consumer
                .poll(std::time::Duration::from_millis(20))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_enqueue_failure_leaves_no_dangling_pending() {
        let (intake, _queue) = intake_with_queue(1);
        // Fill the single-slot queue, then submit.
        let first = intake.submit(request(10)).await.unwrap();
        let err = intake.submit(request(20)).await.unwrap_err();
        assert!(matches!(err, TransferError::QueueUnavailable(_)));

        // Only the successfully enqueued transfer is visible.
        assert!(intake.resolve_status(&first.id).is_some());
    }

    #[tokio::test]
    async fn test_recipient_by_account_pair() {
        let (intake, _queue) = intake_with_queue(16);
        let req = SubmitRequest {
            from_owner: "alice@example.com".into(),
            to_owner: None,
            to_routing_id: Some("001".into()),
            to_account_number: Some("2000-2".into()),
            amount: dec(100),
            currency: None,
        };
        let transfer = intake.submit(req).await.unwrap();
        assert_eq!(transfer.to_owner_name, "Bob");
    }
}

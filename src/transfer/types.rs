//! Transfer record and history entry types.
//!
//! [`Transfer`] is both the durable record and the queue wire payload; field
//! names follow the JSON enqueue format (`id`, `fromAccountOwner`,
//! `toRoutingId`, `toAccountNumber`, `toOwnerName`, `amount`, `status`,
//! `errorMessage`, `createdAt`, `processedAt`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::TransferStatus;
use crate::core_types::{AccountRef, OwnerId, RecipientRef, TransferId};

/// A requested movement of funds, tracked from Pending to a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_owner: OwnerId,
    pub to_routing_id: String,
    pub to_account_number: String,
    pub to_owner_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl Transfer {
    /// Create a Pending record at intake time.
    pub fn new(
        from_account_owner: OwnerId,
        to_account: AccountRef,
        to_owner_name: String,
        amount: Decimal,
        currency: String,
    ) -> Self {
        Self {
            id: TransferId::new(),
            from_account_owner,
            to_routing_id: to_account.routing_id,
            to_account_number: to_account.account_number,
            to_owner_name,
            amount,
            currency,
            status: TransferStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Recipient account-pair reference, for authoritative resolution
    /// inside the worker.
    pub fn recipient_ref(&self) -> RecipientRef {
        RecipientRef::Account(AccountRef::new(
            self.to_routing_id.clone(),
            self.to_account_number.clone(),
        ))
    }

    /// Pending -> Processing. No-op once terminal.
    pub fn mark_processing(&mut self) {
        if !self.status.is_terminal() {
            self.status = TransferStatus::Processing;
        }
    }

    /// Processing -> Completed; stamps `processedAt`. No-op once terminal.
    pub fn complete(&mut self) {
        if !self.status.is_terminal() {
            self.status = TransferStatus::Completed;
            self.processed_at = Some(Utc::now());
        }
    }

    /// Processing -> Failed with a human-readable reason. No-op once terminal.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.status.is_terminal() {
            self.status = TransferStatus::Failed;
            self.error_message = Some(reason.into());
            self.processed_at = Some(Utc::now());
        }
    }
}

/// Direction of a history entry relative to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// One side of a settled transfer, appended to the owner's bounded history.
///
/// Exactly two entries exist per Completed transfer (sender `sent` with a
/// negative amount, recipient `received` with a positive one); none for
/// Failed transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub owner: OwnerId,
    pub transfer_id: TransferId,
    pub direction: Direction,
    /// Signed: negative for `sent`, positive for `received`.
    pub amount: Decimal,
    pub counterparty: String,
    pub timestamp: DateTime<Utc>,
    pub status: TransferStatus,
}

impl HistoryEntry {
    pub fn new(
        owner: OwnerId,
        transfer_id: TransferId,
        direction: Direction,
        amount: Decimal,
        counterparty: String,
        status: TransferStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            transfer_id,
            direction,
            amount,
            counterparty,
            timestamp: Utc::now(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn sample_transfer() -> Transfer {
        Transfer::new(
            "alice@example.com".into(),
            AccountRef::new("001", "2000-2"),
            "Bob".into(),
            Decimal::from_i64(100).unwrap(),
            "BRL".into(),
        )
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut transfer = sample_transfer();
        assert_eq!(transfer.status, TransferStatus::Pending);
        assert!(transfer.processed_at.is_none());

        transfer.mark_processing();
        assert_eq!(transfer.status, TransferStatus::Processing);

        transfer.complete();
        assert_eq!(transfer.status, TransferStatus::Completed);
        assert!(transfer.processed_at.is_some());
    }

    #[test]
    fn test_terminal_record_is_immutable() {
        let mut transfer = sample_transfer();
        transfer.mark_processing();
        transfer.fail("insufficient balance");
        assert_eq!(transfer.status, TransferStatus::Failed);

        // Further transitions are ignored.
        transfer.complete();
        assert_eq!(transfer.status, TransferStatus::Failed);
        transfer.mark_processing();
        assert_eq!(transfer.status, TransferStatus::Failed);
        assert_eq!(
            transfer.error_message.as_deref(),
            Some("insufficient balance")
        );
    }

    #[test]
    fn test_wire_format_field_names() {
        let transfer = sample_transfer();
        let json = serde_json::to_value(&transfer).unwrap();

        assert!(json.get("id").is_some());
        assert!(json.get("fromAccountOwner").is_some());
        assert!(json.get("toRoutingId").is_some());
        assert!(json.get("toAccountNumber").is_some());
        assert!(json.get("toOwnerName").is_some());
        assert!(json.get("amount").is_some());
        assert!(json.get("status").is_some());
        assert!(json.get("createdAt").is_some());
        // Progressive fields are omitted until populated.
        assert!(json.get("errorMessage").is_none());
        assert!(json.get("processedAt").is_none());
    }

    #[test]
    fn test_wire_roundtrip() {
        let mut transfer = sample_transfer();
        transfer.mark_processing();
        transfer.fail("recipient not found");

        let bytes = serde_json::to_vec(&transfer).unwrap();
        let decoded: Transfer = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, transfer);
    }
}

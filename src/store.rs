//! Status/History Store - key-value store for transfer status, per-account
//! history, and balance snapshots.
//!
//! This is the source of truth for cross-process status polling; the intake
//! cache reconciles against it on read (store wins). Every key carries a
//! fixed TTL (24h default) and history lists are bounded to the most recent
//! 100 entries. Expiry is passive: checked on read, pruned on write, and an
//! expired entry is never returned.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::core_types::{OwnerId, TransferId};
use crate::transfer::types::{HistoryEntry, Transfer};

/// Default retention window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Per-owner history cap.
pub const DEFAULT_HISTORY_CAP: usize = 100;

struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Concurrent TTL'd store, shared between intake, workers, and the gateway.
pub struct StatusHistoryStore {
    statuses: DashMap<TransferId, Expiring<Transfer>>,
    histories: DashMap<OwnerId, Expiring<VecDeque<HistoryEntry>>>,
    balances: DashMap<OwnerId, Expiring<Decimal>>,
    ttl: Duration,
    history_cap: usize,
}

impl StatusHistoryStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_TTL, DEFAULT_HISTORY_CAP)
    }

    pub fn with_retention(ttl: Duration, history_cap: usize) -> Self {
        Self {
            statuses: DashMap::new(),
            histories: DashMap::new(),
            balances: DashMap::new(),
            ttl,
            history_cap: history_cap.max(1),
        }
    }

    /// Persist the transfer record under its id, refreshing the TTL.
    pub fn set_status(&self, transfer: &Transfer) {
        self.statuses
            .insert(transfer.id, Expiring::new(transfer.clone(), self.ttl));
    }

    /// Fetch the persisted record. Expired entries are dropped, never
    /// returned.
    pub fn get_status(&self, id: &TransferId) -> Option<Transfer> {
        let entry = self.statuses.get(id)?;
        if entry.expired() {
            drop(entry);
            self.statuses.remove(id);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Remove a record. Used by intake to compensate a Pending write when
    /// the enqueue fails.
    pub fn remove_status(&self, id: &TransferId) {
        self.statuses.remove(id);
    }

    /// Append to the owner's history: newest at the head, trimmed to the
    /// cap, TTL refreshed on write.
    pub fn append_history(&self, entry: HistoryEntry) {
        let mut slot = self
            .histories
            .entry(entry.owner.clone())
            .or_insert_with(|| Expiring::new(VecDeque::new(), self.ttl));
        if slot.expired() {
            slot.value.clear();
        }
        slot.value.push_front(entry);
        slot.value.truncate(self.history_cap);
        slot.expires_at = Instant::now() + self.ttl;
    }

    /// Most-recent-first history for an owner. Empty when absent or
    /// expired, never an error.
    pub fn get_history(&self, owner: &str) -> Vec<HistoryEntry> {
        match self.histories.get(owner) {
            Some(entry) if !entry.expired() => entry.value.iter().cloned().collect(),
            Some(entry) => {
                drop(entry);
                self.histories.remove(owner);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Record the post-settlement balance snapshot for an owner.
    pub fn set_balance(&self, owner: &str, balance: Decimal) {
        self.balances
            .insert(owner.to_string(), Expiring::new(balance, self.ttl));
    }

    /// Latest balance snapshot, if one exists and has not expired.
    pub fn get_balance(&self, owner: &str) -> Option<Decimal> {
        let entry = self.balances.get(owner)?;
        if entry.expired() {
            drop(entry);
            self.balances.remove(owner);
            return None;
        }
        Some(entry.value)
    }
}

impl Default for StatusHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::AccountRef;
    use crate::transfer::state::TransferStatus;
    use crate::transfer::types::Direction;
    use rust_decimal::prelude::FromPrimitive;

    fn dec(v: i64) -> Decimal {
        Decimal::from_i64(v).unwrap()
    }

    fn sample_transfer() -> Transfer {
        Transfer::new(
            "alice@example.com".into(),
            AccountRef::new("001", "2000-2"),
            "Bob".into(),
            dec(100),
            "BRL".into(),
        )
    }

    fn sample_entry(owner: &str, amount: i64) -> HistoryEntry {
        HistoryEntry::new(
            owner.into(),
            TransferId::new(),
            Direction::Sent,
            dec(amount),
            "Bob".into(),
            TransferStatus::Completed,
        )
    }

    #[test]
    fn test_status_roundtrip() {
        let store = StatusHistoryStore::new();
        let transfer = sample_transfer();
        store.set_status(&transfer);
        assert_eq!(store.get_status(&transfer.id), Some(transfer.clone()));

        store.remove_status(&transfer.id);
        assert_eq!(store.get_status(&transfer.id), None);
    }

    #[test]
    fn test_expired_status_is_never_returned() {
        let store = StatusHistoryStore::with_retention(Duration::from_millis(20), 100);
        let transfer = sample_transfer();
        store.set_status(&transfer);
        assert!(store.get_status(&transfer.id).is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(store.get_status(&transfer.id), None);
    }

    #[test]
    fn test_history_is_most_recent_first_and_bounded() {
        let store = StatusHistoryStore::with_retention(DEFAULT_TTL, 3);
        for amount in 1..=5 {
            store.append_history(sample_entry("alice@example.com", amount));
        }

        let history = store.get_history("alice@example.com");
        assert_eq!(history.len(), 3);
        // Newest at the head, oldest trimmed away.
        assert_eq!(history[0].amount, dec(5));
        assert_eq!(history[1].amount, dec(4));
        assert_eq!(history[2].amount, dec(3));
    }

    #[test]
    fn test_history_falls_back_to_empty() {
        let store = StatusHistoryStore::new();
        assert!(store.get_history("nobody@example.com").is_empty());
    }

    #[test]
    fn test_history_expires_with_ttl() {
        let store = StatusHistoryStore::with_retention(Duration::from_millis(20), 100);
        store.append_history(sample_entry("alice@example.com", 1));
        std::thread::sleep(Duration::from_millis(40));
        assert!(store.get_history("alice@example.com").is_empty());
    }

    #[test]
    fn test_balance_snapshot() {
        let store = StatusHistoryStore::new();
        assert_eq!(store.get_balance("alice@example.com"), None);
        store.set_balance("alice@example.com", dec(900));
        assert_eq!(store.get_balance("alice@example.com"), Some(dec(900)));
    }
}

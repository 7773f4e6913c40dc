//! WebSocket connection registry.
//!
//! Maps an owner to every live connection they hold (mobile + web), using
//! DashMap for concurrent access. Publishing to an owner with no
//! connections is a no-op; failed sends are logged and swallowed.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::messages::WsMessage;
use crate::core_types::OwnerId;

/// WebSocket sender channel type.
pub type WsSender = mpsc::UnboundedSender<WsMessage>;

/// Unique connection identifier.
pub type ConnectionId = u64;

/// Per-owner subscriber registry: join/leave/publish are its whole surface.
pub struct ConnectionManager {
    /// owner -> list of (connection_id, sender)
    connections: DashMap<OwnerId, Vec<(ConnectionId, WsSender)>>,
    next_conn_id: AtomicU64,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Join the owner's group. Returns the id used to leave later.
    pub fn add_connection(&self, owner: &str, tx: WsSender) -> ConnectionId {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);

        self.connections
            .entry(owner.to_string())
            .or_default()
            .push((conn_id, tx));

        tracing::info!(owner, conn_id, "WebSocket connection added");
        conn_id
    }

    /// Leave the owner's group; empty groups are removed.
    pub fn remove_connection(&self, owner: &str, conn_id: ConnectionId) {
        if let Some(mut senders) = self.connections.get_mut(owner) {
            senders.retain(|(id, _)| *id != conn_id);

            if senders.is_empty() {
                drop(senders);
                self.connections.remove(owner);
                tracing::info!(owner, conn_id, "All WebSocket connections closed");
            } else {
                tracing::info!(
                    owner,
                    conn_id,
                    remaining = senders.len(),
                    "WebSocket connection removed"
                );
            }
        }
    }

    /// Publish to every member of the owner's group. Best-effort,
    /// at-most-once per connected subscriber; a disconnected client falls
    /// back to polling.
    pub fn send_to_owner(&self, owner: &str, message: WsMessage) {
        if let Some(senders) = self.connections.get(owner) {
            for (conn_id, tx) in senders.iter() {
                if tx.send(message.clone()).is_err() {
                    tracing::warn!(owner, conn_id, "Push dropped - client disconnected");
                }
            }
            tracing::debug!(owner, recipients = senders.len(), "Status pushed to owner");
        }
    }

    /// (owners, total connections) for observability.
    pub fn stats(&self) -> (usize, usize) {
        let owners = self.connections.len();
        let total: usize = self.connections.iter().map(|e| e.value().len()).sum();
        (owners, total)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

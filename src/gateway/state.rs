//! Shared gateway application state.

use std::sync::Arc;

use crate::ledger::Ledger;
use crate::store::StatusHistoryStore;
use crate::transfer::TransferIntake;
use crate::websocket::ConnectionManager;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<TransferIntake>,
    pub store: Arc<StatusHistoryStore>,
    /// Read-only ledger views for balance queries.
    pub ledger: Arc<Ledger>,
    pub ws_manager: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(
        intake: Arc<TransferIntake>,
        store: Arc<StatusHistoryStore>,
        ledger: Arc<Ledger>,
        ws_manager: Arc<ConnectionManager>,
    ) -> Self {
        Self {
            intake,
            store,
            ledger,
            ws_manager,
        }
    }
}

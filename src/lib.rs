//! PayFlow - Asynchronous Funds-Transfer Settlement Pipeline
//!
//! Accepts transfer requests over HTTP, settles them asynchronously off a
//! durable-in-process queue, and pushes status updates to account owners
//! over WebSocket.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (TransferId, AccountRef, etc.)
//! - [`ledger`] - Account balances and atomic settlement
//! - [`store`] - TTL-bound status/history/balance store
//! - [`transfer`] - Intake, queue, state machine, settlement worker
//! - [`websocket`] - Connection registry, push-event notifier, ws handler
//! - [`gateway`] - HTTP/WebSocket API surface
//! - [`config`] - YAML application configuration
//! - [`logging`] - Tracing subscriber setup

// Core types - must be first!
pub mod core_types;

// Domain components
pub mod ledger;
pub mod store;
pub mod transfer;
pub mod websocket;

// Service surface
pub mod config;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use core_types::{AccountRef, OwnerId, RecipientRef, TransferId};
pub use ledger::{Ledger, LedgerError, Settlement};
pub use store::StatusHistoryStore;
pub use transfer::{
    InMemoryQueue, SettlementWorker, SubmitRequest, TransferError, TransferIntake, TransferQueue,
    TransferStatus, WorkerConfig,
};
pub use websocket::{ConnectionManager, NotifierService, PushEvent, WsMessage};

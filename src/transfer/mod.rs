//! Asynchronous transfer settlement pipeline.
//!
//! # Architecture
//!
//! ```text
//! client -> Intake (validate, assign id, persist Pending, enqueue)
//!            -> Transfer Queue (at-least-once, consumer group)
//!                -> Settlement Worker (ledger mutation under mutex,
//!                   persist status/history, push notification)
//! ```
//!
//! # State machine
//!
//! ```text
//! PENDING -> PROCESSING -> COMPLETED
//!                 |
//!                 +------> FAILED
//! ```
//!
//! # Invariants
//!
//! 1. Amount > 0 and a resolvable recipient are checked before anything is
//!    enqueued.
//! 2. The ledger critical section covers lookup, funds check, and both
//!    mutations; it never spans I/O.
//! 3. Terminal records are immutable; redelivered terminal ids are skipped.
//! 4. A failed enqueue rolls the Pending record back before returning.

pub mod error;
pub mod intake;
pub mod queue;
pub mod state;
pub mod types;
pub mod worker;

pub use error::TransferError;
pub use intake::{SubmitRequest, TransferIntake};
pub use queue::{InMemoryQueue, QueueError, TransferConsumer, TransferQueue};
pub use state::TransferStatus;
pub use types::{Direction, HistoryEntry, Transfer};
pub use worker::{SettlementWorker, WorkerConfig};

//! Transfer lifecycle states.
//!
//! Transitions are monotonic: `Pending -> Processing -> {Completed | Failed}`.
//! Terminal states never transition again; the worker checks
//! [`TransferStatus::is_terminal`] before touching a redelivered message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transfer status, as persisted and pushed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// Recorded at intake, before the worker has seen the message.
    Pending,
    /// Worker has dequeued the message and is settling it.
    Processing,
    /// Terminal: funds moved, record immutable.
    Completed,
    /// Terminal: settlement refused, ledger untouched.
    Failed,
}

impl TransferStatus {
    /// Terminal states admit no further transitions.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }

    /// Position in the lifecycle, for monotonicity checks.
    #[inline]
    pub fn rank(&self) -> u8 {
        match self {
            TransferStatus::Pending => 0,
            TransferStatus::Processing => 1,
            TransferStatus::Completed | TransferStatus::Failed => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Processing => "PROCESSING",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Core type definitions shared across the pipeline.
//!
//! Identifiers are deliberately opaque: a transfer is keyed by a ULID
//! (sortable, string-encoded on the wire), an account by its routing id +
//! account number pair, and an owner by a stable identifier (email).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Stable owner identifier (an email address in practice).
pub type OwnerId = String;

/// Unique transfer identifier, assigned once at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransferId(Ulid);

impl TransferId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Ulid::from_str(s)?))
    }
}

/// Account-pair identity: routing id + account number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub routing_id: String,
    pub account_number: String,
}

impl AccountRef {
    pub fn new(routing_id: impl Into<String>, account_number: impl Into<String>) -> Self {
        Self {
            routing_id: routing_id.into(),
            account_number: account_number.into(),
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.routing_id, self.account_number)
    }
}

/// How a caller names the recipient of a transfer: either the raw
/// account-pair, or an owner alias resolved against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientRef {
    Account(AccountRef),
    Owner(OwnerId),
}

impl fmt::Display for RecipientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipientRef::Account(acct) => write!(f, "{}", acct),
            RecipientRef::Owner(owner) => write!(f, "{}", owner),
        }
    }
}

//! Notification records emitted by successful mutations.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// Name under which [`TransferEvent`]s are emitted.
pub const TRANSFER_EVENT: &str = "transferEvent";

/// Name under which [`ApprovalEvent`]s are emitted.
pub const APPROVAL_EVENT: &str = "approvalEvent";

/// Value moved between two addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Debited address.
    pub sender: String,
    /// Credited address.
    pub recipient: String,
    /// Amount moved.
    pub amount: Amount,
}

/// An allowance was set.
///
/// Also the record shape returned by `approvalList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    /// Owner of the balance.
    pub owner: String,
    /// Address allowed to spend.
    pub spender: String,
    /// Allowance after the change.
    pub amount: Amount,
}

//! # tally-ledger
//!
//! Accounting core of a fungible token kept in a key-value world state.
//!
//! This crate provides:
//! - Token issuance, supply and balance queries, transfers
//! - Allowances: approve, increase, decrease, per-owner listing
//! - Delegated transfers, locally and against another ledger instance
//! - A string-parameter dispatcher answering with status-coded responses
//!
//! The ledger owns no state. A host supplies a [`LedgerStore`], an
//! [`EventSink`] and a [`ContractInvoker`]; every operation runs in its own
//! [`TxContext`] and either commits all of its writes and events or none.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tally_ledger::{HostContext, LedgerStore, EventSink, ContractInvoker, TokenContract};
//!
//! fn run(store: &dyn LedgerStore, sink: &dyn EventSink, invoker: &dyn ContractInvoker) {
//!     let contract = TokenContract::new();
//!     let init = ["GLD", "GLD", "alice", "1000"].map(String::from);
//!     let _ = contract.init(store, &init).commit(store, sink);
//!
//!     let host = HostContext { store, invoker, channel_id: "tally-channel" };
//!     let args = ["alice", "bob", "300"].map(String::from);
//!     let response = contract.invoke(&host, "transfer", &args).commit(store, sink);
//!     assert_eq!(response.payload_str(), "Transfer Success");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod allowance;
pub mod amount;
pub mod context;
pub mod contract;
pub mod delegated;
pub mod error;
pub mod events;
pub mod key;
pub mod response;
pub mod store;
pub mod token;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod testing;

pub use allowance::{AllowanceLedger, Approvals};
pub use amount::Amount;
pub use context::{Effects, TxContext};
pub use contract::{HostContext, Invocation, Operation, TokenContract, INIT_ARITY};
pub use delegated::{transfer_from_other, DelegatedTransferEngine, TRANSFER_FROM_FN};
pub use error::{LedgerError, Result};
pub use events::{ApprovalEvent, TransferEvent, APPROVAL_EVENT, TRANSFER_EVENT};
pub use key::{CompositeKey, KeyRange, APPROVAL_NAMESPACE};
pub use response::Response;
pub use store::{
    ChaincodeEvent, ContractInvoker, EventSink, KeyValue, LedgerStore, ReadSet, StateIter, WriteSet,
};
pub use token::{TokenLedger, TokenMetadata};

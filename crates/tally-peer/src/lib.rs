//! # tally-peer
//!
//! In-process host for [`tally_ledger`] contracts.
//!
//! A [`Peer`] keeps a registry of deployed ledgers, each with its own
//! [`MemoryWorldState`]. It collects committed events in an [`EventLog`],
//! routes cross-contract calls between deployments on the same channel and
//! optionally snapshots world state to JSON files so that state survives
//! restarts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod peer;
pub mod snapshot;
pub mod world_state;

pub use config::{PeerConfig, DEFAULT_CHANNEL};
pub use error::{PeerError, Result};
pub use events::{ContractEvents, EventLog, RecordedEvent};
pub use peer::{Deployment, Outcome, Peer, FORBIDDEN};
pub use snapshot::{ContractSnapshot, SnapshotStore};
pub use world_state::MemoryWorldState;

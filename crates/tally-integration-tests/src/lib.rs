//! Integration test crate for the tally ledger.
//!
//! This crate exists solely to run tests that span the ledger and the peer
//! that hosts it. It has no public API - all functionality is in the test
//! modules.

#![forbid(unsafe_code)]

//! Listing deployed contracts.

use std::io::Write;

use tally_peer::Peer;

use crate::error::CliError;
use crate::output::{ContractInfo, ContractList, OutputFormat};

/// Contracts command executor.
pub struct ContractsCommand<'a> {
    peer: &'a Peer,
}

impl<'a> ContractsCommand<'a> {
    /// Create a new contracts command.
    #[must_use]
    pub const fn new(peer: &'a Peer) -> Self {
        Self { peer }
    }

    /// Print every deployed contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let contracts = self
            .peer
            .contracts()
            .into_iter()
            .filter_map(|name| {
                let keys = self.peer.deployment(&name)?.state().len();
                Some(ContractInfo { name, keys })
            })
            .collect();
        let list = ContractList {
            channel: self.peer.config().channel_id.clone(),
            contracts,
        };
        format.write(writer, &list)
    }
}

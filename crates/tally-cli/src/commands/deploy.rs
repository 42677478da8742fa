//! Contract deployment.

use std::io::Write;

use tally_peer::Peer;

use crate::cli::DeployArgs;
use crate::error::CliError;
use crate::output::{CallResult, OutputFormat};

/// Deploy command executor.
pub struct DeployCommand<'a> {
    peer: &'a Peer,
}

impl<'a> DeployCommand<'a> {
    /// Create a new deploy command.
    #[must_use]
    pub const fn new(peer: &'a Peer) -> Self {
        Self { peer }
    }

    /// Deploy and initialize the contract. Returns whether initialization
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the contract name is taken or invalid, or the
    /// output cannot be written.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &DeployArgs,
    ) -> Result<bool, CliError> {
        let outcome = self.peer.deploy(&args.contract, &args.init_params())?;
        let result = CallResult::new(&args.contract, "init", &outcome.response, true, &outcome.events);
        format.write(writer, &result)?;
        Ok(result.is_success())
    }
}

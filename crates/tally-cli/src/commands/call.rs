//! `invoke` and `query`.

use std::io::Write;

use tracing::debug;

use tally_peer::Peer;

use crate::cli::CallArgs;
use crate::error::CliError;
use crate::output::{CallResult, OutputFormat};

/// Runs one contract operation.
pub struct CallCommand<'a> {
    peer: &'a Peer,
    commit: bool,
}

impl<'a> CallCommand<'a> {
    /// An executor that commits effects.
    #[must_use]
    pub const fn invoke(peer: &'a Peer) -> Self {
        Self { peer, commit: true }
    }

    /// An executor that discards effects.
    #[must_use]
    pub const fn query(peer: &'a Peer) -> Self {
        Self { peer, commit: false }
    }

    /// Run the operation and print its result. Returns whether the
    /// operation succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &CallArgs,
    ) -> Result<bool, CliError> {
        debug!(contract = %args.contract, function = %args.function, commit = self.commit, "calling contract");
        let result = if self.commit {
            let outcome = self.peer.invoke(&args.contract, &args.function, &args.params);
            CallResult::new(&args.contract, &args.function, &outcome.response, true, &outcome.events)
        } else {
            let response = self.peer.query(&args.contract, &args.function, &args.params);
            CallResult::new(&args.contract, &args.function, &response, false, &[])
        };
        format.write(writer, &result)?;
        Ok(result.is_success())
    }
}

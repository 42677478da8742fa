//! The peer: a registry of deployed ledger contracts.
//!
//! Each deployment owns its world state. Invocations run against that
//! state, commit their effects and, when persistence is on, rewrite the
//! deployment's snapshot. Contracts reach sibling ledgers through a
//! [`ContractInvoker`] scoped to the outer call, so a nested call commits
//! exactly when the call that made it does.
//!
//! The peer may be shared between threads. Concurrent invocations on one
//! deployment run optimistically: a commit whose reads went stale fails
//! with status 409 and the caller may retry.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use tally_ledger::key::validate_component;
use tally_ledger::{ContractInvoker, HostContext, Response, TokenContract};

use crate::config::PeerConfig;
use crate::error::{PeerError, Result};
use crate::events::{EventLog, RecordedEvent};

type EventTap = Mutex<Vec<RecordedEvent>>;
use crate::snapshot::SnapshotStore;
use crate::world_state::MemoryWorldState;

/// Status returned when a cross-contract call names another channel.
pub const FORBIDDEN: u16 = 403;

/// A contract together with its world state.
#[derive(Debug)]
pub struct Deployment {
    name: String,
    contract: TokenContract,
    state: MemoryWorldState,
}

impl Deployment {
    /// Deployment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Committed world state.
    #[must_use]
    pub fn state(&self) -> &MemoryWorldState {
        &self.state
    }
}

/// Outcome of [`Peer::invoke`]: the response and the events it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Response returned by the contract.
    pub response: Response,
    /// Events committed by this call, including those of nested calls.
    pub events: Vec<RecordedEvent>,
}

/// In-process host for ledger contracts.
pub struct Peer {
    config: PeerConfig,
    deployments: RwLock<BTreeMap<String, Arc<Deployment>>>,
    events: EventLog,
    snapshots: Option<SnapshotStore>,
    // Serializes snapshot writes so a later state is never overwritten by
    // an earlier one.
    persist_lock: Mutex<()>,
}

/// Invoker handed to a running contract. Nested calls inherit `commit`
/// and report their events into the outer call's tap.
struct CallScope<'p> {
    peer: &'p Peer,
    commit: bool,
    tap: &'p EventTap,
}

impl ContractInvoker for CallScope<'_> {
    fn invoke_contract(&self, target: &str, args: &[Vec<u8>], channel: &str) -> Response {
        self.peer.call_nested(target, args, channel, self.commit, self.tap)
    }
}

impl Peer {
    /// Create a peer with no deployments and nothing loaded from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: PeerConfig) -> Result<Self> {
        config.validate()?;
        let snapshots = config
            .persist
            .then(|| SnapshotStore::new(config.state_dir.clone()));
        Ok(Self {
            config,
            deployments: RwLock::new(BTreeMap::new()),
            events: EventLog::new(),
            snapshots,
            persist_lock: Mutex::new(()),
        })
    }

    /// Create a peer and restore every deployment saved in the state
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a snapshot is
    /// unreadable.
    pub fn open(config: PeerConfig) -> Result<Self> {
        let peer = Self::new(config)?;
        if let Some(snapshots) = &peer.snapshots {
            let restored = snapshots.load_all()?;
            let mut deployments = peer.deployments.write();
            for snapshot in restored {
                debug!(contract = %snapshot.contract, entries = snapshot.entries.len(), "restoring deployment");
                deployments.insert(
                    snapshot.contract.clone(),
                    Arc::new(Deployment {
                        name: snapshot.contract,
                        contract: TokenContract::new(),
                        state: MemoryWorldState::from_entries(snapshot.entries),
                    }),
                );
            }
            info!(contracts = deployments.len(), dir = %snapshots.dir().display(), "peer opened");
        }
        Ok(peer)
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    /// Names of deployed contracts, sorted.
    #[must_use]
    pub fn contracts(&self) -> Vec<String> {
        self.deployments.read().keys().cloned().collect()
    }

    /// A deployment by name.
    #[must_use]
    pub fn deployment(&self, name: &str) -> Option<Arc<Deployment>> {
        self.deployments.read().get(name).cloned()
    }

    /// The peer's event log.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Deploy a new ledger under `name` and run its initialization with
    /// `params` (`tokenName, symbol, owner, amount`).
    ///
    /// A failed initialization leaves nothing deployed and is reported
    /// through the returned response.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is invalid or already deployed, or the
    /// snapshot cannot be written.
    pub fn deploy(&self, name: &str, params: &[String]) -> Result<Outcome> {
        validate_deployment_name(name)?;
        if self.deployments.read().contains_key(name) {
            return Err(PeerError::ContractExists(name.to_string()));
        }

        let deployment = Deployment {
            name: name.to_string(),
            contract: TokenContract::new(),
            state: MemoryWorldState::new(),
        };
        let tap = EventTap::default();
        let response = deployment
            .contract
            .init(&deployment.state, params)
            .commit(&deployment.state, &self.events.sink(name, &tap));
        if !response.is_success() {
            warn!(contract = %name, status = response.status, message = %response.message, "initialization failed");
            return Ok(Outcome {
                response,
                events: tap.into_inner(),
            });
        }

        {
            let mut deployments = self.deployments.write();
            if deployments.contains_key(name) {
                return Err(PeerError::ContractExists(name.to_string()));
            }
            // Saved before it is published: a deployment that could not be
            // persisted is never visible.
            self.persist(&deployment)?;
            deployments.insert(name.to_string(), Arc::new(deployment));
        }
        info!(contract = %name, channel = %self.config.channel_id, "contract deployed");
        Ok(Outcome {
            response,
            events: tap.into_inner(),
        })
    }

    /// Run `function` on `contract` and commit its effects.
    #[must_use]
    pub fn invoke(&self, contract: &str, function: &str, params: &[String]) -> Outcome {
        let tap = EventTap::default();
        let response = self.execute(contract, function, params, true, &tap);
        Outcome {
            response,
            events: tap.into_inner(),
        }
    }

    /// Run `function` on `contract` and discard its effects, including
    /// those of nested cross-contract calls.
    #[must_use]
    pub fn query(&self, contract: &str, function: &str, params: &[String]) -> Response {
        self.execute(contract, function, params, false, &EventTap::default())
    }

    fn execute(
        &self,
        contract: &str,
        function: &str,
        params: &[String],
        commit: bool,
        tap: &EventTap,
    ) -> Response {
        // Clone out of the registry so no lock is held while the contract
        // runs; nested calls re-enter the registry.
        let Some(deployment) = self.deployment(contract) else {
            debug!(contract = %contract, "invocation of unknown contract");
            return Response::failure(
                tally_ledger::response::NOT_FOUND,
                PeerError::ContractNotFound(contract.to_string()).to_string(),
            );
        };

        let scope = CallScope {
            peer: self,
            commit,
            tap,
        };
        let host = HostContext {
            store: &deployment.state,
            invoker: &scope,
            channel_id: &self.config.channel_id,
        };
        let invocation = deployment.contract.invoke(&host, function, params);
        if !commit {
            return invocation.response;
        }

        let wrote = !invocation.effects.writes.is_empty();
        let response = invocation.commit(&deployment.state, &self.events.sink(contract, tap));
        if response.is_success() && wrote {
            if let Err(err) = self.persist(&deployment) {
                warn!(contract = %contract, error = %err, "failed to snapshot world state");
            }
        }
        response
    }

    fn persist(&self, deployment: &Deployment) -> Result<()> {
        let Some(snapshots) = &self.snapshots else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock();
        snapshots.save(&deployment.name, &deployment.state.entries())
    }

    fn call_nested(
        &self,
        target: &str,
        args: &[Vec<u8>],
        channel: &str,
        commit: bool,
        tap: &EventTap,
    ) -> Response {
        if channel != self.config.channel_id {
            warn!(target = %target, channel = %channel, "cross-channel invocation refused");
            return Response::failure(
                FORBIDDEN,
                format!("channel {channel} is not served by this peer"),
            );
        }

        let mut decoded = Vec::with_capacity(args.len());
        for arg in args {
            match std::str::from_utf8(arg) {
                Ok(text) => decoded.push(text.to_string()),
                Err(_) => {
                    return Response::failure(400, "arguments must be UTF-8 text");
                }
            }
        }
        let Some((function, params)) = decoded.split_first() else {
            return Response::failure(400, "missing operation name");
        };

        debug!(target = %target, function = %function, commit, "cross-contract invocation");
        self.execute(target, function, params, commit, tap)
    }
}

impl ContractInvoker for Peer {
    fn invoke_contract(&self, target: &str, args: &[Vec<u8>], channel: &str) -> Response {
        self.call_nested(target, args, channel, true, &EventTap::default())
    }
}

fn validate_deployment_name(name: &str) -> Result<()> {
    validate_component(name, "contract name")?;
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        || name.starts_with('.')
    {
        return Err(PeerError::Config(format!(
            "contract name {name:?} must contain only alphanumeric characters, dots, hyphens, and underscores"
        )));
    }
    Ok(())
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("channel_id", &self.config.channel_id)
            .field("contracts", &self.contracts())
            .finish_non_exhaustive()
    }
}

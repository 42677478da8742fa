//! Operation dispatch.
//!
//! The host hands the contract an operation name and string parameters.
//! Arity is checked first, then each parameter is parsed, then the
//! operation runs against a fresh [`TxContext`]. Every error is turned into
//! a failure [`Response`] here; nothing escapes as a panic or aborts the
//! process.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::allowance::AllowanceLedger;
use crate::amount::Amount;
use crate::context::{Effects, TxContext};
use crate::delegated::{transfer_from_other, DelegatedTransferEngine};
use crate::error::{LedgerError, Result};
use crate::events::ApprovalEvent;
use crate::key::validate_component;
use crate::response::Response;
use crate::store::{ContractInvoker, EventSink, LedgerStore};
use crate::token::TokenLedger;

/// Number of parameters of the initialization operation.
pub const INIT_ARITY: usize = 4;

/// Operations reachable through [`TokenContract::invoke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `totalSupply(tokenName)`
    TotalSupply,
    /// `balanceOf(address)`
    BalanceOf,
    /// `transfer(sender, recipient, amount)`
    Transfer,
    /// `allowance(owner, spender)`
    Allowance,
    /// `approve(owner, spender, amount)`
    Approve,
    /// `approvalList(owner)`
    ApprovalList,
    /// `transferFrom(owner, spender, recipient, amount)`
    TransferFrom,
    /// `transferFromOther(target, owner, sender, recipient, amount)`
    TransferFromOther,
    /// `increaseAllowance(owner, spender, delta)`
    IncreaseAllowance,
    /// `decreaseAllowance(owner, spender, delta)`
    DecreaseAllowance,
    /// Recognized but without policy: succeeds with no effect.
    Mint,
    /// Recognized but without policy: succeeds with no effect.
    Burn,
}

impl Operation {
    /// Every operation, in dispatch-table order.
    pub const ALL: [Self; 12] = [
        Self::TotalSupply,
        Self::BalanceOf,
        Self::Transfer,
        Self::Allowance,
        Self::Approve,
        Self::ApprovalList,
        Self::TransferFrom,
        Self::TransferFromOther,
        Self::IncreaseAllowance,
        Self::DecreaseAllowance,
        Self::Mint,
        Self::Burn,
    ];

    /// Wire name of the operation.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TotalSupply => "totalSupply",
            Self::BalanceOf => "balanceOf",
            Self::Transfer => "transfer",
            Self::Allowance => "allowance",
            Self::Approve => "approve",
            Self::ApprovalList => "approvalList",
            Self::TransferFrom => "transferFrom",
            Self::TransferFromOther => "transferFromOther",
            Self::IncreaseAllowance => "increaseAllowance",
            Self::DecreaseAllowance => "decreaseAllowance",
            Self::Mint => "mint",
            Self::Burn => "burn",
        }
    }

    /// Required number of parameters. `None` if unchecked.
    #[must_use]
    pub const fn arity(&self) -> Option<usize> {
        match self {
            Self::TotalSupply | Self::BalanceOf | Self::ApprovalList => Some(1),
            Self::Allowance => Some(2),
            Self::Transfer | Self::Approve | Self::IncreaseAllowance | Self::DecreaseAllowance => {
                Some(3)
            }
            Self::TransferFrom => Some(4),
            Self::TransferFromOther => Some(5),
            Self::Mint | Self::Burn => None,
        }
    }

    /// Whether the operation never writes.
    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(
            self,
            Self::TotalSupply | Self::BalanceOf | Self::Allowance | Self::ApprovalList
        )
    }
}

impl FromStr for Operation {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| LedgerError::not_found("operation", s))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capabilities available to one invocation.
#[derive(Clone, Copy)]
pub struct HostContext<'a> {
    /// Committed world state of this contract.
    pub store: &'a dyn LedgerStore,
    /// Inter-contract call facility.
    pub invoker: &'a dyn ContractInvoker,
    /// Channel the invocation arrived on.
    pub channel_id: &'a str,
}

/// Outcome of one operation: the response and the effects to commit.
///
/// Effects are empty whenever the response is a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Response for the caller.
    pub response: Response,
    /// Writes and events produced.
    pub effects: Effects,
}

impl Invocation {
    fn finish(operation: &str, outcome: Result<(Vec<u8>, Effects)>) -> Self {
        match outcome {
            Ok((payload, effects)) => Self {
                response: Response::success(payload),
                effects,
            },
            Err(err) => {
                warn!(operation = %operation, status = err.status(), error = %err, "operation failed");
                Self {
                    response: Response::from(&err),
                    effects: Effects::default(),
                }
            }
        }
    }

    /// Commits the effects and returns the response.
    ///
    /// If the store rejects the batch, the response becomes a storage
    /// failure and no event is delivered.
    #[must_use]
    pub fn commit(self, store: &dyn LedgerStore, sink: &dyn EventSink) -> Response {
        if !self.response.is_success() {
            return self.response;
        }
        match self.effects.commit(store, sink) {
            Ok(()) => self.response,
            Err(err) => Response::from(&err),
        }
    }
}

/// The token contract: stateless, all state lives in the host's store.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenContract;

impl TokenContract {
    /// Create the contract.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Initialization: `tokenName, symbol, owner, amount`.
    #[must_use]
    pub fn init(&self, store: &dyn LedgerStore, params: &[String]) -> Invocation {
        debug!(params = ?params, "init called");
        let outcome = Self::issue(store, params);
        Invocation::finish("init", outcome)
    }

    /// Run `function` with `params`.
    ///
    /// Unknown operation names yield a 404 response.
    #[must_use]
    pub fn invoke(&self, host: &HostContext<'_>, function: &str, params: &[String]) -> Invocation {
        let Ok(operation) = function.parse::<Operation>() else {
            debug!(function = %function, "unknown operation");
            return Invocation {
                response: Response::not_found(),
                effects: Effects::default(),
            };
        };
        debug!(operation = %operation, params = params.len(), "invoke called");
        let outcome = self.execute(operation, host, params);
        Invocation::finish(operation.name(), outcome)
    }

    fn issue(store: &dyn LedgerStore, params: &[String]) -> Result<(Vec<u8>, Effects)> {
        check_arity(params, INIT_ARITY)?;
        let name = text(params, 0, "tokenName")?;
        let symbol = text(params, 1, "symbol")?;
        let owner = text(params, 2, "owner")?;
        let supply = Amount::parse(&params[3], "amount")?;

        let mut ctx = TxContext::new(store);
        TokenLedger::new(&mut ctx).issue(name, symbol, owner, supply)?;
        Ok((Vec::new(), ctx.into_effects()))
    }

    fn execute(
        &self,
        operation: Operation,
        host: &HostContext<'_>,
        params: &[String],
    ) -> Result<(Vec<u8>, Effects)> {
        if let Some(arity) = operation.arity() {
            check_arity(params, arity)?;
        }

        let mut ctx = TxContext::new(host.store);
        let payload = match operation {
            Operation::TotalSupply => {
                let name = text(params, 0, "tokenName")?;
                let supply = TokenLedger::new(&mut ctx).total_supply(name)?;
                serde_json::to_vec(&supply)?
            }
            Operation::BalanceOf => {
                let address = text(params, 0, "address")?;
                TokenLedger::new(&mut ctx).balance_of(address)?.to_state()
            }
            Operation::Transfer => {
                let sender = text(params, 0, "callerAddress")?;
                let recipient = text(params, 1, "recipientAddress")?;
                let amount = Amount::parse_positive(&params[2], "transferedMoney")?;
                TokenLedger::new(&mut ctx).transfer(sender, recipient, amount)?;
                b"Transfer Success".to_vec()
            }
            Operation::Allowance => {
                let owner = text(params, 0, "ownerAddress")?;
                let spender = text(params, 1, "spenderAddress")?;
                AllowanceLedger::new(&mut ctx).allowance(owner, spender)?.to_state()
            }
            Operation::Approve => {
                let owner = text(params, 0, "ownerAddress")?;
                let spender = text(params, 1, "spenderAddress")?;
                let amount = Amount::parse_positive(&params[2], "approveAmount")?;
                AllowanceLedger::new(&mut ctx).approve(owner, spender, amount)?;
                b"allowance success".to_vec()
            }
            Operation::ApprovalList => {
                let owner = text(params, 0, "ownerAddress")?;
                let approvals = AllowanceLedger::new(&mut ctx)
                    .approval_list(owner)?
                    .collect::<Result<Vec<ApprovalEvent>>>()?;
                serde_json::to_vec(&approvals)?
            }
            Operation::TransferFrom => {
                let owner = text(params, 0, "ownerAddress")?;
                let spender = text(params, 1, "spenderAddress")?;
                let recipient = text(params, 2, "recipientAddress")?;
                let amount = Amount::parse_positive(&params[3], "TransferedAmount")?;
                DelegatedTransferEngine::new(&mut ctx).transfer_from(owner, spender, recipient, amount)?;
                b"transferFrom func success".to_vec()
            }
            Operation::TransferFromOther => {
                let target = text(params, 0, "chaincodeName")?;
                let owner = text(params, 1, "ownerAddress")?;
                let sender = text(params, 2, "senderAddress")?;
                let recipient = text(params, 3, "recipientAddress")?;
                Amount::parse_positive(&params[4], "TransferedAmount")?;
                transfer_from_other(
                    host.invoker,
                    host.channel_id,
                    target,
                    owner,
                    sender,
                    recipient,
                    &params[4],
                )?;
                b"transferFrom in other token success".to_vec()
            }
            Operation::IncreaseAllowance => {
                let owner = text(params, 0, "ownerAddress")?;
                let spender = text(params, 1, "targetAddress")?;
                let delta = Amount::parse_positive(&params[2], "IncreaseAmount")?;
                AllowanceLedger::new(&mut ctx).increase(owner, spender, delta)?;
                b"increaseAllowance func success".to_vec()
            }
            Operation::DecreaseAllowance => {
                let owner = text(params, 0, "ownerAddress")?;
                let spender = text(params, 1, "targetAddress")?;
                let delta = Amount::parse_positive(&params[2], "decreaseAmount")?;
                AllowanceLedger::new(&mut ctx).decrease(owner, spender, delta)?;
                b"decreaseAllowance func success".to_vec()
            }
            Operation::Mint | Operation::Burn => {
                warn!(operation = %operation, "no supply policy defined, ignoring");
                Vec::new()
            }
        };

        let effects = ctx.into_effects();
        if !effects.is_empty() {
            info!(
                operation = %operation,
                writes = effects.writes.len(),
                events = effects.events.len(),
                "operation completed"
            );
        }
        Ok((payload, effects))
    }
}

fn check_arity(params: &[String], expected: usize) -> Result<()> {
    if params.len() == expected {
        Ok(())
    } else {
        Err(LedgerError::arity(expected, params.len()))
    }
}

fn text<'p>(params: &'p [String], index: usize, field: &str) -> Result<&'p str> {
    let value = params
        .get(index)
        .ok_or_else(|| LedgerError::validation(format!("{field} is missing")))?;
    validate_component(value, field)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, NoRemote, RecordingSink};
    use test_case::test_case;

    fn params(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn deployed() -> MemoryStore {
        let store = MemoryStore::default();
        let sink = RecordingSink::default();
        let response = TokenContract::new()
            .init(&store, &params(&["GLD", "GLD", "alice", "1000"]))
            .commit(&store, &sink);
        assert!(response.is_success(), "{}", response.message);
        store
    }

    fn call(store: &MemoryStore, function: &str, args: &[&str]) -> Response {
        let sink = RecordingSink::default();
        let host = HostContext {
            store,
            invoker: &NoRemote,
            channel_id: "ch",
        };
        TokenContract::new()
            .invoke(&host, function, &params(args))
            .commit(store, &sink)
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_operation_is_404() {
        let store = deployed();
        let resp = call(&store, "steal", &["alice"]);
        assert_eq!(resp.status, 404);
        assert_eq!(resp.message, "404 Not Found");
    }

    #[test_case("totalSupply", &[] ; "totalSupply")]
    #[test_case("balanceOf", &["a", "b"] ; "balanceOf")]
    #[test_case("transfer", &["a", "b"] ; "transfer")]
    #[test_case("allowance", &["a"] ; "allowance")]
    #[test_case("approve", &["a", "b", "1", "2"] ; "approve")]
    #[test_case("approvalList", &[] ; "approvalList")]
    #[test_case("transferFrom", &["a", "b", "c"] ; "transferFrom")]
    #[test_case("transferFromOther", &["t", "a", "b", "c"] ; "transferFromOther")]
    #[test_case("increaseAllowance", &["a", "b"] ; "increaseAllowance")]
    #[test_case("decreaseAllowance", &["a"] ; "decreaseAllowance")]
    fn test_wrong_arity_is_validation(function: &str, args: &[&str]) {
        let store = deployed();
        let resp = call(&store, function, args);
        assert_eq!(resp.status, 400);
        assert!(resp.message.contains("number of params"), "{}", resp.message);
    }

    #[test]
    fn test_arity_checked_before_amount() {
        let store = deployed();
        let resp = call(&store, "transfer", &["alice", "bob", "x", "extra"]);
        assert!(resp.message.contains("number of params"));
    }

    #[test_case(&["GLD", "GLD", "alice"] ; "too few")]
    #[test_case(&["", "GLD", "alice", "10"] ; "empty name")]
    #[test_case(&["GLD", "", "alice", "10"] ; "empty symbol")]
    #[test_case(&["GLD", "GLD", "", "10"] ; "empty owner")]
    #[test_case(&["GLD", "GLD", "alice", "-10"] ; "negative supply")]
    #[test_case(&["GLD", "GLD", "alice", "ten"] ; "non numeric supply")]
    fn test_init_validation(args: &[&str]) {
        let store = MemoryStore::default();
        let inv = TokenContract::new().init(&store, &params(args));
        assert_eq!(inv.response.status, 400);
        assert!(inv.effects.is_empty());
    }

    #[test]
    fn test_init_zero_supply_allowed() {
        let store = MemoryStore::default();
        let inv = TokenContract::new().init(&store, &params(&["GLD", "GLD", "alice", "0"]));
        assert!(inv.response.is_success());
    }

    #[test]
    fn test_reinit_conflicts() {
        let store = deployed();
        let inv = TokenContract::new().init(&store, &params(&["GLD", "GLD", "bob", "5"]));
        assert_eq!(inv.response.status, 409);
    }

    #[test]
    fn test_query_payload_encodings() {
        let store = deployed();
        assert_eq!(call(&store, "totalSupply", &["GLD"]).payload, b"1000");
        assert_eq!(call(&store, "balanceOf", &["alice"]).payload, b"1000");
        assert_eq!(call(&store, "allowance", &["alice", "carol"]).payload, b"0");
        assert_eq!(call(&store, "approvalList", &["alice"]).payload, b"[]");
    }

    #[test]
    fn test_balance_of_unknown_is_404() {
        let store = deployed();
        assert_eq!(call(&store, "balanceOf", &["zed"]).status, 404);
    }

    #[test]
    fn test_transfer_success_message() {
        let store = deployed();
        let resp = call(&store, "transfer", &["alice", "bob", "300"]);
        assert_eq!(resp.payload_str(), "Transfer Success");
        assert_eq!(call(&store, "balanceOf", &["bob"]).payload, b"300");
    }

    #[test_case("0" ; "zero")]
    #[test_case("-3" ; "negative")]
    #[test_case("lots" ; "not a number")]
    fn test_transfer_amount_validation(amount: &str) {
        let store = deployed();
        let resp = call(&store, "transfer", &["alice", "bob", amount]);
        assert_eq!(resp.status, 400);
        assert_eq!(call(&store, "balanceOf", &["alice"]).payload, b"1000");
    }

    #[test]
    fn test_insufficient_funds_is_422() {
        let store = deployed();
        assert_eq!(call(&store, "transfer", &["alice", "bob", "10000"]).status, 422);
    }

    #[test]
    fn test_approval_list_payload() {
        let store = deployed();
        call(&store, "approve", &["alice", "carol", "100"]);
        let resp = call(&store, "approvalList", &["alice"]);
        let listed: Vec<ApprovalEvent> = serde_json::from_slice(&resp.payload).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].spender, "carol");
        assert_eq!(listed[0].amount, Amount::new(100));
    }

    #[test]
    fn test_transfer_from_other_without_remote() {
        let store = deployed();
        let resp = call(&store, "transferFromOther", &["SLV", "alice", "carol", "dave", "1"]);
        assert_eq!(resp.status, 502);
        assert!(resp.message.contains("SLV"));
    }

    #[test]
    fn test_mint_and_burn_are_inert() {
        let store = deployed();
        assert!(call(&store, "mint", &["alice", "5"]).is_success());
        assert!(call(&store, "burn", &[]).is_success());
        assert_eq!(call(&store, "totalSupply", &["GLD"]).payload, b"1000");
    }

    #[test]
    fn test_failed_operation_has_no_effects() {
        let store = deployed();
        let host = HostContext {
            store: &store,
            invoker: &NoRemote,
            channel_id: "ch",
        };
        let inv = TokenContract::new().invoke(&host, "transferFrom", &params(&["alice", "carol", "dave", "5"]));
        assert_eq!(inv.response.status, 422);
        assert!(inv.effects.is_empty());
    }

    #[test]
    fn test_events_delivered_on_commit() {
        let store = deployed();
        let sink = RecordingSink::default();
        let host = HostContext {
            store: &store,
            invoker: &NoRemote,
            channel_id: "ch",
        };
        let resp = TokenContract::new()
            .invoke(&host, "approve", &params(&["alice", "carol", "7"]))
            .commit(&store, &sink);
        assert!(resp.is_success());
        assert_eq!(sink.names(), vec!["approvalEvent".to_string()]);
    }
}

//! Spending on behalf of an owner.
//!
//! `transfer_from` keeps two allowance records in step with the moved
//! value: the spender's allowance on the owner shrinks by the amount and the
//! recipient's allowance on the owner grows by it. Both allowances are read
//! before the transfer runs, and all writes share the caller's
//! [`TxContext`], so the whole operation commits or fails as one.

use tracing::{debug, warn};

use crate::allowance::AllowanceLedger;
use crate::amount::Amount;
use crate::context::TxContext;
use crate::error::{LedgerError, Result};
use crate::key::{CompositeKey, APPROVAL_NAMESPACE};
use crate::store::ContractInvoker;
use crate::token::TokenLedger;

/// Operation name forwarded to the target of a cross-contract transfer.
pub const TRANSFER_FROM_FN: &str = "transferFrom";

/// Delegated transfers, local and cross-contract.
pub struct DelegatedTransferEngine<'c, 's> {
    ctx: &'c mut TxContext<'s>,
}

impl<'c, 's> DelegatedTransferEngine<'c, 's> {
    /// Operate on `ctx`.
    pub fn new(ctx: &'c mut TxContext<'s>) -> Self {
        Self { ctx }
    }

    /// Move `amount` from `owner` to `recipient`, spending `spender`'s
    /// allowance.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero amount, insufficient-allowance
    /// if `spender` may not move `amount`, and whatever the inner transfer
    /// reports (not-found, insufficient-funds).
    pub fn transfer_from(
        &mut self,
        owner: &str,
        spender: &str,
        recipient: &str,
        amount: Amount,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(LedgerError::validation("TransferedAmount must be more than zero"));
        }

        let (spender_allowance, recipient_allowance) = {
            let allowances = AllowanceLedger::new(&mut *self.ctx);
            (
                allowances.allowance(owner, spender)?,
                allowances.allowance(owner, recipient)?,
            )
        };
        let debited = spender_allowance.checked_sub(amount).ok_or_else(|| {
            LedgerError::InsufficientAllowance {
                owner: owner.to_string(),
                spender: spender.to_string(),
                have: spender_allowance.units(),
                need: amount.units(),
            }
        })?;

        TokenLedger::new(&mut *self.ctx).transfer(owner, recipient, amount)?;

        // A spender that is also the recipient is credited on top of its debit.
        let recipient_base = if spender == recipient {
            debited
        } else {
            recipient_allowance
        };
        let credited = recipient_base
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow {
                key: CompositeKey::new(APPROVAL_NAMESPACE, [owner, recipient]).to_string(),
            })?;

        let mut allowances = AllowanceLedger::new(&mut *self.ctx);
        allowances.set(owner, spender, debited)?;
        allowances.set(owner, recipient, credited)?;

        debug!(
            owner = %owner,
            spender = %spender,
            recipient = %recipient,
            amount = %amount,
            "delegated transfer completed"
        );
        Ok(())
    }
}

/// Forward a `transferFrom` to another ledger instance.
///
/// Has no local state effect: the target commits its own changes.
///
/// # Errors
///
/// Returns a validation error for an empty target and a remote-invocation
/// error if the target rejects the call or cannot be reached.
pub fn transfer_from_other(
    invoker: &dyn ContractInvoker,
    channel_id: &str,
    target: &str,
    owner: &str,
    sender: &str,
    recipient: &str,
    amount: &str,
) -> Result<Vec<u8>> {
    if target.is_empty() {
        return Err(LedgerError::validation("target contract cannot be empty"));
    }

    let args: Vec<Vec<u8>> = [TRANSFER_FROM_FN, owner, sender, recipient, amount]
        .iter()
        .map(|arg| arg.as_bytes().to_vec())
        .collect();

    let response = invoker.invoke_contract(target, &args, channel_id);
    if !response.is_success() {
        warn!(
            target = %target,
            status = response.status,
            message = %response.message,
            "cross-contract transferFrom rejected"
        );
        return Err(LedgerError::RemoteInvocation {
            target: target.to_string(),
            status: response.status,
            message: response.message,
        });
    }

    debug!(target = %target, owner = %owner, recipient = %recipient, "cross-contract transferFrom completed");
    Ok(response.payload)
}

//! Delegated spending allowances.
//!
//! An allowance is keyed by the ordered pair (owner, spender). Unlike a
//! balance, an absent allowance is a valid state meaning zero. Entries are
//! never deleted: lowering an allowance to zero leaves a zero-valued record,
//! which `approval_list` still reports.

use tracing::debug;

use crate::amount::Amount;
use crate::context::TxContext;
use crate::error::{LedgerError, Result};
use crate::events::{ApprovalEvent, APPROVAL_EVENT};
use crate::key::{allowance_key, validate_component, CompositeKey, APPROVAL_NAMESPACE};
use crate::store::StateIter;

/// Allowance operations over one transaction context.
pub struct AllowanceLedger<'c, 's> {
    ctx: &'c mut TxContext<'s>,
}

impl<'c, 's> AllowanceLedger<'c, 's> {
    /// Operate on `ctx`.
    pub fn new(ctx: &'c mut TxContext<'s>) -> Self {
        Self { ctx }
    }

    /// Amount `spender` may move out of `owner`'s balance. Zero if never
    /// approved.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the stored value is unreadable.
    pub fn allowance(&self, owner: &str, spender: &str) -> Result<Amount> {
        let key = allowance_key(owner, spender);
        match self.ctx.get(&key)? {
            Some(bytes) => Amount::from_state(&bytes, &key),
            None => Ok(Amount::ZERO),
        }
    }

    /// Set the allowance to exactly `amount`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `amount` is zero or either address is
    /// empty or reserved.
    pub fn approve(&mut self, owner: &str, spender: &str, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Err(LedgerError::validation("approveAmount must be more than zero"));
        }
        self.set(owner, spender, amount)
    }

    /// Raise the allowance by `delta`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero `delta` and an overflow error
    /// if the result is not representable.
    pub fn increase(&mut self, owner: &str, spender: &str, delta: Amount) -> Result<Amount> {
        if delta.is_zero() {
            return Err(LedgerError::validation("increaseAmount must be more than zero"));
        }
        let current = self.allowance(owner, spender)?;
        let raised = current.checked_add(delta).ok_or_else(|| LedgerError::Overflow {
            key: CompositeKey::new(APPROVAL_NAMESPACE, [owner, spender]).to_string(),
        })?;
        self.set(owner, spender, raised)?;
        Ok(raised)
    }

    /// Lower the allowance by `delta`. Lowering to exactly zero is allowed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero `delta` or one larger than the
    /// current allowance.
    pub fn decrease(&mut self, owner: &str, spender: &str, delta: Amount) -> Result<Amount> {
        if delta.is_zero() {
            return Err(LedgerError::validation("decreaseAmount must be more than zero"));
        }
        let current = self.allowance(owner, spender)?;
        let lowered = current.checked_sub(delta).ok_or_else(|| {
            LedgerError::validation(format!(
                "decrease of {delta} exceeds current allowance {current}"
            ))
        })?;
        self.set(owner, spender, lowered)?;
        Ok(lowered)
    }

    /// Storage path shared by every allowance mutation. Accepts zero.
    pub(crate) fn set(&mut self, owner: &str, spender: &str, amount: Amount) -> Result<()> {
        validate_component(owner, "owner")?;
        validate_component(spender, "spender")?;

        self.ctx.put(allowance_key(owner, spender), amount.to_state());
        self.ctx.emit(
            APPROVAL_EVENT,
            &ApprovalEvent {
                owner: owner.to_string(),
                spender: spender.to_string(),
                amount,
            },
        )?;

        debug!(owner = %owner, spender = %spender, amount = %amount, "allowance set");
        Ok(())
    }

    /// Every committed allowance granted by `owner`, in key order.
    ///
    /// The sequence is produced lazily from a fresh scan on each call.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or reserved owner and a
    /// storage error if the scan cannot start.
    pub fn approval_list(&self, owner: &str) -> Result<Approvals<'s>> {
        validate_component(owner, "owner")?;
        let entries = self.ctx.scan_committed(APPROVAL_NAMESPACE, &[owner])?;
        Ok(Approvals {
            owner: owner.to_string(),
            entries,
        })
    }
}

/// Lazy sequence of one owner's allowances.
pub struct Approvals<'s> {
    owner: String,
    entries: StateIter<'s>,
}

impl Approvals<'_> {
    fn decode(&self, key: &str, value: &[u8]) -> Result<ApprovalEvent> {
        let composite = CompositeKey::split(key)?;
        let spender = match composite.components() {
            [owner, spender] if *owner == self.owner => spender.clone(),
            _ => {
                return Err(LedgerError::storage(format!(
                    "unexpected key {composite} in approvals of {}",
                    self.owner
                )))
            }
        };
        if value.is_empty() {
            return Err(LedgerError::not_found("allowance amount", composite.to_string()));
        }
        Ok(ApprovalEvent {
            owner: self.owner.clone(),
            spender,
            amount: Amount::from_state(value, key)?,
        })
    }
}

impl Iterator for Approvals<'_> {
    type Item = Result<ApprovalEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(entry.and_then(|(key, value)| self.decode(&key, &value)))
    }
}

//! Token supply and per-holder balances.
//!
//! A balance lives under the holder's address as decimal bytes. An address
//! that was never credited has *no* balance record: `balance_of` reports it
//! as not found rather than zero. Allowances behave differently, see
//! [`AllowanceLedger::allowance`](crate::AllowanceLedger::allowance).
//!
//! Token names and addresses share one key space, so an address equal to
//! an issued token's name is reserved and rejected as input.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::amount::Amount;
use crate::context::TxContext;
use crate::error::{LedgerError, Result};
use crate::events::{TransferEvent, TRANSFER_EVENT};
use crate::key::{balance_key, metadata_key, validate_component};

/// Token metadata, written once at issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Token name, also the metadata key.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Issuing address.
    pub owner: String,
    /// Fixed total supply.
    #[serde(rename = "totalsupply")]
    pub total_supply: Amount,
}

/// Supply and balance operations over one transaction context.
pub struct TokenLedger<'c, 's> {
    ctx: &'c mut TxContext<'s>,
}

impl<'c, 's> TokenLedger<'c, 's> {
    /// Operate on `ctx`.
    pub fn new(ctx: &'c mut TxContext<'s>) -> Self {
        Self { ctx }
    }

    /// Create the token and credit its whole supply to `owner`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty or reserved names, or an owner
    /// equal to the token name, and an already-exists error if the token
    /// was issued before.
    pub fn issue(&mut self, name: &str, symbol: &str, owner: &str, supply: Amount) -> Result<TokenMetadata> {
        validate_component(name, "tokenName")?;
        validate_component(symbol, "symbol")?;
        validate_component(owner, "owner")?;
        if name == owner {
            return Err(LedgerError::validation(
                "owner address cannot equal the token name",
            ));
        }

        let key = metadata_key(name);
        if self.ctx.get(&key)?.is_some() {
            return Err(LedgerError::already_exists("token", name));
        }

        let metadata = TokenMetadata {
            name: name.to_string(),
            symbol: symbol.to_string(),
            owner: owner.to_string(),
            total_supply: supply,
        };
        self.ctx.put(key, serde_json::to_vec(&metadata)?);
        self.ctx.put(balance_key(owner), supply.to_state());

        info!(token = %name, symbol = %symbol, owner = %owner, supply = %supply, "token issued");
        Ok(metadata)
    }

    /// Metadata of `name`.
    ///
    /// # Errors
    ///
    /// Returns not-found if the token was never issued.
    pub fn metadata(&self, name: &str) -> Result<TokenMetadata> {
        let bytes = self
            .ctx
            .get(&metadata_key(name))?
            .ok_or_else(|| LedgerError::not_found("token", name))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Total supply of `name`.
    ///
    /// # Errors
    ///
    /// Returns not-found if the token was never issued.
    pub fn total_supply(&self, name: &str) -> Result<Amount> {
        Ok(self.metadata(name)?.total_supply)
    }

    /// Balance of `address`.
    ///
    /// # Errors
    ///
    /// Returns not-found if `address` was never credited and a validation
    /// error if it names a token.
    pub fn balance_of(&self, address: &str) -> Result<Amount> {
        self.stored_balance(address)?
            .ok_or_else(|| LedgerError::not_found("balance", address))
    }

    fn stored_balance(&self, address: &str) -> Result<Option<Amount>> {
        let key = balance_key(address);
        let Some(bytes) = self.ctx.get(&key)? else {
            return Ok(None);
        };
        match Amount::from_state(&bytes, &key) {
            Ok(amount) => Ok(Some(amount)),
            Err(_) if serde_json::from_slice::<TokenMetadata>(&bytes).is_ok() => Err(
                LedgerError::validation(format!("address {address} is reserved by a token")),
            ),
            Err(err) => Err(err),
        }
    }

    /// Move `amount` from `sender` to `recipient`.
    ///
    /// Both balances are read before anything is written. A self-transfer
    /// checks funds and emits the event but leaves the balance unchanged.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero amount or a reserved address,
    /// not-found if `sender` has no balance, and insufficient-funds if the
    /// balance is below `amount`.
    pub fn transfer(&mut self, sender: &str, recipient: &str, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Err(LedgerError::validation("amount must be more than zero"));
        }
        validate_component(recipient, "recipient")?;

        let sender_balance = self.balance_of(sender)?;
        let remaining = sender_balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                address: sender.to_string(),
                have: sender_balance.units(),
                need: amount.units(),
            })?;

        if sender != recipient {
            let recipient_key = balance_key(recipient);
            let recipient_balance = self.stored_balance(recipient)?.unwrap_or(Amount::ZERO);
            let credited = recipient_balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::Overflow {
                    key: recipient_key.clone(),
                })?;

            self.ctx.put(balance_key(sender), remaining.to_state());
            self.ctx.put(recipient_key, credited.to_state());
        }

        self.ctx.emit(
            TRANSFER_EVENT,
            &TransferEvent {
                sender: sender.to_string(),
                recipient: recipient.to_string(),
                amount,
            },
        )?;

        debug!(from = %sender, to = %recipient, amount = %amount, "transfer completed");
        Ok(())
    }
}

//! Ledger — balances, supplies, mint, and atomic transfer
//!
//! The ledger is the only mutator of value in the venue. Every balance is a
//! non-negative integer in base units; for every asset the sum of balances
//! equals the recorded total supply after every call.

use std::collections::HashMap;

use tracing::debug;
use types::ids::{AccountId, AssetId};
use types::numeric::AMOUNT_CEILING;

use crate::errors::LedgerError;
use crate::events::{IssuanceEvent, TokensTransferred};
use crate::security::Ownable;

/// Venue ledger tracking (asset, account) balances and per-asset supply.
///
/// Assets are implicit: an asset exists once it has supply or a balance.
/// `mint` is restricted to the ledger owner (the venue operator); `transfer`
/// is invoked by the custodial components on behalf of validated operations.
#[derive(Debug)]
pub struct Ledger {
    /// Balances: asset -> (account -> amount)
    balances: HashMap<AssetId, HashMap<AccountId, u64>>,
    /// Total supply per asset
    supplies: HashMap<AssetId, u64>,
    ownership: Ownable,
    /// Emitted events log (append-only)
    events: Vec<IssuanceEvent>,
}

impl Ledger {
    /// Create a new empty ledger owned by the venue operator.
    pub fn new(owner: AccountId) -> Self {
        Self {
            balances: HashMap::new(),
            supplies: HashMap::new(),
            ownership: Ownable::new(owner),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Balance of an account in an asset. Unknown pairs read as zero.
    pub fn balance_of(&self, asset: &AssetId, account: &AccountId) -> u64 {
        self.balances
            .get(asset)
            .and_then(|accounts| accounts.get(account))
            .copied()
            .unwrap_or(0)
    }

    /// Total supply of an asset. Unknown assets read as zero.
    pub fn total_supply(&self, asset: &AssetId) -> u64 {
        self.supplies.get(asset).copied().unwrap_or(0)
    }

    /// Sum of all account balances in an asset.
    ///
    /// Audit helper: conservation requires this to equal `total_supply`.
    pub fn sum_balances(&self, asset: &AssetId) -> u64 {
        self.balances
            .get(asset)
            .map(|accounts| accounts.values().sum())
            .unwrap_or(0)
    }

    // ───────────────────────── Mint ─────────────────────────

    /// Mint new units of an asset to an account. Owner-only.
    ///
    /// Increases both the account balance and the asset's total supply.
    pub fn mint(
        &mut self,
        caller: &AccountId,
        asset: AssetId,
        to: AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if !self.ownership.is_owner(caller) {
            return Err(LedgerError::OwnerOnly);
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if amount > AMOUNT_CEILING {
            return Err(LedgerError::AmountTooLarge);
        }

        let supply = self.supplies.entry(asset).or_insert(0);
        let new_supply = supply
            .checked_add(amount)
            .filter(|s| *s <= AMOUNT_CEILING)
            .ok_or(LedgerError::AmountTooLarge)?;

        *supply = new_supply;
        *self
            .balances
            .entry(asset)
            .or_default()
            .entry(to)
            .or_insert(0) += amount;

        debug!(%asset, %to, amount, "minted");
        Ok(())
    }

    // ───────────────────────── Transfer ─────────────────────────

    /// Move `amount` of `asset` from one account to another.
    ///
    /// All-or-nothing: the debit and credit happen together or not at all,
    /// so conservation holds after every call. Emits `TokensTransferred`.
    pub fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if amount > AMOUNT_CEILING {
            return Err(LedgerError::AmountTooLarge);
        }

        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        let accounts = self.balances.entry(*asset).or_default();
        *accounts.entry(*from).or_insert(0) -= amount;
        *accounts.entry(*to).or_insert(0) += amount;

        self.events
            .push(IssuanceEvent::TokensTransferred(TokensTransferred {
                asset: *asset,
                from: *from,
                to: *to,
                amount,
            }));
        Ok(())
    }

    // ───────────────────────── Ownership ─────────────────────────

    /// Hand the ledger over to a new owner. Current-owner gated.
    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), LedgerError> {
        if !self.ownership.transfer(caller, new_owner) {
            return Err(LedgerError::OwnerOnly);
        }
        Ok(())
    }

    /// Get the current owner.
    pub fn owner(&self) -> AccountId {
        self.ownership.owner()
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[IssuanceEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<IssuanceEvent> {
        std::mem::take(&mut self.events)
    }
}

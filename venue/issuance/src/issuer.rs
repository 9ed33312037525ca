//! Issuer — whitelist, dividend pool accounting, and governance tallies
//!
//! One issuer exists per listed SME. The issuer owns no value directly: its
//! treasury account on the ledger holds the unsold security-token supply and
//! the USDT backing declared dividends.
//!
//! Dividend entitlement is pull-based with forfeiture: `withdrawn` snapshots
//! the proportional entitlement at claim time, so a holder who transfers
//! shares away between distributions forfeits the untaken portion for the
//! shares they no longer hold. This is intentional venue behavior.

use std::collections::{HashMap, HashSet};

use tracing::info;
use types::ids::{AccountId, AssetId};
use types::numeric::mul_div_floor;

use crate::errors::IssuerError;
use crate::events::{
    DividendClaimed, DividendsDistributed, GovernanceVoteCasted, IssuanceEvent,
    ShareholderWhitelisted,
};
use crate::ledger::Ledger;

/// Per-SME issuer state.
#[derive(Debug)]
pub struct Issuer {
    company_name: String,
    token_symbol: String,
    security_token: AssetId,
    usdt: AssetId,
    treasury: AccountId,
    owner: AccountId,
    whitelist: HashSet<AccountId>,
    /// USDT already withdrawn per shareholder; non-decreasing
    withdrawn_dividends: HashMap<AccountId, u64>,
    /// Cumulative USDT declared as dividends; monotone non-decreasing
    total_dividends_distributed: u64,
    governance_votes: HashMap<AccountId, u64>,
    /// Emitted events log (append-only)
    events: Vec<IssuanceEvent>,
}

impl Issuer {
    /// Construct a fresh issuer. The treasury is auto-whitelisted.
    ///
    /// Called by the registry at deployment; issuers are never destroyed.
    pub(crate) fn new(
        company_name: String,
        token_symbol: String,
        security_token: AssetId,
        usdt: AssetId,
        treasury: AccountId,
        owner: AccountId,
    ) -> Self {
        let mut whitelist = HashSet::new();
        whitelist.insert(treasury);
        Self {
            company_name,
            token_symbol,
            security_token,
            usdt,
            treasury,
            owner,
            whitelist,
            withdrawn_dividends: HashMap::new(),
            total_dividends_distributed: 0,
            governance_votes: HashMap::new(),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Whitelist ─────────────────────────

    /// Set whitelist membership for an account. Owner-only, idempotent.
    pub fn set_whitelisted(
        &mut self,
        caller: &AccountId,
        account: AccountId,
        status: bool,
    ) -> Result<(), IssuerError> {
        if caller != &self.owner {
            return Err(IssuerError::OwnerOnly);
        }
        if status {
            self.whitelist.insert(account);
        } else {
            self.whitelist.remove(&account);
        }
        self.events
            .push(IssuanceEvent::ShareholderWhitelisted(ShareholderWhitelisted {
                investor: account,
                status,
            }));
        Ok(())
    }

    /// Check whitelist membership.
    pub fn is_whitelisted(&self, account: &AccountId) -> bool {
        self.whitelist.contains(account)
    }

    // ───────────────────────── Dividends ─────────────────────────

    /// Record a dividend distribution against the pool. Owner-only.
    ///
    /// Does not move funds: the treasury's USDT balance must already cover
    /// the declared amount; shareholders pull their share via
    /// [`claim_dividend`](Self::claim_dividend).
    pub fn record_dividend_distribution(
        &mut self,
        caller: &AccountId,
        ledger: &Ledger,
        amount: u64,
    ) -> Result<(), IssuerError> {
        if caller != &self.owner {
            return Err(IssuerError::OwnerOnly);
        }
        if amount == 0 {
            return Err(IssuerError::NonPositive);
        }
        let pool = ledger.balance_of(&self.usdt, &self.treasury);
        if pool < amount {
            return Err(IssuerError::InsufficientPool {
                required: amount,
                available: pool,
            });
        }

        self.total_dividends_distributed = self
            .total_dividends_distributed
            .checked_add(amount)
            .ok_or(IssuerError::AmountTooLarge)?;

        info!(company = %self.company_name, amount, "dividend distribution recorded");
        self.events
            .push(IssuanceEvent::DividendsDistributed(DividendsDistributed {
                amount,
            }));
        Ok(())
    }

    /// Withdraw the caller's outstanding dividend entitlement.
    ///
    /// Entitlement is `floor(total_distributed * balance / total_supply)`;
    /// the delta above what was already withdrawn is transferred from the
    /// treasury. `withdrawn` is monotone: a holder who reduced their
    /// position since the last distribution forfeits the difference.
    pub fn claim_dividend(
        &mut self,
        caller: &AccountId,
        ledger: &mut Ledger,
    ) -> Result<u64, IssuerError> {
        if !self.is_whitelisted(caller) {
            return Err(IssuerError::NotWhitelisted);
        }
        let shares = ledger.balance_of(&self.security_token, caller);
        if shares == 0 {
            return Err(IssuerError::NoShares);
        }
        let supply = ledger.total_supply(&self.security_token);
        let entitlement = mul_div_floor(self.total_dividends_distributed, shares, supply);
        let withdrawn = self.withdrawn_dividends.get(caller).copied().unwrap_or(0);
        if entitlement <= withdrawn {
            return Err(IssuerError::NothingToClaim);
        }
        let delta = entitlement - withdrawn;

        // Transfer first: a short treasury aborts the claim with no writes.
        ledger.transfer(&self.usdt, &self.treasury, caller, delta)?;
        self.withdrawn_dividends.insert(*caller, entitlement);

        info!(company = %self.company_name, shareholder = %caller, delta, "dividend claimed");
        self.events.push(IssuanceEvent::DividendClaimed(DividendClaimed {
            shareholder: *caller,
            amount: delta,
        }));
        Ok(delta)
    }

    // ───────────────────────── Governance ─────────────────────────

    /// Assign (not add) the caller's governance vote tally.
    ///
    /// Requires whitelist membership and a share balance covering the votes.
    pub fn cast_vote(
        &mut self,
        caller: &AccountId,
        ledger: &Ledger,
        votes: u64,
    ) -> Result<(), IssuerError> {
        if !self.is_whitelisted(caller) {
            return Err(IssuerError::NotWhitelisted);
        }
        let held = ledger.balance_of(&self.security_token, caller);
        if held < votes {
            return Err(IssuerError::InsufficientBalance {
                requested: votes,
                held,
            });
        }

        self.governance_votes.insert(*caller, votes);
        self.events
            .push(IssuanceEvent::GovernanceVoteCasted(GovernanceVoteCasted {
                voter: *caller,
                votes,
            }));
        Ok(())
    }

    // ───────────────────────── Bootstrap ─────────────────────────

    /// Seed the treasury's USDT balance. Owner-only, one-shot.
    ///
    /// Bootstrap hook for venues whose USDT is externally funded; realized
    /// as a ledger mint so conservation stays an identity.
    pub fn set_initial_usdt_balance(
        &mut self,
        caller: &AccountId,
        ledger: &mut Ledger,
        amount: u64,
    ) -> Result<(), IssuerError> {
        if caller != &self.owner {
            return Err(IssuerError::OwnerOnly);
        }
        if amount == 0 {
            return Err(IssuerError::NonPositive);
        }
        if ledger.balance_of(&self.usdt, &self.treasury) != 0 {
            return Err(IssuerError::AlreadyInitialized);
        }
        ledger.mint(caller, self.usdt, self.treasury, amount)?;
        Ok(())
    }

    // ───────────────────────── Accessors ─────────────────────────

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn token_symbol(&self) -> &str {
        &self.token_symbol
    }

    pub fn security_token(&self) -> AssetId {
        self.security_token
    }

    pub fn usdt(&self) -> AssetId {
        self.usdt
    }

    pub fn treasury(&self) -> AccountId {
        self.treasury
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn total_dividends_distributed(&self) -> u64 {
        self.total_dividends_distributed
    }

    /// USDT already withdrawn by a shareholder.
    pub fn withdrawn_of(&self, account: &AccountId) -> u64 {
        self.withdrawn_dividends.get(account).copied().unwrap_or(0)
    }

    /// Current governance vote tally of a voter.
    pub fn votes_of(&self, account: &AccountId) -> u64 {
        self.governance_votes.get(account).copied().unwrap_or(0)
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[IssuanceEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<IssuanceEvent> {
        std::mem::take(&mut self.events)
    }
}

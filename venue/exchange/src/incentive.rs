//! Market-maker incentive module
//!
//! Providers lock USDT collateral against per-token programs and earn a
//! daily reward while they keep a two-sided quote inside the program's
//! spread obligation. The obligation check is a read-only predicate over the
//! order book; reward payouts are snapshots gated by a minimum claim
//! interval, not a streamed accrual.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use issuance::ledger::Ledger;
use issuance::registry::Registry;
use issuance::security::{Ownable, ReentrancyGuard};
use types::ids::{AccountId, AssetId};
use types::numeric::{mul_div_floor, spread_bps, BPS_DENOM, Price};

use crate::errors::IncentiveError;
use crate::events::{
    CollateralLocked, CollateralReleased, ExchangeEvent, IncentiveProgramCreated,
    IncentiveProgramUpdated, LiquidityProviderDeactivated, LiquidityProviderRegistered,
    RewardsPaid,
};
use crate::orderbook::OrderBook;

/// Seconds in a day; the reward period and the minimum claim interval.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// A registered liquidity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub address: AccountId,
    pub registered_at: i64,
    pub active: bool,
    pub cumulative_rewards: u64,
    /// Sum of the provider's per-token locked amounts
    pub current_locked: u64,
    /// Last reward claim per token; gates repeat claims within a day
    last_claim_at: HashMap<AssetId, i64>,
}

/// Per-token incentive program parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncentiveProgram {
    pub security_token: AssetId,
    pub max_spread_bps: u64,
    pub min_order_size: u64,
    pub min_lockup: u64,
    pub daily_rate_bps: u64,
    pub end_time: i64,
    pub active: bool,
}

impl IncentiveProgram {
    /// Whether the program has reached its end time.
    pub fn is_ended(&self, now: i64) -> bool {
        now >= self.end_time
    }
}

/// The venue's market-maker incentive module.
#[derive(Debug)]
pub struct IncentiveModule {
    ownership: Ownable,
    /// Custody account holding locked collateral and the reward pool
    escrow: AccountId,
    usdt: AssetId,
    providers: HashMap<AccountId, Provider>,
    programs: HashMap<AssetId, IncentiveProgram>,
    /// Locked collateral: token -> (provider -> amount)
    locked: HashMap<AssetId, HashMap<AccountId, u64>>,
    /// Cumulative rewards paid per token
    total_rewards: HashMap<AssetId, u64>,
    guard: ReentrancyGuard,
    /// Emitted events log (append-only)
    events: Vec<ExchangeEvent>,
}

impl IncentiveModule {
    /// Create an incentive module with a fresh escrow account.
    pub fn new(owner: AccountId, usdt: AssetId) -> Self {
        Self {
            ownership: Ownable::new(owner),
            escrow: AccountId::new(),
            usdt,
            providers: HashMap::new(),
            programs: HashMap::new(),
            locked: HashMap::new(),
            total_rewards: HashMap::new(),
            guard: ReentrancyGuard::new(),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Providers ─────────────────────────

    /// Register the caller as a liquidity provider.
    pub fn register_provider(
        &mut self,
        caller: &AccountId,
        now: i64,
    ) -> Result<(), IncentiveError> {
        if self.providers.contains_key(caller) {
            return Err(IncentiveError::AlreadyRegistered);
        }
        self.providers.insert(
            *caller,
            Provider {
                address: *caller,
                registered_at: now,
                active: true,
                cumulative_rewards: 0,
                current_locked: 0,
                last_claim_at: HashMap::new(),
            },
        );
        info!(provider = %caller, "liquidity provider registered");
        self.events
            .push(ExchangeEvent::LiquidityProviderRegistered(
                LiquidityProviderRegistered { provider: *caller },
            ));
        Ok(())
    }

    /// Deactivate a provider. Owner-only.
    pub fn deactivate_provider(
        &mut self,
        caller: &AccountId,
        provider: &AccountId,
    ) -> Result<(), IncentiveError> {
        if !self.ownership.is_owner(caller) {
            return Err(IncentiveError::OwnerOnly);
        }
        let record = self
            .providers
            .get_mut(provider)
            .ok_or(IncentiveError::NotActiveProvider)?;
        record.active = false;
        self.events
            .push(ExchangeEvent::LiquidityProviderDeactivated(
                LiquidityProviderDeactivated { provider: *provider },
            ));
        Ok(())
    }

    // ───────────────────────── Programs ─────────────────────────

    /// Create (or replace) a program for a security token. Owner-only.
    #[allow(clippy::too_many_arguments)]
    pub fn create_program(
        &mut self,
        caller: &AccountId,
        security_token: AssetId,
        max_spread_bps: u64,
        min_order_size: u64,
        min_lockup: u64,
        daily_rate_bps: u64,
        duration_days: i64,
        now: i64,
    ) -> Result<(), IncentiveError> {
        if !self.ownership.is_owner(caller) {
            return Err(IncentiveError::OwnerOnly);
        }
        if daily_rate_bps == 0 {
            return Err(IncentiveError::NonPositive);
        }
        if daily_rate_bps > BPS_DENOM {
            return Err(IncentiveError::InvalidAmount);
        }
        let end_time = now + duration_days * SECONDS_PER_DAY;
        self.programs.insert(
            security_token,
            IncentiveProgram {
                security_token,
                max_spread_bps,
                min_order_size,
                min_lockup,
                daily_rate_bps,
                end_time,
                active: true,
            },
        );
        info!(token = %security_token, daily_rate_bps, end_time, "incentive program created");
        self.events
            .push(ExchangeEvent::IncentiveProgramCreated(IncentiveProgramCreated {
                token: security_token,
                daily_rate_bps,
                end_time,
            }));
        Ok(())
    }

    /// Toggle a program on or off. Owner-only.
    pub fn toggle_program(
        &mut self,
        caller: &AccountId,
        security_token: &AssetId,
        active: bool,
    ) -> Result<(), IncentiveError> {
        if !self.ownership.is_owner(caller) {
            return Err(IncentiveError::OwnerOnly);
        }
        let program = self
            .programs
            .get_mut(security_token)
            .ok_or(IncentiveError::UnknownProgram)?;
        program.active = active;
        self.events
            .push(ExchangeEvent::IncentiveProgramUpdated(IncentiveProgramUpdated {
                token: *security_token,
                active,
            }));
        Ok(())
    }

    // ───────────────────────── Collateral ─────────────────────────

    /// Lock USDT collateral into a token's program.
    pub fn lock_collateral(
        &mut self,
        ledger: &mut Ledger,
        caller: &AccountId,
        security_token: &AssetId,
        amount: u64,
        now: i64,
    ) -> Result<(), IncentiveError> {
        if !self.guard.enter("lock_collateral") {
            warn!(attempted = "lock_collateral", holder = ?self.guard.holder(), "reentrant call rejected");
            return Err(IncentiveError::Reentrancy);
        }
        let result = self.lock_collateral_inner(ledger, caller, security_token, amount, now);
        self.guard.exit();
        result
    }

    fn lock_collateral_inner(
        &mut self,
        ledger: &mut Ledger,
        caller: &AccountId,
        security_token: &AssetId,
        amount: u64,
        now: i64,
    ) -> Result<(), IncentiveError> {
        if !self.providers.get(caller).is_some_and(|p| p.active) {
            return Err(IncentiveError::NotActiveProvider);
        }
        let program = self
            .programs
            .get(security_token)
            .ok_or(IncentiveError::UnknownProgram)?;
        // Deactivation and expiry read the same from the provider's side.
        if !program.active || program.is_ended(now) {
            return Err(IncentiveError::ProgramEnded);
        }
        if amount < program.min_lockup {
            return Err(IncentiveError::InvalidAmount);
        }

        ledger.transfer(&self.usdt, caller, &self.escrow, amount)?;

        *self
            .locked
            .entry(*security_token)
            .or_default()
            .entry(*caller)
            .or_insert(0) += amount;
        if let Some(record) = self.providers.get_mut(caller) {
            record.current_locked += amount;
        }

        info!(provider = %caller, token = %security_token, amount, "collateral locked");
        self.events.push(ExchangeEvent::CollateralLocked(CollateralLocked {
            provider: *caller,
            token: *security_token,
            amount,
        }));
        Ok(())
    }

    /// Release the caller's collateral once the program ended or was
    /// switched off.
    pub fn release_collateral(
        &mut self,
        ledger: &mut Ledger,
        caller: &AccountId,
        security_token: &AssetId,
        now: i64,
    ) -> Result<(), IncentiveError> {
        if !self.guard.enter("release_collateral") {
            warn!(attempted = "release_collateral", holder = ?self.guard.holder(), "reentrant call rejected");
            return Err(IncentiveError::Reentrancy);
        }
        let result = self.release_collateral_inner(ledger, caller, security_token, now);
        self.guard.exit();
        result
    }

    fn release_collateral_inner(
        &mut self,
        ledger: &mut Ledger,
        caller: &AccountId,
        security_token: &AssetId,
        now: i64,
    ) -> Result<(), IncentiveError> {
        let amount = self.locked_of(security_token, caller);
        if amount == 0 {
            return Err(IncentiveError::NoCollateral);
        }
        if let Some(program) = self.programs.get(security_token) {
            if program.active && !program.is_ended(now) {
                return Err(IncentiveError::ProgramStillActive);
            }
        }

        ledger.transfer(&self.usdt, &self.escrow, caller, amount)?;

        if let Some(slots) = self.locked.get_mut(security_token) {
            slots.remove(caller);
        }
        if let Some(record) = self.providers.get_mut(caller) {
            record.current_locked = record.current_locked.saturating_sub(amount);
        }

        info!(provider = %caller, token = %security_token, amount, "collateral released");
        self.events
            .push(ExchangeEvent::CollateralReleased(CollateralReleased {
                provider: *caller,
                token: *security_token,
                amount,
            }));
        Ok(())
    }

    // ───────────────────────── Spread obligation ─────────────────────────

    /// Read-only predicate: is the provider currently quoting both sides of
    /// the token inside the program's obligation?
    ///
    /// Checked as a sequence of gates, each failing the obligation on its
    /// own: the token must have a registered issuer and a program, the book
    /// must be live on both sides, the provider must own both best-priced
    /// orders, each side must carry the program's minimum size, and the
    /// quoted spread must sit within the program maximum.
    pub fn meets_spread(
        &self,
        book: &OrderBook,
        registry: &Registry,
        provider: &AccountId,
        security_token: &AssetId,
    ) -> bool {
        if registry.lookup_by_security_token(security_token).is_none() {
            return false;
        }
        let Some(program) = self.programs.get(security_token) else {
            return false;
        };

        let (bid_price, bid_size) = book.best_bid(security_token);
        let (ask_price, ask_size) = book.best_ask(security_token);
        if bid_price == 0 || ask_price == 0 {
            return false;
        }
        if !book.has_active_order(provider, security_token, bid_price, true) {
            return false;
        }
        if !book.has_active_order(provider, security_token, ask_price, false) {
            return false;
        }
        if bid_size < program.min_order_size || ask_size < program.min_order_size {
            return false;
        }
        spread_bps(Price::new(bid_price), Price::new(ask_price)) <= program.max_spread_bps
    }

    /// The provider's daily reward snapshot:
    /// `floor(locked * daily_rate_bps / 10_000)` while the spread obligation
    /// holds, zero otherwise.
    pub fn daily_reward(
        &self,
        book: &OrderBook,
        registry: &Registry,
        provider: &AccountId,
        security_token: &AssetId,
    ) -> u64 {
        if !self.meets_spread(book, registry, provider, security_token) {
            return 0;
        }
        let Some(program) = self.programs.get(security_token) else {
            return 0;
        };
        mul_div_floor(
            self.locked_of(security_token, provider),
            program.daily_rate_bps,
            BPS_DENOM,
        )
    }

    /// Pay out the caller's daily reward from the module escrow.
    ///
    /// At most one claim per token per day; a premature or zero-reward
    /// claim fails `NothingToClaim`. Reward solvency (funding the escrow)
    /// is the operator's responsibility.
    #[allow(clippy::too_many_arguments)]
    pub fn claim_rewards(
        &mut self,
        ledger: &mut Ledger,
        book: &OrderBook,
        registry: &Registry,
        caller: &AccountId,
        security_token: &AssetId,
        now: i64,
    ) -> Result<u64, IncentiveError> {
        if !self.guard.enter("claim_rewards") {
            warn!(attempted = "claim_rewards", holder = ?self.guard.holder(), "reentrant call rejected");
            return Err(IncentiveError::Reentrancy);
        }
        let result = self.claim_rewards_inner(ledger, book, registry, caller, security_token, now);
        self.guard.exit();
        result
    }

    fn claim_rewards_inner(
        &mut self,
        ledger: &mut Ledger,
        book: &OrderBook,
        registry: &Registry,
        caller: &AccountId,
        security_token: &AssetId,
        now: i64,
    ) -> Result<u64, IncentiveError> {
        let provider = self
            .providers
            .get(caller)
            .filter(|p| p.active)
            .ok_or(IncentiveError::NotActiveProvider)?;
        let last_claim = provider
            .last_claim_at
            .get(security_token)
            .copied()
            .unwrap_or(i64::MIN);
        let program = self
            .programs
            .get(security_token)
            .ok_or(IncentiveError::UnknownProgram)?;
        if !program.active || program.is_ended(now) {
            return Err(IncentiveError::ProgramEnded);
        }
        if self.locked_of(security_token, caller) == 0 {
            return Err(IncentiveError::NoCollateral);
        }
        if last_claim != i64::MIN && now < last_claim + SECONDS_PER_DAY {
            return Err(IncentiveError::NothingToClaim);
        }

        let reward = self.daily_reward(book, registry, caller, security_token);
        if reward == 0 {
            return Err(IncentiveError::NothingToClaim);
        }

        ledger.transfer(&self.usdt, &self.escrow, caller, reward)?;

        if let Some(record) = self.providers.get_mut(caller) {
            record.cumulative_rewards += reward;
            record.last_claim_at.insert(*security_token, now);
        }
        *self.total_rewards.entry(*security_token).or_insert(0) += reward;

        info!(provider = %caller, token = %security_token, reward, "rewards paid");
        self.events.push(ExchangeEvent::RewardsPaid(RewardsPaid {
            provider: *caller,
            token: *security_token,
            amount: reward,
        }));
        Ok(reward)
    }

    /// Move USDT from the caller into the reward escrow. Owner-only.
    pub fn fund_rewards(
        &mut self,
        ledger: &mut Ledger,
        caller: &AccountId,
        amount: u64,
    ) -> Result<(), IncentiveError> {
        if !self.ownership.is_owner(caller) {
            return Err(IncentiveError::OwnerOnly);
        }
        ledger.transfer(&self.usdt, caller, &self.escrow, amount)?;
        Ok(())
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Look up a provider record.
    pub fn provider(&self, address: &AccountId) -> Option<&Provider> {
        self.providers.get(address)
    }

    /// Look up a program by security token.
    pub fn program(&self, security_token: &AssetId) -> Option<&IncentiveProgram> {
        self.programs.get(security_token)
    }

    /// Collateral a provider has locked against a token.
    pub fn locked_of(&self, security_token: &AssetId, provider: &AccountId) -> u64 {
        self.locked
            .get(security_token)
            .and_then(|slots| slots.get(provider))
            .copied()
            .unwrap_or(0)
    }

    /// Cumulative rewards paid for a token.
    pub fn total_rewards_of(&self, security_token: &AssetId) -> u64 {
        self.total_rewards.get(security_token).copied().unwrap_or(0)
    }

    /// The custody account holding collateral and the reward pool.
    pub fn escrow_account(&self) -> AccountId {
        self.escrow
    }

    /// Get all emitted events.
    pub fn events(&self) -> &[ExchangeEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.events)
    }
}

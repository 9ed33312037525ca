//! Order book — submission, matching, cancellation, views, fee admin
//!
//! Per security token the book keeps a bid queue (price descending) and an
//! ask queue (price ascending); order records live in one central map and a
//! user index supports per-account views.
//!
//! The order book is the custodian of escrowed value between submission and
//! final fill or cancel: a buy escrows `floor(amount * price / 10^6)` USDT,
//! a sell escrows the tokens themselves. An open buy's escrow is always
//! `floor(remaining * price / 10^6)` — each fill pays the seller and the fee
//! collector out of the gross and refunds the price improvement to the buyer
//! at once, so cancelling later returns exactly the remaining escrow.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use issuance::ledger::Ledger;
use issuance::registry::Registry;
use issuance::security::{Ownable, ReentrancyGuard};
use types::ids::{AccountId, AssetId, OrderId};
use types::numeric::{quote_cost, Price, Quantity, AMOUNT_CEILING};
use types::order::{Order, Side};

use crate::book::{AskQueue, BidQueue};
use crate::errors::OrderBookError;
use crate::events::{ExchangeEvent, FeesCollected, OrderCancelled, OrderCreated, OrderFilled};
use crate::matching;

/// Default trading fee, in basis points of each fill's gross value.
pub const DEFAULT_TRADING_FEE_BPS: u16 = 25;

/// Maximum configurable trading fee (1%).
pub const MAX_TRADING_FEE_BPS: u16 = 100;

/// Both sides of one security token's book.
#[derive(Debug, Default)]
struct TokenBook {
    bids: BidQueue,
    asks: AskQueue,
}

/// The venue's continuous double-auction order book.
#[derive(Debug)]
pub struct OrderBook {
    ownership: Ownable,
    /// Custody account holding all escrowed value on the ledger
    escrow: AccountId,
    /// The venue-wide USDT settlement asset
    usdt: AssetId,
    fee_collector: AccountId,
    trading_fee_bps: u16,
    /// Next order id; ids are process-wide monotone starting at 1
    next_order_id: u64,
    orders: HashMap<OrderId, Order>,
    books: HashMap<AssetId, TokenBook>,
    user_orders: HashMap<AccountId, Vec<OrderId>>,
    guard: ReentrancyGuard,
    /// Emitted events log (append-only)
    events: Vec<ExchangeEvent>,
}

impl OrderBook {
    /// Create an order book with a fresh escrow account.
    pub fn new(owner: AccountId, usdt: AssetId, fee_collector: AccountId) -> Self {
        Self {
            ownership: Ownable::new(owner),
            escrow: AccountId::new(),
            usdt,
            fee_collector,
            trading_fee_bps: DEFAULT_TRADING_FEE_BPS,
            next_order_id: 1,
            orders: HashMap::new(),
            books: HashMap::new(),
            user_orders: HashMap::new(),
            guard: ReentrancyGuard::new(),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Submission ─────────────────────────

    /// Submit a buy order; escrows USDT and matches against the asks.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_buy(
        &mut self,
        ledger: &mut Ledger,
        registry: &Registry,
        caller: &AccountId,
        security_token: AssetId,
        amount: u64,
        price: u64,
        now: i64,
    ) -> Result<OrderId, OrderBookError> {
        self.submit(ledger, registry, caller, security_token, amount, price, Side::BUY, now)
    }

    /// Submit a sell order; escrows the tokens and matches against the bids.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_sell(
        &mut self,
        ledger: &mut Ledger,
        registry: &Registry,
        caller: &AccountId,
        security_token: AssetId,
        amount: u64,
        price: u64,
        now: i64,
    ) -> Result<OrderId, OrderBookError> {
        self.submit(ledger, registry, caller, security_token, amount, price, Side::SELL, now)
    }

    #[allow(clippy::too_many_arguments)]
    fn submit(
        &mut self,
        ledger: &mut Ledger,
        registry: &Registry,
        caller: &AccountId,
        security_token: AssetId,
        amount: u64,
        price: u64,
        side: Side,
        now: i64,
    ) -> Result<OrderId, OrderBookError> {
        let op = match side {
            Side::BUY => "submit_buy",
            Side::SELL => "submit_sell",
        };
        if !self.guard.enter(op) {
            warn!(attempted = op, holder = ?self.guard.holder(), "reentrant call rejected");
            return Err(OrderBookError::Reentrancy);
        }
        let result = self.submit_inner(ledger, registry, caller, security_token, amount, price, side, now);
        self.guard.exit();
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn submit_inner(
        &mut self,
        ledger: &mut Ledger,
        registry: &Registry,
        caller: &AccountId,
        security_token: AssetId,
        amount: u64,
        price: u64,
        side: Side,
        now: i64,
    ) -> Result<OrderId, OrderBookError> {
        if amount == 0 || price == 0 {
            return Err(OrderBookError::NonPositive);
        }
        if amount > AMOUNT_CEILING || price > AMOUNT_CEILING {
            return Err(OrderBookError::AmountTooLarge);
        }
        let issuer = registry
            .lookup_by_security_token(&security_token)
            .ok_or(OrderBookError::UnknownToken)?;
        if !issuer.is_whitelisted(caller) {
            return Err(OrderBookError::NotWhitelisted);
        }

        let quantity = Quantity::new(amount);
        let price = Price::new(price);

        // Escrow the appropriate asset; a failed transfer aborts the call
        // before any book state is written.
        match side {
            Side::BUY => {
                let total_cost = quote_cost(quantity, price);
                ledger.transfer(&self.usdt, caller, &self.escrow, total_cost)?;
            }
            Side::SELL => {
                ledger.transfer(&security_token, caller, &self.escrow, amount)?;
            }
        }

        let order_id = OrderId::from_u64(self.next_order_id);
        self.next_order_id += 1;

        let order = Order::new(order_id, *caller, security_token, quantity, price, side, now);
        self.orders.insert(order_id, order);
        self.user_orders.entry(*caller).or_default().push(order_id);

        let book = self.books.entry(security_token).or_default();
        match side {
            Side::BUY => book.bids.insert(price, order_id),
            Side::SELL => book.asks.insert(price, order_id),
        }

        info!(order = %order_id, maker = %caller, token = %security_token, %quantity, %price, ?side, "order created");
        self.events.push(ExchangeEvent::OrderCreated(OrderCreated {
            order_id,
            maker: *caller,
            security_token,
            amount: quantity,
            price,
            side,
        }));

        self.match_order(ledger, order_id, now)?;
        Ok(order_id)
    }

    // ───────────────────────── Matching ─────────────────────────

    /// Run the matcher for a freshly inserted order.
    fn match_order(
        &mut self,
        ledger: &mut Ledger,
        taker_id: OrderId,
        now: i64,
    ) -> Result<(), OrderBookError> {
        let Some(mut taker) = self.orders.remove(&taker_id) else {
            return Ok(());
        };
        let result = self.match_loop(ledger, &mut taker, now);

        // Reinsert the taker record before surfacing any error so the book
        // never loses an order.
        if !taker.is_open() {
            self.remove_from_book(&taker);
        }
        self.orders.insert(taker_id, taker);
        result
    }

    /// Walk the opposite side in priority order until the taker is filled
    /// or no further counter-order crosses.
    fn match_loop(
        &mut self,
        ledger: &mut Ledger,
        taker: &mut Order,
        now: i64,
    ) -> Result<(), OrderBookError> {
        let candidates: Vec<OrderId> = match self.books.get(&taker.security_token) {
            Some(book) => match taker.side {
                Side::BUY => book.asks.ids_in_priority(),
                Side::SELL => book.bids.ids_in_priority(),
            },
            None => return Ok(()),
        };

        for candidate_id in candidates {
            if taker.is_filled() {
                break;
            }

            let (candidate_open, candidate_expired, candidate_price, candidate_maker, candidate_remaining) =
                match self.orders.get(&candidate_id) {
                    Some(c) => (c.is_open(), c.is_expired(now), c.price, c.maker, c.remaining()),
                    None => continue,
                };
            if !candidate_open {
                continue;
            }
            if candidate_expired {
                // The matcher is the janitor for stale counter-orders:
                // cancel, refund the remainder, and keep scanning.
                warn!(order = %candidate_id, "expiring stale counter-order");
                self.cancel_and_refund(ledger, candidate_id)?;
                continue;
            }
            if !matching::crosses(taker.side, taker.price, candidate_price) {
                // Keep scanning: stale orders deeper in the book must still
                // be expired by this pass even when prices no longer cross.
                continue;
            }
            if candidate_maker == taker.maker {
                debug!(order = %candidate_id, "self-trade skipped");
                continue;
            }
            let match_qty = taker.remaining().min(candidate_remaining);
            if match_qty.is_zero() {
                continue;
            }

            self.execute_fill(ledger, taker, candidate_id, match_qty)?;
        }
        Ok(())
    }

    /// Execute one fill between the taker and a resting counter-order.
    fn execute_fill(
        &mut self,
        ledger: &mut Ledger,
        taker: &mut Order,
        candidate_id: OrderId,
        match_qty: Quantity,
    ) -> Result<(), OrderBookError> {
        let token = taker.security_token;
        let Some(candidate) = self.orders.get_mut(&candidate_id) else {
            return Ok(());
        };

        let exec_price = matching::execution_price(taker.side, taker.price, candidate.price);
        let settlement = matching::settle(match_qty, exec_price, self.trading_fee_bps);

        // The buy-side order's escrow shrinks from floor(rem * price) to the
        // post-fill value; the gross goes to the sell side (net of fee) and
        // the excess is the buyer's price improvement.
        let (buyer, seller, escrow_released) = match taker.side {
            Side::BUY => {
                let before = taker.escrowed_quote();
                taker.add_fill(match_qty);
                candidate.add_fill(match_qty);
                (taker.maker, candidate.maker, before - taker.escrowed_quote())
            }
            Side::SELL => {
                let before = candidate.escrowed_quote();
                candidate.add_fill(match_qty);
                taker.add_fill(match_qty);
                (candidate.maker, taker.maker, before - candidate.escrowed_quote())
            }
        };
        let resting_maker = candidate.maker;
        let candidate_filled = candidate.is_filled();
        let candidate_price = candidate.price;
        let candidate_side = candidate.side;

        ledger.transfer(&token, &self.escrow, &buyer, match_qty.as_u64())?;
        if settlement.seller_net > 0 {
            ledger.transfer(&self.usdt, &self.escrow, &seller, settlement.seller_net)?;
        }
        if settlement.fee > 0 {
            ledger.transfer(&self.usdt, &self.escrow, &self.fee_collector, settlement.fee)?;
            self.events.push(ExchangeEvent::FeesCollected(FeesCollected {
                asset: self.usdt,
                collector: self.fee_collector,
                amount: settlement.fee,
            }));
        }
        let price_improvement = escrow_released - settlement.gross;
        if price_improvement > 0 {
            ledger.transfer(&self.usdt, &self.escrow, &buyer, price_improvement)?;
        }

        info!(
            resting = %candidate_id,
            taker = %taker.id,
            %match_qty,
            %exec_price,
            gross = settlement.gross,
            fee = settlement.fee,
            "orders matched"
        );
        self.events.push(ExchangeEvent::OrderFilled(OrderFilled {
            resting_order_id: candidate_id,
            resting_maker,
            taker: taker.maker,
            amount: match_qty,
            exec_price,
        }));

        if candidate_filled {
            if let Some(book) = self.books.get_mut(&token) {
                match candidate_side {
                    Side::BUY => book.bids.remove(candidate_price, candidate_id),
                    Side::SELL => book.asks.remove(candidate_price, candidate_id),
                };
            }
        }
        Ok(())
    }

    // ───────────────────────── Cancellation ─────────────────────────

    /// Cancel an open order. Maker-only; refunds the unfilled remainder.
    pub fn cancel(
        &mut self,
        ledger: &mut Ledger,
        caller: &AccountId,
        order_id: OrderId,
    ) -> Result<(), OrderBookError> {
        if !self.guard.enter("cancel") {
            warn!(attempted = "cancel", holder = ?self.guard.holder(), "reentrant call rejected");
            return Err(OrderBookError::Reentrancy);
        }
        let result = self.cancel_inner(ledger, caller, order_id);
        self.guard.exit();
        result
    }

    fn cancel_inner(
        &mut self,
        ledger: &mut Ledger,
        caller: &AccountId,
        order_id: OrderId,
    ) -> Result<(), OrderBookError> {
        let order = self.orders.get(&order_id).ok_or(OrderBookError::UnknownOrder {
            order_id: order_id.as_u64(),
        })?;
        if order.maker != *caller {
            return Err(OrderBookError::NotOwner);
        }
        if !order.is_open() {
            return Err(OrderBookError::NotOpen);
        }
        self.cancel_and_refund(ledger, order_id)
    }

    /// Cancel any order past the maximum order age. Open to every caller.
    pub fn cancel_expired(
        &mut self,
        ledger: &mut Ledger,
        order_id: OrderId,
        now: i64,
    ) -> Result<(), OrderBookError> {
        if !self.guard.enter("cancel_expired") {
            warn!(attempted = "cancel_expired", holder = ?self.guard.holder(), "reentrant call rejected");
            return Err(OrderBookError::Reentrancy);
        }
        let result = self.cancel_expired_inner(ledger, order_id, now);
        self.guard.exit();
        result
    }

    fn cancel_expired_inner(
        &mut self,
        ledger: &mut Ledger,
        order_id: OrderId,
        now: i64,
    ) -> Result<(), OrderBookError> {
        let order = self.orders.get(&order_id).ok_or(OrderBookError::UnknownOrder {
            order_id: order_id.as_u64(),
        })?;
        if !order.is_open() {
            return Err(OrderBookError::NotOpen);
        }
        if !order.is_expired(now) {
            return Err(OrderBookError::NotExpired);
        }
        self.cancel_and_refund(ledger, order_id)
    }

    /// Refund the unfilled remainder, mark the order CANCELLED, and drop it
    /// from its book side. Callers have already validated the transition.
    fn cancel_and_refund(
        &mut self,
        ledger: &mut Ledger,
        order_id: OrderId,
    ) -> Result<(), OrderBookError> {
        let (maker, refund_asset, refund_amount) = {
            let order = self.orders.get(&order_id).ok_or(OrderBookError::UnknownOrder {
                order_id: order_id.as_u64(),
            })?;
            match order.side {
                Side::BUY => (order.maker, self.usdt, order.escrowed_quote()),
                Side::SELL => (order.maker, order.security_token, order.remaining().as_u64()),
            }
        };

        // Refund before mutating: a failed transfer leaves the order open.
        if refund_amount > 0 {
            ledger.transfer(&refund_asset, &self.escrow, &maker, refund_amount)?;
        }

        let removed = self.orders.get_mut(&order_id).map(|order| {
            order.cancel();
            order.clone()
        });
        if let Some(order) = removed {
            self.remove_from_book(&order);
        }

        info!(order = %order_id, refund = refund_amount, "order cancelled");
        self.events
            .push(ExchangeEvent::OrderCancelled(OrderCancelled { order_id }));
        Ok(())
    }

    fn remove_from_book(&mut self, order: &Order) {
        if let Some(book) = self.books.get_mut(&order.security_token) {
            match order.side {
                Side::BUY => book.bids.remove(order.price, order.id),
                Side::SELL => book.asks.remove(order.price, order.id),
            };
        }
    }

    // ───────────────────────── Views ─────────────────────────

    /// Open buy orders for a token, best price first.
    pub fn active_buy_orders(&self, security_token: &AssetId) -> Vec<&Order> {
        self.side_orders(security_token, Side::BUY)
    }

    /// Open sell orders for a token, best price first.
    pub fn active_sell_orders(&self, security_token: &AssetId) -> Vec<&Order> {
        self.side_orders(security_token, Side::SELL)
    }

    fn side_orders(&self, security_token: &AssetId, side: Side) -> Vec<&Order> {
        let Some(book) = self.books.get(security_token) else {
            return Vec::new();
        };
        let ids = match side {
            Side::BUY => book.bids.ids_in_priority(),
            Side::SELL => book.asks.ids_in_priority(),
        };
        ids.iter()
            .filter_map(|id| self.orders.get(id))
            .filter(|order| order.is_open())
            .collect()
    }

    /// All open orders of one account, across tokens.
    pub fn user_active_orders(&self, user: &AccountId) -> Vec<&Order> {
        self.user_orders
            .get(user)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.orders.get(id))
                    .filter(|order| order.is_open())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `maker` has an open order on `security_token` at exactly
    /// `price` on the given side.
    pub fn has_active_order(
        &self,
        maker: &AccountId,
        security_token: &AssetId,
        price: u64,
        is_bid: bool,
    ) -> bool {
        let side = if is_bid { Side::BUY } else { Side::SELL };
        self.side_orders(security_token, side)
            .iter()
            .any(|order| order.maker == *maker && order.price.as_u64() == price)
    }

    /// Best (highest-priced) open bid as `(price, remaining)`, or `(0, 0)`.
    ///
    /// The remaining quantity is that of the single order holding the
    /// extremum, not the total depth at the level; the first-encountered
    /// order wins price ties.
    pub fn best_bid(&self, security_token: &AssetId) -> (u64, u64) {
        self.side_orders(security_token, Side::BUY)
            .first()
            .map(|order| (order.price.as_u64(), order.remaining().as_u64()))
            .unwrap_or((0, 0))
    }

    /// Best (lowest-priced) open ask as `(price, remaining)`, or `(0, 0)`.
    pub fn best_ask(&self, security_token: &AssetId) -> (u64, u64) {
        self.side_orders(security_token, Side::SELL)
            .first()
            .map(|order| (order.price.as_u64(), order.remaining().as_u64()))
            .unwrap_or((0, 0))
    }

    /// Look up any order record by id.
    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    // ───────────────────────── Fee admin ─────────────────────────

    /// Set the trading fee. Owner-only; capped at 100 bps (1%).
    pub fn set_trading_fee_bps(
        &mut self,
        caller: &AccountId,
        bps: u16,
    ) -> Result<(), OrderBookError> {
        if !self.ownership.is_owner(caller) {
            return Err(OrderBookError::OwnerOnly);
        }
        if bps > MAX_TRADING_FEE_BPS {
            return Err(OrderBookError::FeeTooHigh);
        }
        self.trading_fee_bps = bps;
        Ok(())
    }

    /// Set the fee collector account. Owner-only; must not be nil.
    pub fn set_fee_collector(
        &mut self,
        caller: &AccountId,
        collector: AccountId,
    ) -> Result<(), OrderBookError> {
        if !self.ownership.is_owner(caller) {
            return Err(OrderBookError::OwnerOnly);
        }
        if collector.is_nil() {
            return Err(OrderBookError::InvalidAccount);
        }
        self.fee_collector = collector;
        Ok(())
    }

    /// Hand the order book over to a new owner. Current-owner gated.
    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), OrderBookError> {
        if !self.ownership.transfer(caller, new_owner) {
            return Err(OrderBookError::OwnerOnly);
        }
        Ok(())
    }

    /// Current trading fee in basis points.
    pub fn trading_fee_bps(&self) -> u16 {
        self.trading_fee_bps
    }

    /// Current fee collector.
    pub fn fee_collector(&self) -> AccountId {
        self.fee_collector
    }

    /// The custody account holding escrowed value on the ledger.
    pub fn escrow_account(&self) -> AccountId {
        self.escrow
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[ExchangeEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::MAX_ORDER_AGE;
    use types::order::OrderStatus;

    const NOW: i64 = 1_000_000;

    struct Venue {
        ledger: Ledger,
        registry: Registry,
        book: OrderBook,
        operator: AccountId,
        usdt: AssetId,
        token: AssetId,
        alice: AccountId,
        bob: AccountId,
        collector: AccountId,
    }

    /// Acme listed with 10_000_000 tokens; Bob holds 1_000_000 of them,
    /// Alice holds 2_000_000 USDT; both whitelisted; fee 25 bps.
    fn setup() -> Venue {
        let operator = AccountId::new();
        let mut ledger = Ledger::new(operator);
        let usdt = AssetId::new();
        let mut registry = Registry::new(operator, usdt);
        let treasury = AccountId::new();
        let alice = AccountId::new();
        let bob = AccountId::new();
        let collector = AccountId::new();

        let token = registry
            .deploy_issuer(&mut ledger, &operator, "Acme Widgets", "ACME", 10_000_000, treasury)
            .unwrap();
        {
            let issuer = registry.issuer_mut_by_token(&token).unwrap();
            issuer.set_whitelisted(&operator, alice, true).unwrap();
            issuer.set_whitelisted(&operator, bob, true).unwrap();
        }
        ledger.mint(&operator, usdt, alice, 2_000_000).unwrap();
        ledger.transfer(&token, &treasury, &bob, 1_000_000).unwrap();

        let book = OrderBook::new(operator, usdt, collector);

        Venue {
            ledger,
            registry,
            book,
            operator,
            usdt,
            token,
            alice,
            bob,
            collector,
        }
    }

    fn escrow_balance(v: &Venue, asset: &AssetId) -> u64 {
        v.ledger.balance_of(asset, &v.book.escrow_account())
    }

    // ─── Submission validation ───

    #[test]
    fn test_submit_rests_and_escrows() {
        let mut v = setup();
        let alice = v.alice;
        let id = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 500_000, 1_000_000, NOW)
            .unwrap();

        assert_eq!(id.as_u64(), 1);
        let order = v.book.order(&id).unwrap();
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(escrow_balance(&v, &v.usdt), 500_000);
        assert_eq!(v.ledger.balance_of(&v.usdt, &alice), 1_500_000);
    }

    #[test]
    fn test_submit_unknown_token() {
        let mut v = setup();
        let alice = v.alice;
        let result = v.book.submit_buy(
            &mut v.ledger,
            &v.registry,
            &alice,
            AssetId::new(),
            100,
            1_000_000,
            NOW,
        );
        assert_eq!(result, Err(OrderBookError::UnknownToken));
    }

    #[test]
    fn test_submit_not_whitelisted() {
        let mut v = setup();
        let stranger = AccountId::new();
        let result = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &stranger, v.token, 100, 1_000_000, NOW);
        assert_eq!(result, Err(OrderBookError::NotWhitelisted));
    }

    #[test]
    fn test_submit_non_positive() {
        let mut v = setup();
        let alice = v.alice;
        assert_eq!(
            v.book
                .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 0, 1_000_000, NOW),
            Err(OrderBookError::NonPositive)
        );
        assert_eq!(
            v.book
                .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 0, NOW),
            Err(OrderBookError::NonPositive)
        );
    }

    #[test]
    fn test_submit_above_ceiling() {
        let mut v = setup();
        let alice = v.alice;
        let result = v.book.submit_buy(
            &mut v.ledger,
            &v.registry,
            &alice,
            v.token,
            AMOUNT_CEILING + 1,
            1_000_000,
            NOW,
        );
        assert_eq!(result, Err(OrderBookError::AmountTooLarge));
    }

    #[test]
    fn test_submit_insufficient_funds_leaves_no_state() {
        let mut v = setup();
        let alice = v.alice;
        // Costs 5_000_000 USDT; Alice has 2_000_000
        let result = v.book.submit_buy(
            &mut v.ledger,
            &v.registry,
            &alice,
            v.token,
            5_000_000,
            1_000_000,
            NOW,
        );
        assert!(matches!(result, Err(OrderBookError::Ledger(_))));
        assert!(v.book.user_active_orders(&alice).is_empty());
        assert!(v.book.events().is_empty());
    }

    // ─── Crossing fill on submission (scenario A) ───

    #[test]
    fn test_crossing_fill_on_submission() {
        let mut v = setup();
        let (alice, bob) = (v.alice, v.bob);

        let sell = v
            .book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 500_000, 1_200_000, NOW)
            .unwrap();
        let buy = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 500_000, 1_500_000, NOW)
            .unwrap();

        assert_eq!(v.book.order(&sell).unwrap().status, OrderStatus::Filled);
        assert_eq!(v.book.order(&buy).unwrap().status, OrderStatus::Filled);

        // Executed at the resting ask: gross 600_000, fee 1_500 at 25 bps
        assert_eq!(v.ledger.balance_of(&v.token, &alice), 500_000);
        assert_eq!(v.ledger.balance_of(&v.usdt, &bob), 598_500);
        assert_eq!(v.ledger.balance_of(&v.usdt, &v.collector), 1_500);
        // Alice escrowed 750_000, spent 600_000, refunded 150_000
        assert_eq!(v.ledger.balance_of(&v.usdt, &alice), 1_400_000);
        assert_eq!(escrow_balance(&v, &v.usdt), 0);
        assert_eq!(escrow_balance(&v, &v.token), 0);

        let fill = v
            .book
            .events()
            .iter()
            .find_map(|e| match e {
                ExchangeEvent::OrderFilled(f) => Some(f.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(fill.resting_order_id, sell);
        assert_eq!(fill.resting_maker, bob);
        assert_eq!(fill.taker, alice);
        assert_eq!(fill.exec_price, Price::new(1_200_000));
    }

    // ─── Partial fill then rest (scenario B) and cancel (scenario C) ───

    #[test]
    fn test_partial_fill_then_rest_then_cancel() {
        let mut v = setup();
        let (alice, bob) = (v.alice, v.bob);

        let buy = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 1_000_000, 1_000_000, NOW)
            .unwrap();
        assert_eq!(escrow_balance(&v, &v.usdt), 1_000_000);

        let sell = v
            .book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 400_000, 900_000, NOW)
            .unwrap();

        // Incoming sell executes at its own price: gross 360_000, fee 900
        assert_eq!(v.book.order(&sell).unwrap().status, OrderStatus::Filled);
        let resting = v.book.order(&buy).unwrap();
        assert_eq!(resting.status, OrderStatus::Open);
        assert_eq!(resting.filled.as_u64(), 400_000);

        assert_eq!(v.ledger.balance_of(&v.usdt, &bob), 359_100);
        assert_eq!(v.ledger.balance_of(&v.usdt, &v.collector), 900);
        assert_eq!(v.ledger.balance_of(&v.token, &alice), 400_000);
        // Residual escrow covers exactly the 600_000 unfilled tokens
        assert_eq!(escrow_balance(&v, &v.usdt), 600_000);

        // Scenario C: cancelling the partially filled buy refunds 600_000
        let alice_before = v.ledger.balance_of(&v.usdt, &alice);
        v.book.cancel(&mut v.ledger, &alice, buy).unwrap();
        assert_eq!(v.book.order(&buy).unwrap().status, OrderStatus::Cancelled);
        assert_eq!(v.ledger.balance_of(&v.usdt, &alice), alice_before + 600_000);
        assert_eq!(escrow_balance(&v, &v.usdt), 0);
    }

    // ─── Self-trade prevention (scenario D) ───

    #[test]
    fn test_self_trade_prevention() {
        let mut v = setup();
        let alice = v.alice;
        // Give Alice some tokens to sell
        let bob = v.bob;
        v.ledger.transfer(&v.token, &bob, &alice, 100).unwrap();

        let sell = v
            .book
            .submit_sell(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_000_000, NOW)
            .unwrap();
        let buy = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_000_000, NOW)
            .unwrap();

        assert_eq!(v.book.order(&sell).unwrap().status, OrderStatus::Open);
        assert_eq!(v.book.order(&buy).unwrap().status, OrderStatus::Open);
        assert!(!v
            .book
            .events()
            .iter()
            .any(|e| matches!(e, ExchangeEvent::OrderFilled(_))));
    }

    #[test]
    fn test_self_trade_skip_matches_deeper_order() {
        let mut v = setup();
        let (alice, bob) = (v.alice, v.bob);
        v.ledger.transfer(&v.token, &bob, &alice, 100).unwrap();

        // Alice's own ask is best-priced; Bob's sits behind at the same price
        v.book
            .submit_sell(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_000_000, NOW)
            .unwrap();
        let bob_sell = v
            .book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 100, 1_000_000, NOW)
            .unwrap();

        let buy = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_000_000, NOW)
            .unwrap();

        // Alice's buy skipped her own ask and lifted Bob's
        assert_eq!(v.book.order(&bob_sell).unwrap().status, OrderStatus::Filled);
        assert_eq!(v.book.order(&buy).unwrap().status, OrderStatus::Filled);
    }

    // ─── Price-time priority ───

    #[test]
    fn test_equal_price_insertion_priority() {
        let mut v = setup();
        let (alice, bob, operator) = (v.alice, v.bob, v.operator);
        let carol = AccountId::new();
        let token = v.token;
        v.registry
            .issuer_mut_by_token(&token)
            .unwrap()
            .set_whitelisted(&operator, carol, true)
            .unwrap();
        let treasury = v.registry.lookup_by_security_token(&token).unwrap().treasury();
        v.ledger.transfer(&v.token, &treasury, &carol, 500).unwrap();

        let first = v
            .book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 100, 1_000_000, NOW)
            .unwrap();
        let second = v
            .book
            .submit_sell(&mut v.ledger, &v.registry, &carol, v.token, 100, 1_000_000, NOW)
            .unwrap();

        v.book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_000_000, NOW)
            .unwrap();

        assert_eq!(v.book.order(&first).unwrap().status, OrderStatus::Filled);
        assert_eq!(v.book.order(&second).unwrap().status, OrderStatus::Open);
    }

    #[test]
    fn test_better_priced_ask_fills_first() {
        let mut v = setup();
        let (alice, bob) = (v.alice, v.bob);

        let dear = v
            .book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 100, 1_200_000, NOW)
            .unwrap();
        let cheap = v
            .book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 100, 1_100_000, NOW)
            .unwrap();

        v.book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_300_000, NOW)
            .unwrap();

        assert_eq!(v.book.order(&cheap).unwrap().status, OrderStatus::Filled);
        assert_eq!(v.book.order(&dear).unwrap().status, OrderStatus::Open);
    }

    // ─── Cancellation ───

    #[test]
    fn test_cancel_round_trip_refund() {
        let mut v = setup();
        let alice = v.alice;
        let before = v.ledger.balance_of(&v.usdt, &alice);

        let id = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 333_333, 1_234_567, NOW)
            .unwrap();
        v.book.cancel(&mut v.ledger, &alice, id).unwrap();

        assert_eq!(v.ledger.balance_of(&v.usdt, &alice), before);
        assert_eq!(escrow_balance(&v, &v.usdt), 0);
    }

    #[test]
    fn test_cancel_not_owner() {
        let mut v = setup();
        let (alice, bob) = (v.alice, v.bob);
        let id = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_000_000, NOW)
            .unwrap();
        let result = v.book.cancel(&mut v.ledger, &bob, id);
        assert_eq!(result, Err(OrderBookError::NotOwner));
    }

    #[test]
    fn test_cancel_not_open() {
        let mut v = setup();
        let alice = v.alice;
        let id = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_000_000, NOW)
            .unwrap();
        v.book.cancel(&mut v.ledger, &alice, id).unwrap();
        let result = v.book.cancel(&mut v.ledger, &alice, id);
        assert_eq!(result, Err(OrderBookError::NotOpen));
    }

    #[test]
    fn test_cancel_unknown_order() {
        let mut v = setup();
        let alice = v.alice;
        let result = v.book.cancel(&mut v.ledger, &alice, OrderId::from_u64(99));
        assert_eq!(result, Err(OrderBookError::UnknownOrder { order_id: 99 }));
    }

    #[test]
    fn test_cancel_expired_requires_age() {
        let mut v = setup();
        let alice = v.alice;
        let id = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_000_000, NOW)
            .unwrap();

        let result = v.book.cancel_expired(&mut v.ledger, id, NOW + MAX_ORDER_AGE);
        assert_eq!(result, Err(OrderBookError::NotExpired));

        // Any caller may expire once past the age
        v.book
            .cancel_expired(&mut v.ledger, id, NOW + MAX_ORDER_AGE + 1)
            .unwrap();
        assert_eq!(v.book.order(&id).unwrap().status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_matcher_expires_stale_counter_order() {
        let mut v = setup();
        let (alice, bob) = (v.alice, v.bob);
        let bob_tokens_before = v.ledger.balance_of(&v.token, &bob);

        let stale = v
            .book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 100, 1_000_000, NOW)
            .unwrap();

        // A crossing buy arrives after the ask went stale
        let later = NOW + MAX_ORDER_AGE + 1;
        let buy = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 1_000_000, later)
            .unwrap();

        // No fill: the stale ask was cancelled and refunded instead
        assert_eq!(v.book.order(&stale).unwrap().status, OrderStatus::Cancelled);
        assert_eq!(v.book.order(&buy).unwrap().status, OrderStatus::Open);
        assert_eq!(v.ledger.balance_of(&v.token, &bob), bob_tokens_before);
        assert!(v
            .book
            .events()
            .iter()
            .any(|e| matches!(e, ExchangeEvent::OrderCancelled(c) if c.order_id == stale)));
    }

    // ─── Views ───

    #[test]
    fn test_best_bid_ask_empty() {
        let v = setup();
        assert_eq!(v.book.best_bid(&v.token), (0, 0));
        assert_eq!(v.book.best_ask(&v.token), (0, 0));
    }

    #[test]
    fn test_best_bid_ask_extremes() {
        let mut v = setup();
        let (alice, bob) = (v.alice, v.bob);

        v.book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 300, 900_000, NOW)
            .unwrap();
        v.book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 200, 950_000, NOW)
            .unwrap();
        v.book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 500, 1_100_000, NOW)
            .unwrap();
        v.book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 400, 1_050_000, NOW)
            .unwrap();

        assert_eq!(v.book.best_bid(&v.token), (950_000, 200));
        assert_eq!(v.book.best_ask(&v.token), (1_050_000, 400));
    }

    #[test]
    fn test_best_reports_order_remaining_not_depth() {
        let mut v = setup();
        let bob = v.bob;
        v.book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 400, 1_050_000, NOW)
            .unwrap();
        v.book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 300, 1_050_000, NOW)
            .unwrap();

        // First-encountered order at the extreme, not the level total
        assert_eq!(v.book.best_ask(&v.token), (1_050_000, 400));
    }

    #[test]
    fn test_has_active_order() {
        let mut v = setup();
        let alice = v.alice;
        v.book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 950_000, NOW)
            .unwrap();

        assert!(v.book.has_active_order(&alice, &v.token, 950_000, true));
        assert!(!v.book.has_active_order(&alice, &v.token, 950_000, false));
        assert!(!v.book.has_active_order(&alice, &v.token, 900_000, true));
    }

    #[test]
    fn test_user_active_orders() {
        let mut v = setup();
        let alice = v.alice;
        let kept = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 900_000, NOW)
            .unwrap();
        let cancelled = v
            .book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 100, 910_000, NOW)
            .unwrap();
        v.book.cancel(&mut v.ledger, &alice, cancelled).unwrap();

        let open: Vec<OrderId> = v.book.user_active_orders(&alice).iter().map(|o| o.id).collect();
        assert_eq!(open, vec![kept]);
    }

    // ─── Fee admin ───

    #[test]
    fn test_set_trading_fee_bounds() {
        let mut v = setup();
        let operator = v.operator;
        v.book.set_trading_fee_bps(&operator, 100).unwrap();
        assert_eq!(v.book.trading_fee_bps(), 100);

        let result = v.book.set_trading_fee_bps(&operator, 101);
        assert_eq!(result, Err(OrderBookError::FeeTooHigh));
    }

    #[test]
    fn test_set_trading_fee_owner_only() {
        let mut v = setup();
        let eve = AccountId::new();
        let result = v.book.set_trading_fee_bps(&eve, 10);
        assert_eq!(result, Err(OrderBookError::OwnerOnly));
    }

    #[test]
    fn test_set_fee_collector_nil_rejected() {
        let mut v = setup();
        let operator = v.operator;
        let result = v.book.set_fee_collector(&operator, AccountId::nil());
        assert_eq!(result, Err(OrderBookError::InvalidAccount));
    }

    #[test]
    fn test_zero_fee_pays_seller_full_gross() {
        let mut v = setup();
        let (alice, bob, operator) = (v.alice, v.bob, v.operator);
        v.book.set_trading_fee_bps(&operator, 0).unwrap();

        v.book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 500_000, 1_200_000, NOW)
            .unwrap();
        v.book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 500_000, 1_200_000, NOW)
            .unwrap();

        assert_eq!(v.ledger.balance_of(&v.usdt, &bob), 600_000);
        assert_eq!(v.ledger.balance_of(&v.usdt, &v.collector), 0);
        assert!(!v
            .book
            .events()
            .iter()
            .any(|e| matches!(e, ExchangeEvent::FeesCollected(_))));
    }

    // ─── Escrow completeness ───

    #[test]
    fn test_escrow_matches_open_orders() {
        let mut v = setup();
        let (alice, bob) = (v.alice, v.bob);

        v.book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 600_000, 1_000_000, NOW)
            .unwrap();
        v.book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 250_000, 990_000, NOW)
            .unwrap();
        v.book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 100_000, 1_500_000, NOW)
            .unwrap();

        let open_quote: u64 = v
            .book
            .active_buy_orders(&v.token)
            .iter()
            .map(|o| o.escrowed_quote())
            .sum();
        let open_tokens: u64 = v
            .book
            .active_sell_orders(&v.token)
            .iter()
            .map(|o| o.remaining().as_u64())
            .sum();

        assert_eq!(escrow_balance(&v, &v.usdt), open_quote);
        assert_eq!(escrow_balance(&v, &v.token), open_tokens);
    }

    #[test]
    fn test_conservation_across_trading() {
        let mut v = setup();
        let (alice, bob) = (v.alice, v.bob);

        v.book
            .submit_buy(&mut v.ledger, &v.registry, &alice, v.token, 700_000, 1_100_000, NOW)
            .unwrap();
        v.book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 300_000, 1_000_000, NOW)
            .unwrap();
        v.book
            .submit_sell(&mut v.ledger, &v.registry, &bob, v.token, 500_000, 1_100_000, NOW)
            .unwrap();

        assert_eq!(v.ledger.sum_balances(&v.usdt), v.ledger.total_supply(&v.usdt));
        assert_eq!(v.ledger.sum_balances(&v.token), v.ledger.total_supply(&v.token));
    }
}

//! Integer price and quantity primitives
//!
//! All venue arithmetic is over non-negative integers in base units with
//! floor division. Prices are denominated in USDT base units per
//! [`PRICE_SCALE`] token base units, so `qty * price / PRICE_SCALE` yields
//! USDT base units. Intermediate products are widened to `u128`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token base units per whole security token; prices are quoted against it.
pub const PRICE_SCALE: u64 = 1_000_000;

/// Basis-point denominator (1 bps = 1/10_000).
pub const BPS_DENOM: u64 = 10_000;

/// Maximum age of an open order before anyone may expire it, in seconds.
pub const MAX_ORDER_AGE: i64 = 30 * 24 * 60 * 60;

/// Interop ceiling for amounts and prices.
///
/// The settlement environment bounds values to a signed 64-bit range; inputs
/// at or above this are rejected even though `u64` could carry them.
pub const AMOUNT_CEILING: u64 = i64::MAX as u64;

/// Price in USDT base units per 10^6 token base units
///
/// Must always be positive. Ordering is numeric, so a `BTreeMap<Price, _>`
/// iterates price levels ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Create a new Price
    ///
    /// # Panics
    /// Panics if the price is zero
    pub fn new(value: u64) -> Self {
        assert!(value > 0, "Price must be positive");
        Self(value)
    }

    /// Try to create a Price, returning None if zero
    pub fn try_new(value: u64) -> Option<Self> {
        if value > 0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Get the raw value in USDT base units per 10^6 token base units
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check whether the raw value breaches the interop ceiling
    pub fn exceeds_ceiling(&self) -> bool {
        self.0 > AMOUNT_CEILING
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity in token base units
///
/// Order sizes must be positive; fill counters start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Create a new Quantity
    ///
    /// # Panics
    /// Panics if the quantity is zero
    pub fn new(value: u64) -> Self {
        assert!(value > 0, "Quantity must be positive");
        Self(value)
    }

    /// Try to create a Quantity, returning None if zero
    pub fn try_new(value: u64) -> Option<Self> {
        if value > 0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Zero quantity (fill counters)
    pub fn zero() -> Self {
        Self(0)
    }

    /// Get the raw value in token base units
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Check if the quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check whether the raw value breaches the interop ceiling
    pub fn exceeds_ceiling(&self) -> bool {
        self.0 > AMOUNT_CEILING
    }

    /// Saturating subtraction, used for remaining-quantity math
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// The smaller of two quantities
    pub fn min(self, rhs: Self) -> Self {
        Self(self.0.min(rhs.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Floor of `a * b / denom` over widened integers
///
/// # Panics
/// Panics if `denom` is zero. The product `a * b` cannot overflow `u128`
/// for inputs bounded by [`AMOUNT_CEILING`].
pub fn mul_div_floor(a: u64, b: u64, denom: u64) -> u64 {
    assert!(denom > 0, "Division by zero");
    ((a as u128 * b as u128) / denom as u128) as u64
}

/// USDT cost of `qty` token base units at `price`: `floor(qty * price / 10^6)`
pub fn quote_cost(qty: Quantity, price: Price) -> u64 {
    mul_div_floor(qty.as_u64(), price.as_u64(), PRICE_SCALE)
}

/// Fee cut of a gross USDT amount: `floor(gross * bps / 10_000)`
pub fn fee_cut(gross: u64, bps: u16) -> u64 {
    mul_div_floor(gross, bps as u64, BPS_DENOM)
}

/// Spread between a bid and an ask in basis points of the bid:
/// `floor((ask - bid) * 10_000 / bid)`
///
/// A zero or crossed spread reports 0.
pub fn spread_bps(bid: Price, ask: Price) -> u64 {
    let bid = bid.as_u64();
    let ask = ask.as_u64();
    if ask <= bid {
        return 0;
    }
    mul_div_floor(ask - bid, BPS_DENOM, bid)
}

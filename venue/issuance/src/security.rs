//! Shared security primitives
//!
//! Provides the single-owner capability and the reentrancy guard used by
//! every value-moving component of the venue.

use types::ids::AccountId;

/// Single-owner capability.
///
/// Administrative operations are gated on the current owner; ownership can
/// be handed over, guarded by the current owner.
#[derive(Debug, Clone)]
pub struct Ownable {
    owner: AccountId,
}

impl Ownable {
    /// Create with an initial owner.
    pub fn new(owner: AccountId) -> Self {
        Self { owner }
    }

    /// Check if a caller is the current owner.
    pub fn is_owner(&self, caller: &AccountId) -> bool {
        self.owner == *caller
    }

    /// Transfer ownership. Returns `false` when the caller is not the
    /// current owner; the owner is unchanged in that case.
    pub fn transfer(&mut self, caller: &AccountId, new_owner: AccountId) -> bool {
        if !self.is_owner(caller) {
            return false;
        }
        self.owner = new_owner;
        true
    }

    /// Get the current owner.
    pub fn owner(&self) -> AccountId {
        self.owner
    }
}

/// Reentrancy guard for value-moving venue operations.
///
/// An operation enters the guard under its own name before its first ledger
/// write and exits on completion. A nested entry fails, and the recorded
/// holder tells the rejected caller which operation it collided with, so
/// the collision is attributable in the operation log.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    holder: Option<&'static str>,
}

impl ReentrancyGuard {
    /// Create a new vacant guard.
    pub fn new() -> Self {
        Self { holder: None }
    }

    /// Try to enter the guarded section as `operation`. Returns `true` on
    /// entry, `false` when another operation already holds the guard
    /// (reentrancy attempt); the holder is unchanged in that case.
    pub fn enter(&mut self, operation: &'static str) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(operation);
        true
    }

    /// Leave the guarded section.
    pub fn exit(&mut self) {
        self.holder = None;
    }

    /// The operation currently inside the guard, if any.
    pub fn holder(&self) -> Option<&'static str> {
        self.holder
    }
}

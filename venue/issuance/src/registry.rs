//! Registry — issuer factory and lookup indexes
//!
//! Deploys per-SME issuers, mints their initial security-token supply, and
//! indexes them by company name and by security token so token resolution
//! is O(1) on the submission path.

use std::collections::HashMap;

use tracing::info;
use types::ids::{AccountId, AssetId};

use crate::errors::RegistryError;
use crate::events::{ExchangeDeployed, IssuanceEvent, TokenCreated};
use crate::issuer::Issuer;
use crate::ledger::Ledger;
use crate::security::Ownable;

/// Factory and index of all issuers on the venue.
#[derive(Debug)]
pub struct Registry {
    ownership: Ownable,
    /// The venue-wide USDT settlement asset
    usdt: AssetId,
    issuers: Vec<Issuer>,
    by_company: HashMap<String, usize>,
    by_token: HashMap<AssetId, usize>,
    /// Emitted events log (append-only)
    events: Vec<IssuanceEvent>,
}

impl Registry {
    /// Create a registry bound to the venue's USDT asset.
    pub fn new(owner: AccountId, usdt: AssetId) -> Self {
        Self {
            ownership: Ownable::new(owner),
            usdt,
            issuers: Vec::new(),
            by_company: HashMap::new(),
            by_token: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Deploy a new issuer. Owner-only.
    ///
    /// Allocates the security-token asset, mints `initial_supply` to the
    /// treasury, auto-whitelists the treasury, and records both lookup
    /// indexes. Returns the new security-token id (the issuer handle).
    pub fn deploy_issuer(
        &mut self,
        ledger: &mut Ledger,
        caller: &AccountId,
        company_name: &str,
        token_symbol: &str,
        initial_supply: u64,
        treasury: AccountId,
    ) -> Result<AssetId, RegistryError> {
        if !self.ownership.is_owner(caller) {
            return Err(RegistryError::OwnerOnly);
        }
        if company_name.is_empty() {
            return Err(RegistryError::InvalidCompanyName);
        }
        if self.by_company.contains_key(company_name) {
            return Err(RegistryError::DuplicateCompany {
                company: company_name.to_string(),
            });
        }

        let security_token = AssetId::new();
        // Mint before any registry write: a failed mint aborts cleanly.
        ledger.mint(caller, security_token, treasury, initial_supply)?;

        let issuer = Issuer::new(
            company_name.to_string(),
            token_symbol.to_string(),
            security_token,
            self.usdt,
            treasury,
            *caller,
        );

        let index = self.issuers.len();
        self.issuers.push(issuer);
        self.by_company.insert(company_name.to_string(), index);
        self.by_token.insert(security_token, index);

        info!(company = company_name, token = %security_token, initial_supply, "issuer deployed");
        self.events.push(IssuanceEvent::ExchangeDeployed(ExchangeDeployed {
            owner: *caller,
            issuer: security_token,
            company_name: company_name.to_string(),
        }));
        self.events.push(IssuanceEvent::TokenCreated(TokenCreated {
            security_token,
            name: company_name.to_string(),
            symbol: token_symbol.to_string(),
            initial_supply,
        }));

        Ok(security_token)
    }

    // ───────────────────────── Lookups ─────────────────────────

    /// All deployed issuers, in deployment order.
    pub fn list_issuers(&self) -> &[Issuer] {
        &self.issuers
    }

    /// Resolve an issuer by its registered company name.
    pub fn lookup_by_company(&self, company_name: &str) -> Option<&Issuer> {
        self.by_company
            .get(company_name)
            .map(|&index| &self.issuers[index])
    }

    /// Resolve an issuer by its security token.
    pub fn lookup_by_security_token(&self, asset: &AssetId) -> Option<&Issuer> {
        self.by_token.get(asset).map(|&index| &self.issuers[index])
    }

    /// Mutable resolution by security token, for issuer-mutating operations.
    pub fn issuer_mut_by_token(&mut self, asset: &AssetId) -> Option<&mut Issuer> {
        let index = *self.by_token.get(asset)?;
        Some(&mut self.issuers[index])
    }

    /// Mutable resolution by company name.
    pub fn issuer_mut_by_company(&mut self, company_name: &str) -> Option<&mut Issuer> {
        let index = *self.by_company.get(company_name)?;
        Some(&mut self.issuers[index])
    }

    /// The venue-wide USDT settlement asset.
    pub fn usdt(&self) -> AssetId {
        self.usdt
    }

    /// Get the current owner.
    pub fn owner(&self) -> AccountId {
        self.ownership.owner()
    }

    /// Hand the registry over to a new owner. Current-owner gated.
    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), RegistryError> {
        if !self.ownership.transfer(caller, new_owner) {
            return Err(RegistryError::OwnerOnly);
        }
        Ok(())
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

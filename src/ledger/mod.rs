//! Committed bookkeeping: balances, token registry and total supply.
//!
//! Balances and supplies are read and written through the [`BalanceBook`] and
//! [`SupplyBook`] traits so that handlers can run the same debit/credit rules
//! against either the committed maps or a [`staging`] overlay.

use std::collections::BTreeMap;

use crate::error::LedgerError;
use crate::types::{Amount, LedgerKey, TokenId, TokenMetadata};

pub mod staging;

pub use staging::{StagedBalances, StagedSupply};

pub trait BalanceBook {
    /// Balance for `key`, zero when no entry is stored.
    fn balance(&self, key: &LedgerKey) -> Amount;

    /// Write an absolute balance. Zero removes the entry.
    fn store_balance(&mut self, key: LedgerKey, amount: Amount);

    fn credit(&mut self, key: &LedgerKey, amount: Amount) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let next = self
            .balance(key)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                token_id: key.token_id,
                owner: key.owner.clone(),
            })?;
        self.store_balance(key.clone(), next);
        Ok(())
    }

    fn debit(&mut self, key: &LedgerKey, amount: Amount) -> Result<(), LedgerError> {
        let have = self.balance(key);
        if have < amount {
            return Err(LedgerError::InsufficientBalance {
                token_id: key.token_id,
                owner: key.owner.clone(),
                have,
                need: amount,
            });
        }
        if amount > 0 {
            self.store_balance(key.clone(), have - amount);
        }
        Ok(())
    }
}

pub trait SupplyBook {
    fn total_supply(&self, token_id: TokenId) -> Amount;

    fn store_supply(&mut self, token_id: TokenId, amount: Amount);

    fn increase_supply(&mut self, token_id: TokenId, amount: Amount) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let next = self
            .total_supply(token_id)
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow { token_id })?;
        self.store_supply(token_id, next);
        Ok(())
    }

    fn decrease_supply(&mut self, token_id: TokenId, amount: Amount) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let next = self
            .total_supply(token_id)
            .checked_sub(amount)
            .ok_or(LedgerError::SupplyUnderflow { token_id })?;
        self.store_supply(token_id, next);
        Ok(())
    }
}

/// Sparse (token, owner) -> balance map. Zero balances are never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerStore {
    entries: BTreeMap<LedgerKey, Amount>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LedgerKey, &Amount)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every owner's balance of `token_id`.
    pub fn circulating(&self, token_id: TokenId) -> u128 {
        self.entries
            .iter()
            .filter(|(key, _)| key.token_id == token_id)
            .map(|(_, amount)| *amount as u128)
            .sum()
    }
}

impl BalanceBook for LedgerStore {
    fn balance(&self, key: &LedgerKey) -> Amount {
        self.entries.get(key).copied().unwrap_or(0)
    }

    fn store_balance(&mut self, key: LedgerKey, amount: Amount) {
        if amount == 0 {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, amount);
        }
    }
}

/// Registered token identifiers and their metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    tokens: BTreeMap<TokenId, TokenMetadata>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, token_id: TokenId) -> bool {
        self.tokens.contains_key(&token_id)
    }

    pub fn ensure_defined(&self, token_id: TokenId) -> Result<(), LedgerError> {
        if self.contains(token_id) {
            Ok(())
        } else {
            Err(LedgerError::TokenUndefined { token_id })
        }
    }

    pub fn get(&self, token_id: TokenId) -> Option<&TokenMetadata> {
        self.tokens.get(&token_id)
    }

    /// Insert or replace the record for `record.token_id`.
    pub fn register(&mut self, record: TokenMetadata) {
        self.tokens.insert(record.token_id, record);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenMetadata> {
        self.tokens.values()
    }

    pub fn token_ids(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.tokens.keys().copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SupplyTracker {
    totals: BTreeMap<TokenId, Amount>,
}

impl SupplyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TokenId, &Amount)> {
        self.totals.iter()
    }
}

impl SupplyBook for SupplyTracker {
    fn total_supply(&self, token_id: TokenId) -> Amount {
        self.totals.get(&token_id).copied().unwrap_or(0)
    }

    fn store_supply(&mut self, token_id: TokenId, amount: Amount) {
        self.totals.insert(token_id, amount);
    }
}

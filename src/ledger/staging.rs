//! Write overlays used while a handler runs.
//!
//! Reads fall through to the committed maps; writes land in the overlay only.
//! The overlay is drained into mutations once the whole invocation passed.

use std::collections::BTreeMap;

use super::{BalanceBook, LedgerStore, SupplyBook, SupplyTracker};
use crate::types::{Amount, LedgerKey, TokenId};

pub struct StagedBalances<'a> {
    committed: &'a LedgerStore,
    writes: BTreeMap<LedgerKey, Amount>,
}

impl<'a> StagedBalances<'a> {
    pub fn new(committed: &'a LedgerStore) -> Self {
        Self {
            committed,
            writes: BTreeMap::new(),
        }
    }

    /// Final absolute balances for every key written, skipping net no-ops.
    pub fn into_changes(self) -> Vec<(LedgerKey, Amount)> {
        let committed = self.committed;
        self.writes
            .into_iter()
            .filter(|(key, amount)| committed.balance(key) != *amount)
            .collect()
    }
}

impl BalanceBook for StagedBalances<'_> {
    fn balance(&self, key: &LedgerKey) -> Amount {
        match self.writes.get(key) {
            Some(amount) => *amount,
            None => self.committed.balance(key),
        }
    }

    fn store_balance(&mut self, key: LedgerKey, amount: Amount) {
        self.writes.insert(key, amount);
    }
}

pub struct StagedSupply<'a> {
    committed: &'a SupplyTracker,
    writes: BTreeMap<TokenId, Amount>,
}

impl<'a> StagedSupply<'a> {
    pub fn new(committed: &'a SupplyTracker) -> Self {
        Self {
            committed,
            writes: BTreeMap::new(),
        }
    }

    pub fn into_changes(self) -> Vec<(TokenId, Amount)> {
        self.writes.into_iter().collect()
    }
}

impl SupplyBook for StagedSupply<'_> {
    fn total_supply(&self, token_id: TokenId) -> Amount {
        match self.writes.get(&token_id) {
            Some(amount) => *amount,
            None => self.committed.total_supply(token_id),
        }
    }

    fn store_supply(&mut self, token_id: TokenId, amount: Amount) {
        self.writes.insert(token_id, amount);
    }
}

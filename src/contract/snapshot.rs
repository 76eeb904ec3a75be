//! Persisted form of [`ContractState`] and its state root.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{AdminState, BurnState, ContractState, CoreState, Profile};
use crate::access::AccessControl;
use crate::ledger::{BalanceBook, LedgerStore, SupplyBook, SupplyTracker, TokenRegistry};
use crate::types::{Address, Amount, LedgerKey, TokenId, TokenMetadata};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("state root mismatch: recorded {recorded}, computed {computed}")]
    RootMismatch { recorded: String, computed: String },
    #[error("zero balance stored for token {token_id} owner {owner}")]
    ZeroBalance { token_id: TokenId, owner: Address },
    #[error("duplicate ledger entry for token {token_id} owner {owner}")]
    DuplicateEntry { token_id: TokenId, owner: Address },
    #[error("balance held in unregistered token {0}")]
    UndefinedToken(TokenId),
    #[error("total supply of token {token_id} is {supply} but owners hold {circulating}")]
    SupplyMismatch {
        token_id: TokenId,
        supply: Amount,
        circulating: u128,
    },
    #[error("profile {profile:?} does not match the recorded slices: {reason}")]
    ProfileMismatch {
        profile: Profile,
        reason: &'static str,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub token_id: TokenId,
    pub owner: Address,
    pub balance: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplyEntry {
    pub token_id: TokenId,
    pub total: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateSnapshot {
    pub profile: Profile,
    pub height: u64,
    pub ledger: Vec<LedgerEntry>,
    pub token_metadata: Vec<TokenMetadata>,
    #[serde(default)]
    pub total_supply: Vec<SupplyEntry>,
    #[serde(default)]
    pub access: Option<AccessControl>,
    #[serde(default)]
    pub redeem_address: Option<Address>,
    pub state_root: String,
}

impl ContractState {
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            profile: self.profile(),
            height: self.height,
            ledger: self
                .core
                .ledger
                .iter()
                .map(|(key, balance)| LedgerEntry {
                    token_id: key.token_id,
                    owner: key.owner.clone(),
                    balance: *balance,
                })
                .collect(),
            token_metadata: self.core.registry.iter().cloned().collect(),
            total_supply: self
                .supply()
                .map(|supply| {
                    supply
                        .iter()
                        .map(|(token_id, total)| SupplyEntry {
                            token_id: *token_id,
                            total: *total,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            access: self.access().cloned(),
            redeem_address: self.redeem_address().cloned(),
            state_root: hex::encode(self.state_root()),
        }
    }

    /// Deterministic commitment over every balance, supply, token and admin field.
    pub fn state_root(&self) -> [u8; 32] {
        let mut leaves: Vec<[u8; 32]> = Vec::new();
        for (key, balance) in self.core.ledger.iter() {
            let mut hasher = Sha256::new();
            hasher.update(b"balance");
            hasher.update(key.token_id.to_le_bytes());
            hash_str(&mut hasher, &key.owner);
            hasher.update(balance.to_le_bytes());
            leaves.push(hasher.finalize().into());
        }
        for record in self.core.registry.iter() {
            let mut hasher = Sha256::new();
            hasher.update(b"token");
            hasher.update(record.token_id.to_le_bytes());
            for (name, value) in &record.info {
                hash_str(&mut hasher, name);
                hasher.update((value.0.len() as u64).to_le_bytes());
                hasher.update(&value.0);
            }
            leaves.push(hasher.finalize().into());
        }
        if let Some(admin) = &self.admin {
            for (token_id, total) in admin.supply.iter() {
                let mut hasher = Sha256::new();
                hasher.update(b"supply");
                hasher.update(token_id.to_le_bytes());
                hasher.update(total.to_le_bytes());
                leaves.push(hasher.finalize().into());
            }
            let mut hasher = Sha256::new();
            hasher.update(b"admin");
            hash_str(&mut hasher, &admin.access.administrator);
            hash_str(&mut hasher, &admin.access.proposed_administrator);
            leaves.push(hasher.finalize().into());
        }
        if let Some(burn) = &self.burn {
            let mut hasher = Sha256::new();
            hasher.update(b"redeem");
            hash_str(&mut hasher, &burn.redeem_address);
            leaves.push(hasher.finalize().into());
        }
        build_merkle(leaves)
    }

    pub fn write_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&self.snapshot())?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn read_snapshot(path: &Path) -> Result<Self, SnapshotError> {
        let bytes = fs::read(path)?;
        let snapshot: StateSnapshot = serde_json::from_slice(&bytes)?;
        snapshot.restore()
    }
}

impl StateSnapshot {
    /// Rebuilds live state, rejecting snapshots that break ledger invariants
    /// or whose recorded root does not match their content.
    pub fn restore(self) -> Result<ContractState, SnapshotError> {
        let mut registry = TokenRegistry::new();
        for record in self.token_metadata {
            registry.register(record);
        }

        let mut ledger = LedgerStore::new();
        for entry in self.ledger {
            if entry.balance == 0 {
                return Err(SnapshotError::ZeroBalance {
                    token_id: entry.token_id,
                    owner: entry.owner,
                });
            }
            if !registry.contains(entry.token_id) {
                return Err(SnapshotError::UndefinedToken(entry.token_id));
            }
            let key = LedgerKey::new(entry.token_id, entry.owner);
            if ledger.balance(&key) != 0 {
                return Err(SnapshotError::DuplicateEntry {
                    token_id: key.token_id,
                    owner: key.owner,
                });
            }
            ledger.store_balance(key, entry.balance);
        }

        let admin = match (self.profile, self.access) {
            (Profile::Base, None) => {
                if !self.total_supply.is_empty() {
                    return Err(SnapshotError::ProfileMismatch {
                        profile: self.profile,
                        reason: "base profile carries no supply tracker",
                    });
                }
                None
            }
            (Profile::Base, Some(_)) => {
                return Err(SnapshotError::ProfileMismatch {
                    profile: self.profile,
                    reason: "base profile carries no administrator",
                })
            }
            (_, None) => {
                return Err(SnapshotError::ProfileMismatch {
                    profile: self.profile,
                    reason: "administrator missing",
                })
            }
            (_, Some(access)) => {
                let mut supply = SupplyTracker::new();
                for entry in self.total_supply {
                    supply.store_supply(entry.token_id, entry.total);
                }
                for token_id in registry.token_ids() {
                    let circulating = ledger.circulating(token_id);
                    let total = supply.total_supply(token_id);
                    if total as u128 != circulating {
                        return Err(SnapshotError::SupplyMismatch {
                            token_id,
                            supply: total,
                            circulating,
                        });
                    }
                }
                if let Some((token_id, total)) = supply
                    .iter()
                    .find(|(token_id, total)| **total != 0 && !registry.contains(**token_id))
                {
                    return Err(SnapshotError::SupplyMismatch {
                        token_id: *token_id,
                        supply: *total,
                        circulating: 0,
                    });
                }
                Some(AdminState { access, supply })
            }
        };

        let burn = match (self.profile, self.redeem_address) {
            (Profile::BurnableMintable, Some(redeem_address)) => Some(BurnState { redeem_address }),
            (Profile::BurnableMintable, None) => {
                return Err(SnapshotError::ProfileMismatch {
                    profile: self.profile,
                    reason: "redeem address missing",
                })
            }
            (_, Some(_)) => {
                return Err(SnapshotError::ProfileMismatch {
                    profile: self.profile,
                    reason: "only the burnable profile carries a redeem address",
                })
            }
            (_, None) => None,
        };

        let state = ContractState {
            core: CoreState { ledger, registry },
            admin,
            burn,
            height: self.height,
        };
        let computed = hex::encode(state.state_root());
        if computed != self.state_root {
            return Err(SnapshotError::RootMismatch {
                recorded: self.state_root,
                computed,
            });
        }
        Ok(state)
    }
}

fn hash_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"fa2-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            if chunk.len() == 2 {
                hasher.update(chunk[1]);
            } else {
                hasher.update(chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}

//! Top-level contract state and entrypoint dispatch.
//!
//! State is split into slices: the core slice (balances and token registry)
//! always exists, the admin slice (access control and total supply) exists for
//! mintable profiles, and the burn slice (redeem address) only for the
//! burnable profile. An invocation is planned against staged copies of the
//! slices it touches and committed only if planning succeeded.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::access::AccessControl;
use crate::engine;
use crate::error::LedgerError;
use crate::ledger::{
    BalanceBook, LedgerStore, StagedBalances, StagedSupply, SupplyBook, SupplyTracker,
    TokenRegistry,
};
use crate::outbox::{OutboundMessage, Outbox};
use crate::types::{
    Address, Amount, BalanceOfRequest, BurnRequest, LedgerKey, MintRequest, TokenId,
    TokenMetadata, TransferGroup,
};

pub mod snapshot;

pub use snapshot::{SnapshotError, StateSnapshot};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Base,
    Mintable,
    BurnableMintable,
}

/// State slice an entrypoint needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Core,
    Admin,
    Burn,
}

impl Profile {
    pub fn supports(self, capability: Capability) -> bool {
        match capability {
            Capability::Core => true,
            Capability::Admin => self != Profile::Base,
            Capability::Burn => self == Profile::BurnableMintable,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Entrypoint {
    Transfer(Vec<TransferGroup>),
    BalanceOf(BalanceOfRequest),
    SetTokenMetadata(TokenMetadata),
    Mint(Vec<MintRequest>),
    Burn(Vec<BurnRequest>),
    ProposeAdministrator(Address),
    SetAdministrator(Address),
}

impl Entrypoint {
    pub fn name(&self) -> &'static str {
        match self {
            Entrypoint::Transfer(_) => "transfer",
            Entrypoint::BalanceOf(_) => "balance_of",
            Entrypoint::SetTokenMetadata(_) => "set_token_metadata",
            Entrypoint::Mint(_) => "mint",
            Entrypoint::Burn(_) => "burn",
            Entrypoint::ProposeAdministrator(_) => "propose_administrator",
            Entrypoint::SetAdministrator(_) => "set_administrator",
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            Entrypoint::Transfer(_) | Entrypoint::BalanceOf(_) => Capability::Core,
            Entrypoint::SetTokenMetadata(_)
            | Entrypoint::Mint(_)
            | Entrypoint::ProposeAdministrator(_)
            | Entrypoint::SetAdministrator(_) => Capability::Admin,
            Entrypoint::Burn(_) => Capability::Burn,
        }
    }
}

/// One call as submitted by the host: who called, and what.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    pub sender: Address,
    pub call: Entrypoint,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateMutation {
    /// Absolute balance; zero prunes the entry.
    SetBalance { key: LedgerKey, amount: Amount },
    SetSupply { token_id: TokenId, amount: Amount },
    SetTokenMetadata { record: TokenMetadata },
    SetProposedAdministrator { address: Address },
    SetAdministrator { address: Address },
}

/// Everything a successful invocation commits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Effects {
    pub mutations: Vec<StateMutation>,
    pub messages: Vec<OutboundMessage>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreState {
    pub(crate) ledger: LedgerStore,
    pub(crate) registry: TokenRegistry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminState {
    pub(crate) access: AccessControl,
    pub(crate) supply: SupplyTracker,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnState {
    pub(crate) redeem_address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractState {
    pub(crate) core: CoreState,
    pub(crate) admin: Option<AdminState>,
    pub(crate) burn: Option<BurnState>,
    pub(crate) height: u64,
}

impl ContractState {
    pub fn base() -> Self {
        Self {
            core: CoreState::default(),
            admin: None,
            burn: None,
            height: 0,
        }
    }

    pub fn mintable(administrator: impl Into<Address>) -> Self {
        Self {
            admin: Some(AdminState {
                access: AccessControl::new(administrator),
                supply: SupplyTracker::new(),
            }),
            ..Self::base()
        }
    }

    pub fn burnable_mintable(
        administrator: impl Into<Address>,
        redeem_address: impl Into<Address>,
    ) -> Self {
        Self {
            burn: Some(BurnState {
                redeem_address: redeem_address.into(),
            }),
            ..Self::mintable(administrator)
        }
    }

    pub fn profile(&self) -> Profile {
        match (&self.admin, &self.burn) {
            (None, _) => Profile::Base,
            (Some(_), None) => Profile::Mintable,
            (Some(_), Some(_)) => Profile::BurnableMintable,
        }
    }

    /// Number of committed invocations.
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.core.ledger
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.core.registry
    }

    pub fn access(&self) -> Option<&AccessControl> {
        self.admin.as_ref().map(|admin| &admin.access)
    }

    pub fn supply(&self) -> Option<&SupplyTracker> {
        self.admin.as_ref().map(|admin| &admin.supply)
    }

    pub fn redeem_address(&self) -> Option<&Address> {
        self.burn.as_ref().map(|burn| &burn.redeem_address)
    }

    pub fn balance(&self, token_id: TokenId, owner: &str) -> Amount {
        self.core.ledger.balance(&LedgerKey::new(token_id, owner))
    }

    /// Total supply, or `None` when the profile does not track supply.
    pub fn total_supply(&self, token_id: TokenId) -> Option<Amount> {
        self.supply().map(|supply| supply.total_supply(token_id))
    }

    /// Runs one invocation. On success every mutation is applied and the
    /// produced messages are handed to `outbox`; on failure nothing changes.
    pub fn invoke<O: Outbox>(
        &mut self,
        sender: &Address,
        call: &Entrypoint,
        outbox: &mut O,
    ) -> Result<(), LedgerError> {
        let effects = match self.plan(sender, call) {
            Ok(effects) => effects,
            Err(err) => {
                warn!(entrypoint = call.name(), %sender, code = %err.code(), "invocation aborted: {err}");
                return Err(err);
            }
        };
        debug!(
            entrypoint = call.name(),
            %sender,
            mutations = effects.mutations.len(),
            messages = effects.messages.len(),
            height = self.height + 1,
            "invocation committed"
        );
        self.apply(effects.mutations);
        self.height += 1;
        for message in effects.messages {
            outbox.send(message);
        }
        Ok(())
    }

    /// Validates `call` against the current state and returns what it would commit.
    pub fn plan(&self, sender: &Address, call: &Entrypoint) -> Result<Effects, LedgerError> {
        if !self.profile().supports(call.capability()) {
            return Err(LedgerError::UnsupportedEntrypoint(call.name()));
        }
        match call {
            Entrypoint::Transfer(batch) => self.plan_transfer(sender, batch),
            Entrypoint::BalanceOf(request) => self.plan_balance_of(request),
            Entrypoint::SetTokenMetadata(record) => self.plan_set_token_metadata(sender, record),
            Entrypoint::Mint(batch) => self.plan_mint(sender, batch),
            Entrypoint::Burn(batch) => self.plan_burn(sender, batch),
            Entrypoint::ProposeAdministrator(candidate) => {
                let address = self.admin_slice(call.name())?.access.propose(sender, candidate)?;
                Ok(Effects {
                    mutations: vec![StateMutation::SetProposedAdministrator { address }],
                    ..Effects::default()
                })
            }
            Entrypoint::SetAdministrator(candidate) => {
                let address = self.admin_slice(call.name())?.access.accept(sender, candidate)?;
                Ok(Effects {
                    mutations: vec![StateMutation::SetAdministrator { address }],
                    ..Effects::default()
                })
            }
        }
    }

    fn admin_slice(&self, entrypoint: &'static str) -> Result<&AdminState, LedgerError> {
        self.admin
            .as_ref()
            .ok_or(LedgerError::UnsupportedEntrypoint(entrypoint))
    }

    fn plan_transfer(&self, sender: &Address, batch: &[TransferGroup]) -> Result<Effects, LedgerError> {
        let mut book = StagedBalances::new(&self.core.ledger);
        engine::transfer(&mut book, &self.core.registry, sender, batch)?;
        Ok(Effects {
            mutations: balance_mutations(book),
            ..Effects::default()
        })
    }

    fn plan_balance_of(&self, request: &BalanceOfRequest) -> Result<Effects, LedgerError> {
        let message = engine::balance_of(&self.core.ledger, &self.core.registry, request)?;
        Ok(Effects {
            messages: vec![message],
            ..Effects::default()
        })
    }

    fn plan_set_token_metadata(
        &self,
        sender: &Address,
        record: &TokenMetadata,
    ) -> Result<Effects, LedgerError> {
        self.admin_slice("set_token_metadata")?
            .access
            .ensure_administrator(sender)?;
        Ok(Effects {
            mutations: vec![StateMutation::SetTokenMetadata {
                record: record.clone(),
            }],
            ..Effects::default()
        })
    }

    fn plan_mint(&self, sender: &Address, batch: &[MintRequest]) -> Result<Effects, LedgerError> {
        let admin = self.admin_slice("mint")?;
        let mut book = StagedBalances::new(&self.core.ledger);
        let mut supply = StagedSupply::new(&admin.supply);
        engine::mint(
            &mut book,
            &mut supply,
            &self.core.registry,
            &admin.access,
            sender,
            batch,
        )?;
        let mut mutations = balance_mutations(book);
        mutations.extend(supply_mutations(supply));
        Ok(Effects {
            mutations,
            ..Effects::default()
        })
    }

    fn plan_burn(&self, sender: &Address, batch: &[BurnRequest]) -> Result<Effects, LedgerError> {
        let (admin, burn) = match (&self.admin, &self.burn) {
            (Some(admin), Some(burn)) => (admin, burn),
            _ => return Err(LedgerError::UnsupportedEntrypoint("burn")),
        };
        let mut book = StagedBalances::new(&self.core.ledger);
        let mut supply = StagedSupply::new(&admin.supply);
        engine::burn(
            &mut book,
            &mut supply,
            &self.core.registry,
            &admin.access,
            sender,
            &burn.redeem_address,
            batch,
        )?;
        let mut mutations = balance_mutations(book);
        mutations.extend(supply_mutations(supply));
        Ok(Effects {
            mutations,
            ..Effects::default()
        })
    }

    /// Applies already validated mutations. Mutations addressing a slice the
    /// profile lacks are ignored; `plan` never produces them.
    pub(crate) fn apply(&mut self, mutations: Vec<StateMutation>) {
        for mutation in mutations {
            match mutation {
                StateMutation::SetBalance { key, amount } => {
                    self.core.ledger.store_balance(key, amount);
                }
                StateMutation::SetSupply { token_id, amount } => {
                    if let Some(admin) = self.admin.as_mut() {
                        admin.supply.store_supply(token_id, amount);
                    }
                }
                StateMutation::SetTokenMetadata { record } => {
                    self.core.registry.register(record);
                }
                StateMutation::SetProposedAdministrator { address } => {
                    if let Some(admin) = self.admin.as_mut() {
                        admin.access.proposed_administrator = address;
                    }
                }
                StateMutation::SetAdministrator { address } => {
                    if let Some(admin) = self.admin.as_mut() {
                        admin.access.administrator = address;
                    }
                }
            }
        }
    }
}

fn balance_mutations(book: StagedBalances<'_>) -> Vec<StateMutation> {
    book.into_changes()
        .into_iter()
        .map(|(key, amount)| StateMutation::SetBalance { key, amount })
        .collect()
}

fn supply_mutations(supply: StagedSupply<'_>) -> Vec<StateMutation> {
    supply
        .into_changes()
        .into_iter()
        .map(|(token_id, amount)| StateMutation::SetSupply { token_id, amount })
        .collect()
}

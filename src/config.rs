//! Genesis configuration.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::contract::{ContractState, Profile};
use crate::error::LedgerError;
use crate::ledger::{BalanceBook, SupplyBook};
use crate::types::{Address, Amount, LedgerKey, TokenId, TokenMetadata};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("genesis io: {0}")]
    Io(#[from] io::Error),
    #[error("genesis json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("profile {0:?} requires an administrator")]
    MissingAdministrator(Profile),
    #[error("profile {0:?} requires a redeem address")]
    MissingRedeemAddress(Profile),
    #[error("profile {profile:?} does not use `{field}`")]
    UnusedField {
        profile: Profile,
        field: &'static str,
    },
    #[error("genesis balance references unregistered token {0}")]
    UndefinedToken(TokenId),
    #[error("genesis balances: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenesisBalance {
    pub owner: Address,
    pub token_id: TokenId,
    pub amount: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenesisConfig {
    pub profile: Profile,
    #[serde(default)]
    pub administrator: Option<Address>,
    #[serde(default)]
    pub redeem_address: Option<Address>,
    #[serde(default)]
    pub tokens: Vec<TokenMetadata>,
    #[serde(default)]
    pub balances: Vec<GenesisBalance>,
}

impl GenesisConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Builds the initial state. Genesis balances count towards total supply.
    pub fn build(&self) -> Result<ContractState, ConfigError> {
        let mut state = match (self.profile, &self.administrator, &self.redeem_address) {
            (Profile::Base, None, None) => ContractState::base(),
            (Profile::Base, Some(_), _) => {
                return Err(ConfigError::UnusedField {
                    profile: self.profile,
                    field: "administrator",
                })
            }
            (Profile::Base | Profile::Mintable, _, Some(_)) => {
                return Err(ConfigError::UnusedField {
                    profile: self.profile,
                    field: "redeem_address",
                })
            }
            (Profile::Mintable, Some(admin), None) => ContractState::mintable(admin.clone()),
            (Profile::BurnableMintable, Some(admin), Some(redeem)) => {
                ContractState::burnable_mintable(admin.clone(), redeem.clone())
            }
            (Profile::BurnableMintable, Some(_), None) => {
                return Err(ConfigError::MissingRedeemAddress(self.profile))
            }
            (_, None, _) => return Err(ConfigError::MissingAdministrator(self.profile)),
        };

        for record in &self.tokens {
            state.core.registry.register(record.clone());
        }
        for balance in &self.balances {
            if !state.core.registry.contains(balance.token_id) {
                return Err(ConfigError::UndefinedToken(balance.token_id));
            }
            state.core.ledger.credit(
                &LedgerKey::new(balance.token_id, balance.owner.clone()),
                balance.amount,
            )?;
            if let Some(admin) = state.admin.as_mut() {
                admin.supply.increase_supply(balance.token_id, balance.amount)?;
            }
        }
        info!(
            profile = ?self.profile,
            tokens = self.tokens.len(),
            balances = state.core.ledger.len(),
            "genesis state built"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis(profile: Profile) -> GenesisConfig {
        GenesisConfig {
            profile,
            administrator: Some("admin".into()),
            redeem_address: Some("dan".into()),
            tokens: vec![TokenMetadata::new(0)],
            balances: vec![
                GenesisBalance {
                    owner: "alice".into(),
                    token_id: 0,
                    amount: 100,
                },
                GenesisBalance {
                    owner: "dan".into(),
                    token_id: 0,
                    amount: 10,
                },
            ],
        }
    }

    #[test]
    fn genesis_balances_count_into_supply() {
        let state = genesis(Profile::BurnableMintable).build().unwrap();
        assert_eq!(state.balance(0, "alice"), 100);
        assert_eq!(state.total_supply(0), Some(110));
        assert_eq!(state.redeem_address().map(String::as_str), Some("dan"));
        assert_eq!(state.height(), 0);
    }

    #[test]
    fn base_profile_rejects_admin_fields() {
        let config = genesis(Profile::Base);
        assert!(matches!(
            config.build(),
            Err(ConfigError::UnusedField {
                field: "administrator",
                ..
            })
        ));
        let config = GenesisConfig {
            administrator: None,
            redeem_address: None,
            ..genesis(Profile::Base)
        };
        let state = config.build().unwrap();
        assert_eq!(state.total_supply(0), None);
        assert_eq!(state.balance(0, "dan"), 10);
    }

    #[test]
    fn burnable_profile_needs_redeem_address() {
        let config = GenesisConfig {
            redeem_address: None,
            ..genesis(Profile::BurnableMintable)
        };
        assert!(matches!(
            config.build(),
            Err(ConfigError::MissingRedeemAddress(_))
        ));
    }

    #[test]
    fn mintable_profile_needs_administrator() {
        let config = GenesisConfig {
            administrator: None,
            redeem_address: None,
            ..genesis(Profile::Mintable)
        };
        assert!(matches!(
            config.build(),
            Err(ConfigError::MissingAdministrator(Profile::Mintable))
        ));
    }

    #[test]
    fn balances_need_registered_tokens() {
        let mut config = genesis(Profile::BurnableMintable);
        config.balances[0].token_id = 7;
        assert!(matches!(config.build(), Err(ConfigError::UndefinedToken(7))));
    }

    #[test]
    fn parses_minimal_json() {
        let config: GenesisConfig = serde_json::from_str(
            r#"{"profile":"mintable","administrator":"tz1admin","tokens":[{"token_id":0}]}"#,
        )
        .unwrap();
        let state = config.build().unwrap();
        assert_eq!(state.access().unwrap().administrator, "tz1admin");
        assert!(state.registry().contains(0));
    }
}

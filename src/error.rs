use thiserror::Error;

use crate::types::{Address, TokenId};

const PREFIX: &str = "FA2_";

/// Reasons an invocation aborts. Any of these discards every staged write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Referenced token identifier is not in the registry.
    #[error("token {token_id} is not defined")]
    TokenUndefined { token_id: TokenId },

    /// Debit exceeds the available balance.
    #[error("insufficient balance of token {token_id} for {owner}: have {have}, need {need}")]
    InsufficientBalance {
        token_id: TokenId,
        owner: Address,
        have: u64,
        need: u64,
    },

    /// Caller is not the declared sender, the administrator or the proposed administrator.
    #[error("sender {sender} is not authorized")]
    NotOwner { sender: Address },

    #[error("balance of token {token_id} for {owner} would overflow")]
    BalanceOverflow { token_id: TokenId, owner: Address },

    #[error("total supply of token {token_id} would overflow")]
    SupplyOverflow { token_id: TokenId },

    /// Burn would take total supply below zero; ledger and supply tracker disagree.
    #[error("total supply of token {token_id} would underflow")]
    SupplyUnderflow { token_id: TokenId },

    #[error("entrypoint {0} is not available for this contract profile")]
    UnsupportedEntrypoint(&'static str),
}

impl LedgerError {
    /// Stable wire code reported to the caller of an aborted invocation.
    pub fn code(&self) -> String {
        let kind = match self {
            LedgerError::TokenUndefined { .. } => "TOKEN_UNDEFINED",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::NotOwner { .. } => "NOT_OWNER",
            LedgerError::BalanceOverflow { .. } => "BALANCE_OVERFLOW",
            LedgerError::SupplyOverflow { .. } => "SUPPLY_OVERFLOW",
            LedgerError::SupplyUnderflow { .. } => "SUPPLY_UNDERFLOW",
            LedgerError::UnsupportedEntrypoint(_) => "UNSUPPORTED_ENTRYPOINT",
        };
        format!("{PREFIX}{kind}")
    }
}

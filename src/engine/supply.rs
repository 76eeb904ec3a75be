use crate::access::AccessControl;
use crate::error::LedgerError;
use crate::ledger::{BalanceBook, SupplyBook, TokenRegistry};
use crate::types::{Address, BurnRequest, LedgerKey, MintRequest};

/// Credits every recipient and grows total supply by the same amount.
pub fn mint<B: BalanceBook, S: SupplyBook>(
    book: &mut B,
    supply: &mut S,
    registry: &TokenRegistry,
    access: &AccessControl,
    sender: &Address,
    batch: &[MintRequest],
) -> Result<(), LedgerError> {
    access.ensure_administrator(sender)?;
    for request in batch {
        registry.ensure_defined(request.token_id)?;
        book.credit(
            &LedgerKey::new(request.token_id, request.to.clone()),
            request.amount,
        )?;
        supply.increase_supply(request.token_id, request.amount)?;
    }
    Ok(())
}

/// Debits the redeem address and shrinks total supply by the same amount.
pub fn burn<B: BalanceBook, S: SupplyBook>(
    book: &mut B,
    supply: &mut S,
    registry: &TokenRegistry,
    access: &AccessControl,
    sender: &Address,
    redeem_address: &Address,
    batch: &[BurnRequest],
) -> Result<(), LedgerError> {
    access.ensure_administrator(sender)?;
    for request in batch {
        registry.ensure_defined(request.token_id)?;
        book.debit(
            &LedgerKey::new(request.token_id, redeem_address.clone()),
            request.amount,
        )?;
        supply.decrease_supply(request.token_id, request.amount)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerStore, StagedBalances, StagedSupply, SupplyTracker};
    use crate::types::TokenMetadata;

    fn registry() -> TokenRegistry {
        let mut registry = TokenRegistry::new();
        registry.register(TokenMetadata::new(0));
        registry
    }

    fn mint_req(to: &str, token_id: u64, amount: u64) -> MintRequest {
        MintRequest {
            to: to.into(),
            token_id,
            amount,
        }
    }

    #[test]
    fn mint_grows_balance_and_supply_together() {
        let ledger = LedgerStore::new();
        let totals = SupplyTracker::new();
        let access = AccessControl::new("admin");
        let mut book = StagedBalances::new(&ledger);
        let mut supply = StagedSupply::new(&totals);

        mint(
            &mut book,
            &mut supply,
            &registry(),
            &access,
            &"admin".into(),
            &[mint_req("dan", 0, 50), mint_req("alice", 0, 25)],
        )
        .unwrap();
        assert_eq!(book.balance(&LedgerKey::new(0, "dan")), 50);
        assert_eq!(supply.total_supply(0), 75);
    }

    #[test]
    fn mint_of_unregistered_token_fails() {
        let ledger = LedgerStore::new();
        let totals = SupplyTracker::new();
        let mut book = StagedBalances::new(&ledger);
        let mut supply = StagedSupply::new(&totals);
        assert_eq!(
            mint(
                &mut book,
                &mut supply,
                &registry(),
                &AccessControl::new("admin"),
                &"admin".into(),
                &[mint_req("dan", 1, 50)],
            ),
            Err(LedgerError::TokenUndefined { token_id: 1 })
        );
    }

    #[test]
    fn non_admin_cannot_mint_or_burn() {
        let ledger = LedgerStore::new();
        let totals = SupplyTracker::new();
        let access = AccessControl::new("admin");
        let mut book = StagedBalances::new(&ledger);
        let mut supply = StagedSupply::new(&totals);
        assert!(matches!(
            mint(&mut book, &mut supply, &registry(), &access, &"alice".into(), &[]),
            Err(LedgerError::NotOwner { .. })
        ));
        assert!(matches!(
            burn(
                &mut book,
                &mut supply,
                &registry(),
                &access,
                &"alice".into(),
                &"dan".into(),
                &[],
            ),
            Err(LedgerError::NotOwner { .. })
        ));
    }

    #[test]
    fn burn_above_redeem_balance_fails() {
        let mut ledger = LedgerStore::new();
        ledger.credit(&LedgerKey::new(0, "dan"), 10).unwrap();
        let mut totals = SupplyTracker::new();
        totals.increase_supply(0, 10).unwrap();
        let mut book = StagedBalances::new(&ledger);
        let mut supply = StagedSupply::new(&totals);

        let err = burn(
            &mut book,
            &mut supply,
            &registry(),
            &AccessControl::new("admin"),
            &"admin".into(),
            &"dan".into(),
            &[BurnRequest {
                token_id: 0,
                amount: 30,
            }],
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { have: 10, need: 30, .. }));
    }

    #[test]
    fn burn_fails_safe_when_supply_lags_ledger() {
        let mut ledger = LedgerStore::new();
        ledger.credit(&LedgerKey::new(0, "dan"), 10).unwrap();
        let totals = SupplyTracker::new();
        let mut book = StagedBalances::new(&ledger);
        let mut supply = StagedSupply::new(&totals);

        assert_eq!(
            burn(
                &mut book,
                &mut supply,
                &registry(),
                &AccessControl::new("admin"),
                &"admin".into(),
                &"dan".into(),
                &[BurnRequest {
                    token_id: 0,
                    amount: 10,
                }],
            ),
            Err(LedgerError::SupplyUnderflow { token_id: 0 })
        );
    }
}

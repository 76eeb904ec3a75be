use tracing::trace;

use crate::error::LedgerError;
use crate::ledger::{BalanceBook, TokenRegistry};
use crate::types::{Address, LedgerKey, TransferGroup};

/// Applies a batch of transfers in input order. Total supply is never touched.
///
/// The sender check runs per tx, so a group with no txs passes regardless of
/// its declared `from`.
pub fn transfer<B: BalanceBook>(
    book: &mut B,
    registry: &TokenRegistry,
    sender: &Address,
    batch: &[TransferGroup],
) -> Result<(), LedgerError> {
    for group in batch {
        for tx in &group.txs {
            if group.from != *sender {
                return Err(LedgerError::NotOwner {
                    sender: sender.clone(),
                });
            }
            registry.ensure_defined(tx.token_id)?;
            if tx.amount == 0 {
                continue;
            }
            book.debit(&LedgerKey::new(tx.token_id, group.from.clone()), tx.amount)?;
            book.credit(&LedgerKey::new(tx.token_id, tx.to.clone()), tx.amount)?;
            trace!(from = %group.from, to = %tx.to, token_id = tx.token_id, amount = tx.amount, "staged transfer");
        }
    }
    Ok(())
}

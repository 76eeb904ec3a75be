use crate::error::LedgerError;
use crate::ledger::{BalanceBook, TokenRegistry};
use crate::outbox::OutboundMessage;
use crate::types::{BalanceOfRequest, BalanceOfResponse};

/// Looks up every requested balance in order and packs them into a single
/// message for `request.destination`. One undefined token fails the whole query.
pub fn balance_of<B: BalanceBook>(
    book: &B,
    registry: &TokenRegistry,
    request: &BalanceOfRequest,
) -> Result<OutboundMessage, LedgerError> {
    let mut responses = Vec::with_capacity(request.requests.len());
    for key in &request.requests {
        registry.ensure_defined(key.token_id)?;
        responses.push(BalanceOfResponse {
            request: key.clone(),
            balance: book.balance(key),
        });
    }
    Ok(OutboundMessage::BalanceOf {
        destination: request.destination.clone(),
        responses,
    })
}

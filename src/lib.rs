//! Multi-asset FA2 ledger engine.
//!
//! The crate tracks balances of many token ids held by many owners and
//! exposes them through a handful of handlers:
//!
//! * [`engine::transfer()`]: batched owner-to-owner transfers.
//! * [`engine::balance_of()`]: batched balance lookups answered with an
//!   [`OutboundMessage`].
//! * [`engine::mint()`] and [`engine::burn()`]: administrator-only supply changes.
//! * [`access`]: two-step administrator handover.
//!
//! [`ContractState::invoke`] is the single entry for the host. Every call is
//! planned against staged views of the state and committed as a whole, or
//! not at all.

pub mod access;
pub mod config;
pub mod contract;
pub mod engine;
pub mod ledger;
pub mod outbox;
pub mod types;

mod error;

pub use contract::{ContractState, Entrypoint, Invocation, Profile, StateMutation};
pub use error::LedgerError;
pub use outbox::{OutboundMessage, Outbox};

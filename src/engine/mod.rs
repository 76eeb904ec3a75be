//! Handler bodies. Each one validates its whole batch against staged books and
//! fails on the first violated check; committing is left to the caller.

pub mod query;
pub mod supply;
pub mod transfer;

pub use query::balance_of;
pub use supply::{burn, mint};
pub use transfer::transfer;

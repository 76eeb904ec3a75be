use serde::{Deserialize, Serialize};

use crate::types::{Address, BalanceOfResponse};

/// One-way message emitted by an invocation. Carries no value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    BalanceOf {
        destination: Address,
        responses: Vec<BalanceOfResponse>,
    },
}

impl OutboundMessage {
    pub fn destination(&self) -> &Address {
        match self {
            OutboundMessage::BalanceOf { destination, .. } => destination,
        }
    }
}

/// Host-side send primitive. Messages are handed over only for committed invocations.
pub trait Outbox {
    fn send(&mut self, message: OutboundMessage);
}

impl Outbox for Vec<OutboundMessage> {
    fn send(&mut self, message: OutboundMessage) {
        self.push(message);
    }
}

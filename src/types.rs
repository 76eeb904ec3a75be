use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Opaque caller identity handed in by the host.
pub type Address = String;
pub type TokenId = u64;
pub type Amount = u64;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LedgerKey {
    pub token_id: TokenId,
    pub owner: Address,
}

impl LedgerKey {
    pub fn new(token_id: TokenId, owner: impl Into<Address>) -> Self {
        Self {
            token_id,
            owner: owner.into(),
        }
    }
}

/// Raw metadata value, hex encoded on the wire.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Bytes(#[serde(with = "hex_bytes")] pub Vec<u8>);

impl From<&str> for Bytes {
    fn from(value: &str) -> Self {
        Bytes(value.as_bytes().to_vec())
    }
}

/// Token metadata record. The ledger only ever checks that `token_id` is present.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenMetadata {
    pub token_id: TokenId,
    #[serde(default)]
    pub info: BTreeMap<String, Bytes>,
}

impl TokenMetadata {
    pub fn new(token_id: TokenId) -> Self {
        Self {
            token_id,
            info: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferTx {
    pub to: Address,
    pub token_id: TokenId,
    pub amount: Amount,
}

/// All transfers debited from one sender inside a batch.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferGroup {
    pub from: Address,
    pub txs: Vec<TransferTx>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceOfRequest {
    pub requests: Vec<LedgerKey>,
    pub destination: Address,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceOfResponse {
    pub request: LedgerKey,
    pub balance: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MintRequest {
    pub to: Address,
    pub token_id: TokenId,
    pub amount: Amount,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BurnRequest {
    pub token_id: TokenId,
    pub amount: Amount,
}

pub(crate) mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(&encoded).map_err(D::Error::custom)
    }
}

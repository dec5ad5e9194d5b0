// Row models for the index tables read by the serving layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name under which the system token's balances are stored.
pub const SYS_TOKEN: &str = "SYS";

/// Category of a hash in the reverse-lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashKind {
    Block,
    Tx,
    Token,
    Address,
}

impl HashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashKind::Block => "block",
            HashKind::Tx => "tx",
            HashKind::Token => "token",
            HashKind::Address => "addr",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "block" => Some(HashKind::Block),
            "tx" => Some(HashKind::Tx),
            "token" => Some(HashKind::Token),
            "addr" => Some(HashKind::Address),
            _ => None,
        }
    }
}

/// Token family; each has its own fixed storage precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Sys,
    Normal,
    Bancor,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Sys => "sys",
            TokenType::Normal => "normal",
            TokenType::Bancor => "bancor",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "sys" => Some(TokenType::Sys),
            "normal" => Some(TokenType::Normal),
            "bancor" => Some(TokenType::Bancor),
            _ => None,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashRecord {
    pub hash: String,
    pub kind: HashKind,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub hash: String,
    pub number: u64,
    pub tx_count: u32,
    pub creator: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub block_hash: String,
    pub block_number: u64,
    pub caller: String,
    pub timestamp: i64,
    /// JSON rendering of the transaction with the receipt's `cost` attached.
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub address: String,
    pub token: String,
    pub token_type: TokenType,
    /// Decimal string at the token type's precision.
    pub amount: String,
    /// Float projection of `amount`, for ranking queries.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub name: String,
    pub token_type: TokenType,
    pub creator: String,
    pub created_at: i64,
    pub meta: Vec<u8>,
}

/// Metadata stored for a token created by `createToken`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalTokenMeta {
    pub supply: f64,
    pub precision: Option<u32>,
}

/// Metadata stored for a token created by `createBancorToken`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BancorTokenMeta {
    pub factor: f64,
    pub supply: f64,
    pub nonliquidity: f64,
    pub reserve: f64,
}

/// AMM curve parameters as last reported by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BancorTokenParams {
    pub name: String,
    pub factor: f64,
    pub reserve: f64,
    pub supply: f64,
}

impl BancorTokenParams {
    /// Spot price `S·F/R`; `None` while the reserve is empty.
    pub fn price(&self) -> Option<f64> {
        if self.reserve == 0.0 {
            None
        } else {
            Some(self.supply * self.factor / self.reserve)
        }
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Big-number type tag the node prefixes to amount strings.
const AMOUNT_MARKER: char = 'n';

/// String type tag the node prefixes to miner addresses.
const ADDRESS_MARKER: char = 's';

/// Strip a single amount marker from either end of a raw wire value.
pub fn strip_marker(raw: &str) -> &str {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix(AMOUNT_MARKER) {
        rest
    } else if let Some(rest) = raw.strip_suffix(AMOUNT_MARKER) {
        rest
    } else {
        raw
    }
}

pub fn strip_address_tag(raw: &str) -> &str {
    raw.strip_prefix(ADDRESS_MARKER).unwrap_or(raw)
}

/// Parse a number that may arrive as a JSON number or a (possibly tagged) string.
/// Any magnitude a float can hold is accepted, including exponent notation.
pub fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => strip_marker(s).parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {}", value)))
}

fn lenient_number_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => number_from_value(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {}", value))),
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockHeader {
    pub hash: String,
    pub number: u64,
    pub timestamp: i64,
    pub creator: String,
}

/// Transaction as embedded in a block response. Unknown fields are kept so the
/// stored content is the node's rendering plus `cost`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockTransaction {
    pub hash: String,
    pub caller: String,
    #[serde(default)]
    pub method: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlockTransaction {
    /// JSON bytes of this transaction with the receipt's execution cost attached.
    pub fn content_with_cost(&self, cost: &Value) -> Result<Vec<u8>, serde_json::Error> {
        let mut object = self.extra.clone();
        object.insert("hash".to_string(), Value::String(self.hash.clone()));
        object.insert("caller".to_string(), Value::String(self.caller.clone()));
        object.insert("method".to_string(), Value::String(self.method.clone()));
        object.insert("cost".to_string(), cost.clone());
        serde_json::to_vec(&Value::Object(object))
    }
}

/// One block with its transactions, as returned by `getBlock` and inside `getBlocks`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockBundle {
    pub block: BlockHeader,
    #[serde(default)]
    pub transactions: Vec<BlockTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Receipt {
    pub block: ReceiptBlock,
    pub tx: ReceiptTx,
    pub receipt: ExecutionReceipt,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.receipt.return_code == 0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptBlock {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptTx {
    pub hash: String,
    pub caller: String,
    pub method: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub value: Value,
}

impl ReceiptTx {
    /// Decode the method-specific `input` object.
    pub fn input<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.input)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionReceipt {
    #[serde(rename = "returnCode")]
    pub return_code: i64,
    #[serde(default)]
    pub cost: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferInput {
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreBalance {
    pub address: String,
    #[serde(deserialize_with = "lenient_number")]
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTokenInput {
    pub tokenid: String,
    #[serde(rename = "preBalances", default)]
    pub pre_balances: Vec<PreBalance>,
    #[serde(default)]
    pub precision: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBancorTokenInput {
    pub tokenid: String,
    #[serde(rename = "preBalances", default)]
    pub pre_balances: Vec<PreBalance>,
    #[serde(deserialize_with = "lenient_number")]
    pub factor: f64,
    #[serde(default, deserialize_with = "lenient_number_opt")]
    pub nonliquidity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenInput {
    pub tokenid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenTransferInput {
    pub tokenid: String,
    pub to: String,
}

/// Sum of pre-balance amounts, each truncated to an integer first.
pub fn pre_balance_supply(pre_balances: &[PreBalance]) -> f64 {
    pre_balances.iter().map(|p| p.amount.trunc()).sum()
}

/// Transaction methods the ledger updater knows how to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxMethod {
    TransferTo,
    CreateToken,
    CreateBancorToken,
    BuyBancorToken,
    SellBancorToken,
    TransferTokenTo,
    TransferBancorTokenTo,
    Vote,
    Mortgage,
    Unmortgage,
    Register,
    SetUserCode,
    GetUserCode,
    RunUserMethod,
    Unknown(String),
}

impl TxMethod {
    pub fn from_name(name: &str) -> Self {
        match name {
            "transferTo" => TxMethod::TransferTo,
            "createToken" => TxMethod::CreateToken,
            "createBancorToken" => TxMethod::CreateBancorToken,
            "buyBancorToken" => TxMethod::BuyBancorToken,
            "sellBancorToken" => TxMethod::SellBancorToken,
            "transferTokenTo" => TxMethod::TransferTokenTo,
            "transferBancorTokenTo" => TxMethod::TransferBancorTokenTo,
            "vote" => TxMethod::Vote,
            "mortgage" => TxMethod::Mortgage,
            "unmortgage" => TxMethod::Unmortgage,
            "register" => TxMethod::Register,
            "setUserCode" => TxMethod::SetUserCode,
            "getUserCode" => TxMethod::GetUserCode,
            "runUserMethod" => TxMethod::RunUserMethod,
            other => TxMethod::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TxMethod::TransferTo => "transferTo",
            TxMethod::CreateToken => "createToken",
            TxMethod::CreateBancorToken => "createBancorToken",
            TxMethod::BuyBancorToken => "buyBancorToken",
            TxMethod::SellBancorToken => "sellBancorToken",
            TxMethod::TransferTokenTo => "transferTokenTo",
            TxMethod::TransferBancorTokenTo => "transferBancorTokenTo",
            TxMethod::Vote => "vote",
            TxMethod::Mortgage => "mortgage",
            TxMethod::Unmortgage => "unmortgage",
            TxMethod::Register => "register",
            TxMethod::SetUserCode => "setUserCode",
            TxMethod::GetUserCode => "getUserCode",
            TxMethod::RunUserMethod => "runUserMethod",
            TxMethod::Unknown(name) => name,
        }
    }
}

/// Raw AMM parameters; each value may carry the amount marker.
#[derive(Debug, Clone, Deserialize)]
pub struct RawBancorParams {
    #[serde(rename = "F", deserialize_with = "lenient_number")]
    pub factor: f64,
    #[serde(rename = "R", deserialize_with = "lenient_number")]
    pub reserve: f64,
    #[serde(rename = "S", deserialize_with = "lenient_number")]
    pub supply: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerBalance {
    pub address: String,
    pub balance: String,
}

use crate::blockchain::models::{
    strip_address_tag, BlockBundle, MinerBalance, RawBancorParams, Receipt,
};
use crate::config::Config;
use crate::error::SyncError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const STATUS_OK: u16 = 200;
/// Reported when the request did not complete within the configured timeout.
pub const STATUS_TIMEOUT: u16 = 504;
/// Reported when the node could not be reached at all.
pub const STATUS_UNREACHABLE: u16 = 0;

/// Remote method names understood by the chain node.
pub mod methods {
    pub const GET_FINALIZED_HEIGHT: &str = "getLastIrreversibleBlockNumber";
    pub const GET_BLOCK: &str = "getBlock";
    pub const GET_BLOCK_RANGE: &str = "getBlocks";
    pub const GET_RECEIPT: &str = "getTransactionReceipt";
    pub const GET_BALANCE: &str = "getBalance";
    pub const GET_TOKEN_BALANCE: &str = "getTokenBalance";
    pub const GET_BANCOR_TOKEN_BALANCE: &str = "getBancorTokenBalance";
    pub const GET_BANCOR_TOKEN_PARAMS: &str = "getBancorTokenParams";
    pub const GET_MINER_LIST: &str = "getMiners";
    pub const GET_BALANCES: &str = "getBalances";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    pub method: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcResponse {
    pub status: u16,
    pub payload: Option<String>,
}

impl RpcResponse {
    pub fn ok(payload: impl Into<String>) -> Self {
        Self { status: STATUS_OK, payload: Some(payload.into()) }
    }

    pub fn failed(status: u16) -> Self {
        Self { status, payload: None }
    }
}

/// Named remote calls against a chain node. Implementations never fail; every
/// problem is reported through the status code.
#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn call(&self, request: RpcRequest) -> RpcResponse;
}

#[async_trait]
impl<T: RpcClient + ?Sized> RpcClient for std::sync::Arc<T> {
    async fn call(&self, request: RpcRequest) -> RpcResponse {
        (**self).call(request).await
    }
}

/// JSON-over-HTTP transport posting `{"funName", "args"}` to the node's `/rpc` endpoint.
pub struct HttpRpcClient {
    http: reqwest::Client,
    url: String,
}

impl HttpRpcClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let url = config.node_rpc_url();
        let timeout = Duration::from_secs(config.rpc_timeout_secs);

        info!("Initializing node client with RPC endpoint: {}, timeout: {:?}", url, timeout);

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn call(&self, request: RpcRequest) -> RpcResponse {
        let body = json!({ "funName": request.method, "args": request.args });

        let response = match self.http.post(&self.url).json(&body).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("RPC {} timed out", request.method);
                return RpcResponse::failed(STATUS_TIMEOUT);
            }
            Err(e) => {
                warn!("RPC {} failed: {}", request.method, e);
                return RpcResponse::failed(e.status().map(|s| s.as_u16()).unwrap_or(STATUS_UNREACHABLE));
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(text) => RpcResponse { status, payload: Some(text) },
            Err(e) if e.is_timeout() => RpcResponse::failed(STATUS_TIMEOUT),
            Err(e) => {
                warn!("RPC {} body unreadable: {}", request.method, e);
                RpcResponse::failed(STATUS_UNREACHABLE)
            }
        }
    }
}

/// Which block `get_block` should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    Number(u64),
    Latest,
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Number(n) => write!(f, "{}", n),
            BlockId::Latest => f.write_str("latest"),
        }
    }
}

/// Typed view over an [`RpcClient`]: checks the status, decodes the payload
/// and the `err` discriminator, then extracts the method's result.
pub struct NodeClient<C> {
    rpc: C,
}

impl<C: RpcClient> NodeClient<C> {
    pub fn new(rpc: C) -> Self {
        Self { rpc }
    }

    async fn request(&self, method: &str, args: Vec<String>) -> Result<Value, SyncError> {
        debug!(method, ?args, "rpc call");
        let response = self
            .rpc
            .call(RpcRequest { method: method.to_string(), args })
            .await;

        if response.status != STATUS_OK {
            return Err(SyncError::Transport { method: method.to_string(), status: response.status });
        }

        let payload = response
            .payload
            .ok_or_else(|| SyncError::parse(method, "empty payload"))?;
        let value: Value = serde_json::from_str(&payload).map_err(|e| SyncError::parse(method, e))?;

        // An absent `err` means success; anything but an integer is malformed
        let code = match value.get("err") {
            None => 0,
            Some(err) => err
                .as_i64()
                .ok_or_else(|| SyncError::parse(method, format!("non-integer err {}", err)))?,
        };
        if code != 0 {
            return Err(SyncError::Node { method: method.to_string(), code });
        }

        Ok(value)
    }

    fn field<T: DeserializeOwned>(method: &str, value: &Value, field: &str) -> Result<T, SyncError> {
        let inner = value
            .get(field)
            .ok_or_else(|| SyncError::parse(method, format!("missing `{}`", field)))?;
        T::deserialize(inner).map_err(|e| SyncError::parse(method, e))
    }

    pub async fn get_finalized_height(&self) -> Result<u64, SyncError> {
        let method = methods::GET_FINALIZED_HEIGHT;
        let value = self.request(method, Vec::new()).await?;

        let height = match &value {
            Value::Object(_) => value.get("value").and_then(height_from_value),
            other => height_from_value(other),
        };
        height.ok_or_else(|| SyncError::parse(method, format!("not a height: {}", value)))
    }

    pub async fn get_block(&self, id: BlockId) -> Result<BlockBundle, SyncError> {
        let method = methods::GET_BLOCK;
        let value = self.request(method, vec![id.to_string(), "true".to_string()]).await?;
        BlockBundle::deserialize(&value).map_err(|e| SyncError::parse(method, e))
    }

    /// Blocks `start..=stop` with their transactions, in the node's order.
    pub async fn get_block_range(&self, start: u64, stop: u64) -> Result<Vec<BlockBundle>, SyncError> {
        let method = methods::GET_BLOCK_RANGE;
        let args = vec![start.to_string(), stop.to_string(), "true".to_string()];
        let value = self.request(method, args).await?;
        Self::field(method, &value, "blocks")
    }

    pub async fn get_receipt(&self, tx_hash: &str) -> Result<Receipt, SyncError> {
        let method = methods::GET_RECEIPT;
        let value = self.request(method, vec![tx_hash.to_string()]).await?;
        Receipt::deserialize(&value).map_err(|e| SyncError::parse(method, e))
    }

    /// Raw SYS balance string, marker included.
    pub async fn get_balance(&self, address: &str) -> Result<String, SyncError> {
        let method = methods::GET_BALANCE;
        let value = self.request(method, vec![address.to_string()]).await?;
        amount_field(method, &value)
    }

    pub async fn get_token_balance(&self, token: &str, address: &str) -> Result<String, SyncError> {
        let method = methods::GET_TOKEN_BALANCE;
        let value = self
            .request(method, vec![token.to_string(), address.to_string()])
            .await?;
        amount_field(method, &value)
    }

    pub async fn get_bancor_token_balance(&self, token: &str, address: &str) -> Result<String, SyncError> {
        let method = methods::GET_BANCOR_TOKEN_BALANCE;
        let value = self
            .request(method, vec![token.to_string(), address.to_string()])
            .await?;
        amount_field(method, &value)
    }

    pub async fn get_bancor_token_params(&self, token: &str) -> Result<RawBancorParams, SyncError> {
        let method = methods::GET_BANCOR_TOKEN_PARAMS;
        let value = self.request(method, vec![token.to_string()]).await?;
        Self::field(method, &value, "value")
    }

    /// Current miner addresses with their string tag removed.
    pub async fn get_miner_list(&self) -> Result<Vec<String>, SyncError> {
        let method = methods::GET_MINER_LIST;
        let value = self.request(method, Vec::new()).await?;
        let miners: Vec<String> = Self::field(method, &value, "value")?;
        Ok(miners.iter().map(|m| strip_address_tag(m).to_string()).collect())
    }

    pub async fn get_balances(&self, addresses: &[String]) -> Result<Vec<MinerBalance>, SyncError> {
        let method = methods::GET_BALANCES;
        let list = serde_json::to_string(addresses).map_err(|e| SyncError::parse(method, e))?;
        let value = self.request(method, vec![list]).await?;
        Self::field(method, &value, "value")
    }
}

fn height_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn amount_field(method: &str, value: &Value) -> Result<String, SyncError> {
    match value.get("value") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(SyncError::parse(method, format!("not an amount: {}", other))),
        None => Err(SyncError::parse(method, "missing `value`")),
    }
}

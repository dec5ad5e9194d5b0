//! In-process chain node that records every call and serves scripted state.

use crate::blockchain::client::{methods, RpcClient, RpcRequest, RpcResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Application error code the mock returns for anything it doesn't know.
pub const ERR_NOT_FOUND: i64 = 5;

struct Failure {
    method: String,
    arg: Option<String>,
    status: u16,
}

#[derive(Default)]
struct MockState {
    finalized_height: u64,
    blocks: BTreeMap<u64, Value>,
    receipts: HashMap<String, Value>,
    /// (method, token, address) -> raw balance
    balances: HashMap<(String, String, String), String>,
    bancor_params: HashMap<String, Value>,
    miners: Vec<String>,
    failures: Vec<Failure>,
    calls: Vec<RpcRequest>,
}

#[derive(Default)]
pub struct MockNode {
    state: Mutex<MockState>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_height(&self, height: u64) {
        self.state.lock().unwrap().finalized_height = height;
    }

    /// Serve `bundle` for block `number`, whatever number its header claims.
    pub fn add_block_at(&self, number: u64, bundle: Value) {
        self.state.lock().unwrap().blocks.insert(number, bundle);
    }

    pub fn add_block(&self, bundle: Value) {
        let number = bundle["block"]["number"].as_u64().unwrap();
        self.add_block_at(number, bundle);
    }

    pub fn add_receipt(&self, receipt: Value) {
        let hash = receipt["tx"]["hash"].as_str().unwrap().to_string();
        self.state.lock().unwrap().receipts.insert(hash, receipt);
    }

    pub fn add_raw_receipt(&self, hash: &str, receipt: Value) {
        self.state.lock().unwrap().receipts.insert(hash.to_string(), receipt);
    }

    fn set_balance(&self, method: &str, token: &str, address: &str, raw: &str) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((method.to_string(), token.to_string(), address.to_string()), raw.to_string());
    }

    pub fn set_sys_balance(&self, address: &str, raw: &str) {
        self.set_balance(methods::GET_BALANCE, "", address, raw);
    }

    pub fn set_token_balance(&self, token: &str, address: &str, raw: &str) {
        self.set_balance(methods::GET_TOKEN_BALANCE, token, address, raw);
    }

    pub fn set_bancor_balance(&self, token: &str, address: &str, raw: &str) {
        self.set_balance(methods::GET_BANCOR_TOKEN_BALANCE, token, address, raw);
    }

    pub fn set_bancor_params(&self, token: &str, factor: &str, reserve: &str, supply: &str) {
        self.state
            .lock()
            .unwrap()
            .bancor_params
            .insert(token.to_string(), json!({ "F": factor, "R": reserve, "S": supply }));
    }

    /// Miner addresses as the node reports them, string tag included.
    pub fn set_miners(&self, miners: &[&str]) {
        self.state.lock().unwrap().miners = miners.iter().map(|m| format!("s{}", m)).collect();
    }

    /// Answer every `method` call (optionally only those carrying `arg`) with `status`.
    pub fn fail(&self, method: &str, arg: Option<&str>, status: u16) {
        self.state.lock().unwrap().failures.push(Failure {
            method: method.to_string(),
            arg: arg.map(str::to_string),
            status,
        });
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub fn calls(&self) -> Vec<RpcRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Arguments of every recorded call to `method`, in call order.
    pub fn calls_to(&self, method: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .map(|c| c.args)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn respond(state: &MockState, request: &RpcRequest) -> Value {
        let arg = |i: usize| request.args.get(i).cloned().unwrap_or_default();
        let not_found = json!({ "err": ERR_NOT_FOUND });

        match request.method.as_str() {
            methods::GET_FINALIZED_HEIGHT => json!({ "err": 0, "value": state.finalized_height }),
            methods::GET_BLOCK => {
                let bundle = if arg(0) == "latest" {
                    state.blocks.values().next_back()
                } else {
                    arg(0).parse::<u64>().ok().and_then(|n| state.blocks.get(&n))
                };
                match bundle {
                    Some(bundle) => {
                        let mut bundle = bundle.clone();
                        bundle["err"] = json!(0);
                        bundle
                    }
                    None => not_found,
                }
            }
            methods::GET_BLOCK_RANGE => {
                let start: u64 = arg(0).parse().unwrap_or(0);
                let stop: u64 = arg(1).parse().unwrap_or(0);
                let blocks: Vec<Value> = state.blocks.range(start..=stop).map(|(_, b)| b.clone()).collect();
                json!({ "err": 0, "blocks": blocks })
            }
            methods::GET_RECEIPT => state.receipts.get(&arg(0)).cloned().unwrap_or(not_found),
            methods::GET_BALANCE => {
                let key = (request.method.clone(), String::new(), arg(0));
                json!({ "err": 0, "value": state.balances.get(&key).cloned().unwrap_or_else(|| "n0".into()) })
            }
            methods::GET_TOKEN_BALANCE | methods::GET_BANCOR_TOKEN_BALANCE => {
                let key = (request.method.clone(), arg(0), arg(1));
                json!({ "err": 0, "value": state.balances.get(&key).cloned().unwrap_or_else(|| "n0".into()) })
            }
            methods::GET_BANCOR_TOKEN_PARAMS => match state.bancor_params.get(&arg(0)) {
                Some(params) => json!({ "err": 0, "value": params }),
                None => not_found,
            },
            methods::GET_MINER_LIST => json!({ "err": 0, "value": state.miners }),
            methods::GET_BALANCES => {
                let addresses: Vec<String> = serde_json::from_str(&arg(0)).unwrap_or_default();
                let entries: Vec<Value> = addresses
                    .iter()
                    .map(|address| {
                        let key = (methods::GET_BALANCE.to_string(), String::new(), address.clone());
                        let balance = state.balances.get(&key).cloned().unwrap_or_else(|| "n0".into());
                        json!({ "address": format!("s{}", address), "balance": balance })
                    })
                    .collect();
                json!({ "err": 0, "value": entries })
            }
            _ => not_found,
        }
    }
}

#[async_trait]
impl RpcClient for MockNode {
    async fn call(&self, request: RpcRequest) -> RpcResponse {
        let mut state = self.state.lock().unwrap();
        state.calls.push(request.clone());

        let failure = state.failures.iter().find(|f| {
            f.method == request.method
                && f.arg.as_ref().map_or(true, |a| request.args.contains(a))
        });
        if let Some(failure) = failure {
            return RpcResponse::failed(failure.status);
        }

        RpcResponse::ok(Self::respond(&state, &request).to_string())
    }
}

pub fn block(number: u64, transactions: Vec<Value>) -> Value {
    json!({
        "block": {
            "hash": format!("block-{}", number),
            "number": number,
            "timestamp": 1_600_000_000 + number as i64,
            "creator": "miner-1"
        },
        "transactions": transactions
    })
}

pub fn tx(hash: &str, caller: &str, method: &str) -> Value {
    json!({ "hash": hash, "caller": caller, "method": method, "nonce": 1 })
}

pub fn receipt(hash: &str, caller: &str, method: &str, input: Value, return_code: i64) -> Value {
    receipt_with_value(hash, caller, method, input, Value::Null, return_code)
}

pub fn receipt_with_value(
    hash: &str,
    caller: &str,
    method: &str,
    input: Value,
    value: Value,
    return_code: i64,
) -> Value {
    json!({
        "err": 0,
        "block": { "timestamp": 1_600_000_500 },
        "tx": {
            "hash": hash,
            "caller": caller,
            "method": method,
            "input": input,
            "value": value
        },
        "receipt": { "returnCode": return_code, "cost": "n0.001" }
    })
}

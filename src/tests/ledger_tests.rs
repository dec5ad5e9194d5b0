use super::mock_node::{receipt, receipt_with_value, MockNode};
use super::test_pool;
use crate::blockchain::client::{methods, NodeClient};
use crate::blockchain::ledger::LedgerUpdater;
use crate::blockchain::models::Receipt;
use crate::db::{account, address, hash, token};
use crate::error::SyncError;
use crate::models::{BancorTokenMeta, HashKind, NormalTokenMeta, TokenType};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;

struct Harness {
    mock: Arc<MockNode>,
    node: NodeClient<Arc<MockNode>>,
    pool: SqlitePool,
}

impl Harness {
    async fn new() -> Self {
        let mock = Arc::new(MockNode::new());
        Self {
            node: NodeClient::new(mock.clone()),
            mock,
            pool: test_pool().await,
        }
    }

    async fn apply(&self, receipt: Value) -> Result<(), SyncError> {
        let receipt: Receipt = serde_json::from_value(receipt).unwrap();
        LedgerUpdater::new(&self.node, &self.pool).apply(&receipt).await
    }

    fn refreshed(&self, method: &str) -> Vec<Vec<String>> {
        self.mock.calls_to(method)
    }
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn failed_transfer_still_refreshes_both_parties() {
    let h = Harness::new().await;
    h.mock.set_sys_balance("A", "n99.99995");
    h.mock.set_sys_balance("B", "n1");

    h.apply(receipt("tx1", "A", "transferTo", json!({ "to": "B" }), 7))
        .await
        .unwrap();

    assert_eq!(h.refreshed(methods::GET_BALANCE), vec![args(&["A"]), args(&["B"])]);
    assert_eq!(
        address::get_addresses_for_transaction(&h.pool, "tx1").await.unwrap(),
        vec!["A", "B"]
    );
    assert_eq!(hash::get_hash(&h.pool, "B").await.unwrap().unwrap().kind, HashKind::Address);

    let a = account::get_balance(&h.pool, "A", "SYS", TokenType::Sys).await.unwrap().unwrap();
    assert_eq!(a.amount, "100.0000");
    assert_eq!(a.value, 100.0);
}

#[tokio::test]
async fn create_token_records_supply_and_seeds_holders() {
    let h = Harness::new().await;
    h.mock.set_token_balance("CAT", "h1", "n600");
    h.mock.set_token_balance("CAT", "h2", "n400");

    let input = json!({
        "tokenid": "cat",
        "preBalances": [
            { "address": "h1", "amount": "600" },
            { "address": "h2", "amount": "400" }
        ],
        "precision": 3
    });
    h.apply(receipt("tx1", "owner", "createToken", input, 0)).await.unwrap();

    let record = token::get_token(&h.pool, "cat").await.unwrap().unwrap();
    assert_eq!(record.name, "CAT");
    assert_eq!(record.token_type, TokenType::Normal);
    assert_eq!(record.creator, "owner");
    let meta: NormalTokenMeta = serde_json::from_slice(&record.meta).unwrap();
    assert_eq!(meta, NormalTokenMeta { supply: 1000.0, precision: Some(3) });

    assert_eq!(
        h.refreshed(methods::GET_TOKEN_BALANCE),
        vec![args(&["CAT", "h1"]), args(&["CAT", "h2"])]
    );
    let h1 = account::get_balance(&h.pool, "h1", "CAT", TokenType::Normal).await.unwrap().unwrap();
    assert_eq!(h1.amount, "600.000000000");
    assert_eq!(hash::get_hash(&h.pool, "CAT").await.unwrap().unwrap().kind, HashKind::Token);
    assert_eq!(
        address::get_addresses_for_transaction(&h.pool, "tx1").await.unwrap(),
        vec!["h1", "h2", "owner"]
    );
}

#[tokio::test]
async fn failed_create_token_only_charges_caller() {
    let h = Harness::new().await;

    let input = json!({ "tokenid": "cat", "preBalances": [{ "address": "h1", "amount": 5 }] });
    h.apply(receipt("tx1", "owner", "createToken", input, 1)).await.unwrap();

    assert_eq!(h.refreshed(methods::GET_BALANCE), vec![args(&["owner"])]);
    assert!(h.refreshed(methods::GET_TOKEN_BALANCE).is_empty());
    assert!(token::get_token(&h.pool, "CAT").await.unwrap().is_none());
    assert!(hash::get_hash(&h.pool, "CAT").await.unwrap().is_none());
    assert_eq!(
        address::get_addresses_for_transaction(&h.pool, "tx1").await.unwrap(),
        vec!["h1", "owner"]
    );
}

#[tokio::test]
async fn create_bancor_token_takes_params_from_node() {
    let h = Harness::new().await;
    h.mock.set_bancor_params("AMM", "n0.25", "n200", "n2000");
    h.mock.set_bancor_balance("AMM", "h1", "n600");

    let input = json!({
        "tokenid": "amm",
        "preBalances": [
            { "address": "h1", "amount": "600" },
            { "address": "h2", "amount": "400" }
        ],
        "factor": "0.5"
    });
    h.apply(receipt_with_value("tx1", "owner", "createBancorToken", input, json!("100"), 0))
        .await
        .unwrap();

    let record = token::get_token(&h.pool, "AMM").await.unwrap().unwrap();
    assert_eq!(record.token_type, TokenType::Bancor);
    let meta: BancorTokenMeta = serde_json::from_slice(&record.meta).unwrap();
    assert_eq!(
        meta,
        BancorTokenMeta { factor: 0.5, supply: 1000.0, nonliquidity: 0.0, reserve: 100.0 }
    );

    let params = token::get_bancor_params(&h.pool, "AMM").await.unwrap().unwrap();
    assert_eq!((params.factor, params.reserve, params.supply), (0.25, 200.0, 2000.0));
    assert_eq!(params.price(), Some(2.5));
    assert_eq!(h.refreshed(methods::GET_BANCOR_TOKEN_PARAMS), vec![args(&["AMM"])]);

    let h1 = account::get_balance(&h.pool, "h1", "AMM", TokenType::Bancor).await.unwrap().unwrap();
    assert_eq!(h1.amount, "600.000000000");
}

#[tokio::test]
async fn bancor_trades_refresh_balance_and_params_only_on_success() {
    let h = Harness::new().await;
    h.mock.set_bancor_params("AMM", "n0.5", "n110", "n1010");

    h.apply(receipt("tx1", "trader", "buyBancorToken", json!({ "tokenid": "amm" }), 0))
        .await
        .unwrap();
    assert_eq!(h.refreshed(methods::GET_BANCOR_TOKEN_BALANCE), vec![args(&["AMM", "trader"])]);
    assert_eq!(h.refreshed(methods::GET_BANCOR_TOKEN_PARAMS), vec![args(&["AMM"])]);

    h.mock.clear_calls();
    h.apply(receipt("tx2", "trader", "buyBancorToken", json!({ "tokenid": "amm" }), 3))
        .await
        .unwrap();
    assert_eq!(h.refreshed(methods::GET_BALANCE), vec![args(&["trader"])]);
    assert!(h.refreshed(methods::GET_BANCOR_TOKEN_BALANCE).is_empty());
    assert!(h.refreshed(methods::GET_BANCOR_TOKEN_PARAMS).is_empty());
    assert_eq!(address::get_addresses_for_transaction(&h.pool, "tx2").await.unwrap(), vec!["trader"]);
}

#[tokio::test]
async fn sell_uses_upper_cased_token_name() {
    let h = Harness::new().await;
    h.mock.set_bancor_params("AMM", "n0.5", "n90", "n990");

    h.apply(receipt("tx1", "trader", "sellBancorToken", json!({ "tokenid": "Amm" }), 0))
        .await
        .unwrap();

    assert_eq!(h.refreshed(methods::GET_BANCOR_TOKEN_BALANCE), vec![args(&["AMM", "trader"])]);
    assert!(token::get_bancor_params(&h.pool, "AMM").await.unwrap().is_some());
}

#[tokio::test]
async fn token_transfers_refresh_both_sides_on_success() {
    let h = Harness::new().await;

    h.apply(receipt("tx1", "A", "transferTokenTo", json!({ "tokenid": "cat", "to": "B" }), 0))
        .await
        .unwrap();
    assert_eq!(h.refreshed(methods::GET_BALANCE), vec![args(&["A"])]);
    assert_eq!(
        h.refreshed(methods::GET_TOKEN_BALANCE),
        vec![args(&["CAT", "A"]), args(&["CAT", "B"])]
    );

    h.apply(receipt("tx2", "A", "transferBancorTokenTo", json!({ "tokenid": "amm", "to": "B" }), 0))
        .await
        .unwrap();
    assert_eq!(
        h.refreshed(methods::GET_BANCOR_TOKEN_BALANCE),
        vec![args(&["AMM", "A"]), args(&["AMM", "B"])]
    );

    h.mock.clear_calls();
    h.apply(receipt("tx3", "A", "transferTokenTo", json!({ "tokenid": "cat", "to": "B" }), 2))
        .await
        .unwrap();
    assert_eq!(h.refreshed(methods::GET_BALANCE), vec![args(&["A"])]);
    assert!(h.refreshed(methods::GET_TOKEN_BALANCE).is_empty());
    assert_eq!(address::get_addresses_for_transaction(&h.pool, "tx3").await.unwrap(), vec!["A", "B"]);
}

#[tokio::test]
async fn passive_methods_associate_and_charge_caller() {
    let h = Harness::new().await;

    for (i, method) in ["vote", "mortgage", "unmortgage", "register", "setUserCode", "getUserCode", "runUserMethod"]
        .iter()
        .enumerate()
    {
        let hash = format!("tx{}", i);
        h.apply(receipt(&hash, "C", method, json!({}), 0)).await.unwrap();
        assert_eq!(address::get_addresses_for_transaction(&h.pool, &hash).await.unwrap(), vec!["C"]);
    }

    assert_eq!(h.refreshed(methods::GET_BALANCE).len(), 7);
}

#[tokio::test]
async fn completed_steps_survive_a_later_failure() {
    let h = Harness::new().await;
    h.mock.set_sys_balance("A", "n10");
    h.mock.fail(methods::GET_TOKEN_BALANCE, None, 504);

    let err = h
        .apply(receipt("tx1", "A", "transferTokenTo", json!({ "tokenid": "cat", "to": "B" }), 0))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Transport { status: 504, .. }));
    assert_eq!(address::get_addresses_for_transaction(&h.pool, "tx1").await.unwrap(), vec!["A", "B"]);
    assert!(account::get_balance(&h.pool, "A", "SYS", TokenType::Sys).await.unwrap().is_some());
}

#[tokio::test]
async fn node_error_code_fails_the_refresh() {
    let h = Harness::new().await;

    let err = h
        .apply(receipt("tx1", "A", "buyBancorToken", json!({ "tokenid": "nope" }), 0))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Node { code: 5, .. }));
}

#[tokio::test]
async fn malformed_input_is_a_parse_failure() {
    let h = Harness::new().await;

    let err = h
        .apply(receipt("tx1", "A", "transferTo", json!({ "recipient": "B" }), 0))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Parse { .. }));
    assert!(h.mock.calls().is_empty());
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let h = Harness::new().await;

    let err = h.apply(receipt("tx1", "A", "mint", json!({}), 0)).await.unwrap_err();

    assert!(matches!(err, SyncError::UnknownMethod(ref name) if name == "mint"));
    assert!(address::get_addresses_for_transaction(&h.pool, "tx1").await.unwrap().is_empty());
}

#[tokio::test]
async fn huge_amounts_do_not_stall_the_handler() {
    let h = Harness::new().await;
    h.mock.set_sys_balance("owner", "n100000000000000000000000000000");
    h.mock.set_token_balance("BIG", "h1", "n1e30");

    let input = json!({ "tokenid": "big", "preBalances": [{ "address": "h1", "amount": "1e30" }] });
    h.apply(receipt("tx1", "owner", "createToken", input, 0)).await.unwrap();

    let record = token::get_token(&h.pool, "BIG").await.unwrap().unwrap();
    let meta: NormalTokenMeta = serde_json::from_slice(&record.meta).unwrap();
    assert_eq!(meta.supply, 1e30);

    let h1 = account::get_balance(&h.pool, "h1", "BIG", TokenType::Normal).await.unwrap().unwrap();
    assert_eq!(h1.value, 1e30);
    let owner = account::get_balance(&h.pool, "owner", "SYS", TokenType::Sys).await.unwrap().unwrap();
    assert_eq!(owner.value, 1e29);
}

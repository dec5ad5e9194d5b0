pub mod mock_node;

mod ledger_tests;

use crate::blockchain::client::NodeClient;
use crate::blockchain::polling::SyncEngine;
use crate::config::Config;
use crate::db::connection;
use mock_node::MockNode;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

pub fn test_config(batch_size: u64) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        node_host: "127.0.0.1".to_string(),
        node_port: 18089,
        rpc_timeout_secs: 1,
        poll_interval: Duration::from_millis(1),
        batch_size,
        miner_sync: false,
    }
}

pub async fn test_pool() -> SqlitePool {
    connection::in_memory().await.expect("in-memory database")
}

pub async fn setup_engine(batch_size: u64) -> (Arc<MockNode>, SyncEngine<Arc<MockNode>>) {
    let mock = Arc::new(MockNode::new());
    let engine = SyncEngine::new(
        NodeClient::new(mock.clone()),
        test_pool().await,
        &test_config(batch_size),
    );
    (mock, engine)
}

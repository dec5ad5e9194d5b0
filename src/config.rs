// Configuration for:
// - chain node RPC endpoint (host, port, timeout)
// - SQLite index location
// - sync loop delay and batch size
// - miner balance sweep toggle

use dotenv::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub node_host: String,
    pub node_port: u16,
    pub rpc_timeout_secs: u64,
    pub poll_interval: Duration,
    pub batch_size: u64,
    pub miner_sync: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:index.db".to_string());
        let node_host = env::var("NODE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let node_port = env::var("NODE_PORT")
            .unwrap_or_else(|_| "18089".to_string())
            .parse()
            .unwrap_or(18089);
        let rpc_timeout_secs = env::var("RPC_TIMEOUT_SECS")
            .map(|v| v.parse().unwrap_or(30))
            .unwrap_or(30);
        let poll_interval = env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));
        let batch_size = env::var("SYNC_BATCH_SIZE")
            .map(|v| v.parse().unwrap_or(20))
            .unwrap_or(20);
        let miner_sync = env::var("MINER_SYNC")
            .map(|v| v.parse().unwrap_or(true))
            .unwrap_or(true);

        Self {
            database_url,
            node_host,
            node_port,
            rpc_timeout_secs,
            poll_interval,
            batch_size,
            miner_sync,
        }
    }

    pub fn node_rpc_url(&self) -> String {
        format!("http://{}:{}/rpc", self.node_host, self.node_port)
    }
}

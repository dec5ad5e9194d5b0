pub mod client;
pub mod polling;
pub mod processor;
pub mod models;
pub mod batch_manager;
pub mod ledger;
pub mod refresh;

// Re-exports for convenience
pub use client::{HttpRpcClient, NodeClient, RpcClient};
pub use polling::SyncEngine;

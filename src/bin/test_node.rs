use ledger_index_service::{
    blockchain::{client::BlockId, HttpRpcClient, NodeClient},
    config::Config,
};
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting node connectivity check...");

    let config = Config::from_env();
    info!("Node endpoint: {}", config.node_rpc_url());
    let node = NodeClient::new(HttpRpcClient::new(&config)?);

    // 1. Finalized height
    let height = node.get_finalized_height().await?;
    info!("✅ Finalized height: {}", height);

    // 2. Latest block with its transactions
    match node.get_block(BlockId::Latest).await {
        Ok(bundle) => {
            info!("✅ Latest block {} ({})", bundle.block.number, bundle.block.hash);
            info!("   Creator: {}", bundle.block.creator);
            info!("   Transactions: {}", bundle.transactions.len());
            for tx in &bundle.transactions {
                info!("   - {} {} by {}", tx.hash, tx.method, tx.caller);
            }
        }
        Err(e) => error!("❌ Failed to fetch latest block: {}", e),
    }

    // 3. Miners and their balances
    match node.get_miner_list().await {
        Ok(miners) => {
            info!("✅ {} miners", miners.len());
            match node.get_balances(&miners).await {
                Ok(balances) => {
                    for entry in balances {
                        info!("   {} -> {}", entry.address, entry.balance);
                    }
                }
                Err(e) => error!("❌ Failed to fetch miner balances: {}", e),
            }
        }
        Err(e) => error!("❌ Failed to fetch miners: {}", e),
    }

    info!("Node check complete");
    Ok(())
}

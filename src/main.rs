use ledger_index_service::{
    blockchain::{HttpRpcClient, NodeClient, SyncEngine},
    config::Config,
    db,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ledger-index-service");

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Configuration loaded: {:?}", config);

    // Setup database connection
    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    tracing::info!("Database connection established");

    let node = NodeClient::new(HttpRpcClient::new(&config)?);
    let engine = SyncEngine::new(node, db_pool, &config);

    tokio::select! {
        result = engine.run() => {
            // Only an index ahead of the node ends the engine
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, exiting");
        }
    }

    Ok(())
}

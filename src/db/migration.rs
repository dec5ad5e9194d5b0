use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS hashes (
            hash TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            verified INTEGER NOT NULL DEFAULT 0
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS blocks (
            hash TEXT PRIMARY KEY,
            number INTEGER NOT NULL,
            tx_count INTEGER NOT NULL,
            creator TEXT NOT NULL,
            timestamp INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transactions (
            hash TEXT PRIMARY KEY,
            block_hash TEXT NOT NULL,
            block_number INTEGER NOT NULL,
            caller TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            content BLOB NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tx_addresses (
            hash TEXT NOT NULL,
            address TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            PRIMARY KEY (hash, address)
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS accounts (
            address TEXT NOT NULL,
            token TEXT NOT NULL,
            token_type TEXT NOT NULL,
            amount TEXT NOT NULL,
            value REAL NOT NULL,
            PRIMARY KEY (address, token, token_type)
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tokens (
            name TEXT PRIMARY KEY,
            token_type TEXT NOT NULL,
            creator TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            meta BLOB NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bancor_params (
            name TEXT PRIMARY KEY,
            factor REAL NOT NULL,
            reserve REAL NOT NULL,
            supply REAL NOT NULL,
            updated_at INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    // Singleton row holding the indexed height
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sync_status (
            id INTEGER PRIMARY KEY CHECK (id = 0),
            height INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    // Indexes for the serving layer's common queries
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_blocks_number ON blocks(number)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_block_number
         ON transactions(block_number)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_timestamp
         ON transactions(timestamp)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tx_addresses_address_time
         ON tx_addresses(address, timestamp)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_accounts_token_value
         ON accounts(token, value)"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}

use sqlx::{Pool, Row, Sqlite};

/// Link a transaction to every address it touches. Existing links are kept.
pub async fn associate(
    pool: &Pool<Sqlite>,
    hash: &str,
    addresses: &[String],
    timestamp: i64,
) -> Result<(), sqlx::Error> {
    for address in addresses {
        sqlx::query(
            "INSERT INTO tx_addresses (hash, address, timestamp) VALUES (?, ?, ?)
             ON CONFLICT(hash, address) DO NOTHING"
        )
        .bind(hash)
        .bind(address)
        .bind(timestamp)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Transaction hashes touching `address`, newest first.
pub async fn get_transactions_for_address(
    pool: &Pool<Sqlite>,
    address: &str,
    offset: i64,
    limit: i64,
) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT hash FROM tx_addresses WHERE address = ?
         ORDER BY timestamp DESC, hash ASC
         LIMIT ? OFFSET ?"
    )
    .bind(address)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("hash")).collect())
}

pub async fn get_addresses_for_transaction(pool: &Pool<Sqlite>, hash: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT address FROM tx_addresses WHERE hash = ? ORDER BY address")
        .bind(hash)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.get("address")).collect())
}

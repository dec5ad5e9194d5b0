use sqlx::{Pool, Row, Sqlite};
use crate::models::TransactionRecord;

/// Insert a transaction row. Transactions are immutable; re-insertion is a no-op.
pub async fn insert_transaction(pool: &Pool<Sqlite>, transaction: &TransactionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO transactions
        (hash, block_hash, block_number, caller, timestamp, content)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(hash) DO NOTHING
        "#
    )
    .bind(&transaction.hash)
    .bind(&transaction.block_hash)
    .bind(transaction.block_number as i64)
    .bind(&transaction.caller)
    .bind(transaction.timestamp)
    .bind(&transaction.content)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_transaction(pool: &Pool<Sqlite>, hash: &str) -> Result<Option<TransactionRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT hash, block_hash, block_number, caller, timestamp, content
           FROM transactions WHERE hash = ?"#
    )
    .bind(hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| transaction_from_row(&row)))
}

/// Transactions of one block, in insertion order.
pub async fn get_transactions_by_block(pool: &Pool<Sqlite>, block_hash: &str) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT hash, block_hash, block_number, caller, timestamp, content
           FROM transactions WHERE block_hash = ?
           ORDER BY rowid ASC"#
    )
    .bind(block_hash)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(transaction_from_row).collect())
}

pub async fn count_transactions(
    pool: &Pool<Sqlite>,
    start_time: i64,
    end_time: i64,
) -> Result<i64, sqlx::Error> {
    let count = sqlx::query(
        "SELECT COUNT(*) FROM transactions
         WHERE timestamp >= ? AND timestamp < ?"
    )
    .bind(start_time)
    .bind(end_time)
    .fetch_one(pool)
    .await?
    .get::<i64, _>(0);

    Ok(count)
}

fn transaction_from_row(row: &sqlx::sqlite::SqliteRow) -> TransactionRecord {
    TransactionRecord {
        hash: row.get("hash"),
        block_hash: row.get("block_hash"),
        block_number: row.get::<i64, _>("block_number") as u64,
        caller: row.get("caller"),
        timestamp: row.get("timestamp"),
        content: row.get("content"),
    }
}

use sqlx::{Pool, Row, Sqlite};
use crate::models::BlockRecord;

/// Insert a block row. Blocks are immutable; re-insertion is a no-op.
pub async fn insert_block(pool: &Pool<Sqlite>, block: &BlockRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO blocks (hash, number, tx_count, creator, timestamp)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(hash) DO NOTHING
        "#
    )
    .bind(&block.hash)
    .bind(block.number as i64)
    .bind(block.tx_count as i64)
    .bind(&block.creator)
    .bind(block.timestamp)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_block(pool: &Pool<Sqlite>, hash: &str) -> Result<Option<BlockRecord>, sqlx::Error> {
    let row = sqlx::query("SELECT hash, number, tx_count, creator, timestamp FROM blocks WHERE hash = ?")
        .bind(hash)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| block_from_row(&row)))
}

pub async fn get_block_by_number(pool: &Pool<Sqlite>, number: u64) -> Result<Option<BlockRecord>, sqlx::Error> {
    let row = sqlx::query("SELECT hash, number, tx_count, creator, timestamp FROM blocks WHERE number = ?")
        .bind(number as i64)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| block_from_row(&row)))
}

pub async fn count_blocks(pool: &Pool<Sqlite>) -> Result<i64, sqlx::Error> {
    let count = sqlx::query("SELECT COUNT(*) FROM blocks")
        .fetch_one(pool)
        .await?
        .get::<i64, _>(0);

    Ok(count)
}

fn block_from_row(row: &sqlx::sqlite::SqliteRow) -> BlockRecord {
    BlockRecord {
        hash: row.get("hash"),
        number: row.get::<i64, _>("number") as u64,
        tx_count: row.get::<i64, _>("tx_count") as u32,
        creator: row.get("creator"),
        timestamp: row.get("timestamp"),
    }
}

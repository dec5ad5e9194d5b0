use sqlx::{Pool, Row, Sqlite};

/// Last fully indexed block number; 0 before anything has been indexed.
pub async fn get_indexed_height(pool: &Pool<Sqlite>) -> Result<u64, sqlx::Error> {
    let row = sqlx::query("SELECT height FROM sync_status WHERE id = 0")
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row.get::<i64, _>("height") as u64).unwrap_or(0))
}

/// Persist the indexed height. Returns once the write is committed.
pub async fn set_indexed_height(pool: &Pool<Sqlite>, height: u64) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO sync_status (id, height, updated_at) VALUES (0, ?, ?)
         ON CONFLICT(id) DO UPDATE SET height = excluded.height, updated_at = excluded.updated_at
         WHERE sync_status.height <> excluded.height"
    )
    .bind(height as i64)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

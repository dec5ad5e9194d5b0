use sqlx::{Pool, Row, Sqlite};
use crate::models::{HashKind, HashRecord};

/// Record `hash` under `kind`. The first registration wins; later calls are no-ops.
pub async fn register_hash(pool: &Pool<Sqlite>, hash: &str, kind: HashKind) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO hashes (hash, kind, verified) VALUES (?, ?, 0)
         ON CONFLICT(hash) DO NOTHING"
    )
    .bind(hash)
    .bind(kind.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn register_hashes(pool: &Pool<Sqlite>, hashes: &[String], kind: HashKind) -> Result<(), sqlx::Error> {
    for hash in hashes {
        register_hash(pool, hash, kind).await?;
    }
    Ok(())
}

pub async fn get_hash(pool: &Pool<Sqlite>, hash: &str) -> Result<Option<HashRecord>, sqlx::Error> {
    let row = sqlx::query("SELECT hash, kind, verified FROM hashes WHERE hash = ?")
        .bind(hash)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|row| hash_from_row(&row)))
}

/// Prefix search used by the explorer's search box.
pub async fn search_hashes(pool: &Pool<Sqlite>, prefix: &str, limit: i64) -> Result<Vec<HashRecord>, sqlx::Error> {
    let pattern = format!("{}%", prefix.replace('%', "").replace('_', ""));
    let rows = sqlx::query("SELECT hash, kind, verified FROM hashes WHERE hash LIKE ? ORDER BY hash LIMIT ?")
        .bind(pattern)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().filter_map(hash_from_row).collect())
}

fn hash_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<HashRecord> {
    let kind: String = row.get("kind");
    Some(HashRecord {
        hash: row.get("hash"),
        kind: HashKind::from_db(&kind)?,
        verified: row.get::<i64, _>("verified") != 0,
    })
}

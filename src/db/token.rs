use sqlx::{Pool, Row, Sqlite};
use crate::models::{BancorTokenParams, TokenRecord, TokenType};

/// Insert a token row. The first creation wins; re-insertion is a no-op.
pub async fn insert_token(pool: &Pool<Sqlite>, token: &TokenRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO tokens (name, token_type, creator, created_at, meta)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(name) DO NOTHING
        "#
    )
    .bind(token.name.to_uppercase())
    .bind(token.token_type.as_str())
    .bind(&token.creator)
    .bind(token.created_at)
    .bind(&token.meta)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_token(pool: &Pool<Sqlite>, name: &str) -> Result<Option<TokenRecord>, sqlx::Error> {
    let row = sqlx::query("SELECT name, token_type, creator, created_at, meta FROM tokens WHERE name = ?")
        .bind(name.to_uppercase())
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|row| {
        let token_type: String = row.get("token_type");
        Some(TokenRecord {
            name: row.get("name"),
            token_type: TokenType::from_db(&token_type)?,
            creator: row.get("creator"),
            created_at: row.get("created_at"),
            meta: row.get("meta"),
        })
    }))
}

/// Overwrite the curve parameters of a bancor token. Identical parameters
/// leave the row untouched.
pub async fn upsert_bancor_params(pool: &Pool<Sqlite>, params: &BancorTokenParams) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO bancor_params (name, factor, reserve, supply, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET
            factor = excluded.factor,
            reserve = excluded.reserve,
            supply = excluded.supply,
            updated_at = excluded.updated_at
        WHERE bancor_params.factor IS NOT excluded.factor
           OR bancor_params.reserve IS NOT excluded.reserve
           OR bancor_params.supply IS NOT excluded.supply
        "#
    )
    .bind(params.name.to_uppercase())
    .bind(params.factor)
    .bind(params.reserve)
    .bind(params.supply)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_bancor_params(pool: &Pool<Sqlite>, name: &str) -> Result<Option<BancorTokenParams>, sqlx::Error> {
    let row = sqlx::query("SELECT name, factor, reserve, supply FROM bancor_params WHERE name = ?")
        .bind(name.to_uppercase())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| BancorTokenParams {
        name: row.get("name"),
        factor: row.get("factor"),
        reserve: row.get("reserve"),
        supply: row.get("supply"),
    }))
}

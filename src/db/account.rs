use sqlx::{Pool, Row, Sqlite};
use crate::models::{AccountBalance, TokenType};

/// Overwrite a balance with a freshly fetched value.
pub async fn upsert_balance(pool: &Pool<Sqlite>, balance: &AccountBalance) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO accounts (address, token, token_type, amount, value)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(address, token, token_type)
        DO UPDATE SET amount = excluded.amount, value = excluded.value
        "#
    )
    .bind(&balance.address)
    .bind(&balance.token)
    .bind(balance.token_type.as_str())
    .bind(&balance.amount)
    .bind(balance.value)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_balance(
    pool: &Pool<Sqlite>,
    address: &str,
    token: &str,
    token_type: TokenType,
) -> Result<Option<AccountBalance>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT address, token, token_type, amount, value FROM accounts
         WHERE address = ? AND token = ? AND token_type = ?"
    )
    .bind(address)
    .bind(token.to_uppercase())
    .bind(token_type.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|row| balance_from_row(&row)))
}

pub async fn get_balances_for_address(pool: &Pool<Sqlite>, address: &str) -> Result<Vec<AccountBalance>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT address, token, token_type, amount, value FROM accounts
         WHERE address = ? ORDER BY token"
    )
    .bind(address)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().filter_map(balance_from_row).collect())
}

fn balance_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<AccountBalance> {
    let token_type: String = row.get("token_type");
    Some(AccountBalance {
        address: row.get("address"),
        token: row.get("token"),
        token_type: TokenType::from_db(&token_type)?,
        amount: row.get("amount"),
        value: row.get("value"),
    })
}

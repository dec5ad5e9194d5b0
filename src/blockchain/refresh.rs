use crate::blockchain::client::{NodeClient, RpcClient};
use crate::blockchain::models::{strip_address_tag, strip_marker, RawBancorParams};
use crate::db::{account, token as token_db};
use crate::error::SyncError;
use crate::models::{AccountBalance, BancorTokenParams, TokenType, SYS_TOKEN};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};

pub const SYS_PRECISION: u32 = 4;
pub const BANCOR_PRECISION: u32 = 9;
pub const NORMAL_PRECISION: u32 = 9;

pub fn precision_for(token_type: TokenType) -> u32 {
    match token_type {
        TokenType::Sys => SYS_PRECISION,
        TokenType::Normal => NORMAL_PRECISION,
        TokenType::Bancor => BANCOR_PRECISION,
    }
}

/// Turn a raw wire amount into its stored decimal string and ranking value.
///
/// The string always carries exactly the type's number of fractional digits.
/// Amounts beyond `Decimal`'s 28 significant digits go through a float.
pub fn normalize_amount(raw: &str, token_type: TokenType) -> Result<(String, f64), SyncError> {
    let digits = strip_marker(raw);
    let precision = precision_for(token_type);

    let amount = match Decimal::from_str(digits).or_else(|_| Decimal::from_scientific(digits)) {
        Ok(exact) => fixed_digits(
            exact.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero),
            precision,
        ),
        Err(_) => {
            let float = digits
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| SyncError::parse(format!("amount {:?}", raw), "not a finite number"))?;
            format!("{:.*}", precision as usize, float)
        }
    };
    let value = amount.parse::<f64>().map_err(|e| SyncError::parse("amount", e))?;

    Ok((amount, value))
}

/// Render with trailing zeros up to `precision` places. `Decimal::rescale`
/// cannot do this once the integer part is wide.
fn fixed_digits(rounded: Decimal, precision: u32) -> String {
    let mut text = rounded.to_string();
    let scale = rounded.scale();
    if scale < precision {
        if scale == 0 {
            text.push('.');
        }
        text.extend(std::iter::repeat('0').take((precision - scale) as usize));
    }
    text
}

/// Re-fetches balances and AMM parameters from the node and overwrites the
/// stored rows. Nothing here derives a value from transaction deltas.
pub struct BalanceRefresher<'a, C> {
    node: &'a NodeClient<C>,
    pool: &'a SqlitePool,
}

impl<'a, C: RpcClient> BalanceRefresher<'a, C> {
    pub fn new(node: &'a NodeClient<C>, pool: &'a SqlitePool) -> Self {
        Self { node, pool }
    }

    async fn store(&self, address: &str, token: &str, token_type: TokenType, raw: &str) -> Result<(), SyncError> {
        let (amount, value) = normalize_amount(raw, token_type)?;
        debug!(address, token, %token_type, %amount, "balance refreshed");

        account::upsert_balance(
            self.pool,
            &AccountBalance {
                address: address.to_string(),
                token: token.to_uppercase(),
                token_type,
                amount,
                value,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn refresh_sys_balance(&self, address: &str) -> Result<(), SyncError> {
        let raw = self.node.get_balance(address).await?;
        self.store(address, SYS_TOKEN, TokenType::Sys, &raw).await
    }

    pub async fn refresh_sys_balances(&self, addresses: &[String]) -> Result<(), SyncError> {
        for address in addresses {
            self.refresh_sys_balance(address).await?;
        }
        Ok(())
    }

    pub async fn refresh_token_balance(&self, token: &str, address: &str) -> Result<(), SyncError> {
        let raw = self.node.get_token_balance(token, address).await?;
        self.store(address, token, TokenType::Normal, &raw).await
    }

    pub async fn refresh_token_balances(&self, token: &str, addresses: &[String]) -> Result<(), SyncError> {
        for address in addresses {
            self.refresh_token_balance(token, address).await?;
        }
        Ok(())
    }

    pub async fn refresh_bancor_balance(&self, token: &str, address: &str) -> Result<(), SyncError> {
        let raw = self.node.get_bancor_token_balance(token, address).await?;
        self.store(address, token, TokenType::Bancor, &raw).await
    }

    pub async fn refresh_bancor_balances(&self, token: &str, addresses: &[String]) -> Result<(), SyncError> {
        for address in addresses {
            self.refresh_bancor_balance(token, address).await?;
        }
        Ok(())
    }

    /// Fetch F, R and S in one call and overwrite the stored parameters.
    pub async fn refresh_bancor_params(&self, token: &str) -> Result<BancorTokenParams, SyncError> {
        let RawBancorParams { factor, reserve, supply } = self.node.get_bancor_token_params(token).await?;

        let params = BancorTokenParams {
            name: token.to_uppercase(),
            factor,
            reserve,
            supply,
        };
        debug!(token = %params.name, factor = params.factor, reserve = params.reserve, supply = params.supply, "bancor params refreshed");

        token_db::upsert_bancor_params(self.pool, &params).await?;
        Ok(params)
    }

    /// Overwrite every miner's SYS balance from one batched balance call.
    /// Returns the number of balances written.
    pub async fn sweep_miner_balances(&self) -> Result<usize, SyncError> {
        let miners = self.node.get_miner_list().await?;
        if miners.is_empty() {
            return Ok(0);
        }

        let balances = self.node.get_balances(&miners).await?;
        for entry in &balances {
            self.store(strip_address_tag(&entry.address), SYS_TOKEN, TokenType::Sys, &entry.balance)
                .await?;
        }

        info!("Refreshed SYS balances for {} miners", balances.len());
        Ok(balances.len())
    }
}

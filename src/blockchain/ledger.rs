use crate::blockchain::client::{NodeClient, RpcClient};
use crate::blockchain::models::{
    number_from_value, pre_balance_supply, CreateBancorTokenInput, CreateTokenInput, Receipt,
    TokenInput, TokenTransferInput, TransferInput, TxMethod,
};
use crate::blockchain::refresh::BalanceRefresher;
use crate::db::{address, hash, token};
use crate::error::SyncError;
use crate::models::{BancorTokenMeta, HashKind, NormalTokenMeta, TokenRecord, TokenType};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Applies the ledger effect of one executed transaction.
///
/// Every handler runs the same three steps in order: address associations,
/// the fee payer's SYS balance, then the method's own effect when the
/// receipt reports success. A failing step leaves earlier steps in place.
pub struct LedgerUpdater<'a, C> {
    pool: &'a SqlitePool,
    refresher: BalanceRefresher<'a, C>,
}

impl<'a, C: RpcClient> LedgerUpdater<'a, C> {
    pub fn new(node: &'a NodeClient<C>, pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            refresher: BalanceRefresher::new(node, pool),
        }
    }

    pub async fn apply(&self, receipt: &Receipt) -> Result<(), SyncError> {
        let method = TxMethod::from_name(&receipt.tx.method);
        debug!(tx = %receipt.tx.hash, method = method.as_str(), code = receipt.receipt.return_code, "applying transaction");

        match method {
            TxMethod::TransferTo => self.transfer_to(receipt).await,
            TxMethod::CreateToken => self.create_token(receipt).await,
            TxMethod::CreateBancorToken => self.create_bancor_token(receipt).await,
            TxMethod::BuyBancorToken | TxMethod::SellBancorToken => self.trade_bancor_token(receipt).await,
            TxMethod::TransferTokenTo => self.transfer_token(receipt, TokenType::Normal).await,
            TxMethod::TransferBancorTokenTo => self.transfer_token(receipt, TokenType::Bancor).await,
            TxMethod::Vote
            | TxMethod::Mortgage
            | TxMethod::Unmortgage
            | TxMethod::Register
            | TxMethod::SetUserCode
            | TxMethod::GetUserCode
            | TxMethod::RunUserMethod => self.caller_only(receipt).await,
            TxMethod::Unknown(name) => Err(SyncError::UnknownMethod(name)),
        }
    }

    async fn associate(&self, receipt: &Receipt, addresses: &[String]) -> Result<(), SyncError> {
        address::associate(self.pool, &receipt.tx.hash, addresses, receipt.block.timestamp).await?;
        Ok(())
    }

    /// The fee is charged whatever the outcome, so both sides are refreshed
    /// even when the transfer itself failed.
    async fn transfer_to(&self, receipt: &Receipt) -> Result<(), SyncError> {
        let input: TransferInput = decode_input(receipt)?;
        let addresses = vec![receipt.tx.caller.clone(), input.to];

        hash::register_hashes(self.pool, &addresses, HashKind::Address).await?;
        self.associate(receipt, &addresses).await?;
        self.refresher.refresh_sys_balances(&addresses).await
    }

    async fn create_token(&self, receipt: &Receipt) -> Result<(), SyncError> {
        let input: CreateTokenInput = decode_input(receipt)?;
        let name = input.tokenid.to_uppercase();
        let caller = &receipt.tx.caller;

        let holders: Vec<String> = input.pre_balances.iter().map(|p| p.address.clone()).collect();
        let mut addresses = holders.clone();
        addresses.push(caller.clone());

        hash::register_hashes(self.pool, &addresses, HashKind::Address).await?;
        self.associate(receipt, &addresses).await?;
        self.refresher.refresh_sys_balance(caller).await?;

        if !receipt.succeeded() {
            return Ok(());
        }

        let meta = NormalTokenMeta {
            supply: pre_balance_supply(&input.pre_balances),
            precision: input.precision,
        };
        token::insert_token(
            self.pool,
            &TokenRecord {
                name: name.clone(),
                token_type: TokenType::Normal,
                creator: caller.clone(),
                created_at: receipt.block.timestamp,
                meta: serde_json::to_vec(&meta).map_err(|e| SyncError::parse("token metadata", e))?,
            },
        )
        .await?;

        self.refresher.refresh_token_balances(&name, &holders).await?;
        hash::register_hash(self.pool, &name, HashKind::Token).await?;

        info!(token = %name, supply = meta.supply, "Token created");
        Ok(())
    }

    async fn create_bancor_token(&self, receipt: &Receipt) -> Result<(), SyncError> {
        let input: CreateBancorTokenInput = decode_input(receipt)?;
        let name = input.tokenid.to_uppercase();
        let caller = &receipt.tx.caller;

        let holders: Vec<String> = input.pre_balances.iter().map(|p| p.address.clone()).collect();
        let mut addresses = holders.clone();
        addresses.push(caller.clone());

        hash::register_hashes(self.pool, &addresses, HashKind::Address).await?;
        self.associate(receipt, &addresses).await?;
        self.refresher.refresh_sys_balance(caller).await?;

        if !receipt.succeeded() {
            return Ok(());
        }

        let reserve = match &receipt.tx.value {
            Value::Null => 0.0,
            value => number_from_value(value)
                .ok_or_else(|| SyncError::parse("createBancorToken value", value))?,
        };
        let meta = BancorTokenMeta {
            factor: input.factor,
            supply: pre_balance_supply(&input.pre_balances),
            nonliquidity: input.nonliquidity.unwrap_or(0.0),
            reserve,
        };
        token::insert_token(
            self.pool,
            &TokenRecord {
                name: name.clone(),
                token_type: TokenType::Bancor,
                creator: caller.clone(),
                created_at: receipt.block.timestamp,
                meta: serde_json::to_vec(&meta).map_err(|e| SyncError::parse("token metadata", e))?,
            },
        )
        .await?;

        self.refresher.refresh_bancor_balances(&name, &holders).await?;
        hash::register_hash(self.pool, &name, HashKind::Token).await?;
        self.refresher.refresh_bancor_params(&name).await?;

        info!(token = %name, supply = meta.supply, reserve = meta.reserve, "Bancor token created");
        Ok(())
    }

    async fn trade_bancor_token(&self, receipt: &Receipt) -> Result<(), SyncError> {
        let input: TokenInput = decode_input(receipt)?;
        let name = input.tokenid.to_uppercase();
        let caller = &receipt.tx.caller;

        self.associate(receipt, std::slice::from_ref(caller)).await?;
        self.refresher.refresh_sys_balance(caller).await?;

        if receipt.succeeded() {
            self.refresher.refresh_bancor_balance(&name, caller).await?;
            self.refresher.refresh_bancor_params(&name).await?;
        }
        Ok(())
    }

    async fn transfer_token(&self, receipt: &Receipt, token_type: TokenType) -> Result<(), SyncError> {
        let input: TokenTransferInput = decode_input(receipt)?;
        let name = input.tokenid.to_uppercase();
        let caller = &receipt.tx.caller;
        let addresses = vec![caller.clone(), input.to];

        self.associate(receipt, &addresses).await?;
        self.refresher.refresh_sys_balance(caller).await?;

        if !receipt.succeeded() {
            return Ok(());
        }

        match token_type {
            TokenType::Bancor => self.refresher.refresh_bancor_balances(&name, &addresses).await,
            _ => self.refresher.refresh_token_balances(&name, &addresses).await,
        }
    }

    async fn caller_only(&self, receipt: &Receipt) -> Result<(), SyncError> {
        let caller = &receipt.tx.caller;
        self.associate(receipt, std::slice::from_ref(caller)).await?;
        self.refresher.refresh_sys_balance(caller).await
    }
}

fn decode_input<T: DeserializeOwned>(receipt: &Receipt) -> Result<T, SyncError> {
    receipt
        .tx
        .input()
        .map_err(|e| SyncError::parse(format!("{} input of {}", receipt.tx.method, receipt.tx.hash), e))
}

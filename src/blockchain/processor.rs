use crate::blockchain::client::{NodeClient, RpcClient};
use crate::blockchain::ledger::LedgerUpdater;
use crate::blockchain::models::BlockBundle;
use crate::db::{block, hash, transaction};
use crate::error::SyncError;
use crate::models::{BlockRecord, HashKind, TransactionRecord};
use sqlx::SqlitePool;
use tracing::{debug, error};

/// Persists one block and applies its transactions strictly in block order.
pub struct BlockIngestor<'a, C> {
    node: &'a NodeClient<C>,
    pool: &'a SqlitePool,
    ledger: LedgerUpdater<'a, C>,
}

impl<'a, C: RpcClient> BlockIngestor<'a, C> {
    pub fn new(node: &'a NodeClient<C>, pool: &'a SqlitePool) -> Self {
        Self {
            node,
            pool,
            ledger: LedgerUpdater::new(node, pool),
        }
    }

    pub async fn ingest_block(&self, bundle: &BlockBundle) -> Result<(), SyncError> {
        let header = &bundle.block;
        debug!(number = header.number, hash = %header.hash, txs = bundle.transactions.len(), "ingesting block");

        hash::register_hash(self.pool, &header.hash, HashKind::Block).await?;
        block::insert_block(
            self.pool,
            &BlockRecord {
                hash: header.hash.clone(),
                number: header.number,
                tx_count: bundle.transactions.len() as u32,
                creator: header.creator.clone(),
                timestamp: header.timestamp,
            },
        )
        .await?;

        for tx in &bundle.transactions {
            hash::register_hash(self.pool, &tx.hash, HashKind::Tx).await?;

            let receipt = self.node.get_receipt(&tx.hash).await.map_err(|e| {
                error!("Receipt for tx {} in block {} failed: {}", tx.hash, header.number, e);
                e
            })?;

            let content = tx
                .content_with_cost(&receipt.receipt.cost)
                .map_err(|e| SyncError::parse(format!("content of tx {}", tx.hash), e))?;

            transaction::insert_transaction(
                self.pool,
                &TransactionRecord {
                    hash: tx.hash.clone(),
                    block_hash: header.hash.clone(),
                    block_number: header.number,
                    caller: tx.caller.clone(),
                    timestamp: header.timestamp,
                    content,
                },
            )
            .await?;

            self.ledger.apply(&receipt).await?;
        }

        Ok(())
    }
}

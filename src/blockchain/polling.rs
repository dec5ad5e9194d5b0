use crate::blockchain::batch_manager::plan_windows;
use crate::blockchain::client::{BlockId, NodeClient, RpcClient};
use crate::blockchain::models::BlockBundle;
use crate::blockchain::processor::BlockIngestor;
use crate::blockchain::refresh::BalanceRefresher;
use crate::config::Config;
use crate::db::height;
use crate::error::SyncError;
use sqlx::SqlitePool;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Strategy chosen for one cycle. Derived from the heights every time; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Bootstrap,
    BatchCatchup,
    SingleFollow,
    Wait,
    Fatal,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncState::Bootstrap => "BOOTSTRAP",
            SyncState::BatchCatchup => "BATCH_CATCHUP",
            SyncState::SingleFollow => "SINGLE_FOLLOW",
            SyncState::Wait => "WAIT",
            SyncState::Fatal => "FATAL",
        })
    }
}

pub fn select_state(local: u64, remote: u64) -> SyncState {
    if local == 0 {
        SyncState::Bootstrap
    } else if remote.checked_sub(local) == Some(1) {
        SyncState::SingleFollow
    } else if local < remote {
        SyncState::BatchCatchup
    } else if local > remote {
        SyncState::Fatal
    } else {
        SyncState::Wait
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    pub state: SyncState,
    /// Inclusive block range this cycle set out to index.
    pub range: Option<(u64, u64)>,
    /// Indexed height once the cycle finished.
    pub height: u64,
}

pub struct SyncEngine<C> {
    node: NodeClient<C>,
    pool: SqlitePool,
    batch_size: u64,
    poll_interval: Duration,
    miner_sync: bool,
}

impl<C: RpcClient> SyncEngine<C> {
    pub fn new(node: NodeClient<C>, pool: SqlitePool, config: &Config) -> Self {
        Self {
            node,
            pool,
            batch_size: config.batch_size,
            poll_interval: config.poll_interval,
            miner_sync: config.miner_sync,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run cycles until the index is found ahead of the node.
    ///
    /// Any other failure aborts only the current cycle; the whole cycle is
    /// retried after the fixed delay.
    pub async fn run(&self) -> Result<(), SyncError> {
        info!(
            "Starting sync engine: batch size {}, interval {:?}, miner sweep {}",
            self.batch_size, self.poll_interval, self.miner_sync
        );

        loop {
            match self.run_cycle().await {
                Ok(outcome) => match outcome.range {
                    Some((start, stop)) => info!(
                        state = %outcome.state, start, stop, height = outcome.height,
                        "Sync cycle complete"
                    ),
                    None => debug!(state = %outcome.state, height = outcome.height, "Sync cycle idle"),
                },
                Err(e) if e.is_fatal() => {
                    error!(state = %SyncState::Fatal, "Stopping sync engine: {}", e);
                    return Err(e);
                }
                Err(e) => error!("Sync cycle failed, retrying in {:?}: {}", self.poll_interval, e),
            }

            sleep(self.poll_interval).await;

            if self.miner_sync {
                self.sweep_miners().await;
                sleep(self.poll_interval).await;
            }
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleOutcome, SyncError> {
        let remote = self.node.get_finalized_height().await?;
        let local = height::get_indexed_height(&self.pool).await?;
        let state = select_state(local, remote);
        debug!(local, remote, state = %state, "cycle start");

        let range = match state {
            SyncState::Fatal => return Err(SyncError::HeightAhead { local, remote }),
            SyncState::Wait => None,
            SyncState::Bootstrap => {
                self.catch_up(0, remote).await?;
                Some((0, remote))
            }
            SyncState::BatchCatchup => {
                self.catch_up(local + 1, remote).await?;
                Some((local + 1, remote))
            }
            SyncState::SingleFollow => {
                self.follow(local + 1).await?;
                Some((local + 1, local + 1))
            }
        };

        let height = height::get_indexed_height(&self.pool).await?;
        Ok(CycleOutcome { state, range, height })
    }

    /// Index `[start, stop]` window by window, persisting height after each block.
    async fn catch_up(&self, start: u64, stop: u64) -> Result<(), SyncError> {
        let ingestor = BlockIngestor::new(&self.node, &self.pool);

        for (from, to) in plan_windows(start, stop, self.batch_size) {
            debug!(from, to, "fetching block window");
            let bundles = self.node.get_block_range(from, to).await?;

            let mut expected = from;
            for bundle in &bundles {
                if expected > to {
                    warn!("Node returned more blocks than requested for [{}, {}]", from, to);
                    break;
                }
                self.commit_block(&ingestor, bundle, expected).await?;
                expected += 1;
            }

            if expected <= to {
                return Err(SyncError::parse(
                    format!("blocks [{}, {}]", from, to),
                    format!("node returned {} blocks, missing {}", bundles.len(), expected),
                ));
            }
        }

        Ok(())
    }

    async fn follow(&self, number: u64) -> Result<(), SyncError> {
        let ingestor = BlockIngestor::new(&self.node, &self.pool);
        let bundle = self.node.get_block(BlockId::Number(number)).await?;
        self.commit_block(&ingestor, &bundle, number).await
    }

    async fn commit_block(
        &self,
        ingestor: &BlockIngestor<'_, C>,
        bundle: &BlockBundle,
        expected: u64,
    ) -> Result<(), SyncError> {
        let actual = bundle.block.number;
        if actual != expected {
            return Err(SyncError::UnexpectedBlock { expected, actual });
        }

        ingestor.ingest_block(bundle).await?;
        height::set_indexed_height(&self.pool, actual).await?;
        debug!(height = actual, "height advanced");
        Ok(())
    }

    /// Refresh miner SYS balances. Failures are logged and left for the next sweep.
    pub async fn sweep_miners(&self) {
        let refresher = BalanceRefresher::new(&self.node, &self.pool);
        match refresher.sweep_miner_balances().await {
            Ok(count) => debug!(count, "miner sweep complete"),
            Err(e) => warn!("Miner balance sweep failed: {}", e),
        }
    }
}

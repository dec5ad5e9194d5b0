pub mod blockchain;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience if desired
pub use db::connection;
pub use db::migration;
pub use error::SyncError;
pub use blockchain::polling::{select_state, CycleOutcome, SyncState};

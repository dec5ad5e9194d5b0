pub mod account;
pub mod address;
pub mod block;
pub mod connection;
pub mod hash;
pub mod height;
pub mod migration;
pub mod token;
pub mod transaction;

//! Database record structures matching table schemas.

pub mod numbers;
pub mod transactions;
pub mod users;
pub mod wallets;

//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed operations for one table, and returns domain models from
//! [`crate::db::models`]. Create repositories from a transaction when several
//! operations must commit or roll back together (the purchase flow does this
//! for the number insert + wallet debit + ledger row).
//!
//! # Available Repositories
//!
//! - [`Users`]: User accounts and bearer API keys
//! - [`Wallets`]: Per-user balances with atomic guarded mutations
//! - [`Transactions`]: The credit/debit ledger
//! - [`Numbers`]: Provisioned phone numbers

pub mod numbers;
pub mod repository;
pub mod transactions;
pub mod users;
pub mod wallets;

pub use numbers::Numbers;
pub use repository::Repository;
pub use transactions::Transactions;
pub use users::Users;
pub use wallets::Wallets;

//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`UserId`]: User account identifier
//! - [`WalletId`]: Wallet identifier
//! - [`TransactionId`]: Ledger transaction identifier
//! - [`NumberId`]: Provisioned phone number identifier
//! - [`ApiKeyId`]: API key identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type WalletId = Uuid;
pub type TransactionId = Uuid;
pub type NumberId = Uuid;
pub type ApiKeyId = Uuid;

/// Wallet currency, stored as TEXT in the database.
///
/// The wallet holds one balance per currency; a transaction moves money in
/// exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Inr,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Inr => write!(f, "INR"),
        }
    }
}

impl Currency {
    /// Lowercase ISO code as the payment processor expects it
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Inr => "inr",
        }
    }
}

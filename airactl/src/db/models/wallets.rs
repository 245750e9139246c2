//! Database models for wallets.

use crate::types::{Currency, UserId, WalletId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database response for a wallet row
#[derive(Debug, Clone, FromRow)]
pub struct WalletDBResponse {
    pub id: WalletId,
    pub user_id: UserId,
    pub balance_usd: Decimal,
    pub balance_inr: Decimal,
    pub primary_currency: Currency,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletDBResponse {
    /// The balance held in the given currency
    pub fn balance(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => self.balance_usd,
            Currency::Inr => self.balance_inr,
        }
    }
}

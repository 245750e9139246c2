//! API models for wallet balances.

use crate::db::models::wallets::WalletDBResponse;
use crate::types::{Currency, UserId, WalletId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    /// Wallet ID
    #[schema(value_type = String, format = "uuid")]
    pub wallet_id: WalletId,
    /// User ID
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    /// US dollar balance
    #[schema(value_type = f64)]
    pub balance_usd: Decimal,
    /// Indian rupee balance
    #[schema(value_type = f64)]
    pub balance_inr: Decimal,
    /// Currency the dashboard should display by default
    pub primary_currency: Currency,
}

// Conversions
impl From<WalletDBResponse> for BalanceResponse {
    fn from(db: WalletDBResponse) -> Self {
        Self {
            wallet_id: db.id,
            user_id: db.user_id,
            balance_usd: db.balance_usd,
            balance_inr: db.balance_inr,
            primary_currency: db.primary_currency,
        }
    }
}

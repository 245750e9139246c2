//! API models for the wallet ledger.

use crate::db::models::transactions::{TransactionDBResponse, TransactionStatus, TransactionType};
use crate::types::{Currency, NumberId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    /// Transaction ID
    #[schema(value_type = String, format = "uuid")]
    pub id: TransactionId,
    /// User ID
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    /// Whether money moved into or out of the wallet
    pub transaction_type: TransactionType,
    /// Amount moved (absolute value)
    #[schema(value_type = f64)]
    pub amount: Decimal,
    /// Currency of the amount
    pub currency: Currency,
    /// Lifecycle status
    pub status: TransactionStatus,
    /// Description
    pub description: Option<String>,
    /// Phone number this transaction paid for, if any
    #[schema(value_type = Option<String>, format = "uuid")]
    pub number_id: Option<NumberId>,
    /// When the transaction was created
    pub created_at: DateTime<Utc>,
}

/// A page of ledger transactions
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
    /// Total number of transactions for this user (across all pages)
    pub total: i64,
}

// Conversions
impl From<TransactionDBResponse> for TransactionResponse {
    fn from(db: TransactionDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            transaction_type: db.transaction_type,
            amount: db.amount,
            currency: db.currency,
            status: db.status,
            description: db.description,
            number_id: db.number_id,
            created_at: db.created_at,
        }
    }
}

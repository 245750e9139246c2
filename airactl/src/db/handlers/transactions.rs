//! Transaction repository: the append-mostly ledger of wallet movements.
//!
//! Status transitions are single guarded UPDATE statements
//! (`WHERE ... AND status = 'pending'`), so a replayed webhook event finds no
//! pending row to transition and reports that to the caller instead of
//! mutating anything twice.

use crate::{
    db::{
        errors::Result,
        models::transactions::{TransactionCreateDBRequest, TransactionDBResponse, TransactionStatus},
    },
    types::{TransactionId, UserId},
};
use rust_decimal::Decimal;
use sqlx::PgConnection;

/// Filter for listing transactions
#[derive(Debug, Clone)]
pub struct TransactionFilter {
    pub user_id: UserId,
    pub skip: i64,
    pub limit: i64,
}

pub struct Transactions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Transactions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert a new transaction row
    pub async fn create(&mut self, request: &TransactionCreateDBRequest) -> Result<TransactionDBResponse> {
        let transaction = sqlx::query_as::<_, TransactionDBResponse>(
            r#"
            INSERT INTO transactions
                (user_id, wallet_id, transaction_type, amount, currency, status,
                 description, checkout_session_id, payment_intent_id, number_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.wallet_id)
        .bind(request.transaction_type)
        .bind(request.amount)
        .bind(request.currency)
        .bind(request.status)
        .bind(&request.description)
        .bind(&request.checkout_session_id)
        .bind(&request.payment_intent_id)
        .bind(request.number_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(transaction)
    }

    pub async fn get_by_id(&mut self, id: TransactionId) -> Result<Option<TransactionDBResponse>> {
        let transaction = sqlx::query_as::<_, TransactionDBResponse>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(transaction)
    }

    pub async fn get_by_checkout_session(&mut self, session_id: &str) -> Result<Option<TransactionDBResponse>> {
        let transaction = sqlx::query_as::<_, TransactionDBResponse>("SELECT * FROM transactions WHERE checkout_session_id = $1")
            .bind(session_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(transaction)
    }

    /// Transition the transaction for a checkout session from `pending` to
    /// `completed`.
    ///
    /// Returns `Ok(None)` when no *pending* row matched: either the session is
    /// unknown, or the transition already happened (webhook replay). Only a
    /// `Some` return may be followed by a wallet credit.
    pub async fn complete_pending_by_session(&mut self, session_id: &str) -> Result<Option<TransactionDBResponse>> {
        let transaction = sqlx::query_as::<_, TransactionDBResponse>(
            r#"
            UPDATE transactions
            SET status = 'completed', updated_at = NOW()
            WHERE checkout_session_id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(transaction)
    }

    /// Mark the pending transaction for a checkout session as failed
    pub async fn fail_pending_by_session(&mut self, session_id: &str) -> Result<Option<TransactionDBResponse>> {
        let transaction = sqlx::query_as::<_, TransactionDBResponse>(
            r#"
            UPDATE transactions
            SET status = 'failed', updated_at = NOW()
            WHERE checkout_session_id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(transaction)
    }

    /// Mark the pending transaction for a payment intent as failed.
    ///
    /// Payment-failure events are keyed by payment-intent id rather than by
    /// checkout-session id, hence the separate lookup.
    pub async fn fail_pending_by_payment_intent(&mut self, payment_intent_id: &str) -> Result<Option<TransactionDBResponse>> {
        let transaction = sqlx::query_as::<_, TransactionDBResponse>(
            r#"
            UPDATE transactions
            SET status = 'failed', updated_at = NOW()
            WHERE payment_intent_id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(payment_intent_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(transaction)
    }

    /// List transactions for a user, newest first, with pagination
    pub async fn list(&mut self, filter: &TransactionFilter) -> Result<Vec<TransactionDBResponse>> {
        let transactions = sqlx::query_as::<_, TransactionDBResponse>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(transactions)
    }

    pub async fn count_for_user(&mut self, user_id: UserId) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Signed sum of completed movements for a user in one currency
    /// (credits positive, debits negative). Used by tests to cross-check the
    /// wallet balance against the ledger.
    pub async fn completed_sum(&mut self, user_id: UserId, currency: crate::types::Currency) -> Result<Decimal> {
        let (sum,): (Option<Decimal>,) = sqlx::query_as(
            r#"
            SELECT SUM(CASE WHEN transaction_type = 'credit' THEN amount ELSE -amount END)
            FROM transactions
            WHERE user_id = $1 AND currency = $2 AND status = $3
            "#,
        )
        .bind(user_id)
        .bind(currency)
        .bind(TransactionStatus::Completed)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(sum.unwrap_or(Decimal::ZERO))
    }
}

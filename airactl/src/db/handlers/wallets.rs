//! Wallet repository: the single point of truth for a user's spendable balance.
//!
//! All balance mutations are single atomic UPDATE statements. Debits are
//! guarded (`balance >= amount` in the WHERE clause) so two concurrent debits
//! can never drive a balance negative: the second one simply matches no row.

use crate::{
    db::{
        errors::Result,
        models::wallets::WalletDBResponse,
    },
    types::{Currency, UserId},
};
use rust_decimal::Decimal;
use sqlx::PgConnection;

fn balance_column(currency: Currency) -> &'static str {
    match currency {
        Currency::Usd => "balance_usd",
        Currency::Inr => "balance_inr",
    }
}

pub struct Wallets<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Wallets<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Get the wallet for a user, creating a zero-balance one on first access.
    ///
    /// The insert races benignly with concurrent first-accesses: the unique
    /// constraint on `user_id` means at most one row exists, and
    /// `ON CONFLICT DO NOTHING` makes the losers fall through to the select.
    pub async fn get_or_create(&mut self, user_id: UserId) -> Result<WalletDBResponse> {
        sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;

        let wallet = sqlx::query_as::<_, WalletDBResponse>("SELECT * FROM wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(wallet)
    }

    /// Get the wallet for a user without creating one
    pub async fn get_by_user(&mut self, user_id: UserId) -> Result<Option<WalletDBResponse>> {
        let wallet = sqlx::query_as::<_, WalletDBResponse>("SELECT * FROM wallets WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(wallet)
    }

    /// Whether the user's balance in `currency` covers `amount`.
    ///
    /// Read-only; the guarded decrement in [`Wallets::debit`] remains the
    /// authoritative check under concurrency.
    pub async fn has_sufficient(&mut self, user_id: UserId, amount: Decimal, currency: Currency) -> Result<bool> {
        let wallet = self.get_or_create(user_id).await?;
        Ok(wallet.balance(currency) >= amount)
    }

    /// Atomically increment the matching balance. `amount` must be positive;
    /// callers validate before reaching the repository.
    pub async fn credit(&mut self, user_id: UserId, amount: Decimal, currency: Currency) -> Result<WalletDBResponse> {
        // Ensure the wallet row exists before incrementing it
        self.get_or_create(user_id).await?;

        let sql = format!(
            "UPDATE wallets SET {col} = {col} + $1, updated_at = NOW() WHERE user_id = $2 RETURNING *",
            col = balance_column(currency)
        );

        let wallet = sqlx::query_as::<_, WalletDBResponse>(&sql)
            .bind(amount)
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(wallet)
    }

    /// Atomically decrement the matching balance, guarded against going
    /// negative.
    ///
    /// Returns `Ok(None)` when the guarded update matched no row, i.e. the
    /// balance did not cover the amount at commit time. No state changes in
    /// that case.
    pub async fn debit(&mut self, user_id: UserId, amount: Decimal, currency: Currency) -> Result<Option<WalletDBResponse>> {
        self.get_or_create(user_id).await?;

        let sql = format!(
            "UPDATE wallets SET {col} = {col} - $1, updated_at = NOW() WHERE user_id = $2 AND {col} >= $1 RETURNING *",
            col = balance_column(currency)
        );

        let wallet = sqlx::query_as::<_, WalletDBResponse>(&sql)
            .bind(amount)
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(wallet)
    }
}

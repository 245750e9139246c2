//! Phone number repository.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::numbers::{NumberCreateDBRequest, NumberDBResponse, NumberUpdateDBRequest},
    },
    types::{NumberId, UserId},
};
use sqlx::PgConnection;
use std::collections::HashMap;

/// Filter for listing phone numbers
#[derive(Debug, Clone)]
pub struct NumberFilter {
    pub user_id: Option<UserId>,
    pub skip: i64,
    pub limit: i64,
}

impl NumberFilter {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            skip: 0,
            limit: 100,
        }
    }
}

pub struct Numbers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Numbers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Get a number owned by a specific user, or None if it does not exist or
    /// belongs to someone else
    pub async fn get_owned(&mut self, id: NumberId, user_id: UserId) -> Result<Option<NumberDBResponse>> {
        let number = sqlx::query_as::<_, NumberDBResponse>("SELECT * FROM business_numbers WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(number)
    }

    /// Look up a number by its E.164 string. Inbound call webhooks arrive
    /// keyed by the dialed number, not by our id.
    pub async fn get_by_phone_number(&mut self, phone_number: &str) -> Result<Option<NumberDBResponse>> {
        let number = sqlx::query_as::<_, NumberDBResponse>("SELECT * FROM business_numbers WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(number)
    }

    pub async fn count_for_user(&mut self, user_id: UserId) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM business_numbers WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}

#[async_trait::async_trait]
impl Repository for Numbers<'_> {
    type CreateRequest = NumberCreateDBRequest;
    type UpdateRequest = NumberUpdateDBRequest;
    type Response = NumberDBResponse;
    type Id = NumberId;
    type Filter = NumberFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let number = sqlx::query_as::<_, NumberDBResponse>(
            r#"
            INSERT INTO business_numbers
                (business_id, user_id, phone_number, display_name, country_code, number_type,
                 monthly_cost, currency, provider_sid, voice_webhook_url, voice_enabled, sms_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(request.business_id)
        .bind(request.user_id)
        .bind(&request.phone_number)
        .bind(&request.display_name)
        .bind(&request.country_code)
        .bind(request.number_type)
        .bind(request.monthly_cost)
        .bind(request.currency)
        .bind(&request.provider_sid)
        .bind(&request.voice_webhook_url)
        .bind(request.voice_enabled)
        .bind(request.sms_enabled)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(number)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let number = sqlx::query_as::<_, NumberDBResponse>("SELECT * FROM business_numbers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(number)
    }

    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let numbers = sqlx::query_as::<_, NumberDBResponse>("SELECT * FROM business_numbers WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(numbers.into_iter().map(|n| (n.id, n)).collect())
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let numbers = sqlx::query_as::<_, NumberDBResponse>(
            r#"
            SELECT * FROM business_numbers
            WHERE ($1::uuid IS NULL OR user_id = $1)
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

        Ok(numbers)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM business_numbers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let number = sqlx::query_as::<_, NumberDBResponse>(
            r#"
            UPDATE business_numbers
            SET display_name = COALESCE($2, display_name),
                is_primary = COALESCE($3, is_primary),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.display_name)
        .bind(request.is_primary)
        .bind(request.is_active)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(number)
    }
}

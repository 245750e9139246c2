//! User and API key repository.

use crate::{
    db::{
        errors::Result,
        models::users::{ApiKeyDBResponse, UserCreateDBRequest, UserDBResponse},
    },
    types::UserId,
};
use sqlx::PgConnection;

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (email, display_name, is_admin)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(request.is_admin)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    /// Save the payment processor's customer id after the first checkout
    pub async fn set_payment_provider_id(&mut self, id: UserId, payment_provider_id: &str) -> Result<()> {
        sqlx::query("UPDATE users SET payment_provider_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(payment_provider_id)
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Resolve a bearer API key secret to its owning user
    pub async fn get_by_api_key(&mut self, secret: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT u.* FROM users u
            INNER JOIN api_keys ak ON ak.user_id = u.id
            WHERE ak.secret = $1
            "#,
        )
        .bind(secret)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }

    pub async fn create_api_key(&mut self, user_id: UserId, name: &str, secret: &str) -> Result<ApiKeyDBResponse> {
        let key = sqlx::query_as::<_, ApiKeyDBResponse>(
            r#"
            INSERT INTO api_keys (user_id, name, secret)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(secret)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(key)
    }
}

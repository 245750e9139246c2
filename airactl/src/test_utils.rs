//! Test utilities shared by the integration tests.

use std::sync::Arc;

use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    AppState,
    config::Config,
    crypto,
    db::{handlers::Users, models::users::UserCreateDBRequest, models::users::UserDBResponse},
    payment_providers::PaymentProvider,
    telephony::TelephonyProvider,
};

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.local".to_string(),
        ..Config::default()
    }
}

/// Build a test server on a per-test pool, with the given providers injected.
///
/// Providers are passed as trait objects so tests can keep a handle to a
/// dummy provider and assert on its call counters afterwards.
pub fn create_test_app(
    pool: PgPool,
    payment: Option<Arc<dyn PaymentProvider>>,
    telephony: Option<Arc<dyn TelephonyProvider>>,
) -> TestServer {
    let state = AppState::builder()
        .db(pool)
        .config(create_test_config())
        .maybe_payment(payment)
        .maybe_telephony(telephony)
        .build();

    let router = crate::build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// Create a user with a bearer API key, returning both
pub async fn create_test_user(pool: &PgPool) -> (UserDBResponse, String) {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users = Users::new(&mut conn);

    let email = format!("testuser_{}@example.com", Uuid::new_v4().simple());
    let user = users
        .create(&UserCreateDBRequest {
            email,
            display_name: Some("Test User".to_string()),
            is_admin: false,
        })
        .await
        .expect("Failed to create test user");

    let secret = crypto::generate_api_key();
    users
        .create_api_key(user.id, "test key", &secret)
        .await
        .expect("Failed to create test API key");

    (user, secret)
}

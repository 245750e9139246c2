//! # airactl: Control Layer for AI Voice Reception
//!
//! `airactl` is the billing and provisioning control plane behind an AI voice
//! reception service. It manages per-user wallets, processes payment webhooks,
//! and provisions phone numbers from a telephony carrier, gating every
//! purchase on wallet sufficiency.
//!
//! ## Overview
//!
//! Businesses using the service hold a wallet with USD and INR balances. They
//! top up the wallet through a hosted checkout at the payment processor; the
//! processor's webhook credits the wallet once the payment completes. Phone
//! numbers are purchased from the carrier and paid for out of the wallet, and
//! inbound calls to those numbers are answered via a carrier webhook.
//!
//! Money movement is ledger-first: every credit and debit is a row in the
//! `transactions` table, and wallet balances only change inside database
//! transactions that also write the corresponding ledger row. Webhook
//! crediting is idempotent (keyed on the processor's checkout session id) and
//! purchases are atomic (a guarded debit that cannot drive a balance
//! negative, committed together with the number record).
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for all persistence.
//!
//! The **API layer** ([`api`]) exposes the wallet, payment, and number
//! endpoints under `/api/*`, plus the unauthenticated webhook surfaces: the
//! payment processor posts to `/api/payment/webhook` and the carrier posts
//! inbound calls to `/call`.
//!
//! The **database layer** ([`db`]) uses the repository pattern. Each entity
//! (users, wallets, transactions, numbers) has a repository wrapping a SQLx
//! connection, so multi-step money movement can run on a single transaction.
//!
//! **Providers** ([`payment_providers`], [`telephony`]) are thin HTTP clients
//! for the payment processor and the carrier. They never touch the database;
//! handlers own all state changes so that a provider outage can never leave
//! the ledger half-written.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use airactl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = airactl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     airactl::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
mod crypto;
pub mod db;
pub mod errors;
mod openapi;
pub mod payment_providers;
pub mod telemetry;
pub mod telephony;
mod types;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod test;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, http,
    http::HeaderValue,
    routing::{get, patch, post},
};
use bon::Builder;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;

use crate::{
    config::CorsOrigin,
    db::{handlers::Users, models::users::UserCreateDBRequest},
    openapi::ApiDoc,
    payment_providers::PaymentProvider,
    telephony::TelephonyProvider,
};

pub use types::{ApiKeyId, Currency, NumberId, TransactionId, UserId, WalletId};

/// Application state shared across all request handlers.
///
/// Providers are optional: an instance without payment or telephony
/// configuration still serves the wallet endpoints, and the provider-backed
/// endpoints respond with 503.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub payment: Option<Arc<dyn PaymentProvider>>,
    pub telephony: Option<Arc<dyn TelephonyProvider>>,
}

/// Get the airactl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing admin user is left untouched, and the seeded API
/// key is only inserted when no key with that secret exists yet. Called on
/// every startup so there is always a way into the API.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, api_key: Option<&str>, db: &PgPool) -> anyhow::Result<UserId> {
    let mut tx = db.begin().await?;
    let mut users = Users::new(&mut tx);

    let user = match users.get_by_email(email).await? {
        Some(user) => user,
        None => {
            info!("Creating initial admin user {email}");
            users
                .create(&UserCreateDBRequest {
                    email: email.to_string(),
                    display_name: Some("Admin".to_string()),
                    is_admin: true,
                })
                .await?
        }
    };

    if let Some(secret) = api_key {
        if users.get_by_api_key(secret).await?.is_none() {
            users.create_api_key(user.id, "Initial admin key", secret).await?;
        }
    }

    tx.commit().await?;
    Ok(user.id)
}

/// Connect the main pool using the configured pool settings and run migrations
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.pool.max_connections)
        .min_connections(config.database.pool.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.pool.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials)
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// The authenticated API lives under `/api/*`. Two routes are deliberately
/// unauthenticated: the payment webhook (trust comes from the payload
/// signature) and the inbound call webhook.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let wallet_routes = Router::new()
        .route("/balance", get(api::handlers::wallet::get_balance))
        .route("/transactions", get(api::handlers::wallet::list_transactions));

    let payment_routes = Router::new()
        .route("/create-checkout-session", post(api::handlers::payments::create_checkout_session))
        .route("/confirm", post(api::handlers::payments::confirm_session))
        .route("/webhook", post(api::handlers::payments::webhook));

    let numbers_routes = Router::new()
        .route("/", get(api::handlers::numbers::list_numbers))
        .route("/search", post(api::handlers::numbers::search_numbers))
        .route("/purchase", post(api::handlers::numbers::purchase_number))
        .route("/{id}", patch(api::handlers::numbers::update_number))
        .route("/{id}/release", post(api::handlers::numbers::release_number));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/call", post(api::handlers::voice::inbound_call))
        .nest("/api/wallet", wallet_routes)
        .nest("/api/payment", payment_routes)
        .nest("/api/numbers", numbers_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects the pool, runs migrations,
///    seeds the admin user, and constructs the providers from configuration
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles requests
///    until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on an existing pool (used by tests, which hand
    /// in the per-test database from `#[sqlx::test]`)
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting control layer with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        create_initial_admin_user(&config.admin_email, config.admin_api_key.as_deref(), &pool).await?;

        let payment = config.payment.clone().map(payment_providers::create_provider);
        let telephony = config.telephony.clone().map(telephony::create_provider);

        if payment.is_none() {
            info!("No payment provider configured: checkout endpoints will return 503");
        }
        if telephony.is_none() {
            info!("No telephony provider configured: number endpoints will return 503");
        }

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .maybe_payment(payment)
            .maybe_telephony(telephony)
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Control layer listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

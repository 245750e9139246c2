//! Payment provider abstraction layer
//!
//! This module defines the `PaymentProvider` trait which abstracts payment processing
//! functionality across different payment providers (Stripe, PayPal, etc.).
//!
//! Providers only talk to the processor: creating hosted checkout sessions,
//! retrieving session state, and validating webhook payloads. Crediting the
//! wallet from a completed session happens in the webhook and confirm
//! handlers inside a single database transaction, keyed on the checkout
//! session id so replays credit at most once.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::{api::models::users::CurrentUser, config::PaymentConfig, types::Currency};

pub mod dummy;
pub mod stripe;

/// Create a payment provider from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(config: PaymentConfig) -> Arc<dyn PaymentProvider> {
    match config {
        PaymentConfig::Stripe(stripe_config) => Arc::new(stripe::StripeProvider::from(stripe_config)),
        PaymentConfig::Dummy(dummy_config) => Arc::new(dummy::DummyProvider::new(dummy_config.amount)),
        // Future providers:
        // PaymentConfig::PayPal(paypal_config) => {
        //     Arc::new(paypal::PayPalProvider::from(paypal_config))
        // }
    }
}

/// Result type for payment provider operations
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Errors that can occur during payment processing
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider API error: {0}")]
    ProviderApi(String),

    #[error("Payment not completed yet")]
    PaymentNotCompleted,

    #[error("Invalid payment data: {0}")]
    InvalidData(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::ProviderApi(err.to_string())
    }
}

impl From<PaymentError> for crate::errors::Error {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::ProviderApi(message) => crate::errors::Error::ProviderFailure {
                provider: "payment",
                message,
            },
            PaymentError::PaymentNotCompleted => crate::errors::Error::BadRequest {
                message: "Payment has not been completed".to_string(),
            },
            PaymentError::InvalidData(message) => crate::errors::Error::BadRequest { message },
        }
    }
}

/// A hosted checkout session created at the provider
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Provider-side session identifier (e.g., "cs_...")
    pub id: String,
    /// URL the user should be redirected to for payment
    pub url: String,
    /// Customer identifier if the provider created one
    pub customer_id: Option<String>,
}

/// Provider-side state of a checkout session
#[derive(Debug, Clone)]
pub struct PaymentSession {
    /// Local user id recorded as the session's client reference
    pub user_id: String,
    /// Amount paid (in major currency units)
    pub amount: Decimal,
    /// Currency of the payment
    pub currency: Currency,
    /// Whether the payment has been completed
    pub is_paid: bool,
    /// Provider payment intent id, if present
    pub payment_intent_id: Option<String>,
}

/// Represents a validated webhook event from a payment provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Type of event (e.g., "checkout.session.completed")
    pub event_type: String,
    /// Session ID associated with this event, if applicable
    pub session_id: Option<String>,
    /// Payment intent ID associated with this event, if applicable
    pub payment_intent_id: Option<String>,
}

impl WebhookEvent {
    /// Events that complete a checkout and should credit the wallet
    pub fn is_completion(&self) -> bool {
        matches!(
            self.event_type.as_str(),
            "checkout.session.completed" | "checkout.session.async_payment_succeeded"
        )
    }

    /// Events that terminate a checkout without payment
    pub fn is_failure(&self) -> bool {
        matches!(
            self.event_type.as_str(),
            "checkout.session.expired" | "checkout.session.async_payment_failed" | "payment_intent.payment_failed"
        )
    }
}

/// Abstract payment provider interface
///
/// Implementors provide payment processing capabilities for different providers
/// (Stripe, PayPal, Square, etc.)
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a new checkout session for topping up the wallet
    ///
    /// Returns the provider session and a URL that the user should be
    /// redirected to for payment.
    async fn create_checkout_session(
        &self,
        user: &CurrentUser,
        amount: Decimal,
        currency: Currency,
        cancel_url: &str,
        success_url: &str,
    ) -> Result<CheckoutSession>;

    /// Retrieve and validate a payment session
    ///
    /// Fetches the payment session from the provider and returns validated details.
    async fn get_payment_session(&self, session_id: &str) -> Result<PaymentSession>;

    /// Validate and extract webhook event from raw request data
    ///
    /// Returns None if this provider doesn't support webhooks.
    /// Returns Err if validation fails (invalid signature, malformed data, etc.)
    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<Option<WebhookEvent>>;
}

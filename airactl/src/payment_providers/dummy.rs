//! Dummy payment provider implementation
//!
//! This provider "completes" every checkout instantly without any external
//! payment. Useful for testing and development purposes.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    api::models::users::CurrentUser,
    payment_providers::{CheckoutSession, PaymentError, PaymentProvider, PaymentSession, Result, WebhookEvent},
    types::Currency,
};

/// Dummy payment provider that reports a fixed amount paid on every session
pub struct DummyProvider {
    amount: Decimal,
}

impl DummyProvider {
    /// Create a new Dummy provider
    pub fn new(amount: Decimal) -> Self {
        Self { amount }
    }
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    async fn create_checkout_session(
        &self,
        user: &CurrentUser,
        _amount: Decimal,
        _currency: Currency,
        _cancel_url: &str,
        success_url: &str,
    ) -> Result<CheckoutSession> {
        // Generate a unique session ID that includes the user ID
        // This allows us to recover the user ID in get_payment_session
        let session_id = format!("dummy_session_{}_{}", user.id, uuid::Uuid::new_v4());

        // Build success URL with session ID
        let redirect_url = success_url.replace("{CHECKOUT_SESSION_ID}", &session_id);

        tracing::info!("Dummy provider created checkout session {} for user {}", session_id, user.id);

        // Payment is instantly "complete" for the dummy provider
        Ok(CheckoutSession {
            id: session_id,
            url: redirect_url,
            customer_id: None,
        })
    }

    async fn get_payment_session(&self, session_id: &str) -> Result<PaymentSession> {
        // Parse the user ID from the session_id
        // Format: dummy_session_{user_id}_{uuid}
        let user_id = session_id
            .strip_prefix("dummy_session_")
            .and_then(|rest| rest.split('_').next())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PaymentError::InvalidData("Invalid dummy session ID format".to_string()))?;

        Ok(PaymentSession {
            user_id: user_id.to_string(),
            amount: self.amount,
            currency: Currency::Usd,
            is_paid: true, // Dummy sessions are always "paid"
            payment_intent_id: None,
        })
    }

    async fn validate_webhook(&self, _headers: &axum::http::HeaderMap, _body: &str) -> Result<Option<WebhookEvent>> {
        // Dummy provider doesn't use webhooks
        Ok(None)
    }
}

//! Stripe payment provider implementation
//!
//! Talks to the Stripe REST API directly over HTTPS (form-encoded requests,
//! JSON responses) and verifies webhook payloads against the `Stripe-Signature`
//! header scheme: HMAC-SHA256 over `"{timestamp}.{body}"` with the endpoint's
//! signing secret.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::Deserialize;
use sha2::Sha256;

use crate::{
    api::models::users::CurrentUser,
    config::StripeConfig,
    payment_providers::{CheckoutSession, PaymentError, PaymentProvider, PaymentSession, Result, WebhookEvent},
    types::Currency,
};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Maximum age of a webhook signature timestamp before it is rejected
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Stripe payment provider
pub struct StripeProvider {
    secret_key: String,
    webhook_secret: String,
    api_base: String,
    http: reqwest::Client,
}

impl From<StripeConfig> for StripeProvider {
    fn from(config: StripeConfig) -> Self {
        Self::new(config.secret_key, config.webhook_secret, config.api_base)
    }
}

/// Checkout session object as returned by the Stripe API
#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
    customer: Option<String>,
    payment_intent: Option<String>,
    payment_status: String,
    amount_total: Option<i64>,
    currency: Option<String>,
    client_reference_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeEventObject,
}

#[derive(Debug, Deserialize)]
struct StripeEventObject {
    id: Option<String>,
    payment_intent: Option<String>,
}

impl StripeProvider {
    pub fn new(secret_key: String, webhook_secret: String, api_base: Option<String>) -> Self {
        Self {
            secret_key,
            webhook_secret,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            http: reqwest::Client::new(),
        }
    }

    /// Verify a `Stripe-Signature` header against the raw request body.
    ///
    /// The header has the form `t=<unix timestamp>,v1=<hex hmac>[,v1=...]`.
    /// The signed payload is `"{t}.{body}"`. Comparison is constant-time via
    /// the HMAC verify primitive.
    pub fn verify_signature(&self, signature_header: &str, body: &str) -> Result<()> {
        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<Vec<u8>> = Vec::new();

        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = value.parse().ok();
                }
                Some(("v1", value)) => {
                    if let Ok(bytes) = hex::decode(value) {
                        candidates.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| PaymentError::InvalidData("Signature header missing timestamp".to_string()))?;
        if candidates.is_empty() {
            return Err(PaymentError::InvalidData("Signature header missing v1 signature".to_string()));
        }

        let age = chrono::Utc::now().timestamp() - timestamp;
        if age.abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(PaymentError::InvalidData("Signature timestamp outside tolerance".to_string()));
        }

        let signed_payload = format!("{timestamp}.{body}");
        for candidate in &candidates {
            let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
                .map_err(|e| PaymentError::InvalidData(format!("Invalid webhook secret: {e}")))?;
            mac.update(signed_payload.as_bytes());
            if mac.verify_slice(candidate).is_ok() {
                return Ok(());
            }
        }

        Err(PaymentError::InvalidData("Webhook signature verification failed".to_string()))
    }

    fn parse_session(&self, session: StripeCheckoutSession) -> Result<PaymentSession> {
        let user_id = session.client_reference_id.ok_or_else(|| {
            tracing::error!("Checkout session {} missing client_reference_id", session.id);
            PaymentError::InvalidData("Missing client_reference_id".to_string())
        })?;

        let amount_cents = session.amount_total.ok_or_else(|| {
            tracing::error!("Checkout session {} missing amount_total", session.id);
            PaymentError::InvalidData("Missing payment amount".to_string())
        })?;

        let currency = match session.currency.as_deref() {
            Some("usd") => Currency::Usd,
            Some("inr") => Currency::Inr,
            other => {
                return Err(PaymentError::InvalidData(format!("Unsupported currency: {other:?}")));
            }
        };

        Ok(PaymentSession {
            user_id,
            amount: Decimal::new(amount_cents, 2),
            currency,
            is_paid: session.payment_status == "paid",
            payment_intent_id: session.payment_intent,
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_checkout_session(
        &self,
        user: &CurrentUser,
        amount: Decimal,
        currency: Currency,
        cancel_url: &str,
        success_url: &str,
    ) -> Result<CheckoutSession> {
        let unit_amount = (amount * Decimal::from(100))
            .to_i64()
            .ok_or_else(|| PaymentError::InvalidData(format!("Amount not representable in cents: {amount}")))?;

        let user_id = user.id.to_string();
        let unit_amount_str = unit_amount.to_string();
        let params: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("client_reference_id", &user_id),
            ("customer_email", &user.email),
            ("customer_creation", "always"),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", currency.as_lowercase()),
            ("line_items[0][price_data][product_data][name]", "Wallet top-up"),
            ("line_items[0][price_data][unit_amount]", &unit_amount_str),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Failed to create Stripe checkout session: {} {}", status, body);
            return Err(PaymentError::ProviderApi(format!("checkout session creation returned {status}")));
        }

        let session: StripeCheckoutSession = response.json().await?;
        tracing::info!("Created checkout session {} for user {}", session.id, user.id);

        let url = session.url.ok_or_else(|| {
            tracing::error!("Checkout session missing URL");
            PaymentError::ProviderApi("Checkout session missing URL".to_string())
        })?;

        Ok(CheckoutSession {
            id: session.id,
            url,
            customer_id: session.customer,
        })
    }

    async fn get_payment_session(&self, session_id: &str) -> Result<PaymentSession> {
        let response = self
            .http
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.api_base))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Failed to retrieve Stripe checkout session {}: {}", session_id, status);
            return Err(PaymentError::ProviderApi(format!("session retrieval returned {status}")));
        }

        let session: StripeCheckoutSession = response.json().await?;
        self.parse_session(session)
    }

    async fn validate_webhook(&self, headers: &axum::http::HeaderMap, body: &str) -> Result<Option<WebhookEvent>> {
        let signature = headers
            .get("stripe-signature")
            .ok_or_else(|| {
                tracing::error!("Missing stripe-signature header");
                PaymentError::InvalidData("Missing stripe-signature header".to_string())
            })?
            .to_str()
            .map_err(|e| {
                tracing::error!("Invalid stripe-signature header: {:?}", e);
                PaymentError::InvalidData("Invalid stripe-signature header".to_string())
            })?;

        self.verify_signature(signature, body)?;

        let event: StripeEvent =
            serde_json::from_str(body).map_err(|e| PaymentError::InvalidData(format!("Malformed webhook payload: {e}")))?;

        tracing::trace!("Validated Stripe webhook event: {}", event.event_type);

        Ok(Some(WebhookEvent {
            event_type: event.event_type,
            session_id: event.data.object.id,
            payment_intent_id: event.data.object.payment_intent,
        }))
    }
}

//! Telephony provider abstraction layer
//!
//! This module defines the `TelephonyProvider` trait which abstracts phone
//! number search, provisioning, and release across different telephony
//! providers (Twilio, etc.).
//!
//! Providers only talk to the carrier API. Wallet debiting and the local
//! number record are handled by the purchase handler inside a single database
//! transaction; if the provider-side purchase succeeded but the local commit
//! fails, the handler makes a best-effort release of the provider number.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{config::TelephonyConfig, db::models::numbers::NumberType};

pub mod dummy;
pub mod twilio;

/// Create a telephony provider from configuration
///
/// This is the single point where we convert config into provider instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_provider(config: TelephonyConfig) -> Arc<dyn TelephonyProvider> {
    match config {
        TelephonyConfig::Twilio(twilio_config) => Arc::new(twilio::TwilioProvider::from(twilio_config)),
        TelephonyConfig::Dummy => Arc::new(dummy::DummyProvider::new()),
    }
}

/// Result type for telephony provider operations
pub type Result<T> = std::result::Result<T, TelephonyError>;

/// Errors that can occur during telephony provisioning
#[derive(Debug, thiserror::Error)]
pub enum TelephonyError {
    #[error("Telephony provider API error: {0}")]
    ProviderApi(String),

    #[error("Invalid telephony data: {0}")]
    InvalidData(String),

    #[error("Number not found at provider")]
    NotFound,
}

impl From<reqwest::Error> for TelephonyError {
    fn from(err: reqwest::Error) -> Self {
        TelephonyError::ProviderApi(err.to_string())
    }
}

impl From<TelephonyError> for crate::errors::Error {
    fn from(err: TelephonyError) -> Self {
        match err {
            TelephonyError::ProviderApi(message) => crate::errors::Error::ProviderFailure {
                provider: "telephony",
                message,
            },
            TelephonyError::InvalidData(message) => crate::errors::Error::BadRequest { message },
            TelephonyError::NotFound => crate::errors::Error::NotFound {
                resource: "Phone number".to_string(),
                id: "unknown".to_string(),
            },
        }
    }
}

/// A number available for purchase at the provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailableNumber {
    /// E.164 formatted number (e.g., "+14155552671")
    pub phone_number: String,
    /// Human-readable rendering (e.g., "(415) 555-2671")
    pub friendly_name: Option<String>,
    /// City or locality the number belongs to
    pub locality: Option<String>,
    /// State or region the number belongs to
    pub region: Option<String>,
    /// ISO country code (e.g., "US")
    pub iso_country: String,
    /// Whether the number supports voice calls
    pub voice_enabled: bool,
    /// Whether the number supports SMS
    pub sms_enabled: bool,
}

/// A number purchased at the provider
#[derive(Debug, Clone)]
pub struct ProvisionedNumber {
    /// Provider-side identifier for the number (e.g., "PN...")
    pub sid: String,
    /// E.164 formatted number
    pub phone_number: String,
}

/// Search parameters for available numbers
#[derive(Debug, Clone)]
pub struct NumberSearch {
    /// ISO country code (e.g., "US")
    pub country: String,
    /// Optional area code restriction
    pub area_code: Option<String>,
    /// Kind of number to search for
    pub number_type: NumberType,
    /// Maximum results to return
    pub limit: u32,
}

/// Abstract telephony provider interface
///
/// Implementors provide number provisioning capabilities for different
/// carriers (Twilio, Telnyx, etc.)
#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Search numbers available for purchase
    async fn search_available(&self, search: &NumberSearch) -> Result<Vec<AvailableNumber>>;

    /// Monthly cost of a number of the given type in the given country,
    /// in the provider's billing currency (USD)
    async fn monthly_cost(&self, country: &str, number_type: NumberType) -> Result<Decimal>;

    /// Purchase a specific number
    ///
    /// `voice_webhook_url` is registered as the number's inbound call webhook
    /// when provided.
    async fn purchase_number(&self, phone_number: &str, voice_webhook_url: Option<&str>) -> Result<ProvisionedNumber>;

    /// Release a previously purchased number
    ///
    /// Releasing a number the provider no longer knows about succeeds: the
    /// desired end state (number gone) already holds.
    async fn release_number(&self, provider_sid: &str) -> Result<()>;
}

//! Dummy telephony provider implementation
//!
//! Serves a small fixed inventory and tracks how many provider calls were
//! made, so tests can assert that no provisioning happened when a purchase is
//! rejected. A failing mode simulates carrier-side purchase errors.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    db::models::numbers::NumberType,
    telephony::{AvailableNumber, NumberSearch, ProvisionedNumber, Result, TelephonyError, TelephonyProvider},
};

/// Dummy telephony provider with a fixed inventory
pub struct DummyProvider {
    monthly_cost: Decimal,
    fail_purchases: bool,
    pub search_calls: AtomicUsize,
    pub purchase_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
}

impl DummyProvider {
    pub fn new() -> Self {
        Self {
            monthly_cost: Decimal::new(150, 2), // $1.50/month
            fail_purchases: false,
            search_calls: AtomicUsize::new(0),
            purchase_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_monthly_cost(mut self, monthly_cost: Decimal) -> Self {
        self.monthly_cost = monthly_cost;
        self
    }

    /// A provider whose purchases always fail, for exercising rollback paths
    pub fn failing() -> Self {
        Self {
            fail_purchases: true,
            ..Self::new()
        }
    }
}

impl Default for DummyProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelephonyProvider for DummyProvider {
    async fn search_available(&self, search: &NumberSearch) -> Result<Vec<AvailableNumber>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let inventory = ["+14155550100", "+14155550101", "+14155550102"];
        Ok(inventory
            .iter()
            .take(search.limit as usize)
            .map(|n| AvailableNumber {
                phone_number: n.to_string(),
                friendly_name: None,
                locality: Some("San Francisco".to_string()),
                region: Some("CA".to_string()),
                iso_country: search.country.clone(),
                voice_enabled: true,
                sms_enabled: true,
            })
            .collect())
    }

    async fn monthly_cost(&self, _country: &str, _number_type: NumberType) -> Result<Decimal> {
        Ok(self.monthly_cost)
    }

    async fn purchase_number(&self, phone_number: &str, _voice_webhook_url: Option<&str>) -> Result<ProvisionedNumber> {
        self.purchase_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_purchases {
            return Err(TelephonyError::ProviderApi("simulated purchase failure".to_string()));
        }

        Ok(ProvisionedNumber {
            sid: format!("PNdummy{}", uuid::Uuid::new_v4().simple()),
            phone_number: phone_number.to_string(),
        })
    }

    async fn release_number(&self, _provider_sid: &str) -> Result<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

//! Twilio telephony provider implementation
//!
//! Talks to the Twilio REST API (form-encoded requests, JSON responses) using
//! HTTP basic auth with the account SID and auth token. Number pricing comes
//! from the separate Twilio pricing API.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    config::TwilioConfig,
    db::models::numbers::NumberType,
    telephony::{AvailableNumber, NumberSearch, ProvisionedNumber, Result, TelephonyError, TelephonyProvider},
};

const DEFAULT_API_BASE: &str = "https://api.twilio.com";
const DEFAULT_PRICING_BASE: &str = "https://pricing.twilio.com";

/// Twilio telephony provider
pub struct TwilioProvider {
    account_sid: String,
    auth_token: String,
    voice_webhook_url: Option<String>,
    api_base: String,
    pricing_base: String,
    http: reqwest::Client,
}

impl From<TwilioConfig> for TwilioProvider {
    fn from(config: TwilioConfig) -> Self {
        Self::new(config.account_sid, config.auth_token, config.voice_webhook_url, config.api_base)
    }
}

/// Path segment for the available-numbers resource
fn search_segment(number_type: NumberType) -> &'static str {
    match number_type {
        NumberType::Local => "Local",
        NumberType::TollFree => "TollFree",
        NumberType::Mobile => "Mobile",
    }
}

/// Number type name as the pricing API reports it
fn pricing_name(number_type: NumberType) -> &'static str {
    match number_type {
        NumberType::Local => "local",
        NumberType::TollFree => "toll free",
        NumberType::Mobile => "mobile",
    }
}

#[derive(Debug, Deserialize)]
struct AvailableNumbersResponse {
    available_phone_numbers: Vec<TwilioAvailableNumber>,
}

#[derive(Debug, Deserialize)]
struct TwilioAvailableNumber {
    phone_number: String,
    friendly_name: Option<String>,
    locality: Option<String>,
    region: Option<String>,
    iso_country: String,
    #[serde(default)]
    capabilities: TwilioCapabilities,
}

#[derive(Debug, Default, Deserialize)]
struct TwilioCapabilities {
    #[serde(default)]
    voice: bool,
    #[serde(default, alias = "SMS")]
    sms: bool,
}

#[derive(Debug, Deserialize)]
struct IncomingPhoneNumber {
    sid: String,
    phone_number: String,
}

#[derive(Debug, Deserialize)]
struct CountryPricingResponse {
    phone_number_prices: Vec<PhoneNumberPrice>,
}

#[derive(Debug, Deserialize)]
struct PhoneNumberPrice {
    number_type: String,
    current_price: String,
}

impl TwilioProvider {
    pub fn new(account_sid: String, auth_token: String, voice_webhook_url: Option<String>, api_base: Option<String>) -> Self {
        // A single override serves both APIs so tests can point everything at
        // one mock server
        let pricing_base = api_base.clone().unwrap_or_else(|| DEFAULT_PRICING_BASE.to_string());
        Self {
            account_sid,
            auth_token,
            voice_webhook_url,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            pricing_base,
            http: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http.request(method, url).basic_auth(&self.account_sid, Some(&self.auth_token))
    }
}

#[async_trait]
impl TelephonyProvider for TwilioProvider {
    async fn search_available(&self, search: &NumberSearch) -> Result<Vec<AvailableNumber>> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/AvailablePhoneNumbers/{}/{}.json",
            self.api_base,
            self.account_sid,
            search.country,
            search_segment(search.number_type),
        );

        let mut query: Vec<(&str, String)> = vec![("PageSize", search.limit.to_string()), ("VoiceEnabled", "true".to_string())];
        if let Some(area_code) = &search.area_code {
            query.push(("AreaCode", area_code.clone()));
        }

        let response = self.request(reqwest::Method::GET, url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Twilio number search failed: {}", status);
            return Err(TelephonyError::ProviderApi(format!("number search returned {status}")));
        }

        let body: AvailableNumbersResponse = response.json().await?;

        Ok(body
            .available_phone_numbers
            .into_iter()
            .map(|n| AvailableNumber {
                phone_number: n.phone_number,
                friendly_name: n.friendly_name,
                locality: n.locality,
                region: n.region,
                iso_country: n.iso_country,
                voice_enabled: n.capabilities.voice,
                sms_enabled: n.capabilities.sms,
            })
            .collect())
    }

    async fn monthly_cost(&self, country: &str, number_type: NumberType) -> Result<Decimal> {
        let url = format!("{}/v1/PhoneNumbers/Countries/{country}", self.pricing_base);
        let response = self.request(reqwest::Method::GET, url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Twilio pricing lookup for {} failed: {}", country, status);
            return Err(TelephonyError::ProviderApi(format!("pricing lookup returned {status}")));
        }

        let body: CountryPricingResponse = response.json().await?;
        let wanted = pricing_name(number_type);

        let price = body
            .phone_number_prices
            .iter()
            .find(|p| p.number_type == wanted)
            .ok_or_else(|| TelephonyError::InvalidData(format!("No pricing for {wanted} numbers in {country}")))?;

        price
            .current_price
            .parse()
            .map_err(|_| TelephonyError::InvalidData(format!("Unparseable price: {}", price.current_price)))
    }

    async fn purchase_number(&self, phone_number: &str, voice_webhook_url: Option<&str>) -> Result<ProvisionedNumber> {
        let url = format!("{}/2010-04-01/Accounts/{}/IncomingPhoneNumbers.json", self.api_base, self.account_sid);

        let mut params: Vec<(&str, &str)> = vec![("PhoneNumber", phone_number)];
        let webhook = voice_webhook_url.or(self.voice_webhook_url.as_deref());
        if let Some(webhook) = webhook {
            params.push(("VoiceUrl", webhook));
            params.push(("VoiceMethod", "POST"));
        }

        let response = self.request(reqwest::Method::POST, url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Twilio number purchase for {} failed: {} {}", phone_number, status, body);
            return Err(TelephonyError::ProviderApi(format!("number purchase returned {status}")));
        }

        let number: IncomingPhoneNumber = response.json().await?;
        tracing::info!("Purchased number {} ({})", number.phone_number, number.sid);

        Ok(ProvisionedNumber {
            sid: number.sid,
            phone_number: number.phone_number,
        })
    }

    async fn release_number(&self, provider_sid: &str) -> Result<()> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/IncomingPhoneNumbers/{provider_sid}.json",
            self.api_base, self.account_sid
        );

        let response = self.request(reqwest::Method::DELETE, url).send().await?;

        // The number already being gone is the end state we wanted
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!("Number {} already released at provider", provider_sid);
            return Ok(());
        }

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Twilio number release for {} failed: {}", provider_sid, status);
            return Err(TelephonyError::ProviderApi(format!("number release returned {status}")));
        }

        tracing::info!("Released number {}", provider_sid);
        Ok(())
    }
}

//! API models for phone number provisioning.

use crate::db::models::numbers::{NumberDBResponse, NumberType};
use crate::types::{Currency, NumberId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchNumbersRequest {
    /// ISO country code (e.g., "US")
    #[serde(default = "default_country")]
    pub country: String,
    /// Optional area code restriction
    pub area_code: Option<String>,
    /// Kind of number to search for
    #[serde(default = "default_number_type")]
    pub number_type: NumberType,
    /// Maximum results to return
    #[serde(default = "default_search_limit")]
    #[schema(default = 10, minimum = 1, maximum = 30)]
    pub limit: u32,
}

fn default_country() -> String {
    "US".to_string()
}

fn default_number_type() -> NumberType {
    NumberType::Local
}

fn default_search_limit() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseNumberRequest {
    /// E.164 formatted number to purchase (must come from a search result)
    pub phone_number: String,
    /// ISO country code the number belongs to
    #[serde(default = "default_country")]
    pub country: String,
    /// Kind of number being purchased
    #[serde(default = "default_number_type")]
    pub number_type: NumberType,
    /// Optional display name for the number
    pub display_name: Option<String>,
}

/// Partial update; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateNumberRequest {
    /// New display name
    pub display_name: Option<String>,
    /// Mark this number as the user's primary number
    pub is_primary: Option<bool>,
    /// Enable or disable the number
    pub is_active: Option<bool>,
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NumberResponse {
    /// Number ID
    #[schema(value_type = String, format = "uuid")]
    pub id: NumberId,
    /// Owning user ID
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    /// E.164 formatted number
    pub phone_number: String,
    /// Display name
    pub display_name: Option<String>,
    /// ISO country code
    pub country_code: String,
    /// Kind of number
    pub number_type: NumberType,
    /// Monthly recurring cost
    #[schema(value_type = f64)]
    pub monthly_cost: Decimal,
    /// Currency of the monthly cost
    pub currency: Currency,
    /// Whether the number is active
    pub is_active: bool,
    /// Whether this is the user's primary number
    pub is_primary: bool,
    /// Whether voice calls are enabled
    pub voice_enabled: bool,
    /// Whether SMS is enabled
    pub sms_enabled: bool,
    /// When the number was provisioned
    pub created_at: DateTime<Utc>,
}

/// All numbers owned by the requesting user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NumberListResponse {
    pub numbers: Vec<NumberResponse>,
    pub total: i64,
}

// Conversions
impl From<NumberDBResponse> for NumberResponse {
    fn from(db: NumberDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            phone_number: db.phone_number,
            display_name: db.display_name,
            country_code: db.country_code,
            number_type: db.number_type,
            monthly_cost: db.monthly_cost,
            currency: db.currency,
            is_active: db.is_active,
            is_primary: db.is_primary,
            voice_enabled: db.voice_enabled,
            sms_enabled: db.sms_enabled,
            created_at: db.created_at,
        }
    }
}

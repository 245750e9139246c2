//! Database models for provisioned phone numbers.

use crate::types::{Currency, NumberId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Phone number type enum stored as TEXT in database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NumberType {
    Local,
    TollFree,
    Mobile,
}

/// Database request for creating a new phone number record.
///
/// At least one of `business_id` / `user_id` must be set; the schema enforces
/// this with a CHECK constraint.
#[derive(Debug, Clone)]
pub struct NumberCreateDBRequest {
    pub business_id: Option<Uuid>,
    pub user_id: Option<UserId>,
    pub phone_number: String,
    pub display_name: Option<String>,
    pub country_code: String,
    pub number_type: NumberType,
    pub monthly_cost: Decimal,
    pub currency: Currency,
    pub provider_sid: Option<String>,
    pub voice_webhook_url: Option<String>,
    pub voice_enabled: bool,
    pub sms_enabled: bool,
}

/// Database request for updating a phone number record
#[derive(Debug, Clone, Default)]
pub struct NumberUpdateDBRequest {
    pub display_name: Option<String>,
    pub is_primary: Option<bool>,
    pub is_active: Option<bool>,
}

/// Database response for a phone number row
#[derive(Debug, Clone, FromRow)]
pub struct NumberDBResponse {
    pub id: NumberId,
    pub business_id: Option<Uuid>,
    pub user_id: Option<UserId>,
    pub phone_number: String,
    pub display_name: Option<String>,
    pub country_code: String,
    pub number_type: NumberType,
    pub is_active: bool,
    pub is_primary: bool,
    pub monthly_cost: Decimal,
    pub currency: Currency,
    pub provider_sid: Option<String>,
    pub voice_webhook_url: Option<String>,
    pub voice_enabled: bool,
    pub sms_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! API models for checkout and webhooks.

use crate::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCheckoutSessionRequest {
    /// Amount to add to the wallet (in major currency units)
    #[schema(value_type = f64)]
    pub amount: Decimal,
    /// Currency to top up
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConfirmSessionRequest {
    /// Provider-side checkout session id from the success redirect
    pub session_id: String,
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSessionResponse {
    /// Provider-side checkout session id
    pub session_id: String,
    /// URL the user should be redirected to for payment
    pub checkout_url: String,
}

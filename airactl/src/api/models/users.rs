//! API models for user accounts.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The authenticated user, as resolved from the request's API key.
///
/// Extracted in handlers via `FromRequestParts`; rejects with 401 when the
/// key is missing or unknown.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// User ID
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    /// Email address
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
    /// Whether the user is an administrator
    pub is_admin: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

// Conversions
impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            display_name: db.display_name,
            is_admin: db.is_admin,
            created_at: db.created_at,
        }
    }
}

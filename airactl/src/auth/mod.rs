//! Authentication system.
//!
//! API key authentication for programmatic access:
//! - API keys are seeded for users (the initial admin key comes from config)
//! - Passed in `Authorization: Bearer <key>` header
//! - No expiration (manually revoked when needed)
//! - Scoped to individual users
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use airactl::api::models::users::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> Result<String> {
//!     Ok(format!("Hello, {}!", user.email))
//! }
//! ```

pub mod current_user;

//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Wallet** (`/api/wallet/*`): Balances and the transaction ledger
//! - **Payments** (`/api/payment/*`): Checkout sessions and the processor webhook
//! - **Numbers** (`/api/numbers/*`): Phone number search, purchase, and release
//! - **Voice** (`/call`): Inbound call webhook from the carrier
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! Interactive documentation is served at `/docs` when the server is running.

pub mod handlers;
pub mod models;

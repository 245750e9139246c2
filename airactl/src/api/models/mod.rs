//! API request/response models.
//!
//! These are the wire-facing DTOs: serde + utoipa annotated, converted from
//! the database models in [`crate::db::models`].

pub mod numbers;
pub mod pagination;
pub mod payments;
pub mod transactions;
pub mod users;
pub mod wallets;

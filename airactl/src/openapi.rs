//! OpenAPI documentation for the management API.
//!
//! Aggregates the `utoipa` path annotations from the handler modules into a
//! single document served at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Registers the bearer API key scheme referenced by the path annotations
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(paths(api::handlers::wallet::get_balance, api::handlers::wallet::list_transactions))]
struct WalletApi;

#[derive(OpenApi)]
#[openapi(paths(
    api::handlers::payments::create_checkout_session,
    api::handlers::payments::confirm_session,
    api::handlers::payments::webhook,
))]
struct PaymentsApi;

#[derive(OpenApi)]
#[openapi(paths(
    api::handlers::numbers::search_numbers,
    api::handlers::numbers::list_numbers,
    api::handlers::numbers::purchase_number,
    api::handlers::numbers::update_number,
    api::handlers::numbers::release_number,
))]
struct NumbersApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "airactl API",
        description = "Wallet ledger and phone-number provisioning for AI voice reception",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(api::handlers::voice::inbound_call),
    nest(
        (path = "/api/wallet", api = WalletApi),
        (path = "/api/payment", api = PaymentsApi),
        (path = "/api/numbers", api = NumbersApi),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "wallet", description = "Balances and the transaction ledger"),
        (name = "payments", description = "Checkout sessions and processor webhooks"),
        (name = "numbers", description = "Phone number search, purchase, and release"),
        (name = "voice", description = "Inbound call webhooks"),
    )
)]
pub struct ApiDoc;

//! HTTP handlers for payment processing endpoints.
//!
//! Checkout creates a provider session plus a local `pending` ledger row keyed
//! on the session id. The webhook (or an explicit confirm after the success
//! redirect) completes that row with a guarded `pending -> completed`
//! transition and credits the wallet in the same database transaction, so a
//! replayed event can never credit twice.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use rust_decimal::Decimal;

use crate::{
    AppState,
    api::models::{
        payments::{CheckoutSessionResponse, ConfirmSessionRequest, CreateCheckoutSessionRequest},
        transactions::TransactionResponse,
        users::CurrentUser,
    },
    db::{
        errors::DbError,
        handlers::{Transactions, Users, Wallets},
        models::transactions::{TransactionCreateDBRequest, TransactionStatus, TransactionType},
    },
    errors::{Error, Result},
    payment_providers::PaymentError,
};

/// Create a checkout session for topping up the wallet
#[utoipa::path(
    post,
    path = "/create-checkout-session",
    tag = "payments",
    summary = "Create checkout session",
    request_body = CreateCheckoutSessionRequest,
    responses(
        (status = 200, description = "Checkout session created", body = CheckoutSessionResponse),
        (status = 400, description = "Invalid amount"),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "No payment provider configured"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateCheckoutSessionRequest>,
) -> Result<Json<CheckoutSessionResponse>> {
    let provider = state.payment.as_ref().ok_or(Error::NotConfigured {
        service: "Payment processing",
    })?;

    if request.amount <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Top-up amount must be positive".to_string(),
        });
    }

    let success_url = format!(
        "{}/wallet?payment=success&session_id={{CHECKOUT_SESSION_ID}}",
        state.config.dashboard_url
    );
    let cancel_url = format!("{}/wallet?payment=cancelled", state.config.dashboard_url);

    let session = provider
        .create_checkout_session(&user, request.amount, request.currency, &cancel_url, &success_url)
        .await?;

    // Record the pending ledger row the webhook will later complete. The
    // unique constraint on checkout_session_id backs up the guarded
    // transition against double-insertion.
    let mut tx = state.db.begin().await.map_err(DbError::from)?;

    let wallet = Wallets::new(&mut tx).get_or_create(user.id).await?;
    Transactions::new(&mut tx)
        .create(&TransactionCreateDBRequest {
            user_id: user.id,
            wallet_id: wallet.id,
            transaction_type: TransactionType::Credit,
            amount: request.amount,
            currency: request.currency,
            status: TransactionStatus::Pending,
            description: Some("Wallet top-up".to_string()),
            checkout_session_id: Some(session.id.clone()),
            payment_intent_id: None,
            number_id: None,
        })
        .await?;

    // Save the processor's customer id on first checkout
    if let Some(customer_id) = &session.customer_id {
        Users::new(&mut tx).set_payment_provider_id(user.id, customer_id).await?;
    }

    tx.commit().await.map_err(DbError::from)?;

    tracing::info!(session_id = %session.id, "Created checkout session");

    Ok(Json(CheckoutSessionResponse {
        session_id: session.id,
        checkout_url: session.url,
    }))
}

/// Confirm a checkout session after the success redirect
///
/// Settles sessions the webhook has not (or will not) settle: providers
/// without webhook support, and users landing back on the dashboard before
/// the webhook arrives. The session state comes from the provider; if paid,
/// the same guarded `pending -> completed` transition and credit run as on
/// the webhook path, so confirming and the webhook can race without a double
/// credit. An already-settled session returns its ledger row unchanged.
#[utoipa::path(
    post,
    path = "/confirm",
    tag = "payments",
    summary = "Confirm a checkout session",
    request_body = ConfirmSessionRequest,
    responses(
        (status = 200, description = "Session settled", body = TransactionResponse),
        (status = 400, description = "Payment not completed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No checkout session recorded for this id"),
        (status = 503, description = "No payment provider configured"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id, session_id = %request.session_id))]
pub async fn confirm_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ConfirmSessionRequest>,
) -> Result<Json<TransactionResponse>> {
    let provider = state.payment.as_ref().ok_or(Error::NotConfigured {
        service: "Payment processing",
    })?;

    let session = provider.get_payment_session(&request.session_id).await?;
    if !session.is_paid {
        return Err(PaymentError::PaymentNotCompleted.into());
    }

    let mut tx = state.db.begin().await.map_err(DbError::from)?;

    let recorded = Transactions::new(&mut tx)
        .get_by_checkout_session(&request.session_id)
        .await?
        // A session we never recorded, or someone else's, looks the same to
        // the caller
        .filter(|t| t.user_id == user.id)
        .ok_or_else(|| Error::NotFound {
            resource: "Checkout session".to_string(),
            id: request.session_id.clone(),
        })?;

    match Transactions::new(&mut tx).complete_pending_by_session(&request.session_id).await? {
        Some(transaction) => {
            Wallets::new(&mut tx)
                .credit(transaction.user_id, transaction.amount, transaction.currency)
                .await?;
            tx.commit().await.map_err(DbError::from)?;

            tracing::info!(
                amount = %transaction.amount,
                currency = %transaction.currency,
                "Credited wallet from confirmed checkout"
            );
            Ok(Json(transaction.into()))
        }
        None => {
            // Already settled by the webhook or an earlier confirm
            tracing::debug!("Session already settled, returning recorded transaction");
            Ok(Json(recorded.into()))
        }
    }
}

/// Payment provider webhook endpoint
///
/// Unauthenticated; trust comes from the provider's payload signature. Always
/// returns 200 for validated events (including replays) so the provider stops
/// retrying; signature failures return 400.
#[utoipa::path(
    post,
    path = "/webhook",
    tag = "payments",
    summary = "Payment provider webhook",
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Invalid signature or payload"),
        (status = 503, description = "No payment provider configured"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: String) -> Result<StatusCode> {
    let provider = state.payment.as_ref().ok_or(Error::NotConfigured {
        service: "Payment processing",
    })?;

    let Some(event) = provider.validate_webhook(&headers, &body).await? else {
        // Provider without webhook support
        return Ok(StatusCode::OK);
    };

    tracing::debug!(event_type = %event.event_type, "Received webhook event");

    if event.is_completion() {
        let session_id = event.session_id.as_ref().ok_or_else(|| Error::BadRequest {
            message: "Completion event missing session id".to_string(),
        })?;

        let mut tx = state.db.begin().await.map_err(DbError::from)?;

        match Transactions::new(&mut tx).complete_pending_by_session(session_id).await? {
            Some(transaction) => {
                Wallets::new(&mut tx)
                    .credit(transaction.user_id, transaction.amount, transaction.currency)
                    .await?;
                tx.commit().await.map_err(DbError::from)?;

                tracing::info!(
                    session_id = %session_id,
                    user_id = %transaction.user_id,
                    amount = %transaction.amount,
                    currency = %transaction.currency,
                    "Credited wallet from completed checkout"
                );
            }
            None => {
                // Replay or unknown session: nothing transitioned, nothing credited
                tracing::debug!(session_id = %session_id, "No pending transaction for session, skipping");
            }
        }
    } else if event.is_failure() {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut transactions = Transactions::new(&mut conn);

        let failed = if let Some(session_id) = &event.session_id {
            transactions.fail_pending_by_session(session_id).await?
        } else if let Some(payment_intent_id) = &event.payment_intent_id {
            transactions.fail_pending_by_payment_intent(payment_intent_id).await?
        } else {
            None
        };

        if let Some(transaction) = failed {
            tracing::info!(transaction_id = %transaction.id, "Marked pending top-up as failed");
        }
    } else {
        tracing::debug!(event_type = %event.event_type, "Ignoring webhook event type");
    }

    Ok(StatusCode::OK)
}

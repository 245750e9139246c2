//! HTTP handlers for phone number provisioning endpoints.
//!
//! The purchase flow is wallet-gated: funds are checked before the carrier is
//! asked for anything, and the final debit + number record + ledger row commit
//! in one database transaction. A guarded debit backs up the early funds check
//! under concurrency; if the local commit fails after the carrier purchase
//! succeeded, the carrier number is released best-effort.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;

use crate::{
    AppState,
    api::models::{
        numbers::{NumberListResponse, NumberResponse, PurchaseNumberRequest, SearchNumbersRequest, UpdateNumberRequest},
        pagination::PaginationQuery,
        users::CurrentUser,
    },
    db::{
        errors::DbError,
        handlers::{Numbers, Repository, Transactions, Wallets, numbers::NumberFilter},
        models::{
            numbers::{NumberCreateDBRequest, NumberDBResponse, NumberUpdateDBRequest},
            transactions::{TransactionCreateDBRequest, TransactionStatus, TransactionType},
        },
    },
    errors::{Error, Result},
    telephony::{AvailableNumber, NumberSearch},
    types::{Currency, NumberId},
};

const MAX_SEARCH_RESULTS: u32 = 30;

/// Search numbers available for purchase at the carrier
#[utoipa::path(
    post,
    path = "/search",
    tag = "numbers",
    summary = "Search available phone numbers",
    request_body = SearchNumbersRequest,
    responses(
        (status = 200, description = "Available numbers", body = Vec<AvailableNumber>),
        (status = 401, description = "Not authenticated"),
        (status = 503, description = "No telephony provider configured"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn search_numbers(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<SearchNumbersRequest>,
) -> Result<Json<Vec<AvailableNumber>>> {
    let provider = state.telephony.as_ref().ok_or(Error::NotConfigured { service: "Telephony" })?;

    let search = NumberSearch {
        country: request.country,
        area_code: request.area_code,
        number_type: request.number_type,
        limit: request.limit.clamp(1, MAX_SEARCH_RESULTS),
    };

    let numbers = provider.search_available(&search).await?;
    Ok(Json(numbers))
}

/// List the authenticated user's provisioned numbers
#[utoipa::path(
    get,
    path = "",
    tag = "numbers",
    summary = "List owned phone numbers",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Owned numbers", body = NumberListResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_numbers(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<NumberListResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut numbers = Numbers::new(&mut conn);

    let filter = NumberFilter {
        user_id: Some(user.id),
        skip: pagination.skip(),
        limit: pagination.limit(),
    };

    let page = numbers.list(&filter).await?;
    let total = numbers.count_for_user(user.id).await?;

    Ok(Json(NumberListResponse {
        numbers: page.into_iter().map(NumberResponse::from).collect(),
        total,
    }))
}

/// Purchase a phone number, paying from the wallet
#[utoipa::path(
    post,
    path = "/purchase",
    tag = "numbers",
    summary = "Purchase a phone number",
    request_body = PurchaseNumberRequest,
    responses(
        (status = 200, description = "Number purchased", body = NumberResponse),
        (status = 401, description = "Not authenticated"),
        (status = 402, description = "Insufficient wallet balance"),
        (status = 502, description = "Carrier rejected the purchase"),
        (status = 503, description = "No telephony provider configured"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id, phone_number = %request.phone_number))]
pub async fn purchase_number(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<PurchaseNumberRequest>,
) -> Result<Json<NumberResponse>> {
    let provider = state.telephony.as_ref().ok_or(Error::NotConfigured { service: "Telephony" })?;

    // Carrier billing is in USD
    let currency = Currency::Usd;
    let monthly_cost = provider.monthly_cost(&request.country, request.number_type).await?;

    // Funds check before any carrier call: an underfunded purchase must not
    // provision anything. The guarded debit below remains the authoritative
    // check at commit time.
    {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut wallets = Wallets::new(&mut conn);
        if !wallets.has_sufficient(user.id, monthly_cost, currency).await? {
            let available = wallets
                .get_by_user(user.id)
                .await?
                .map(|w| w.balance(currency))
                .unwrap_or(Decimal::ZERO);
            return Err(Error::InsufficientBalance {
                currency,
                required: monthly_cost,
                available,
            });
        }
    }

    let provisioned = provider.purchase_number(&request.phone_number, None).await?;

    let committed: Result<NumberDBResponse> = async {
        let mut tx = state.db.begin().await.map_err(DbError::from)?;

        let wallet = match Wallets::new(&mut tx).debit(user.id, monthly_cost, currency).await? {
            Some(wallet) => wallet,
            None => {
                // Balance moved between the early check and the debit; report
                // what is actually left, not zero
                let available = Wallets::new(&mut tx)
                    .get_by_user(user.id)
                    .await?
                    .map(|w| w.balance(currency))
                    .unwrap_or(Decimal::ZERO);
                return Err(Error::InsufficientBalance {
                    currency,
                    required: monthly_cost,
                    available,
                });
            }
        };

        let number = Numbers::new(&mut tx)
            .create(&NumberCreateDBRequest {
                business_id: None,
                user_id: Some(user.id),
                phone_number: provisioned.phone_number.clone(),
                display_name: request.display_name.clone(),
                country_code: request.country.clone(),
                number_type: request.number_type,
                monthly_cost,
                currency,
                provider_sid: Some(provisioned.sid.clone()),
                voice_webhook_url: None,
                voice_enabled: true,
                sms_enabled: true,
            })
            .await?;

        Transactions::new(&mut tx)
            .create(&TransactionCreateDBRequest {
                user_id: user.id,
                wallet_id: wallet.id,
                transaction_type: TransactionType::Debit,
                amount: monthly_cost,
                currency,
                status: TransactionStatus::Completed,
                description: Some(format!("Purchased phone number {}", number.phone_number)),
                checkout_session_id: None,
                payment_intent_id: None,
                number_id: Some(number.id),
            })
            .await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(number)
    }
    .await;

    match committed {
        Ok(number) => {
            tracing::info!(number_id = %number.id, "Purchased number {}", number.phone_number);
            Ok(Json(number.into()))
        }
        Err(e) => {
            // The carrier purchase went through but the local commit did not:
            // release the number so the user is not left paying for something
            // we have no record of.
            tracing::error!("Local commit failed after carrier purchase, releasing {}: {e}", provisioned.sid);
            if let Err(release_err) = provider.release_number(&provisioned.sid).await {
                tracing::error!("Failed to release number {} at carrier: {release_err}", provisioned.sid);
            }
            Err(e)
        }
    }
}

/// Update a provisioned number's settings
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "numbers",
    summary = "Update a phone number",
    params(("id" = String, Path, description = "Number ID")),
    request_body = UpdateNumberRequest,
    responses(
        (status = 200, description = "Number updated", body = NumberResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Number not found or not owned by the caller"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id, number_id = %id))]
pub async fn update_number(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<NumberId>,
    Json(request): Json<UpdateNumberRequest>,
) -> Result<Json<NumberResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut numbers = Numbers::new(&mut conn);

    numbers.get_owned(id, user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Phone number".to_string(),
        id: id.to_string(),
    })?;

    let number = numbers
        .update(
            id,
            &NumberUpdateDBRequest {
                display_name: request.display_name,
                is_primary: request.is_primary,
                is_active: request.is_active,
            },
        )
        .await?;

    Ok(Json(number.into()))
}

/// Release a provisioned number
///
/// The local record is deleted first; the carrier release is best-effort
/// afterwards. A number the carrier no longer knows about still releases
/// successfully.
#[utoipa::path(
    post,
    path = "/{id}/release",
    tag = "numbers",
    summary = "Release a phone number",
    params(("id" = String, Path, description = "Number ID")),
    responses(
        (status = 204, description = "Number released"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Number not found or not owned by the caller"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id, number_id = %id))]
pub async fn release_number(State(state): State<AppState>, user: CurrentUser, Path(id): Path<NumberId>) -> Result<StatusCode> {
    let number = {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut numbers = Numbers::new(&mut conn);

        let number = numbers.get_owned(id, user.id).await?.ok_or_else(|| Error::NotFound {
            resource: "Phone number".to_string(),
            id: id.to_string(),
        })?;

        numbers.delete(id).await?;
        number
    };

    if let Some(provider_sid) = &number.provider_sid {
        if let Some(provider) = state.telephony.as_ref() {
            if let Err(e) = provider.release_number(provider_sid).await {
                // Local state is authoritative; the carrier release is retried
                // out of band if it keeps failing
                tracing::warn!("Carrier release of {} failed: {e}", provider_sid);
            }
        }
    }

    tracing::info!("Released number {}", number.phone_number);
    Ok(StatusCode::NO_CONTENT)
}

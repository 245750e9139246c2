//! HTTP handlers for wallet balance and ledger endpoints.

use axum::{Json, extract::Query, extract::State};

use crate::{
    AppState,
    api::models::{
        pagination::PaginationQuery,
        transactions::{TransactionListResponse, TransactionResponse},
        users::CurrentUser,
        wallets::BalanceResponse,
    },
    db::{
        errors::DbError,
        handlers::{Transactions, Wallets, transactions::TransactionFilter},
    },
    errors::Result,
};

/// Get the authenticated user's wallet balances
///
/// The wallet is created lazily on first access with zero balances.
#[utoipa::path(
    get,
    path = "/balance",
    tag = "wallet",
    summary = "Get wallet balance",
    responses(
        (status = 200, description = "Current wallet balances", body = BalanceResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_balance(State(state): State<AppState>, user: CurrentUser) -> Result<Json<BalanceResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let wallet = Wallets::new(&mut conn).get_or_create(user.id).await?;

    Ok(Json(wallet.into()))
}

/// List the authenticated user's ledger transactions, newest first
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "wallet",
    summary = "List wallet transactions",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of ledger transactions", body = TransactionListResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_transactions(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<TransactionListResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut transactions = Transactions::new(&mut conn);

    let filter = TransactionFilter {
        user_id: user.id,
        skip: pagination.skip(),
        limit: pagination.limit(),
    };

    let page = transactions.list(&filter).await?;
    let total = transactions.count_for_user(user.id).await?;

    Ok(Json(TransactionListResponse {
        transactions: page.into_iter().map(TransactionResponse::from).collect(),
        total,
    }))
}

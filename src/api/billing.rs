//! Billing API endpoints: receipts, payments and standing reports

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        client::Client,
        receipt::{
            Delinquent, GenerateReceipts, GenerationSummary, PaymentOutcome, PendingQuery,
            Receipt, ReceiptDetails, ReceiptQuery, StandingQuery,
        },
    },
    AppState,
};

use super::AuthenticatedUser;

/// List receipts, optionally for one month
#[utoipa::path(
    get,
    path = "/receipts",
    tag = "billing",
    security(("bearer_auth" = [])),
    params(ReceiptQuery),
    responses(
        (status = 200, description = "Receipts", body = Vec<ReceiptDetails>),
        (status = 400, description = "Invalid period")
    )
)]
pub async fn list_receipts(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReceiptQuery>,
) -> AppResult<Json<Vec<ReceiptDetails>>> {
    claims.require_staff()?;
    let period = query.period()?;
    let receipts = state.services.billing.list_receipts(period).await?;
    Ok(Json(receipts))
}

/// Issue the month's receipts for every active client
#[utoipa::path(
    post,
    path = "/receipts/generate",
    tag = "billing",
    security(("bearer_auth" = [])),
    request_body = GenerateReceipts,
    responses(
        (status = 201, description = "Generation summary; `created` may be 0 on a re-run", body = GenerationSummary),
        (status = 400, description = "Invalid period or amount")
    )
)]
pub async fn generate_receipts(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<GenerateReceipts>,
) -> AppResult<(StatusCode, Json<GenerationSummary>)> {
    claims.require_staff()?;
    let summary = state.services.billing.generate(&request).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Record a receipt payment
#[utoipa::path(
    post,
    path = "/receipts/{id}/pay",
    tag = "billing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Receipt ID")),
    responses(
        (status = 200, description = "Payment recorded; a repeat carries `already_paid` and a warning", body = PaymentOutcome),
        (status = 404, description = "Receipt not found")
    )
)]
pub async fn pay_receipt(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PaymentOutcome>> {
    claims.require_staff()?;
    let outcome = state.services.billing.record_payment(id).await?;
    Ok(Json(outcome))
}

/// Unpaid receipts, for everyone or one client
#[utoipa::path(
    get,
    path = "/receipts/pending",
    tag = "billing",
    security(("bearer_auth" = [])),
    params(PendingQuery),
    responses(
        (status = 200, description = "Unpaid receipts", body = Vec<ReceiptDetails>),
        (status = 404, description = "Client not found")
    )
)]
pub async fn pending_receipts(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PendingQuery>,
) -> AppResult<Json<Vec<ReceiptDetails>>> {
    let client_id = claims.scope_client(query.client_id)?;
    let receipts = state.services.billing.pending(client_id).await?;
    Ok(Json(receipts))
}

/// Receipt history of one client
#[utoipa::path(
    get,
    path = "/clients/{id}/receipts",
    tag = "billing",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Receipts, newest period first", body = Vec<Receipt>),
        (status = 404, description = "Client not found")
    )
)]
pub async fn client_receipts(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Receipt>>> {
    claims.require_client_access(id)?;
    let receipts = state.services.billing.client_receipts(id).await?;
    Ok(Json(receipts))
}

/// Active clients with unpaid receipts, biggest debt first
#[utoipa::path(
    get,
    path = "/billing/delinquents",
    tag = "billing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Delinquent clients", body = Vec<Delinquent>)
    )
)]
pub async fn delinquents(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Delinquent>>> {
    claims.require_staff()?;
    let rows = state.services.billing.delinquents().await?;
    Ok(Json(rows))
}

/// Clients in good standing.
///
/// With `month` and `year`: paid that period's receipt. Without: owe nothing at all.
#[utoipa::path(
    get,
    path = "/billing/good-standing",
    tag = "billing",
    security(("bearer_auth" = [])),
    params(StandingQuery),
    responses(
        (status = 200, description = "Clients ordered by surname then name", body = Vec<Client>),
        (status = 400, description = "Only one of month/year given, or invalid period")
    )
)]
pub async fn good_standing(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<StandingQuery>,
) -> AppResult<Json<Vec<Client>>> {
    claims.require_staff()?;
    let mode = query.mode()?;
    let clients = state.services.billing.good_standing(mode).await?;
    Ok(Json(clients))
}

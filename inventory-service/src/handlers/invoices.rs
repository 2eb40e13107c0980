use crate::dtos::{
    CreateInvoiceRequest, InvoiceListParams, InvoiceResponse, InvoiceStatsResponse,
    MessageResponse, UpdateInvoiceStatusRequest,
};
use crate::middleware::CurrentUser;
use crate::models::{Invoice, InvoiceStatus};
use crate::services::{InvoiceFilter, OwnerScope};
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

async fn with_branches(
    state: &AppState,
    scope: &OwnerScope,
    invoices: Vec<Invoice>,
) -> Result<Vec<InvoiceResponse>, AppError> {
    let ids: Vec<&str> = invoices.iter().map(|i| i.branch_id.as_str()).collect();
    let branches = state.branches.lookup(scope, &ids).await?;
    Ok(invoices
        .into_iter()
        .map(|invoice| {
            let branch = branches.get(&invoice.branch_id).cloned();
            InvoiceResponse::new(invoice, branch)
        })
        .collect())
}

async fn respond(
    state: &AppState,
    scope: &OwnerScope,
    invoice: Invoice,
) -> Result<InvoiceResponse, AppError> {
    with_branches(state, scope, vec![invoice])
        .await?
        .pop()
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Invoice response lost")))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<InvoiceListParams>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let status = params
        .status
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<InvoiceStatus>())
        .transpose()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;
    let filter = InvoiceFilter {
        branch_id: params.branch.filter(|b| !b.trim().is_empty()),
        status,
    };

    let invoices = state.invoices.list(&user.scope, &filter).await?;
    Ok(Json(with_branches(&state, &user.scope, invoices).await?))
}

pub async fn invoice_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<InvoiceStatsResponse>>, AppError> {
    let stats = state.invoices.stats(&user.scope).await?;
    Ok(Json(stats.into_iter().map(InvoiceStatsResponse::from).collect()))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.invoices.get(&user.scope, &id).await?;
    Ok(Json(respond(&state, &user.scope, invoice).await?))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    let invoice = state.invoices.create(&user.scope, req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(respond(&state, &user.scope, invoice).await?),
    ))
}

pub async fn update_invoice_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateInvoiceStatusRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .invoices
        .update_status(&user.scope, &id, req.status)
        .await?;
    Ok(Json(respond(&state, &user.scope, invoice).await?))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.invoices.delete(&user.scope, &id).await?;
    Ok(Json(MessageResponse::new("Invoice deleted successfully")))
}

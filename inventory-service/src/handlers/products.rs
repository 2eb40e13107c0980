use crate::dtos::{
    CreateProductRequest, MessageResponse, ProductResponse, ProductSearchParams,
    UpdateProductRequest, UpdateProductStatusRequest,
};
use crate::middleware::CurrentUser;
use crate::models::StockStatus;
use crate::services::ProductQuery;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn list_products(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let products = state.products.list(&user.scope).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

pub async fn search_products(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ProductSearchParams>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    let status = non_empty(params.status)
        .map(|s| s.parse::<StockStatus>())
        .transpose()
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;

    let query = ProductQuery {
        text: non_empty(params.query),
        category_id: non_empty(params.category),
        status,
        branch_id: non_empty(params.branch),
    };
    let products = state.products.search(&user.scope, &query).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

pub async fn get_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state.products.get(&user.scope, &id).await?;
    Ok(Json(product.into()))
}

pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let product = state.products.create(&user.scope, req.into()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state.products.update(&user.scope, &id, req.into()).await?;
    Ok(Json(product.into()))
}

pub async fn update_product_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateProductStatusRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state
        .products
        .update_status(&user.scope, &id, req.status)
        .await?;
    Ok(Json(product.into()))
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.products.delete(&user.scope, &id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

use crate::dtos::{CategoryResponse, CreateCategoryRequest, MessageResponse, UpdateCategoryRequest};
use crate::middleware::CurrentUser;
use crate::services::CategoryChanges;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

pub async fn list_categories(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = state.categories.list(&user.scope, false).await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

pub async fn list_active_categories(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = state.categories.list(&user.scope, true).await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

pub async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let category = state
        .categories
        .create(&user.scope, &req.name, req.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

pub async fn update_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    let changes = CategoryChanges {
        name: req.name,
        description: req.description,
        is_active: req.is_active,
    };
    let category = state.categories.update(&user.scope, &id, changes).await?;
    Ok(Json(category.into()))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.categories.delete(&user.scope, &id).await?;
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

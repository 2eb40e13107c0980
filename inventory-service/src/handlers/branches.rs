use crate::dtos::{BranchResponse, CreateBranchRequest, MessageResponse, UpdateBranchRequest};
use crate::middleware::CurrentUser;
use crate::services::BranchChanges;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

pub async fn list_branches(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<BranchResponse>>, AppError> {
    let branches = state.branches.list(&user.scope, false).await?;
    Ok(Json(branches.into_iter().map(BranchResponse::from).collect()))
}

pub async fn list_active_branches(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<BranchResponse>>, AppError> {
    let branches = state.branches.list(&user.scope, true).await?;
    Ok(Json(branches.into_iter().map(BranchResponse::from).collect()))
}

pub async fn get_branch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<BranchResponse>, AppError> {
    let branch = state.branches.get(&user.scope, &id).await?;
    Ok(Json(branch.into()))
}

pub async fn create_branch(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateBranchRequest>,
) -> Result<(StatusCode, Json<BranchResponse>), AppError> {
    let branch = state
        .branches
        .create(&user.scope, &req.name, &req.location)
        .await?;
    Ok((StatusCode::CREATED, Json(branch.into())))
}

pub async fn update_branch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateBranchRequest>,
) -> Result<Json<BranchResponse>, AppError> {
    let changes = BranchChanges {
        name: req.name,
        location: req.location,
        is_active: req.is_active,
    };
    let branch = state.branches.update(&user.scope, &id, changes).await?;
    Ok(Json(branch.into()))
}

pub async fn delete_branch(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.branches.delete(&user.scope, &id).await?;
    Ok(Json(MessageResponse::new("Branch deleted successfully")))
}

use crate::dtos::{AuthResponse, SigninRequest, SignupRequest};
use crate::services::auth::Session;
use crate::startup::AppState;
use crate::utils::{Password, ValidatedJson};
use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;

fn respond(state: &AppState, session: Session) -> AuthResponse {
    AuthResponse {
        token: session.token,
        expires_in: state.auth.jwt().expiry_seconds(),
        user: session.user.into(),
    }
}

pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let session = state
        .auth
        .signup(&req.name, &req.email, &Password::new(req.password))
        .await?;
    Ok((StatusCode::CREATED, Json(respond(&state, session))))
}

pub async fn signin(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SigninRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let session = state
        .auth
        .signin(&req.email, &Password::new(req.password))
        .await?;
    Ok(Json(respond(&state, session)))
}

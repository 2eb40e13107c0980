use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use service_core::error::AppError;

use crate::services::{InventoryError, OwnerScope};
use crate::startup::AppState;

/// Rejects requests without a valid bearer token for an existing user and
/// attaches the caller's [`CurrentUser`] to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("No token, authorization denied")))?;

    let claims = state.auth.jwt().validate_token(bearer.token()).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized(anyhow::anyhow!("Token is not valid"))
    })?;

    let user = state.auth.resolve(&claims).await.map_err(|e| match e {
        InventoryError::UnknownUser => {
            tracing::warn!(user_id = %claims.sub, "Token issued to a user that no longer exists");
            AppError::Unauthorized(anyhow::anyhow!("Token is not valid"))
        }
        other => AppError::from(other),
    })?;

    tracing::Span::current().record("user_id", user.id.as_str());

    req.extensions_mut().insert(CurrentUser {
        scope: OwnerScope::new(user.id.clone()),
        id: user.id,
        email: user.email,
    });

    Ok(next.run(req).await)
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub scope: OwnerScope,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CurrentUser>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Current user missing from request extensions"
            ))
        })
    }
}

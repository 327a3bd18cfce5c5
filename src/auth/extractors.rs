use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{auth::jwt::JwtKeys, auth::repo::User, error::AppError, state::AppState};

/// Extracts the bearer token, verifies it, and resolves the subject to
/// a user row. Handlers taking this are authenticated routes.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::InvalidToken)?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AppError::InvalidToken)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::InvalidToken
        })?;

        // Stale-token case: subject may have been removed after issuance.
        let user = User::find_by_email(&state.db, &claims.sub)
            .await
            .map_err(AppError::Internal)?
            .ok_or_else(|| {
                warn!(subject = %claims.sub, "token subject no longer exists");
                AppError::InvalidToken
            })?;

        Ok(CurrentUser(user))
    }
}

//! Request extractors for admin authentication.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::identity::SessionUser;
use crate::state::AppState;

/// Raw bearer token from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Malformed Authorization header".to_string()))?;

        Ok(BearerToken(token.to_string()))
    }
}

/// A bearer token the identity provider accepted.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub user: SessionUser,
    pub access_token: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(access_token) = BearerToken::from_request_parts(parts, state).await?;
        let user = state.identity.get_user(&access_token).await?;
        Ok(AdminSession { user, access_token })
    }
}

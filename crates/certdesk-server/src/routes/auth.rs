//! Admin login, logout and session endpoints.

use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::{AdminSession, BearerToken};
use crate::identity::{begin_session, end_session, Session, SessionUser};
use crate::state::AppState;

/// Request body for signing in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Creates the auth router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(current_session))
        .with_state(state)
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>, AppError> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let session =
        begin_session(state.identity.as_ref(), &state.sessions, email, &request.password).await?;
    Ok(Json(session))
}

/// POST /api/v1/auth/logout
///
/// Succeeds when the provider has already forgotten the session.
async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<LogoutResponse>, AppError> {
    end_session(state.identity.as_ref(), &state.sessions, &token).await?;
    Ok(Json(LogoutResponse {
        message: "Signed out".to_string(),
    }))
}

/// GET /api/v1/auth/session
async fn current_session(session: AdminSession) -> Json<SessionUser> {
    Json(session.user)
}

//! Institution settings endpoints.

use axum::{extract::State, routing::get, Json, Router};

use crate::error::AppError;
use crate::extract::AdminSession;
use crate::models::{ConfigUpdate, InstitutionConfig};
use crate::state::AppState;
use crate::storage;

/// Creates the config router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_config).put(update_config))
        .with_state(state)
}

/// GET /api/v1/config
async fn show_config(State(state): State<AppState>) -> Json<InstitutionConfig> {
    Json(storage::fetch_config(&state.pool).await)
}

/// PUT /api/v1/config
///
/// Fields left out of the body keep their current value.
async fn update_config(
    State(state): State<AppState>,
    admin: AdminSession,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<InstitutionConfig>, AppError> {
    let current = storage::fetch_config(&state.pool).await;
    let config = current.merged(&update);
    config.check().map_err(AppError::BadRequest)?;

    let saved = storage::update_config(&state.pool, &config).await?;

    tracing::info!(admin = %admin.user.username, "Institution config updated");
    Ok(Json(saved))
}

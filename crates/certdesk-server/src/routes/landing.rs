//! Landing endpoint and the printed validation link.
//!
//! Certificates carry `<origin>/?validate=<code>`; that link lands here and
//! is forwarded to the public search with the code applied.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::percent_encode;
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Deserialize)]
pub struct LandingQuery {
    #[serde(default)]
    pub validate: Option<String>,
}

/// What the landing page shows.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingResponse {
    pub institution_name: String,
    pub logo_url: String,
    pub primary_color: String,
    pub secondary_color: String,
    /// Where students look up their certificates.
    pub public_search: String,
    pub admin_login: String,
}

/// Creates the landing router.
pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(landing)).with_state(state)
}

/// GET /
///
/// `?validate=<code>` redirects (303) to the public search for that code.
async fn landing(State(state): State<AppState>, Query(query): Query<LandingQuery>) -> Response {
    if let Some(code) = query.validate.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        let target = format!("/api/v1/public/certificates?code={}", percent_encode(code));
        return Redirect::to(&target).into_response();
    }

    let config = storage::fetch_config(&state.pool).await;
    Json(LandingResponse {
        institution_name: config.institution_name,
        logo_url: config.logo_url,
        primary_color: config.primary_color,
        secondary_color: config.secondary_color,
        public_search: "/api/v1/public/certificates?identification=".to_string(),
        admin_login: "/api/v1/auth/login".to_string(),
    })
    .into_response()
}

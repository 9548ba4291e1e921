//! Public certificate search and download. No authentication.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::pdf_response;
use crate::error::AppError;
use crate::issuance;
use crate::models::{Certificate, PublicCertificate};
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Default, Deserialize)]
pub struct PublicSearchQuery {
    #[serde(default)]
    pub identification: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicSearchResponse {
    pub count: usize,
    pub certificates: Vec<PublicCertificate>,
}

/// Creates the public router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/certificates", get(search))
        .route("/certificates/{code}/pdf", get(download))
        .with_state(state)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// GET /api/v1/public/certificates?identification=&code=
///
/// Identification matches as a case-insensitive substring; a code must
/// match exactly. Both together narrow the code match by identification.
async fn search(
    State(state): State<AppState>,
    Query(query): Query<PublicSearchQuery>,
) -> Result<Json<PublicSearchResponse>, AppError> {
    let identification = non_blank(&query.identification);
    let code = non_blank(&query.code);

    let found: Vec<Certificate> = match (identification, code) {
        (None, None) => {
            return Err(AppError::BadRequest(
                "Enter an identification number or a certificate code".to_string(),
            ))
        }
        (identification, Some(code)) => {
            let certificate = storage::find_by_code(&state.pool, code).await?;
            certificate
                .into_iter()
                .filter(|c| {
                    identification.map_or(true, |id| {
                        c.identification.to_lowercase().contains(&id.to_lowercase())
                    })
                })
                .collect()
        }
        (Some(identification), None) => {
            storage::search_by_identification(&state.pool, identification).await
        }
    };

    let config = storage::fetch_config(&state.pool).await;
    let certificates: Vec<PublicCertificate> =
        found.iter().map(|c| c.to_public(&config)).collect();

    Ok(Json(PublicSearchResponse {
        count: certificates.len(),
        certificates,
    }))
}

/// GET /api/v1/public/certificates/{code}/pdf
async fn download(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let document = issuance::render_by_code(&state, &code).await?;
    Ok(pdf_response(document))
}

//! Admin certificate endpoints: issue, history and download.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use certdesk_core::CertificateForm;
use serde::{Deserialize, Serialize};

use super::{pdf_response, percent_encode};
use crate::email::EmailOutcome;
use crate::error::AppError;
use crate::extract::AdminSession;
use crate::issuance;
use crate::models::Certificate;
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Response for a newly issued certificate.
///
/// `downloadUrl` and `fileName` let the client save the PDF right away.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub certificate: Certificate,
    pub file_name: String,
    pub download_url: String,
    pub email: EmailOutcome,
}

/// Creates the certificates router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(history).post(issue))
        .route("/{code}/pdf", get(download))
        .with_state(state)
}

/// POST /api/v1/certificates
async fn issue(
    State(state): State<AppState>,
    admin: AdminSession,
    Json(form): Json<CertificateForm>,
) -> Result<(StatusCode, Json<IssueResponse>), AppError> {
    tracing::debug!(admin = %admin.user.username, "Issuing certificate");

    let issued = issuance::issue_certificate(&state, form).await?;
    let download_url = format!(
        "/api/v1/certificates/{}/pdf",
        percent_encode(&issued.certificate.unique_code)
    );

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            file_name: issued.document.file_name().to_string(),
            certificate: issued.certificate,
            download_url,
            email: issued.email,
        }),
    ))
}

/// GET /api/v1/certificates?q=
async fn history(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<Certificate>> {
    let term = query.q.unwrap_or_default();
    Json(storage::search_certificates(&state.pool, &term).await)
}

/// GET /api/v1/certificates/{code}/pdf
async fn download(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let document = issuance::render_by_code(&state, &code).await?;
    Ok(pdf_response(document))
}

//! API routes for the certdesk server.

pub mod auth;
pub mod certificates;
pub mod config;
pub mod courses;
pub mod landing;
pub mod public;

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Router;
use certdesk_core::CertificateDocument;

use crate::state::AppState;

/// Creates the main router: landing page at the root, API under `/api/v1`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(landing::router(state.clone()))
        .nest("/api/v1", api_v1_routes(state))
}

/// Creates the v1 API routes.
fn api_v1_routes(state: AppState) -> Router {
    Router::new()
        .merge(landing::router(state.clone()))
        .nest("/auth", auth::router(state.clone()))
        .nest("/certificates", certificates::router(state.clone()))
        .nest("/courses", courses::router(state.clone()))
        .nest("/config", config::router(state.clone()))
        .nest("/public", public::router(state))
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub(crate) fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// `Content-Disposition` for a download, with an ASCII fallback name and
/// the exact UTF-8 name in `filename*`.
pub(crate) fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        percent_encode(file_name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Responds with a PDF download.
pub(crate) fn pdf_response(document: CertificateDocument) -> Response {
    let disposition = content_disposition(document.file_name());
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.into_bytes(),
    )
        .into_response()
}

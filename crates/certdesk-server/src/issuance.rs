//! Certificate issuance and re-rendering.
//!
//! Issuance runs validate, duplicate guard, code, insert, asset fetch,
//! render and email in that order. Nothing is written when validation or
//! the duplicate guard fails.

use certdesk_core::{
    generate_unique_code, render_certificate, CertificateDocument, CertificateForm,
};
use chrono::Utc;
use tracing::{error, info};

use crate::email::{CertificateMail, EmailOutcome};
use crate::error::AppError;
use crate::models::{Certificate, InstitutionConfig, NewCertificate};
use crate::state::AppState;
use crate::storage;

/// A freshly issued certificate.
#[derive(Debug)]
pub struct Issued {
    pub certificate: Certificate,
    pub document: CertificateDocument,
    pub email: EmailOutcome,
}

/// Issues a certificate from a submitted form.
pub async fn issue_certificate(
    state: &AppState,
    form: CertificateForm,
) -> Result<Issued, AppError> {
    form.validate()?;
    let form = form.normalized();

    let exists = storage::certificate_exists(&state.pool, &form.identification, &form.course)
        .await?;
    if exists {
        return Err(AppError::Conflict(format!(
            "A certificate for course '{}' already exists for identification {}",
            form.course, form.identification
        )));
    }

    let config = storage::fetch_config(&state.pool).await;

    let new = NewCertificate {
        names: form.names,
        surnames: form.surnames,
        identification: form.identification,
        email: form.email,
        phone: form.phone,
        course: form.course,
        issue_date: form.issue_date.unwrap_or_else(|| Utc::now().date_naive()),
        unique_code: generate_unique_code(),
        snapshot: config.clone(),
    };

    let certificate = storage::insert_certificate(&state.pool, &new).await?;

    let document = render(state, &certificate, &config).await?;

    let mail = CertificateMail::from(&certificate.payload());
    let email = match state
        .mailer
        .send(&certificate.email, &mail, document.to_bytes())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(code = %certificate.unique_code, "Failed to email certificate: {}", e);
            EmailOutcome::failed(format!(
                "Certificate issued, but the email could not be sent: {}",
                e
            ))
        }
    };

    info!(
        code = %certificate.unique_code,
        course = %certificate.course,
        emailed = email.success,
        "Certificate issued"
    );

    Ok(Issued {
        certificate,
        document,
        email,
    })
}

/// Renders a stored certificate, preferring its issue-time branding.
pub async fn render(
    state: &AppState,
    certificate: &Certificate,
    current: &InstitutionConfig,
) -> Result<CertificateDocument, AppError> {
    let branding = certificate.branding(current);
    let assets = state.assets.fetch_assets(&branding).await;
    let payload = certificate.payload();
    let layout = state.layout.clone();
    let origin = state.public_base_url.clone();

    tokio::task::spawn_blocking(move || {
        render_certificate(&payload, &branding, &assets, &layout, &origin)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Render task failed: {}", e)))?
    .map_err(|e| AppError::Internal(format!("Failed to render certificate: {}", e)))
}

/// Looks up a certificate by code and renders it for download.
pub async fn render_by_code(state: &AppState, code: &str) -> Result<CertificateDocument, AppError> {
    let certificate = storage::find_by_code(&state.pool, code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No certificate with code {}", code.trim())))?;

    let current = storage::fetch_config(&state.pool).await;
    render(state, &certificate, &current).await
}

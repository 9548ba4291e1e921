//! Type definitions shared by the certdesk server and CLI.
//!
//! These are the payloads that flow between the issuance form, the
//! renderer and the mailer. Storage rows live in the server crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default institution name when no config row exists.
pub const DEFAULT_INSTITUTION_NAME: &str = "Instituto Predeterminado";
/// Default primary color (dark blue).
pub const DEFAULT_PRIMARY_COLOR: &str = "#003366";
/// Default secondary color (off-white).
pub const DEFAULT_SECONDARY_COLOR: &str = "#f8fafc";

/// Data printed on a certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePayload {
    /// Given names of the student
    pub names: String,
    /// Surnames of the student
    pub surnames: String,
    /// Course name as printed
    pub course: String,
    /// Date the certificate is issued
    pub issue_date: NaiveDate,
    /// Unique verification code (CERT-xxxxxx-XXXXXX)
    pub code: String,
}

impl CertificatePayload {
    /// Full name as "<names> <surnames>".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.names.trim(), self.surnames.trim())
    }

    /// File name used for downloads and email attachments.
    pub fn file_name(&self) -> String {
        certificate_file_name(&self.names, &self.surnames)
    }
}

/// Builds `Certificado_<names>_<surnames>.pdf`.
pub fn certificate_file_name(names: &str, surnames: &str) -> String {
    format!("Certificado_{}_{}.pdf", names.trim(), surnames.trim())
}

/// Reduces `name` to a single file name safe to join onto a directory.
///
/// Path separators and control characters become `_`. Returns `None` when
/// nothing usable is left.
pub fn safe_file_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return None;
    }
    Some(cleaned.to_string())
}

/// Institution branding applied to a rendered certificate.
///
/// Empty URLs mean "no image".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub institution_name: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub signature_url: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
}

fn default_primary_color() -> String {
    DEFAULT_PRIMARY_COLOR.to_string()
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            institution_name: DEFAULT_INSTITUTION_NAME.to_string(),
            logo_url: String::new(),
            signature_url: String::new(),
            primary_color: default_primary_color(),
        }
    }
}

impl Branding {
    /// Logo URL if one is configured.
    pub fn logo(&self) -> Option<&str> {
        non_empty(&self.logo_url)
    }

    /// Signature URL if one is configured.
    pub fn signature(&self) -> Option<&str> {
        non_empty(&self.signature_url)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

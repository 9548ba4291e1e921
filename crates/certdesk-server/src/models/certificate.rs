//! Certificate model for issued certificates.

use certdesk_core::{Branding, CertificatePayload};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::institution_config::InstitutionConfig;

/// An issued certificate as stored, with the course name resolved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub names: String,
    pub surnames: String,
    /// National ID or similar document number.
    pub identification: String,
    pub email: String,
    pub phone: Option<String>,
    /// Soft reference; null once the course is deleted.
    pub course_id: Option<Uuid>,
    /// Joined course name, or the literal name stored at issue time.
    pub course: String,
    pub issue_date: NaiveDate,
    pub unique_code: String,
    pub created_at: DateTime<Utc>,
    pub config_institution_name: Option<String>,
    pub config_logo_url: Option<String>,
    pub config_signature_url: Option<String>,
    pub config_primary_color: Option<String>,
}

/// Data required to insert a certificate.
#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub names: String,
    pub surnames: String,
    pub identification: String,
    pub email: String,
    pub phone: Option<String>,
    pub course: String,
    pub issue_date: NaiveDate,
    pub unique_code: String,
    /// Config in effect at issue time.
    pub snapshot: InstitutionConfig,
}

/// What the public search exposes. Contact details are withheld.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicCertificate {
    pub names: String,
    pub surnames: String,
    pub identification: String,
    pub course: String,
    pub issue_date: NaiveDate,
    pub unique_code: String,
    pub institution_name: String,
}

impl Certificate {
    /// Data printed on the page.
    pub fn payload(&self) -> CertificatePayload {
        CertificatePayload {
            names: self.names.clone(),
            surnames: self.surnames.clone(),
            course: self.course.clone(),
            issue_date: self.issue_date,
            code: self.unique_code.clone(),
        }
    }

    /// Branding from the issue-time snapshot, field by field falling back
    /// to `current`.
    ///
    /// A blank name or color falls back. A blank image URL was recorded as
    /// "no image" and stays blank; only a missing one falls back.
    pub fn branding(&self, current: &InstitutionConfig) -> Branding {
        fn text_or_current(snapshot: &Option<String>, current: &str) -> String {
            match snapshot {
                Some(value) if !value.trim().is_empty() => value.clone(),
                _ => current.to_string(),
            }
        }

        fn image_or_current(snapshot: &Option<String>, current: &str) -> String {
            match snapshot {
                Some(value) => value.clone(),
                None => current.to_string(),
            }
        }

        Branding {
            institution_name: text_or_current(
                &self.config_institution_name,
                &current.institution_name,
            ),
            logo_url: image_or_current(&self.config_logo_url, &current.logo_url),
            signature_url: image_or_current(&self.config_signature_url, &current.signature_url),
            primary_color: text_or_current(&self.config_primary_color, &current.primary_color),
        }
    }

    pub fn to_public(&self, current: &InstitutionConfig) -> PublicCertificate {
        PublicCertificate {
            names: self.names.clone(),
            surnames: self.surnames.clone(),
            identification: self.identification.clone(),
            course: self.course.clone(),
            issue_date: self.issue_date,
            unique_code: self.unique_code.clone(),
            institution_name: self.branding(current).institution_name,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_certificate() -> Certificate {
    Certificate {
        id: Uuid::new_v4(),
        names: "Ana María".to_string(),
        surnames: "López".to_string(),
        identification: "1020304050".to_string(),
        email: "ana@example.com".to_string(),
        phone: Some("3001234567".to_string()),
        course_id: None,
        course: "Primeros Auxilios".to_string(),
        issue_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
        unique_code: "CERT-123456-ABC123".to_string(),
        created_at: Utc::now(),
        config_institution_name: Some("Academia Norte".to_string()),
        config_logo_url: None,
        config_signature_url: Some(String::new()),
        config_primary_color: Some("#aa0000".to_string()),
    }
}

//! Form validation for certificate issuance.
//!
//! Everything here runs before any network or database call.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Validation failures for the issuance form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Certificate issuance form as submitted by an admin.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertificateForm {
    #[serde(default)]
    pub names: String,
    #[serde(default)]
    pub surnames: String,
    #[serde(default)]
    pub identification: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub course: String,
    /// Defaults to today when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
}

impl CertificateForm {
    /// Checks required fields and the email format.
    pub fn validate(&self) -> Result<(), FormError> {
        let required = [
            ("names", &self.names),
            ("surnames", &self.surnames),
            ("identification", &self.identification),
            ("email", &self.email),
            ("course", &self.course),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }

        if !is_valid_email(self.email.trim()) {
            return Err(FormError::InvalidEmail(self.email.clone()));
        }

        Ok(())
    }

    /// Returns a copy with surrounding whitespace removed and an empty
    /// phone collapsed to `None`.
    pub fn normalized(&self) -> Self {
        Self {
            names: self.names.trim().to_string(),
            surnames: self.surnames.trim().to_string(),
            identification: self.identification.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            course: self.course.trim().to_string(),
            issue_date: self.issue_date,
        }
    }
}

/// Email check equivalent to `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
///
/// Exactly one `@`, a non-empty local part, and a domain with a dot that
/// has characters on both sides. No whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot + 1 < domain.len(),
        None => false,
    }
}

/// Validates a course name before it is stored.
pub fn validate_course_name(name: &str) -> Result<String, FormError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FormError::MissingFields(vec!["name"]));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CertificateForm {
        CertificateForm {
            names: "Ana".to_string(),
            surnames: "Pérez".to_string(),
            identification: "1020304050".to_string(),
            email: "ana@example.co".to_string(),
            phone: None,
            course: "Diplomado".to_string(),
            issue_date: None,
        }
    }

    #[test]
    fn test_email_accepts_minimal_address() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
    }

    #[test]
    fn test_email_rejects_malformed() {
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a@b.co@c.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@.co"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_valid_form_passes() {
        assert_eq!(form().validate(), Ok(()));
    }

    #[test]
    fn test_missing_fields_are_listed_in_order() {
        let mut f = form();
        f.names = "  ".to_string();
        f.course = String::new();
        assert_eq!(
            f.validate(),
            Err(FormError::MissingFields(vec!["names", "course"]))
        );
    }

    #[test]
    fn test_missing_fields_checked_before_email() {
        let mut f = form();
        f.email = "not-an-email".to_string();
        f.identification = String::new();
        assert_eq!(
            f.validate(),
            Err(FormError::MissingFields(vec!["identification"]))
        );
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut f = form();
        f.email = "a@b".to_string();
        assert!(matches!(f.validate(), Err(FormError::InvalidEmail(_))));
    }

    #[test]
    fn test_phone_is_optional() {
        let mut f = form();
        f.phone = Some("   ".to_string());
        assert!(f.validate().is_ok());
        assert_eq!(f.normalized().phone, None);
    }

    #[test]
    fn test_normalized_trims_fields() {
        let mut f = form();
        f.identification = " 123 ".to_string();
        f.course = " Diplomado ".to_string();
        let n = f.normalized();
        assert_eq!(n.identification, "123");
        assert_eq!(n.course, "Diplomado");
    }

    #[test]
    fn test_error_message_lists_fields() {
        let err = FormError::MissingFields(vec!["names", "email"]);
        assert_eq!(err.to_string(), "Missing required fields: names, email");
    }

    #[test]
    fn test_course_name_validation() {
        assert_eq!(validate_course_name("  Excel Avanzado "), Ok("Excel Avanzado".to_string()));
        assert!(validate_course_name("   ").is_err());
    }

    #[test]
    fn test_form_deserializes_with_missing_fields() {
        let f: CertificateForm = serde_json::from_str(r#"{"names":"Ana"}"#).unwrap();
        assert_eq!(f.names, "Ana");
        assert!(f.validate().is_err());
    }
}

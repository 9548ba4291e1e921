//! Institution configuration (singleton row `app_config.id = 1`).

use certdesk_core::color::parse_hex;
use certdesk_core::types::{
    DEFAULT_INSTITUTION_NAME, DEFAULT_PRIMARY_COLOR, DEFAULT_SECONDARY_COLOR,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Branding and identity of the issuing institution.
///
/// Missing fields deserialize to the documented defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionConfig {
    #[serde(default = "default_institution_name")]
    pub institution_name: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub signature_url: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
}

fn default_institution_name() -> String {
    DEFAULT_INSTITUTION_NAME.to_string()
}

fn default_primary_color() -> String {
    DEFAULT_PRIMARY_COLOR.to_string()
}

fn default_secondary_color() -> String {
    DEFAULT_SECONDARY_COLOR.to_string()
}

impl Default for InstitutionConfig {
    fn default() -> Self {
        Self {
            institution_name: default_institution_name(),
            logo_url: String::new(),
            signature_url: String::new(),
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
        }
    }
}

impl InstitutionConfig {
    /// Applies a partial update on top of this config.
    pub fn merged(&self, update: &ConfigUpdate) -> Self {
        let pick = |new: &Option<String>, old: &String| {
            new.as_ref().map(|v| v.trim().to_string()).unwrap_or_else(|| old.clone())
        };
        Self {
            institution_name: pick(&update.institution_name, &self.institution_name),
            logo_url: pick(&update.logo_url, &self.logo_url),
            signature_url: pick(&update.signature_url, &self.signature_url),
            primary_color: pick(&update.primary_color, &self.primary_color),
            secondary_color: pick(&update.secondary_color, &self.secondary_color),
        }
    }

    /// Rejects an empty institution name and malformed colors.
    pub fn check(&self) -> Result<(), String> {
        if self.institution_name.trim().is_empty() {
            return Err("Institution name cannot be empty".to_string());
        }
        for (field, value) in [
            ("primaryColor", &self.primary_color),
            ("secondaryColor", &self.secondary_color),
        ] {
            if parse_hex(value).is_none() {
                return Err(format!("{} must be a #rrggbb color, got '{}'", field, value));
            }
        }
        Ok(())
    }
}

/// Partial config update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InstitutionConfig::default();
        assert_eq!(config.institution_name, "Instituto Predeterminado");
        assert_eq!(config.logo_url, "");
        assert_eq!(config.signature_url, "");
        assert_eq!(config.primary_color, "#003366");
        assert_eq!(config.secondary_color, "#f8fafc");
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let config: InstitutionConfig =
            serde_json::from_str(r#"{"institutionName": "Academia Norte"}"#).unwrap();
        assert_eq!(config.institution_name, "Academia Norte");
        assert_eq!(config.primary_color, "#003366");
        assert_eq!(config.secondary_color, "#f8fafc");
    }

    #[test]
    fn test_merge_keeps_absent_fields() {
        let current = InstitutionConfig {
            logo_url: "https://cdn.example.org/logo.png".to_string(),
            ..InstitutionConfig::default()
        };
        let update = ConfigUpdate {
            primary_color: Some(" #aa0000 ".to_string()),
            ..ConfigUpdate::default()
        };
        let merged = current.merged(&update);
        assert_eq!(merged.primary_color, "#aa0000");
        assert_eq!(merged.logo_url, "https://cdn.example.org/logo.png");
        assert_eq!(merged.institution_name, "Instituto Predeterminado");
    }

    #[test]
    fn test_check_rejects_bad_color() {
        let config = InstitutionConfig {
            primary_color: "blue".to_string(),
            ..InstitutionConfig::default()
        };
        assert!(config.check().unwrap_err().contains("primaryColor"));
        assert!(InstitutionConfig::default().check().is_ok());
    }
}

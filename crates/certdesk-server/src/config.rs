//! Configuration for the certdesk server.

use certdesk_core::TemplatePreset;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

use crate::email::DEFAULT_SIMULATED_DELAY;

/// How certificate emails are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailProvider {
    /// Log and wait, never send.
    Simulated { delay: Duration },
    /// Transactional-email HTTP API.
    Http {
        api_url: String,
        api_key: String,
        from: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,

    pub bind_addr: SocketAddr,

    /// Origin printed in the certificate validation link.
    pub public_base_url: String,

    /// Base URL of the GoTrue-compatible identity service.
    pub auth_url: String,
    pub auth_api_key: String,

    pub email: EmailProvider,

    pub template: TemplatePreset,

    /// Timeout for outbound requests (images, identity, email).
    pub asset_timeout: Duration,

    pub run_migrations: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `AUTH_URL`, `AUTH_API_KEY`: identity service
    ///
    /// Optional:
    /// - `BIND_ADDR` (default: 0.0.0.0:8080)
    /// - `PUBLIC_BASE_URL` (default: http://localhost:8080)
    /// - `EMAIL_PROVIDER`: `simulated` (default) or `http`, the latter
    ///   requiring `EMAIL_API_URL`, `EMAIL_API_KEY` and `EMAIL_FROM`
    /// - `EMAIL_SIMULATED_DELAY_MS` (default: 2000)
    /// - `CERTIFICATE_TEMPLATE`: `wide` (default) or `narrow`
    /// - `ASSET_TIMEOUT_SECS` (default: 10)
    /// - `RUN_MIGRATIONS` (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };
        let or_default = |key: &'static str, default: &str| match lookup(key) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                info!("{} not set, using default: {}", key, default);
                default.to_string()
            }
        };

        let database_url = required("DATABASE_URL")?;
        let auth_url = required("AUTH_URL")?;
        let auth_api_key = required("AUTH_API_KEY")?;

        let bind_addr = or_default("BIND_ADDR", "0.0.0.0:8080")
            .parse()
            .map_err(|_| ConfigError::Invalid("BIND_ADDR"))?;

        let public_base_url = or_default("PUBLIC_BASE_URL", "http://localhost:8080")
            .trim_end_matches('/')
            .to_string();

        let email = match or_default("EMAIL_PROVIDER", "simulated")
            .to_ascii_lowercase()
            .as_str()
        {
            "simulated" => {
                let delay_ms: u64 = or_default(
                    "EMAIL_SIMULATED_DELAY_MS",
                    &DEFAULT_SIMULATED_DELAY.as_millis().to_string(),
                )
                .parse()
                .map_err(|_| ConfigError::Invalid("EMAIL_SIMULATED_DELAY_MS"))?;
                EmailProvider::Simulated {
                    delay: Duration::from_millis(delay_ms),
                }
            }
            "http" => EmailProvider::Http {
                api_url: required("EMAIL_API_URL")?,
                api_key: required("EMAIL_API_KEY")?,
                from: required("EMAIL_FROM")?,
            },
            _ => return Err(ConfigError::Invalid("EMAIL_PROVIDER")),
        };

        let template = or_default("CERTIFICATE_TEMPLATE", "wide")
            .parse()
            .map_err(|_| ConfigError::Invalid("CERTIFICATE_TEMPLATE"))?;

        let asset_timeout_secs: u64 = or_default("ASSET_TIMEOUT_SECS", "10")
            .parse()
            .map_err(|_| ConfigError::Invalid("ASSET_TIMEOUT_SECS"))?;

        let run_migrations = match or_default("RUN_MIGRATIONS", "true")
            .to_ascii_lowercase()
            .as_str()
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => return Err(ConfigError::Invalid("RUN_MIGRATIONS")),
        };

        Ok(Self {
            database_url,
            bind_addr,
            public_base_url,
            auth_url,
            auth_api_key,
            email,
            template,
            asset_timeout: Duration::from_secs(asset_timeout_secs),
            run_migrations,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/certdesk"),
        ("AUTH_URL", "https://auth.example.org"),
        ("AUTH_API_KEY", "anon-key"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.public_base_url, "http://localhost:8080");
        assert_eq!(
            config.email,
            EmailProvider::Simulated {
                delay: Duration::from_millis(2000)
            }
        );
        assert_eq!(config.template, TemplatePreset::Wide);
        assert_eq!(config.asset_timeout, Duration::from_secs(10));
        assert!(config.run_migrations);
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&REQUIRED[1..]).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnv("DATABASE_URL"));
    }

    #[test]
    fn test_http_email_requires_credentials() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("EMAIL_PROVIDER", "http"));
        vars.push(("EMAIL_API_URL", "https://mail.example.org/emails"));
        assert_eq!(load(&vars).unwrap_err(), ConfigError::MissingEnv("EMAIL_API_KEY"));

        vars.push(("EMAIL_API_KEY", "mail-key"));
        vars.push(("EMAIL_FROM", "certificados@example.org"));
        let config = load(&vars).unwrap();
        assert!(matches!(config.email, EmailProvider::Http { .. }));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PUBLIC_BASE_URL", "https://certs.example.org/"));
        vars.push(("CERTIFICATE_TEMPLATE", "narrow"));
        vars.push(("RUN_MIGRATIONS", "false"));
        vars.push(("EMAIL_SIMULATED_DELAY_MS", "0"));
        let config = load(&vars).unwrap();
        assert_eq!(config.public_base_url, "https://certs.example.org");
        assert_eq!(config.template, TemplatePreset::Narrow);
        assert!(!config.run_migrations);
        assert_eq!(
            config.email,
            EmailProvider::Simulated {
                delay: Duration::ZERO
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("CERTIFICATE_TEMPLATE", "fancy"));
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Invalid("CERTIFICATE_TEMPLATE"));
    }
}

//! Email delivery of issued certificates.
//!
//! Issuance only sees [`EmailSender`]. The simulated sender is the default;
//! the HTTP sender posts to a transactional-email API.

use async_trait::async_trait;
use base64::Engine;
use certdesk_core::render::format_date_es;
use certdesk_core::CertificatePayload;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

/// Default delay of the simulated sender.
pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_millis(2000);

/// What the email says about the certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateMail {
    pub names: String,
    pub surnames: String,
    pub course: String,
    pub date: NaiveDate,
    pub code: String,
}

impl From<&CertificatePayload> for CertificateMail {
    fn from(payload: &CertificatePayload) -> Self {
        Self {
            names: payload.names.clone(),
            surnames: payload.surnames.clone(),
            course: payload.course.clone(),
            date: payload.issue_date,
            code: payload.code.clone(),
        }
    }
}

impl CertificateMail {
    pub fn attachment_name(&self) -> String {
        certdesk_core::certificate_file_name(&self.names, &self.surnames)
    }

    pub fn subject(&self) -> String {
        format!("Tu certificado: {}", self.course)
    }

    pub fn html_body(&self) -> String {
        format!(
            "<p>Hola {} {},</p>\
             <p>Adjuntamos tu certificado del curso <strong>{}</strong>, \
             otorgado el {}.</p>\
             <p>Código de verificación: <strong>{}</strong></p>",
            self.names,
            self.surnames,
            self.course,
            format_date_es(self.date),
            self.code
        )
    }
}

/// Result reported back to the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailOutcome {
    pub success: bool,
    pub message: String,
}

impl EmailOutcome {
    pub fn sent(to: &str) -> Self {
        Self {
            success: true,
            message: format!("Certificate emailed to {}", to),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Email delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Email provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Sends a certificate PDF to a student.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        to: &str,
        mail: &CertificateMail,
        pdf: &[u8],
    ) -> Result<EmailOutcome, EmailError>;
}

/// A send recorded by [`SimulatedEmailSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub mail: CertificateMail,
    pub attachment_len: usize,
}

/// Waits, logs and always succeeds.
#[derive(Debug)]
pub struct SimulatedEmailSender {
    delay: Duration,
    outbox: Mutex<Vec<SentEmail>>,
}

impl Default for SimulatedEmailSender {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DELAY)
    }
}

impl SimulatedEmailSender {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Everything "sent" so far.
    pub fn sent(&self) -> Vec<SentEmail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for SimulatedEmailSender {
    async fn send(
        &self,
        to: &str,
        mail: &CertificateMail,
        pdf: &[u8],
    ) -> Result<EmailOutcome, EmailError> {
        tokio::time::sleep(self.delay).await;

        info!(
            to = %to,
            code = %mail.code,
            attachment = %mail.attachment_name(),
            bytes = pdf.len(),
            "Simulated certificate email"
        );

        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(SentEmail {
                to: to.to_string(),
                mail: mail.clone(),
                attachment_len: pdf.len(),
            });
        }

        Ok(EmailOutcome::sent(to))
    }
}

/// Posts to a transactional-email HTTP API.
#[derive(Clone)]
pub struct HttpEmailSender {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    html: String,
    attachments: Vec<OutgoingAttachment>,
}

#[derive(Debug, Serialize)]
struct OutgoingAttachment {
    filename: String,
    content: String,
}

impl HttpEmailSender {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        from: &str,
        timeout: Duration,
    ) -> Result<Self, EmailError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(
        &self,
        to: &str,
        mail: &CertificateMail,
        pdf: &[u8],
    ) -> Result<EmailOutcome, EmailError> {
        let body = OutgoingEmail {
            from: &self.from,
            to: vec![to],
            subject: mail.subject(),
            html: mail.html_body(),
            attachments: vec![OutgoingAttachment {
                filename: mail.attachment_name(),
                content: base64::engine::general_purpose::STANDARD.encode(pdf),
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmailError::Provider {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        info!(to = %to, code = %mail.code, "Certificate email accepted by provider");
        Ok(EmailOutcome::sent(to))
    }
}

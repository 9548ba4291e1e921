// HTTP client for the certdesk server API

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::time::Duration;

use crate::session::SessionUser;

/// Session returned by `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: SessionUser,
}

/// A certificate as listed in the admin history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub names: String,
    pub surnames: String,
    pub identification: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub course: String,
    pub issue_date: String,
    pub unique_code: String,
}

/// A certificate as the public search shows it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRecord {
    pub names: String,
    pub surnames: String,
    pub identification: String,
    pub course: String,
    pub issue_date: String,
    pub unique_code: String,
    pub institution_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicSearch {
    pub count: usize,
    pub certificates: Vec<PublicRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailOutcome {
    pub success: bool,
    pub message: String,
}

/// Response to `POST /certificates`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub certificate: CertificateRecord,
    pub file_name: String,
    pub download_url: String,
    pub email: EmailOutcome,
}

/// A downloaded PDF.
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Blocking client for the server API.
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(server: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(60))
            .build();
        Self {
            agent,
            base_url: format!("{}/api/v1", server.trim_end_matches('/')),
            token: None,
        }
    }

    /// Sends the admin bearer token with every request.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let request = self.agent.request(method, &format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    // -- auth ---------------------------------------------------------------

    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let response = self
            .request("POST", "/auth/login")
            .send_json(serde_json::json!({ "email": email, "password": password }));
        parse_json(response)
    }

    pub fn logout(&self) -> Result<()> {
        let response = self.request("POST", "/auth/logout").send_json(serde_json::json!({}));
        check(response).map(|_| ())
    }

    pub fn session(&self) -> Result<SessionUser> {
        parse_json(self.request("GET", "/auth/session").call())
    }

    // -- courses ------------------------------------------------------------

    pub fn list_courses(&self) -> Result<Vec<String>> {
        parse_json(self.request("GET", "/courses").call())
    }

    pub fn add_course(&self, name: &str) -> Result<()> {
        let response = self
            .request("POST", "/courses")
            .send_json(serde_json::json!({ "name": name }));
        check(response).map(|_| ())
    }

    pub fn delete_course(&self, name: &str) -> Result<()> {
        check(self.request("DELETE", &format!("/courses/{}", encode(name))).call()).map(|_| ())
    }

    // -- certificates -------------------------------------------------------

    pub fn issue(&self, form: &certdesk_core::CertificateForm) -> Result<IssueResponse> {
        parse_json(self.request("POST", "/certificates").send_json(form))
    }

    pub fn history(&self, query: Option<&str>) -> Result<Vec<CertificateRecord>> {
        let mut request = self.request("GET", "/certificates");
        if let Some(q) = query {
            request = request.query("q", q);
        }
        parse_json(request.call())
    }

    pub fn search(&self, identification: &str) -> Result<PublicSearch> {
        let request = self
            .request("GET", "/public/certificates")
            .query("identification", identification);
        parse_json(request.call())
    }

    pub fn validate(&self, code: &str) -> Result<PublicSearch> {
        let request = self.request("GET", "/public/certificates").query("code", code);
        parse_json(request.call())
    }

    /// Downloads a PDF through the admin route when a token is set,
    /// otherwise through the public route.
    pub fn download(&self, code: &str) -> Result<Download> {
        let path = match self.token {
            Some(_) => format!("/certificates/{}/pdf", encode(code)),
            None => format!("/public/certificates/{}/pdf", encode(code)),
        };
        let response = check(self.request("GET", &path).call())?;

        let file_name = response
            .header("content-disposition")
            .and_then(file_name_from_disposition)
            .unwrap_or_else(|| format!("{}.pdf", code));

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .context("Failed to read PDF body")?;

        Ok(Download { file_name, bytes })
    }

    // -- config -------------------------------------------------------------

    pub fn show_config(&self) -> Result<Value> {
        parse_json(self.request("GET", "/config").call())
    }

    pub fn update_config(&self, update: &Value) -> Result<Value> {
        parse_json(self.request("PUT", "/config").send_json(update))
    }
}

/// Turns HTTP error statuses into readable errors.
fn check(result: std::result::Result<ureq::Response, ureq::Error>) -> Result<ureq::Response> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(status, response)) => {
            let message = response
                .into_json::<Value>()
                .ok()
                .and_then(|body| body["error"].as_str().map(str::to_string))
                .unwrap_or_else(|| "no details".to_string());
            Err(anyhow!("Server returned {}: {}", status, message))
        }
        Err(e) => Err(anyhow!("Failed to reach server: {}", e)),
    }
}

fn parse_json<T: DeserializeOwned>(
    result: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<T> {
    check(result)?
        .into_json()
        .context("Failed to parse server response")
}

/// Percent-encodes a path segment.
fn encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Extracts the file name from a `Content-Disposition` header, preferring
/// the UTF-8 `filename*` form.
pub fn file_name_from_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    for part in header.split(';').map(str::trim) {
        if let Some(encoded) = part.strip_prefix("filename*=UTF-8''") {
            if let Some(decoded) = percent_decode(encoded) {
                return Some(decoded);
            }
        } else if let Some(name) = part.strip_prefix("filename=") {
            plain = Some(name.trim_matches('"').to_string());
        }
    }
    plain
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_prefers_utf8_form() {
        let header = "attachment; filename=\"Certificado_Ana Mar_a_L_pez.pdf\"; \
                      filename*=UTF-8''Certificado_Ana%20Mar%C3%ADa_L%C3%B3pez.pdf";
        assert_eq!(
            file_name_from_disposition(header).as_deref(),
            Some("Certificado_Ana María_López.pdf")
        );
    }

    #[test]
    fn test_file_name_plain_form() {
        assert_eq!(
            file_name_from_disposition("attachment; filename=\"Certificado_A_B.pdf\"").as_deref(),
            Some("Certificado_A_B.pdf")
        );
        assert_eq!(file_name_from_disposition("inline"), None);
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode("Excel Avanzado"), "Excel%20Avanzado");
        assert_eq!(encode("CERT-123456-ABC123"), "CERT-123456-ABC123");
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080/api/v1");
    }
}

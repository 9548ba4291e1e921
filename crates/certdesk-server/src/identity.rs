//! Identity provider client and session change events.
//!
//! Admin authentication is delegated to a GoTrue-compatible service:
//! the server exchanges email and password for an access token, resolves
//! bearer tokens to users, and revokes sessions on logout.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Username shown when the email has no usable local part.
const FALLBACK_USERNAME: &str = "Admin";

/// Capacity of the session event channel.
const SESSION_EVENT_CAPACITY: usize = 16;

/// An authenticated admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    /// Local part of the email.
    pub username: String,
}

impl SessionUser {
    pub fn new(id: Uuid, email: Option<String>) -> Self {
        let email = email.unwrap_or_default();
        let username = username_from_email(&email);
        Self { id, email, username }
    }
}

/// Derives a display name from an email address.
pub fn username_from_email(email: &str) -> String {
    match email.split('@').next() {
        Some(local) if !local.trim().is_empty() => local.trim().to_string(),
        _ => FALLBACK_USERNAME.to_string(),
    }
}

/// A signed-in session as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    pub user: SessionUser,
}

/// Identity provider errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Invalid or expired access token")]
    Unauthorized,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Identity provider returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// True when a provider message says the session no longer exists.
pub fn is_session_not_found(message: &str) -> bool {
    message.contains("session_not_found")
        || message.contains("Session from session_id claim in JWT does not exist")
}

/// Authentication operations the server relies on.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges email and password for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Resolves an access token to its user.
    async fn get_user(&self, access_token: &str) -> Result<SessionUser, IdentityError>;

    /// Revokes the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

// ---------------------------------------------------------------------------
// GoTrue client
// ---------------------------------------------------------------------------

/// [`IdentityProvider`] backed by a GoTrue-compatible REST API.
#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<GoTrueUser> for SessionUser {
    fn from(user: GoTrueUser) -> Self {
        SessionUser::new(user.id, user.email)
    }
}

/// Error bodies differ between GoTrue versions; every field is optional.
#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    error_code: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl GoTrueErrorBody {
    fn message(&self) -> String {
        [
            &self.error_description,
            &self.msg,
            &self.message,
            &self.error,
            &self.error_code,
        ]
        .into_iter()
        .flatten()
        .next()
        .cloned()
        .unwrap_or_else(|| "unknown error".to_string())
    }

    fn is_session_not_found(&self) -> bool {
        self.error_code.as_deref() == Some("session_not_found")
            || is_session_not_found(&self.message())
    }
}

async fn error_body(response: reqwest::Response) -> GoTrueErrorBody {
    response.json().await.unwrap_or_default()
}

impl GoTrueClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let token: TokenResponse = response.json().await?;
                Ok(Session {
                    access_token: token.access_token,
                    refresh_token: token.refresh_token,
                    expires_in: token.expires_in,
                    user: token.user.into(),
                })
            }
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::UNPROCESSABLE_ENTITY => Err(IdentityError::InvalidCredentials(
                error_body(response).await.message(),
            )),
            status => Err(IdentityError::Service {
                status: status.as_u16(),
                message: error_body(response).await.message(),
            }),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<SessionUser, IdentityError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let user: GoTrueUser = response.json().await?;
                Ok(user.into())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::Unauthorized),
            status => Err(IdentityError::Service {
                status: status.as_u16(),
                message: error_body(response).await.message(),
            }),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = error_body(response).await;
        if body.is_session_not_found() {
            return Err(IdentityError::SessionNotFound);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(IdentityError::Unauthorized);
        }
        Err(IdentityError::Service {
            status: status.as_u16(),
            message: body.message(),
        })
    }
}

// ---------------------------------------------------------------------------
// Session events
// ---------------------------------------------------------------------------

/// A change in admin session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(SessionUser),
    SignedOut,
}

/// Broadcast channel for session changes.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self { tx }
    }

    /// Publishes an event. Having no subscribers is fine.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribes to future events. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live subscription to [`SessionEvents`].
#[derive(Debug)]
pub struct SessionSubscription {
    rx: broadcast::Receiver<SessionEvent>,
}

impl SessionSubscription {
    /// Next event, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Session listener lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Spawns the standing listener that logs session changes.
pub fn spawn_session_logger(events: &SessionEvents) -> JoinHandle<()> {
    let mut subscription = events.subscribe();
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            match event {
                SessionEvent::SignedIn(user) => {
                    info!(user = %user.username, user_id = %user.id, "Admin signed in")
                }
                SessionEvent::SignedOut => info!("Admin signed out"),
            }
        }
    })
}

/// Signs in and announces the new session.
pub async fn begin_session(
    provider: &dyn IdentityProvider,
    events: &SessionEvents,
    email: &str,
    password: &str,
) -> Result<Session, IdentityError> {
    let session = provider.sign_in(email, password).await?;
    events.publish(SessionEvent::SignedIn(session.user.clone()));
    Ok(session)
}

/// Signs out and announces it.
///
/// A session the provider no longer knows about counts as signed out.
pub async fn end_session(
    provider: &dyn IdentityProvider,
    events: &SessionEvents,
    access_token: &str,
) -> Result<(), IdentityError> {
    match provider.sign_out(access_token).await {
        Ok(()) => {}
        Err(IdentityError::SessionNotFound) => {
            info!("Session already gone at the provider, treating logout as complete");
        }
        Err(e) => return Err(e),
    }
    events.publish(SessionEvent::SignedOut);
    Ok(())
}

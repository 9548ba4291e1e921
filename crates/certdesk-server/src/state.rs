//! Shared application state.

use certdesk_core::TemplateLayout;
use sqlx::PgPool;
use std::sync::Arc;

use crate::assets::AssetFetcher;
use crate::email::EmailSender;
use crate::identity::{IdentityProvider, SessionEvents};

/// Everything a handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn EmailSender>,
    pub assets: AssetFetcher,
    pub sessions: SessionEvents,
    /// Template every certificate is drawn with.
    pub layout: Arc<TemplateLayout>,
    /// Origin printed in the validation link (no trailing slash).
    pub public_base_url: String,
}

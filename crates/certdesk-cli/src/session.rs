// Session store - keeps the admin access token between CLI invocations

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The signed-in admin as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

/// What `certdesk login` leaves on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    /// Server the token was issued for.
    pub server: String,
    pub access_token: String,
    pub user: SessionUser,
    pub signed_in_at: String,
}

/// Session file location and access.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// `~/.certdesk/session.json`
    pub fn default_location() -> Result<Self> {
        #[cfg(unix)]
        let home = std::env::var("HOME")
            .map_err(|_| anyhow!("HOME environment variable not set"))?;

        #[cfg(windows)]
        let home = std::env::var("USERPROFILE")
            .map_err(|_| anyhow!("USERPROFILE environment variable not set"))?;

        Ok(Self::at(PathBuf::from(home).join(".certdesk").join("session.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved session, if any.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read '{}'", self.path.display()))?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse '{}'", self.path.display()))?;
        Ok(Some(session))
    }

    /// The saved session, or an error telling the user to log in.
    pub fn require(&self) -> Result<StoredSession> {
        self.load()?
            .ok_or_else(|| anyhow!("Not logged in. Run `certdesk login` first."))
    }

    /// Writes the session, readable by the owner only.
    pub fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create '{}'", dir.display()))?;
        }

        let json = serde_json::to_string_pretty(session)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::write(&self.path, &json)?;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&self.path, &json)?;
        }

        Ok(())
    }

    /// Removes the session file. Returns false when there was none.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove '{}'", self.path.display()))?;
        Ok(true)
    }
}

/// Get current time as ISO 8601 string
pub fn iso8601_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> StoredSession {
        StoredSession {
            server: "http://localhost:8080".to_string(),
            access_token: "tok-123".to_string(),
            user: SessionUser {
                id: Uuid::new_v4(),
                email: "secretaria@example.org".to_string(),
                username: "secretaria".to_string(),
            },
            signed_in_at: "2025-03-15T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_load_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
        assert!(store.require().unwrap_err().to_string().contains("Not logged in"));
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("nested").join("session.json"));

        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        store.save(&session()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = SessionStore::at(&path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}

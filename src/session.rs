//! Durable session token storage.
//!
//! The token lives under the `token` key of a small JSON document. Login
//! writes it, logout removes it, and the navigation gate only ever asks
//! whether it is there.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ops_console_core::SessionState;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Persisted session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Opaque bearer token
    pub token: String,
    /// User the token was issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// When the token was stored
    pub created_at: DateTime<Utc>,
}

impl StoredSession {
    /// New session stamped with the current time
    pub fn new(token: impl Into<String>, username: Option<String>) -> Self {
        Self {
            token: token.into(),
            username,
            created_at: Utc::now(),
        }
    }
}

/// Key/value store for the session token
pub trait SessionStore: Send + Sync {
    /// Read the stored session, if any
    fn load(&self) -> Result<Option<StoredSession>>;

    /// Replace the stored session
    fn store(&self, session: StoredSession) -> Result<()>;

    /// Remove the stored session (no-op when absent)
    fn clear(&self) -> Result<()>;

    /// Current token; an empty token counts as absent
    fn token(&self) -> Result<Option<String>> {
        Ok(self
            .load()?
            .map(|s| s.token)
            .filter(|t| !t.is_empty()))
    }
}

/// Current token, with read failures logged and treated as no token.
pub(crate) fn readable_token(store: &(impl SessionStore + ?Sized)) -> Option<String> {
    match store.token() {
        Ok(token) => token,
        Err(e) => {
            warn!(error = %e, "Session store unreadable, treating session as anonymous");
            None
        }
    }
}

/// Token presence for the navigation gate
fn token_present(store: &(impl SessionStore + ?Sized)) -> bool {
    readable_token(store).is_some()
}

/// Session kept in a JSON file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store backed by `path`; the file is created on first login
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn session_err(&self, action: &str, e: impl std::fmt::Display) -> Error {
        Error::Session(format!("{action} {}: {e}", self.path.display()))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.session_err("failed to read", e)),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| self.session_err("malformed session file", e))
    }

    fn store(&self, session: StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.session_err("failed to create directory for", e))?;
        }

        let json = serde_json::to_string_pretty(&session)?;
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, json.as_bytes()).map_err(|e| self.session_err("failed to write", e))?;

        fs::rename(&tmp, &self.path).map_err(|e| self.session_err("failed to replace", e))?;
        debug!(path = %self.path.display(), "Session stored");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.session_err("failed to remove", e)),
        }
    }
}

/// Write `contents` to a fresh file readable only by the owner.
///
/// On unix the mode is set at creation, so the token is never visible under
/// the process umask. A stale file at `path` is removed first because
/// `mode` only applies to newly created files.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// In-memory session, for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<StoredSession>>,
}

impl MemorySessionStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            session: RwLock::new(Some(StoredSession::new(token, None))),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.session.read().clone())
    }

    fn store(&self, session: StoredSession) -> Result<()> {
        *self.session.write() = Some(session);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.session.write().take();
        Ok(())
    }
}

impl SessionState for FileSessionStore {
    fn has_token(&self) -> bool {
        token_present(self)
    }
}

impl SessionState for MemorySessionStore {
    fn has_token(&self) -> bool {
        token_present(self)
    }
}

impl SessionState for dyn SessionStore {
    fn has_token(&self) -> bool {
        token_present(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ops_console_core::{Decision, NavigationGate, RouteTable, SessionPhase, default_routes};

    #[test]
    fn test_missing_file_is_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.phase(), SessionPhase::Anonymous);
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        store
            .store(StoredSession::new("abc123", Some("admin".into())))
            .unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("abc123"));
        assert_eq!(store.load().unwrap().unwrap().username.as_deref(), Some("admin"));
        assert!(store.has_token());

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(!store.has_token());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.store(StoredSession::new("t", None)).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_temp_file_replaced_privately() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        let tmp = store.path().with_extension("json.tmp");
        fs::write(&tmp, "leftover").unwrap();
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644)).unwrap();

        store.store(StoredSession::new("t", None)).unwrap();

        assert!(!tmp.exists());
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.token().unwrap().as_deref(), Some("t"));
    }

    #[test]
    fn test_empty_token_is_absent() {
        let store = MemorySessionStore::new();
        store.store(StoredSession::new("", None)).unwrap();
        assert_eq!(store.token().unwrap(), None);
        assert!(!store.has_token());
    }

    #[test]
    fn test_malformed_file_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();
        let store = FileSessionStore::new(&path);
        assert!(matches!(store.load(), Err(Error::Session(_))));
        assert!(!store.has_token());
    }

    #[test]
    fn test_gate_sees_login_and_logout() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let routes = RouteTable::compile(&default_routes()).unwrap();
        let gate = NavigationGate::new(routes, Arc::clone(&store));

        assert_eq!(
            gate.navigate("/dashboard", None),
            Decision::RedirectTo("/login".into())
        );

        store.store(StoredSession::new("tok", None)).unwrap();
        assert_eq!(gate.navigate("/dashboard", None), Decision::Proceed);
        assert_eq!(
            gate.navigate("/login", None),
            Decision::RedirectTo("/dashboard".into())
        );

        store.clear().unwrap();
        assert_eq!(gate.navigate("/login", None), Decision::Proceed);
    }
}

//! Session persistence
//!
//! The session manager keeps at most one session: the token most recently
//! issued and the identifier it was issued for. Where that pair lives is up
//! to the [`SessionStore`]:
//!
//! - [`MemorySessionStore`]: process lifetime, e.g. a long-running service
//! - [`FileSessionStore`]: a small JSON file, so a CLI keeps its session
//!   across invocations

use std::path::PathBuf;

use async_trait::async_trait;
use rinpass_types::Rin;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{ClientError, Result};

/// A cached session token and the identifier it belongs to
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Identifier the token was issued for
    pub rin: Rin,
    /// Session token
    pub token: String,
}

impl StoredSession {
    pub fn new(rin: Rin, token: impl Into<String>) -> Self {
        Self {
            rin,
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("rin", &self.rin)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Storage for the single cached session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session, if any
    async fn load(&self) -> Result<Option<StoredSession>>;

    /// Replace the current session
    async fn save(&self, session: &StoredSession) -> Result<()>;

    /// Forget the current session
    async fn clear(&self) -> Result<()>;
}

/// In-process session storage
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<()> {
        *self.slot.write().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.slot.write().await.take();
        Ok(())
    }
}

/// Session storage in a JSON file
///
/// A file that cannot be parsed is treated as no session; the next save
/// overwrites it.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ClientError::Store(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &StoredSession) -> Result<()> {
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| ClientError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::Store(format!("cannot create {}: {e}", parent.display())))?;
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| ClientError::Store(format!("cannot write {}: {e}", self.path.display())))
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Store(format!(
                "cannot remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

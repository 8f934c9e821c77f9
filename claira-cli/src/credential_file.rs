//! File-backed credential store.
//!
//! Credentials live in a JSON file (by default under the user's config
//! directory) so refreshed tokens survive between invocations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use claira_client::CredentialStore;
use claira_types::Credentials;

/// Credential store persisted as a JSON file.
pub struct FileStore {
    path: PathBuf,
    cached: RwLock<Credentials>,
}

impl FileStore {
    /// Open an existing credentials file.
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading credentials from {}", path.display()))?;
        let credentials: Credentials = serde_json::from_str(&text)
            .with_context(|| format!("parsing credentials in {}", path.display()))?;
        Ok(Self { path: path.to_path_buf(), cached: RwLock::new(credentials) })
    }

    /// Create (or overwrite) the credentials file with `credentials`.
    pub fn create(path: &Path, credentials: Credentials) -> Result<Self> {
        let store = Self { path: path.to_path_buf(), cached: RwLock::new(credentials.clone()) };
        store.persist(&credentials)?;
        Ok(store)
    }

    fn persist(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("writing credentials to {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn get(&self) -> Credentials {
        self.cached.read().await.clone()
    }

    async fn try_set(&self, credentials: Credentials) -> bool {
        if let Err(err) = self.persist(&credentials) {
            tracing::warn!("could not persist refreshed tokens: {err:#}");
            return false;
        }
        *self.cached.write().await = credentials;
        true
    }
}

/// Default credentials path: `<config dir>/claira/credentials.json`.
pub fn default_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("no config directory on this platform")?;
    Ok(base.join("claira").join("credentials.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tokens_round_trip_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = FileStore::create(&path, Credentials::new("a@b.c", "pw")).unwrap();
        let mut updated = store.get().await;
        updated.access_token = Some("acc".to_string());
        assert!(store.try_set(updated).await);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get().await.access_token.as_deref(), Some("acc"));
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(FileStore::open(Path::new("/nonexistent/credentials.json")).is_err());
    }
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;

use std::io;
use std::path;
use std::sync::RwLock;

use tokio::fs;

/// Bearer token persisted across runs. The in-memory copy is what request
/// construction reads; disk writes happen on set/clear only.
pub struct CredentialStore {
    path: path::PathBuf,
    token: RwLock<Option<String>>,
}

impl Default for CredentialStore {
    fn default() -> CredentialStore {
        let path = dirs::cache_dir().unwrap_or_default().join("docsidian/token");
        return CredentialStore::new(path);
    }
}

impl CredentialStore {
    pub fn new(path: path::PathBuf) -> CredentialStore {
        let mut token = None;
        if let Ok(payload) = std::fs::read_to_string(&path) {
            let trimmed = payload.trim();
            if !trimmed.is_empty() {
                token = Some(trimmed.to_string());
            }
        }

        return CredentialStore {
            path,
            token: RwLock::new(token),
        };
    }

    pub fn get(&self) -> Option<String> {
        return self.token.read().unwrap().clone();
    }

    pub async fn set(&self, token: &str) -> Result<(), io::Error> {
        *self.token.write().unwrap() = Some(token.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, token).await?;

        return Ok(());
    }

    /// Idempotent: clearing an already-clear store is a no-op.
    pub async fn clear(&self) -> Result<(), io::Error> {
        *self.token.write().unwrap() = None;

        if self.path.exists() {
            fs::remove_file(&self.path).await?;
        }

        return Ok(());
    }
}

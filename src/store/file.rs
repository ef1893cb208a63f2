//! Local JSON file backend

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Backend, CredentialStore};
use crate::auth::Credential;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn load(&self) -> Option<Credential> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::error!("Error reading {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(credential) => {
                tracing::info!("Tokens loaded from file");
                Some(credential)
            }
            Err(e) => {
                tracing::error!("Error parsing {}: {}", self.path.display(), e);
                None
            }
        }
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        let content = serde_json::to_string(credential)?;
        tokio::fs::write(&self.path, content).await?;

        // Contains tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, perms).await?;
        }

        tracing::info!("Tokens saved to file");
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::File
    }
}

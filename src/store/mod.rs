//! Credential persistence
//!
//! Two backends sit behind [`CredentialStore`]: a local JSON file, and a
//! Redis-protocol key-value store (Vercel KV, Upstash, plain Redis) that
//! falls back to the file on load. The backend is picked once in [`open`].

mod file;
mod kv;

pub use file::FileStore;
pub use kv::{KvStore, RedisBackend};
#[cfg(test)]
pub(crate) use kv::{memory::MemoryKv, KV_KEY};

use async_trait::async_trait;

use crate::auth::Credential;
use crate::config::Settings;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    KeyValue,
    File,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `None` is the normal first-run state; unreadable data is logged and
    /// also reported as `None`.
    async fn load(&self) -> Option<Credential>;

    async fn save(&self, credential: &Credential) -> Result<()>;

    fn backend(&self) -> Backend;
}

/// Pick the backend from settings. A configured key-value URL that cannot be
/// reached is logged and the file backend is used instead.
pub async fn open(settings: &Settings) -> Box<dyn CredentialStore> {
    let file = FileStore::new(settings.token_file.clone());

    let Some(url) = settings.kv_url.as_deref() else {
        tracing::debug!("No key-value URL configured, using {}", file.path().display());
        return Box::new(file);
    };

    match RedisBackend::connect(url).await {
        Ok(backend) => {
            tracing::info!("Connected to key-value store");
            Box::new(KvStore::new(backend, file))
        }
        Err(e) => {
            tracing::error!("Failed to connect to key-value store: {}", e);
            Box::new(file)
        }
    }
}

//! Key-value backend with file fallback on load

use async_trait::async_trait;
use redis::AsyncCommands;

use super::{Backend, CredentialStore, FileStore};
use crate::auth::Credential;
use crate::error::Result;

/// Key holding the serialized credential
pub const KV_KEY: &str = "keka_tokens";

/// Minimal string get/set surface of the key-value store
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Redis-protocol backend (Vercel KV exposes this via `KV_URL`)
pub struct RedisBackend {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisBackend {
    /// Connect and PING so a bad URL or unreachable server is caught up front.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }
}

pub struct KvStore<B> {
    backend: B,
    fallback: FileStore,
}

impl<B: KvBackend> KvStore<B> {
    pub fn new(backend: B, fallback: FileStore) -> Self {
        Self { backend, fallback }
    }

    async fn load_kv(&self) -> Option<Credential> {
        match self.backend.get(KV_KEY).await {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(credential) => {
                    tracing::info!("Tokens loaded from key-value store");
                    Some(credential)
                }
                Err(e) => {
                    tracing::error!("Failed to parse tokens from key-value store: {}", e);
                    None
                }
            },
            Ok(None) => {
                tracing::warn!("No tokens found in key-value store");
                None
            }
            Err(e) => {
                tracing::error!("Failed to load tokens from key-value store: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl<B: KvBackend> CredentialStore for KvStore<B> {
    async fn load(&self) -> Option<Credential> {
        match self.load_kv().await {
            Some(credential) => Some(credential),
            None => self.fallback.load().await,
        }
    }

    /// Write failures are logged, not returned, and the file is not written.
    async fn save(&self, credential: &Credential) -> Result<()> {
        let data = serde_json::to_string(credential)?;
        match self.backend.set(KV_KEY, &data).await {
            Ok(()) => tracing::info!("Tokens saved to key-value store"),
            Err(e) => tracing::error!("Failed to save tokens to key-value store: {}", e),
        }
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::KeyValue
    }
}

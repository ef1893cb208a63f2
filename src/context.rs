//! Per-process context shared by the token manager and the attendance client

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::store::{self, CredentialStore};

/// Browser user agent; the Keka endpoints are built for the web app.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Built once at startup and passed by reference to every operation.
pub struct Context {
    pub settings: Settings,
    pub http: reqwest::Client,
    pub store: Box<dyn CredentialStore>,
    /// Time source, swapped out in tests
    pub clock: fn() -> DateTime<Utc>,
}

impl Context {
    pub fn new(settings: Settings, store: Box<dyn CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            settings,
            http,
            store,
            clock: Utc::now,
        })
    }

    /// Select the persistence backend from settings and build the context.
    pub async fn open(settings: Settings) -> Result<Self> {
        let store = store::open(&settings).await;
        Self::new(settings, store)
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

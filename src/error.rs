//! Error types for the token lifecycle, persistence and attendance calls

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Nothing persisted yet (or unreadable). Needs `keka-clock setup`.
    #[error("no stored credential found; run 'keka-clock setup'")]
    NotAuthenticated,

    #[error("no refresh token available; run 'keka-clock setup' to re-authenticate")]
    MissingRefreshToken,

    #[error("authorization code is empty")]
    MissingAuthorizationCode,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{context} failed: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context} returned HTTP {status}: {body}")]
    Status {
        context: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed token response: {0}")]
    TokenResponse(#[source] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("key-value store error: {0}")]
    KeyValue(#[from] redis::RedisError),
}

impl Error {
    /// Errors only an operator can fix by re-running `setup` or editing config.
    pub fn needs_operator(&self) -> bool {
        matches!(
            self,
            Error::NotAuthenticated
                | Error::MissingRefreshToken
                | Error::MissingAuthorizationCode
                | Error::Config(_)
        )
    }
}

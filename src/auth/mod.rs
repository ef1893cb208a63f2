//! Authentication module for Keka
//!
//! Implements the OAuth2 authorization code flow with PKCE against the Keka
//! identity server, plus silent refresh of the stored credential.

pub mod oauth;
pub mod pkce;
pub mod tokens;

pub use oauth::{ensure_fresh, setup, status};
pub use tokens::Credential;

use serde::Deserialize;

/// Keka OAuth client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Identity server base (hosts /connect/authorize and /connect/token)
    pub auth_base: String,
    /// OAuth2 client ID (public client used by the Keka web app)
    pub client_id: String,
    /// OAuth2 redirect URI
    pub redirect_uri: String,
    /// Space-separated scopes; offline_access is needed for a refresh token
    pub scope: String,
}

impl AuthConfig {
    pub fn token_url(&self) -> String {
        format!("{}/connect/token", self.auth_base.trim_end_matches('/'))
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/connect/authorize", self.auth_base.trim_end_matches('/'))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_base: "https://app.keka.com".to_string(),
            client_id: "987cc971-fc22-4454-99f9-16c078fa7ff6".to_string(),
            redirect_uri: "https://alchemy.keka.com".to_string(),
            scope: "openid kekahr.api hiro.api offline_access".to_string(),
        }
    }
}

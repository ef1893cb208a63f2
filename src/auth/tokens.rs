//! Credential storage model and JWT expiry handling

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Refresh this many seconds before the token actually expires.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// Access/refresh token pair with the expiry decoded from the access token.
///
/// The expiry is never set directly: it is always re-derived from the access
/// token, including when a persisted credential is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCredential", into = "StoredCredential")]
pub struct Credential {
    access_token: String,
    refresh_token: Option<String>,
    expiry: Option<i64>,
}

/// On-disk / key-value shape
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    access_token: String,
    refresh_token: Option<String>,
    /// Written for readers of the file; ignored on load (older stores may hold a float)
    #[serde(default)]
    token_expiry: Option<serde_json::Value>,
}

impl From<StoredCredential> for Credential {
    fn from(stored: StoredCredential) -> Self {
        Credential::new(stored.access_token, stored.refresh_token)
    }
}

impl From<Credential> for StoredCredential {
    fn from(credential: Credential) -> Self {
        Self {
            access_token: credential.access_token,
            refresh_token: credential.refresh_token,
            token_expiry: credential.expiry.map(Into::into),
        }
    }
}

impl Credential {
    pub fn new(access_token: String, refresh_token: Option<String>) -> Self {
        let expiry = decode_expiry(&access_token);
        Self {
            access_token,
            refresh_token,
            expiry,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Unix seconds from the token's `exp` claim, if it could be decoded
    pub fn expiry(&self) -> Option<i64> {
        self.expiry
    }

    /// Apply a token endpoint response. The refresh token is only replaced
    /// when the provider rotated it.
    pub fn update(&mut self, access_token: String, refresh_token: Option<String>) {
        self.expiry = decode_expiry(&access_token);
        self.access_token = access_token;
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expiry {
            Some(exp) => now >= exp.saturating_sub(EXPIRY_MARGIN_SECS),
            None => true,
        }
    }
}

/// Read the `exp` claim from a JWT without verifying it.
///
/// Returns `None` for anything that is not three dot-separated segments with a
/// base64url JSON payload carrying a numeric `exp`.
pub fn decode_expiry(token: &str) -> Option<i64> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        tracing::debug!("Access token is not a three-segment JWT");
        return None;
    };

    let mut payload = payload.to_string();
    while payload.len() % 4 != 0 {
        payload.push('=');
    }

    let decoded = match base64::engine::general_purpose::URL_SAFE.decode(&payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Failed to decode token payload: {}", e);
            return None;
        }
    };
    let claims: serde_json::Value = match serde_json::from_slice(&decoded) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Token payload is not JSON: {}", e);
            return None;
        }
    };

    let exp = claims.get("exp")?;
    exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))
}

#[cfg(test)]
pub(crate) fn jwt_with_claims(claims: &serde_json::Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.{}",
        engine.encode(br#"{"alg":"RS256","typ":"JWT"}"#),
        engine.encode(claims.to_string()),
        engine.encode(b"signature")
    )
}

#[cfg(test)]
pub(crate) fn jwt_with_exp(exp: i64) -> String {
    jwt_with_claims(&serde_json::json!({ "exp": exp, "sub": "employee" }))
}

//! PKCE verifier/challenge generation (RFC 7636, S256 only)

use oauth2::{PkceCodeChallenge, PkceCodeVerifier};

/// Random bytes behind each verifier; base64url without padding gives 43 chars.
const VERIFIER_BYTES: u32 = 32;

/// One-shot verifier/challenge pair. Never persisted.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

/// Generate a fresh pair from the OS RNG.
pub fn generate() -> PkcePair {
    let (challenge, verifier) = PkceCodeChallenge::new_random_sha256_len(VERIFIER_BYTES);
    PkcePair {
        verifier: verifier.secret().to_string(),
        challenge: challenge.as_str().to_string(),
    }
}

/// S256 challenge for a verifier, hashed over the verifier's text form.
pub fn challenge_for(verifier: &str) -> String {
    let verifier = PkceCodeVerifier::new(verifier.to_string());
    PkceCodeChallenge::from_code_verifier_sha256(&verifier)
        .as_str()
        .to_string()
}

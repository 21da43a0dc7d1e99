//! PKCE code verifier/challenge generation for the OAuth sign-in flow.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};

use crate::types::errors::AuthError;

/// Generates a fresh random code verifier (43 url-safe characters).
pub fn generate_verifier() -> Result<String, AuthError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes)
        .map_err(|_| AuthError::OAuthFlow("failed to generate code verifier".to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Computes the S256 challenge for a verifier.
pub fn challenge_s256(verifier: &str) -> String {
    let hash = digest::digest(&digest::SHA256, verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash.as_ref())
}

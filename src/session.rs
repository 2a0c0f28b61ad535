//! Credential hashing and bearer-token signing.
//!
//! Passwords are hashed with argon2id. API sessions are stateless: a signed
//! HS256 token carries the user id, role, and expiry, and is verified on
//! every request by the client context middleware.

use argon2::Argon2;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

/// Key used to sign bearer tokens. Taken from SECRET_KEY; when absent or
/// too short a random key is generated, which invalidates all issued
/// tokens on restart.
static TOKEN_SECRET: Lazy<String> = Lazy::new(|| match std::env::var("SECRET_KEY") {
    Ok(key) if key.len() >= 64 => key,
    other => {
        let random_string: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(128)
            .map(char::from)
            .collect();
        log::warn!(
            "SECRET_KEY was missing or shorter than 64 bytes ({:?}). A random signing key \
             will be used, so every issued token invalidates when the application restarts.",
            other.map(|k| k.len())
        );
        random_string
    }
});

/// Force initialization of session state. Call early in startup so a
/// missing SECRET_KEY is reported before the first request.
pub fn init() {
    Lazy::force(&ARGON2);
    Lazy::force(&TOKEN_SECRET);
}

/// Returns the process-wide argon2id hasher.
pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub sub: i32,
    /// Role at issue time. The middleware re-reads the user row, so a
    /// demoted admin loses access without waiting for expiry.
    pub role: String,
    /// Expiry as a unix timestamp.
    pub exp: usize,
}

/// Issues a signed token for the given user.
pub fn issue_token(
    user_id: i32,
    role: &str,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(ttl_hours)).timestamp();
    let claims = TokenClaims {
        sub: user_id,
        role: role.to_owned(),
        exp: exp.max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TOKEN_SECRET.as_bytes()),
    )
}

/// Verifies a token's signature and expiry. Returns None for anything
/// invalid; callers treat that as an unauthenticated request.
pub fn verify_token(token: &str) -> Option<TokenClaims> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(TOKEN_SECRET.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = issue_token(42, "admin", 1).expect("token should encode");
        let claims = verify_token(&token).expect("token should verify");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = issue_token(7, "user", 1).expect("token should encode");
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(verify_token(&tampered).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Issued two hours in the past, beyond the default leeway.
        let token = issue_token(7, "user", -2).expect("token should encode");
        assert!(verify_token(&token).is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify_token("not-a-token").is_none());
    }
}

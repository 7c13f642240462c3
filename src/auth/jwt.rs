//! JWT issuance and validation.
//!
//! Tokens are `HS256` signed with the operator-supplied secret. The subject
//! is the username; `iat`/`exp` bound the lifetime. Extra claims ride along
//! flattened into the payload.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token asserts.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sign a token for `username` with no extra claims.
pub fn generate_token(username: &str, secret: &SecretString, ttl_seconds: i64) -> Result<String> {
    generate_token_with_claims(username, Map::new(), secret, ttl_seconds)
}

/// Sign a token for `username` carrying `extra` claims.
pub fn generate_token_with_claims(
    username: &str,
    extra: Map<String, Value>,
    secret: &SecretString,
    ttl_seconds: i64,
) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_string(),
        iat: now,
        exp: now + ttl_seconds,
        extra,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .context("failed to sign token")
}

/// Verify the signature and expiry of `token` and return its claims.
pub fn decode_claims(token: &str, secret: &SecretString) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .context("invalid token")?;

    Ok(data.claims)
}

/// A token is valid for a user when it decodes, is unexpired, and its
/// subject matches the username.
#[must_use]
pub fn is_token_valid(token: &str, username: &str, secret: &SecretString) -> bool {
    decode_claims(token, secret).is_ok_and(|claims| claims.sub == username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn secret() -> SecretString {
        SecretString::from("0123456789abcdef0123456789abcdef".to_string())
    }

    #[test]
    fn round_trip_subject_matches() {
        let token = generate_token("alice", &secret(), 600).expect("token");
        assert!(!token.trim().is_empty());

        let claims = decode_claims(&token, &secret()).expect("claims");
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp > claims.iat);
        assert!(is_token_valid(&token, "alice", &secret()));
    }

    #[test]
    fn subject_mismatch_fails() {
        let token = generate_token("alice", &secret(), 600).expect("token");
        assert!(!is_token_valid(&token, "bob", &secret()));
    }

    #[test]
    fn expired_token_fails() {
        let token = generate_token("alice", &secret(), -600).expect("token");
        assert!(decode_claims(&token, &secret()).is_err());
        assert!(!is_token_valid(&token, "alice", &secret()));
    }

    #[test]
    fn wrong_secret_fails() {
        let token = generate_token("alice", &secret(), 600).expect("token");
        let other = SecretString::from("another-secret-another-secret-00".to_string());
        assert!(!is_token_valid(&token, "alice", &other));
    }

    #[test]
    fn extra_claims_survive() {
        let mut extra = Map::new();
        extra.insert("role".to_string(), json!("admin"));
        let token =
            generate_token_with_claims("alice", extra, &secret(), 600).expect("token");

        let claims = decode_claims(&token, &secret()).expect("claims");
        assert_eq!(claims.extra.get("role"), Some(&json!("admin")));
    }
}

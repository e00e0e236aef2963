use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Claims embedded in a session token. The username (`sub`) is the only
/// identity claim; `exp` is present only when a token TTL is configured.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the authenticated user
    pub sub: String,
    /// Issued at (Unix epoch seconds)
    pub iat: i64,
    /// Expiration time (Unix epoch seconds), absent for non-expiring tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies signed session tokens (HS256).
///
/// The signing secret and optional TTL are threaded in from [`Config`] at
/// construction time; nothing here reads ambient state.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_hours: Option<i64>,
}

impl AuthManager {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl_hours: config.token_ttl_hours,
        }
    }

    /// Create a session token embedding the username as its `sub` claim
    pub fn create_token(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: self
                .token_ttl_hours
                .map(|ttl| (now + Duration::hours(ttl)).timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to encode session token")
    }

    /// Verify a session token's signature (and expiry, when a TTL is
    /// configured) and return its claims
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        if self.token_ttl_hours.is_none() {
            // Tokens carry no exp claim in this mode
            validation.required_spec_claims.clear();
            validation.validate_exp = false;
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid session token")?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(token_ttl_hours: Option<i64>) -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-test-secret-test-secret!".to_string(),
            bcrypt_cost: 4,
            port: 0,
            token_ttl_hours,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn token_round_trip_embeds_username() {
        let auth = AuthManager::new(&test_config(None));
        let token = auth.create_token("alice").unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp.is_none());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let auth = AuthManager::new(&test_config(None));
        let token = auth.create_token("alice").unwrap();

        // Flip a character in the signature segment
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(auth.verify_token(&tampered).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let auth = AuthManager::new(&test_config(None));

        let mut other_config = test_config(None);
        other_config.jwt_secret = "another-secret-another-secret-32char".to_string();
        let other = AuthManager::new(&other_config);

        let token = other.create_token("alice").unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let auth = AuthManager::new(&test_config(None));
        assert!(auth.verify_token("not-a-jwt").is_err());
        assert!(auth.verify_token("").is_err());
    }

    #[test]
    fn configured_ttl_adds_expiry_claim() {
        let auth = AuthManager::new(&test_config(Some(1)));
        let token = auth.create_token("alice").unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert!(claims.exp.is_some());
        assert!(claims.exp.unwrap() > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        // TTL of -1 hour puts exp well past the default validation leeway
        let auth = AuthManager::new(&test_config(Some(-1)));
        let token = auth.create_token("alice").unwrap();

        assert!(auth.verify_token(&token).is_err());
    }
}

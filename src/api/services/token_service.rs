//! Token service for auth token generation and validation.
//!
//! Issues signed JWTs that carry the user id and a session id. Tokens are
//! only honoured while the backing session row exists, so logout revokes
//! them server-side.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Token claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id, stringified)
    pub sub: String,
    /// Username at issue time
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Session ID (for revocation)
    pub session_id: String,
}

impl Claims {
    /// Parse the subject back into a user id.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Token service configuration
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_duration: Duration,
}

impl TokenService {
    /// Create a new token service with the given secret
    ///
    /// # Arguments
    /// * `secret` - The secret key for signing tokens (should be at least 32 bytes)
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_duration: Duration::days(7),
        }
    }

    /// Create a token service from environment variables.
    ///
    /// In production (APP_ENV != "development"), this will panic if TOKEN_SECRET
    /// is not set. In development, falls back to an insecure default secret with
    /// a warning.
    ///
    /// # Panics
    /// Panics in production if TOKEN_SECRET environment variable is not set.
    pub fn from_env() -> Self {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "production".to_string());
        let is_development = app_env.to_lowercase() == "development";

        let secret = match std::env::var("TOKEN_SECRET") {
            Ok(s) => s,
            Err(_) => {
                if is_development {
                    warn!(
                        "TOKEN_SECRET not set! Using default secret for development. DO NOT USE IN PRODUCTION!"
                    );
                    "dev-secret-do-not-use-in-production-change-me-now".to_string()
                } else {
                    panic!(
                        "CRITICAL: TOKEN_SECRET environment variable is required in production. Set APP_ENV=development to use default secret."
                    );
                }
            }
        };

        if secret.len() < 32 {
            if is_development {
                warn!("TOKEN_SECRET is less than 32 characters. Consider using a longer secret.");
            } else {
                panic!("CRITICAL: TOKEN_SECRET must be at least 32 characters in production.");
            }
        }

        Self::new(&secret)
    }

    /// Generate a token for a user session
    pub fn generate_token(
        &self,
        user_id: i64,
        username: &str,
        session_id: Uuid,
    ) -> Result<String, String> {
        let now = Utc::now();
        let expires_at = now + self.token_duration;

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            session_id: session_id.to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| format!("Failed to encode token: {}", e))?;

        info!(
            "Generated token for user {} (session: {}), expires: {}",
            user_id, session_id, expires_at
        );

        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, String> {
        let token_data = self.decode_token(token)?;
        Ok(token_data.claims)
    }

    /// Decode and validate a token (checks signature and expiration)
    fn decode_token(&self, token: &str) -> Result<TokenData<Claims>, String> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token has expired".to_string(),
            jsonwebtoken::errors::ErrorKind::InvalidToken => "Invalid token format".to_string(),
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                "Invalid token signature".to_string()
            }
            _ => format!("Token validation failed: {}", e),
        })
    }

    /// Extract the token from an Authorization header value.
    ///
    /// Accepts both `Token <jwt>` (the scheme clients send) and
    /// `Bearer <jwt>`.
    pub fn extract_token(auth_header: &str) -> Option<&str> {
        auth_header
            .strip_prefix("Token ")
            .or_else(|| auth_header.strip_prefix("Bearer "))
    }
}

/// Shared token service for use across the application
pub type SharedTokenService = Arc<TokenService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_and_validation() {
        let service = TokenService::new("test-secret-key-at-least-32-chars");
        let session_id = Uuid::new_v4();

        let token = service.generate_token(42, "chef", session_id).unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.username, "chef");
        assert_eq!(claims.session_id, session_id.to_string());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_invalid_token() {
        let service = TokenService::new("test-secret-key-at-least-32-chars");

        let result = service.validate_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenService::new("test-secret-key-at-least-32-chars");
        let verifier = TokenService::new("another-secret-key-at-least-32-ch");

        let token = issuer.generate_token(1, "chef", Uuid::new_v4()).unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(TokenService::extract_token("Token abc123"), Some("abc123"));
        assert_eq!(TokenService::extract_token("Bearer abc123"), Some("abc123"));
        assert_eq!(TokenService::extract_token("token abc123"), None);
        assert_eq!(TokenService::extract_token("abc123"), None);
    }
}

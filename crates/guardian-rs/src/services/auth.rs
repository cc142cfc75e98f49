//! Bearer token issuing and verification.
//!
//! Tokens are standard JWT compact serialization signed with HS256, carrying
//! `{sub, exp}`. The signing secret comes from the process environment; the
//! service stores no token state.

use crate::models::error::GatewayError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Environment variable holding the HS256 signing secret.
pub const JWT_SECRET_ENV: &str = "GUARDIAN_JWT_SECRET";

/// Default token lifetime in minutes.
pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;

/// Claims carried by a Guardian access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user ID.
    pub sub: String,
    /// Expiry as a unix timestamp.
    pub exp: usize,
}

/// Issues and verifies HS256-signed bearer tokens.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Builds the service with the secret from `GUARDIAN_JWT_SECRET`,
    /// falling back to a placeholder that config validation warns about.
    pub fn from_env() -> Self {
        let secret = std::env::var(JWT_SECRET_ENV)
            .unwrap_or_else(|_| "please-change-this-secret".to_string());
        Self::new(&secret)
    }

    /// Signs a token for `user_id`, expiring after `expires_in` (default
    /// 30 minutes).
    pub fn create_access_token(
        &self,
        user_id: &str,
        expires_in: Option<chrono::Duration>,
    ) -> Result<String, GatewayError> {
        let lifetime =
            expires_in.unwrap_or_else(|| chrono::Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES));
        let expire = chrono::Utc::now() + lifetime;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expire.timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            GatewayError::Config {
                message: format!("token signing failed: {}", e),
            }
        })
    }

    /// Verifies signature and expiry. Every failure mode (bad signature,
    /// malformed token, expired) collapses to `InvalidToken`.
    pub fn verify_token(&self, token: &str) -> Result<Claims, GatewayError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| GatewayError::InvalidToken)
    }
}

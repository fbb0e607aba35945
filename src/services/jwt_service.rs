//! JWT Service for id token generation and validation.
//!
//! Id tokens are short-lived (1 hour) and sent as bearer tokens to the
//! privileged remote procedures.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default secret for development only.
const DEVELOPMENT_SECRET: &str = "dev-secret-do-not-use-in-production-change-me-now";

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,
    /// E-mail address of the user
    pub email: String,
    /// Display name, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT Service configuration
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    id_token_duration: Duration,
}

impl JwtService {
    /// Create a new JWT service with the given secret
    ///
    /// # Arguments
    /// * `secret` - The secret key for signing tokens (should be at least 32 bytes)
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            id_token_duration: Duration::hours(1),
        }
    }

    /// Create a JWT service from a configured secret.
    ///
    /// Outside development a missing secret, or one shorter than 32 characters,
    /// is an error. In development the insecure default is used with a warning.
    pub fn from_secret(secret: Option<&str>, is_development: bool) -> Result<Self, String> {
        let secret = match secret {
            Some(s) => s,
            None => {
                if is_development {
                    warn!(
                        "JWT_SECRET not set! Using default secret for development. DO NOT USE IN PRODUCTION!"
                    );
                    DEVELOPMENT_SECRET
                } else {
                    return Err(
                        "JWT_SECRET environment variable is required in production".to_string()
                    );
                }
            }
        };

        if secret.len() < 32 {
            if is_development {
                warn!("JWT_SECRET is less than 32 characters. Consider using a longer secret.");
            } else {
                return Err("JWT_SECRET must be at least 32 characters in production".to_string());
            }
        }

        Ok(Self::new(secret))
    }

    /// Generate an id token for an account
    pub fn generate_id_token(
        &self,
        account_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<String, String> {
        let now = Utc::now();
        let exp = now + self.id_token_duration;
        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            name: name.map(str::to_string),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| format!("Failed to encode id token: {}", e))?;

        debug!("Generated id token for account {}, expires: {}", account_id, exp);
        Ok(token)
    }

    /// Validate an id token and return the claims
    pub fn validate_id_token(&self, token: &str) -> Result<Claims, String> {
        Ok(self.decode_token(token)?.claims)
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
}

// Session token verification (HS256, shared secret with the hosted auth service)

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::app_config::AuthConfig;
use crate::models::auth::{AmrEntry, SessionClaims};

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Clock error: {0}")]
    ClockError(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::TokenExpired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => JwtError::InvalidToken,
            _ => JwtError::EncodingError(err.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub access_token_expiry: u64,
    pub algorithm: Algorithm,
    pub audience: String,
    pub encoding_key: EncodingKey,
    pub decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("algorithm", &self.algorithm)
            .field("audience", &self.audience)
            .field("encoding_key", &"<redacted>")
            .field("decoding_key", &"<redacted>")
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: &str, audience: &str) -> Self {
        JwtConfig {
            access_token_expiry: 3600,
            algorithm: Algorithm::HS256,
            audience: audience.to_string(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn from_auth_config(auth: &AuthConfig) -> Self {
        Self::new(&auth.jwt_secret, &auth.jwt_audience)
    }

    #[cfg(test)]
    pub fn for_test() -> Self {
        Self::new("test-session-secret-at-least-32-chars", "authenticated")
    }
}

pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    pub fn from_auth_config(auth: &AuthConfig) -> Self {
        Self::new(JwtConfig::from_auth_config(auth))
    }

    fn now() -> Result<u64, JwtError> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JwtError::ClockError(e.to_string()))?
            .as_secs())
    }

    /// Issue a session token signed with the shared secret.
    /// Used by local tooling and tests; production tokens come from the auth service.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        amr: Vec<AmrEntry>,
    ) -> Result<String, JwtError> {
        let now = Self::now()?;

        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: now + self.config.access_token_expiry,
            iat: now,
            aud: self.config.audience.clone(),
            role: "authenticated".to_string(),
            session_id: Some(Uuid::new_v4().to_string()),
            amr,
        };

        encode(&Header::new(self.config.algorithm), &claims, &self.config.encoding_key)
            .map_err(Into::into)
    }

    /// Validate a session token and return its claims
    pub fn validate_access_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.set_audience(&[self.config.audience.clone()]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0;

        let token_data = decode::<SessionClaims>(token, &self.config.decoding_key, &validation)?;

        Ok(token_data.claims)
    }
}

//! JWT issuing and verification.

use std::time::Duration;

use chrono::Utc;
use common::{User, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, Result};

/// Shortest signing secret accepted, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Which flow a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Signing secret and token lifetimes.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    /// Lifetime of access tokens issued at login.
    pub access_ttl: Duration,
    /// Lifetime of refresh tokens.
    pub refresh_ttl: Duration,
    /// Lifetime of access tokens issued by a refresh.
    pub refreshed_access_ttl: Duration,
}

impl JwtConfig {
    /// Builds a config with the default lifetimes (24h, 24h, 15m).
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            access_ttl: Duration::from_secs(86_400),
            refresh_ttl: Duration::from_secs(86_400),
            refreshed_access_ttl: Duration::from_secs(900),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("refreshed_access_ttl", &self.refreshed_access_ttl)
            .finish()
    }
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
    pub iat: u64,
    pub jti: String,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub token_type: TokenType,
}

/// HS256 signer/verifier built once from the secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Fails when the secret is shorter than [`MIN_SECRET_LENGTH`].
    pub fn new(secret: &SecretString) -> Result<Self> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.len() < MIN_SECRET_LENGTH {
            return Err(DomainError::Validation(format!(
                "JWT secret must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        })
    }

    /// Signs a token of the given type for a user.
    pub fn issue(&self, user: &User, token_type: TokenType, ttl: Duration) -> Result<String> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let claims = Claims {
            sub: user.id.to_string(),
            exp: now.saturating_add(ttl.as_secs()),
            iat: now,
            jti: Uuid::new_v4().to_string(),
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            token_type,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::Validation(format!("token signing failed: {e}")))
    }

    /// Verifies signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| DomainError::Unauthenticated(format!("invalid token: {e}")))
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

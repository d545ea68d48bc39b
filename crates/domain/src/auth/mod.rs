//! Registration, login and bearer-token authentication.

mod password;
mod token;

pub use password::{MIN_PASSWORD_LENGTH, hash_password, verify_password};
pub use token::{Claims, JwtConfig, MIN_SECRET_LENGTH, TokenCodec, TokenType};

use common::{User, UserId};
use serde::{Deserialize, Serialize};
use store::{NewUser, StoreError, UserStore};

use crate::error::{DomainError, Result};

/// The authenticated caller, resolved from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

/// Registration form.
#[derive(Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Registration {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("name is required".to_string()));
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(DomainError::Validation(
                "a valid email is required".to_string(),
            ));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

/// Access and refresh tokens returned by login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// User accounts and token lifecycle.
#[derive(Clone)]
pub struct AuthService<S: UserStore> {
    store: S,
    codec: TokenCodec,
    config: JwtConfig,
}

impl<S: UserStore> AuthService<S> {
    /// Fails when the configured secret is too short to sign with.
    pub fn new(store: S, config: JwtConfig) -> Result<Self> {
        let codec = TokenCodec::new(&config.secret)?;
        Ok(Self {
            store,
            codec,
            config,
        })
    }

    /// Creates a regular account.
    #[tracing::instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<User> {
        self.create_account(registration, false).await
    }

    /// Creates an administrator account, used for startup provisioning.
    #[tracing::instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register_admin(&self, registration: Registration) -> Result<User> {
        self.create_account(registration, true).await
    }

    async fn create_account(&self, registration: Registration, is_admin: bool) -> Result<User> {
        registration.validate()?;
        let password_hash = hash_password(&registration.password)?;

        let user = self
            .store
            .create_user(NewUser {
                name: registration.name.trim().to_string(),
                email: registration.email.trim().to_string(),
                password_hash,
                is_admin,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => {
                    DomainError::Validation("email is already registered".to_string())
                }
                other => DomainError::from(other),
            })?;

        tracing::info!(user_id = %user.id, is_admin, "User registered");
        Ok(user)
    }

    /// Checks credentials and issues an access/refresh pair.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let record = self.store.get_user_by_email(email.trim()).await?;
        let Some(record) = record.filter(|r| verify_password(password, &r.password_hash)) else {
            metrics::counter!("auth_failures_total", "reason" => "credentials").increment(1);
            return Err(DomainError::Unauthenticated(
                "invalid email or password".to_string(),
            ));
        };

        Ok(TokenPair {
            access_token: self.codec.issue(
                &record.user,
                TokenType::Access,
                self.config.access_ttl,
            )?,
            refresh_token: self.codec.issue(
                &record.user,
                TokenType::Refresh,
                self.config.refresh_ttl,
            )?,
        })
    }

    /// Exchanges a refresh token for a short-lived access token.
    #[tracing::instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let claims = self.verify(refresh_token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(DomainError::Unauthenticated(
                "not a refresh token".to_string(),
            ));
        }

        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| DomainError::Unauthenticated("malformed subject".to_string()))?;
        let record = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::Unauthenticated("user no longer exists".to_string()))?;

        self.codec.issue(
            &record.user,
            TokenType::Access,
            self.config.refreshed_access_ttl,
        )
    }

    /// Verifies a token's signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.codec.verify(token).inspect_err(|_| {
            metrics::counter!("auth_failures_total", "reason" => "token").increment(1);
        })
    }

    /// Resolves the caller behind an access token.
    ///
    /// The user is re-loaded by the email claim, so deleted accounts and
    /// revoked admin rights take effect immediately.
    pub async fn authenticate(&self, token: &str) -> Result<Principal> {
        let claims = self.verify(token)?;
        if claims.token_type != TokenType::Access {
            return Err(DomainError::Unauthenticated(
                "not an access token".to_string(),
            ));
        }

        let record = self
            .store
            .get_user_by_email(&claims.email)
            .await?
            .ok_or_else(|| DomainError::Unauthenticated("user no longer exists".to_string()))?;

        Ok(Principal::from(record.user))
    }
}

//! Authentication service for registration, login, and token refresh.
//!
//! Tokens are stateless: nothing is persisted per session, so logout is a
//! client-side discard and refresh only needs to verify that the account
//! still exists.

use std::sync::Arc;
use thiserror::Error;

use domain::models::UserRole;
use persistence::entities::UserEntity;
use persistence::repositories::{NewUser, UserRepository};
use shared::jwt::{JwtConfig, JwtError};
use shared::password::{hash_password, validate_strength, verify_password, PasswordError};
use sqlx::PgPool;
use std::str::FromStr;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User with this email already exists")]
    EmailAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Role must be either \"host\" or \"guest\"")]
    InvalidRole,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Password error: {0}")]
    Password(PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Access/refresh token pair handed to the client.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// A successfully authenticated account with fresh tokens.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: UserEntity,
    pub tokens: TokenPair,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    /// Creates a new AuthService over the given pool and JWT configuration.
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
        }
    }

    /// Register a new account and issue its first token pair.
    ///
    /// Only `guest` and `host` are accepted as self-service roles; admin
    /// accounts are provisioned out of band.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<AuthResult, AuthError> {
        let role = UserRole::from_str(role).map_err(|_| AuthError::InvalidRole)?;
        if role == UserRole::Admin {
            return Err(AuthError::InvalidRole);
        }

        validate_strength(password).map_err(|e| AuthError::WeakPassword(e.to_string()))?;

        let email = email.trim().to_lowercase();

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(password).map_err(AuthError::Password)?;

        let user = self
            .users
            .create(NewUser {
                name: name.trim(),
                email: &email,
                password_hash: &password_hash,
                role: role.as_str(),
            })
            .await
            .map_err(|e| match &e {
                // Unique violation: the email check raced a concurrent signup
                sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                    AuthError::EmailAlreadyExists
                }
                _ => AuthError::Database(e),
            })?;

        tracing::info!(user_id = user.id, "User registered");

        let tokens = self.generate_tokens(user.id)?;
        Ok(AuthResult { user, tokens })
    }

    /// Authenticate with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        let email = email.trim().to_lowercase();

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches =
            verify_password(password, &user.password_hash).map_err(AuthError::Password)?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = user.id, "User logged in");

        let tokens = self.generate_tokens(user.id)?;
        Ok(AuthResult { user, tokens })
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let user_id =
            shared::jwt::extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;

        // The account may have been deleted since the token was issued
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        self.generate_tokens(user_id)
    }

    fn generate_tokens(&self, user_id: i64) -> Result<TokenPair, AuthError> {
        let (access_token, _) = self.jwt.generate_access_token(user_id)?;
        let (refresh_token, _) = self.jwt.generate_refresh_token(user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.access_token_expiry_secs,
        })
    }
}

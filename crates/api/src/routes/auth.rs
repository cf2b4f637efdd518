//! Authentication routes: registration, login, token refresh, logout.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::routes::users::UserResponse;
use crate::services::auth::{AuthError, AuthResult, AuthService, TokenPair};

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Account role; defaults to guest.
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "guest".to_string()
}

/// Request body for login.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token block returned by register, login, and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<TokenPair> for TokensResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: pair.expires_in,
        }
    }
}

/// User plus tokens, returned on register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokensResponse,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            user: result.user.into(),
            tokens: result.tokens.into(),
        }
    }
}

fn map_auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::EmailAlreadyExists => ApiError::Conflict(err.to_string()),
        AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
        AuthError::WeakPassword(msg) => ApiError::Validation(msg),
        AuthError::InvalidRole => ApiError::Validation(err.to_string()),
        AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
        AuthError::InvalidRefreshToken => ApiError::Unauthorized(err.to_string()),
        AuthError::Password(e) => ApiError::Internal(format!("Password error: {}", e)),
        AuthError::Token(e) => ApiError::Internal(format!("Token error: {}", e)),
        AuthError::Database(e) => ApiError::from(e),
    }
}

/// Register a new account.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    request.validate().map_err(ApiError::from)?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let result = service
        .register(
            &request.name,
            &request.email,
            &request.password,
            &request.role,
        )
        .await
        .map_err(map_auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User registered successfully",
            result.into(),
        )),
    ))
}

/// Authenticate and receive a token pair.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    request.validate().map_err(ApiError::from)?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let result = service
        .login(&request.email, &request.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        result.into(),
    )))
}

/// Exchange a refresh token for a fresh pair.
///
/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokensResponse>>, ApiError> {
    request.validate().map_err(ApiError::from)?;

    let service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let tokens = service
        .refresh(&request.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(ApiResponse::data(tokens.into())))
}

/// Acknowledge logout. Tokens are stateless, so the client simply discards
/// them; nothing is revoked server-side.
///
/// POST /api/auth/logout
pub async fn logout() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Logged out successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "SecureP4ss".to_string(),
            role: "guest".to_string(),
        };

        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_request_invalid_email() {
        let request = RegisterRequest {
            name: "Test User".to_string(),
            email: "not-an-email".to_string(),
            password: "SecureP4ss".to_string(),
            role: "guest".to_string(),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_empty_name() {
        let request = RegisterRequest {
            name: "".to_string(),
            email: "test@example.com".to_string(),
            password: "SecureP4ss".to_string(),
            role: "guest".to_string(),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_request_default_role() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"name": "A", "email": "a@example.com", "password": "SecureP4ss"}"#,
        )
        .unwrap();

        assert_eq!(request.role, "guest");
    }

    #[test]
    fn test_login_request_empty_password() {
        let request = LoginRequest {
            email: "test@example.com".to_string(),
            password: "".to_string(),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_tokens_response_from_pair() {
        let pair = TokenPair {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
        };

        let response: TokensResponse = pair.into();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
    }
}

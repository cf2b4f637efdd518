//! Account routes: CRUD, self-service profile, and password change.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::response::ApiResponse;
use crate::services::auth::{AuthError, AuthService};
use domain::models::UserRole;
use domain::policy;
use persistence::entities::UserEntity;
use persistence::repositories::{UpdateUserProfile, UserRepository};
use shared::pagination::{PageInfo, PageQuery};
use shared::password::{hash_password, validate_strength, verify_password};

/// User account in responses. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserEntity> for UserResponse {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            bio: user.bio,
            profile_picture: user.profile_picture,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Requires the caller to hold the admin role, freshly read from the store.
pub(crate) async fn ensure_admin(state: &AppState, user_id: i64) -> Result<(), ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user: domain::models::User = repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?
        .into();

    if user.role.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin access required".to_string()))
    }
}

/// Request body for account creation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "guest".to_string()
}

/// Create an account.
///
/// POST /api/users
///
/// Same semantics as registration, minus the token issuance.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserData>>), ApiError> {
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
        .map_err(|e| match e {
            AuthError::EmailAlreadyExists => ApiError::Conflict(e.to_string()),
            AuthError::WeakPassword(msg) => ApiError::Validation(msg),
            AuthError::InvalidRole => ApiError::Validation(e.to_string()),
            AuthError::Database(db) => ApiError::from(db),
            other => ApiError::Internal(other.to_string()),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User created successfully",
            UserData {
                user: result.user.into(),
            },
        )),
    ))
}

/// `data` payload wrapping a single user.
#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: UserResponse,
}

/// Fetch a user by id.
///
/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _auth: UserAuth,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::data(UserData { user: user.into() })))
}

/// Request body for profile updates. Omitted fields keep their value.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,

    pub profile_picture: Option<String>,
}

/// Update a user account. Self-service only.
///
/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let decision = policy::can_update_profile(auth.user_id, id);
    if let Some(reason) = decision.reason() {
        return Err(ApiError::Forbidden(reason.to_string()));
    }

    apply_profile_update(&state, id, request).await
}

/// Current user's profile.
///
/// GET /api/users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::data(UserData { user: user.into() })))
}

/// Update the current user's profile.
///
/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    apply_profile_update(&state, auth.user_id, request).await
}

async fn apply_profile_update(
    state: &AppState,
    user_id: i64,
    request: UpdateUserRequest,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    request.validate().map_err(ApiError::from)?;

    let repo = UserRepository::new(state.pool.clone());

    let email = request.email.map(|e| e.trim().to_lowercase());
    if let Some(ref email) = email {
        if repo.email_taken_by_other(email, user_id).await? {
            return Err(ApiError::Conflict("Email is already taken".to_string()));
        }
    }

    let update = UpdateUserProfile {
        name: request.name.map(|n| n.trim().to_string()),
        email,
        bio: request.bio,
        profile_picture: request.profile_picture,
    };

    let user = repo
        .update_profile(user_id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id, "Profile updated");

    Ok(Json(ApiResponse::with_message(
        "Profile updated successfully",
        UserData { user: user.into() },
    )))
}

/// Request body for password change.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Change the current user's password.
///
/// PUT /api/users/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    request.validate().map_err(ApiError::from)?;

    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let matches = verify_password(&request.current_password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("Password error: {}", e)))?;
    if !matches {
        return Err(ApiError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }

    validate_strength(&request.new_password).map_err(|e| ApiError::Validation(e.to_string()))?;

    let password_hash = hash_password(&request.new_password)
        .map_err(|e| ApiError::Internal(format!("Password error: {}", e)))?;

    repo.update_password(auth.user_id, &password_hash).await?;

    info!(user_id = auth.user_id, "Password changed");

    Ok(Json(ApiResponse::message("Password changed successfully")))
}

/// Query parameters for the user list.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// `data` payload for the user list.
#[derive(Debug, Serialize)]
pub struct UserListData {
    pub users: Vec<UserResponse>,
    pub pagination: PageInfo,
}

/// List accounts with an optional role filter.
///
/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    _auth: UserAuth,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<UserListData>>, ApiError> {
    // Unknown role values are ignored rather than rejected
    let role = query
        .role
        .as_deref()
        .and_then(|r| UserRole::from_str(r).ok());

    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .normalize();

    let repo = UserRepository::new(state.pool.clone());
    let (users, total) = repo.list(role.map(|r| r.as_str()), page).await?;

    Ok(Json(ApiResponse::data(UserListData {
        users: users.into_iter().map(UserResponse::from).collect(),
        pagination: page.info(total),
    })))
}

/// Delete an account. Admin only.
///
/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ensure_admin(&state, auth.user_id).await?;

    let repo = UserRepository::new(state.pool.clone());
    let deleted = repo.delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(user_id = id, deleted_by = auth.user_id, "User deleted");

    Ok(Json(ApiResponse::message("User deleted successfully")))
}

//! Integration tests for account CRUD, profiles, and password change.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{
    cleanup_all_test_data, create_authenticated_user, create_test_app, create_test_pool,
    delete_request_with_auth, get_request_with_auth, json_request, json_request_with_auth,
    parse_response_body, promote_to_admin, run_migrations, test_config, TestUser,
};
use serde_json::json;
use tower::ServiceExt;

// =============================================================================
// POST /api/users
// =============================================================================

#[tokio::test]
async fn test_create_user_success_and_no_password_leak() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let user = TestUser::new();

    let request = json_request(
        Method::POST,
        "/api/users",
        &json!({
            "name": user.name,
            "email": user.email,
            "password": user.password,
            "role": "guest",
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], user.email.to_lowercase());
    assert_eq!(body["data"]["user"]["role"], "guest");

    // The hash must never appear anywhere in the response
    let raw = body.to_string();
    assert!(!raw.contains("password"));
    assert!(!raw.contains("argon2"));

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_create_user_duplicate_email_conflict() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let user = TestUser::new();

    let body = json!({
        "name": user.name,
        "email": user.email,
        "password": user.password,
    });

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/users", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same email, different case: still a duplicate
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/users",
            &json!({
                "name": user.name,
                "email": user.email.to_uppercase(),
                "password": user.password,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = parse_response_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("already exists"));

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_create_user_weak_password_rejected() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let user = TestUser::new();

    let request = json_request(
        Method::POST,
        "/api/users",
        &json!({
            "name": user.name,
            "email": user.email,
            "password": "short",
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_create_user_admin_role_rejected() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let user = TestUser::new();

    let request = json_request(
        Method::POST,
        "/api/users",
        &json!({
            "name": user.name,
            "email": user.email,
            "password": user.password,
            "role": "admin",
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("host"));

    cleanup_all_test_data(&pool).await;
}

// =============================================================================
// GET /api/users/:id and GET /api/users
// =============================================================================

#[tokio::test]
async fn test_get_user_requires_auth() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let user = create_authenticated_user(&app, &TestUser::new()).await;

    // No token
    let request = Request::builder()
        .method(Method::GET)
        .uri(format!("/api/users/{}", user.user_id))
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::UNAUTHORIZED
    );

    // With token
    let request =
        get_request_with_auth(&format!("/api/users/{}", user.user_id), &user.access_token);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["data"]["user"]["id"].as_i64().unwrap(), user.user_id);

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_get_user_not_found() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let user = create_authenticated_user(&app, &TestUser::new()).await;

    let request = get_request_with_auth("/api/users/999999", &user.access_token);
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::NOT_FOUND
    );

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_list_users_role_filter_and_pagination() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let guest = create_authenticated_user(&app, &TestUser::new()).await;
    let _host_a = create_authenticated_user(&app, &TestUser::host()).await;
    let _host_b = create_authenticated_user(&app, &TestUser::host()).await;

    let request = get_request_with_auth("/api/users?role=host", &guest.access_token);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert_eq!(user["role"], "host");
    }
    assert_eq!(body["data"]["pagination"]["total"], 2);

    // Clamped pagination: page=0, limit=1000 normalize to 1/100
    let request = get_request_with_auth("/api/users?page=0&limit=1000", &guest.access_token);
    let body = parse_response_body(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(body["data"]["pagination"]["page"], 1);
    assert_eq!(body["data"]["pagination"]["limit"], 100);

    cleanup_all_test_data(&pool).await;
}

// =============================================================================
// PUT /api/users/:id and profile routes
// =============================================================================

#[tokio::test]
async fn test_update_other_users_profile_forbidden() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let alice = create_authenticated_user(&app, &TestUser::new()).await;
    let bob = create_authenticated_user(&app, &TestUser::new()).await;

    let request = json_request_with_auth(
        Method::PUT,
        &format!("/api/users/{}", bob.user_id),
        &alice.access_token,
        &json!({ "name": "Hijacked" }),
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_profile_roundtrip() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let user = create_authenticated_user(&app, &TestUser::new()).await;

    let request = json_request_with_auth(
        Method::PUT,
        "/api/users/profile",
        &user.access_token,
        &json!({ "name": "Renamed", "bio": "Traveller" }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = get_request_with_auth("/api/users/profile", &user.access_token);
    let body = parse_response_body(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(body["data"]["user"]["name"], "Renamed");
    assert_eq!(body["data"]["user"]["bio"], "Traveller");

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_profile_update_email_taken() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let alice_creds = TestUser::new();
    let _alice = create_authenticated_user(&app, &alice_creds).await;
    let bob = create_authenticated_user(&app, &TestUser::new()).await;

    let request = json_request_with_auth(
        Method::PUT,
        "/api/users/profile",
        &bob.access_token,
        &json!({ "email": alice_creds.email }),
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = parse_response_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("already taken"));

    cleanup_all_test_data(&pool).await;
}

// =============================================================================
// PUT /api/users/change-password
// =============================================================================

#[tokio::test]
async fn test_change_password_flow() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let creds = TestUser::new();
    let user = create_authenticated_user(&app, &creds).await;

    // Wrong current password
    let request = json_request_with_auth(
        Method::PUT,
        "/api/users/change-password",
        &user.access_token,
        &json!({
            "current_password": "WrongP4ssword",
            "new_password": "BrandNewP4ss",
        }),
    );
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::BAD_REQUEST
    );

    // Correct current password
    let request = json_request_with_auth(
        Method::PUT,
        "/api/users/change-password",
        &user.access_token,
        &json!({
            "current_password": creds.password,
            "new_password": "BrandNewP4ss",
        }),
    );
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::OK
    );

    // Old password no longer works, new one does
    let request = json_request(
        Method::POST,
        "/api/auth/login",
        &json!({ "email": creds.email, "password": creds.password }),
    );
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::UNAUTHORIZED
    );

    let request = json_request(
        Method::POST,
        "/api/auth/login",
        &json!({ "email": creds.email, "password": "BrandNewP4ss" }),
    );
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::OK
    );

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_change_password_rejects_weak_new_password() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let creds = TestUser::new();
    let user = create_authenticated_user(&app, &creds).await;

    let request = json_request_with_auth(
        Method::PUT,
        "/api/users/change-password",
        &user.access_token,
        &json!({
            "current_password": creds.password,
            "new_password": "weak",
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    cleanup_all_test_data(&pool).await;
}

// =============================================================================
// DELETE /api/users/:id
// =============================================================================

#[tokio::test]
async fn test_delete_user_admin_only() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let admin = create_authenticated_user(&app, &TestUser::new()).await;
    let victim = create_authenticated_user(&app, &TestUser::new()).await;
    let bystander = create_authenticated_user(&app, &TestUser::new()).await;

    // A regular user cannot delete accounts
    let request = delete_request_with_auth(
        &format!("/api/users/{}", victim.user_id),
        &bystander.access_token,
    );
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::FORBIDDEN
    );

    promote_to_admin(&pool, admin.user_id).await;

    let request = delete_request_with_auth(
        &format!("/api/users/{}", victim.user_id),
        &admin.access_token,
    );
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::OK
    );

    // Deleted accounts 404
    let request = get_request_with_auth(
        &format!("/api/users/{}", victim.user_id),
        &admin.access_token,
    );
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::NOT_FOUND
    );

    cleanup_all_test_data(&pool).await;
}

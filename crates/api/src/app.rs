use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::metrics::{metrics_handler, metrics_middleware};
use crate::routes::{auth, bookings, health, listings, uploads, users};
use shared::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
}

pub fn create_app(config: Config, pool: PgPool) -> anyhow::Result<Router> {
    let jwt = JwtConfig::with_leeway(
        &config.jwt.private_key,
        &config.jwt.public_key,
        config.jwt.access_token_expiry_secs,
        config.jwt.refresh_token_expiry_secs,
        config.jwt.leeway_secs,
    )?;

    // The upload directory must exist before ServeDir points at it
    std::fs::create_dir_all(&config.uploads.dir)?;

    let upload_body_limit =
        config.uploads.max_file_size_bytes * config.uploads.max_files_per_request;
    let upload_dir = config.uploads.dir.clone();
    let request_timeout_secs = config.server.request_timeout_secs;

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let state = AppState {
        pool,
        config: Arc::new(config),
        jwt: Arc::new(jwt),
    };

    // Authentication endpoints
    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout));

    // Account endpoints. Static segments (profile, change-password) take
    // precedence over the :id capture.
    let user_routes = Router::new()
        .route("/api/users", post(users::create_user).get(users::list_users))
        .route(
            "/api/users/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/api/users/change-password", put(users::change_password))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        );

    // Listing catalog
    let listing_routes = Router::new()
        .route(
            "/api/listings",
            get(listings::search_listings).post(listings::create_listing),
        )
        .route("/api/listings/host/:host_id", get(listings::host_listings))
        .route(
            "/api/listings/:id",
            get(listings::get_listing)
                .put(listings::update_listing)
                .delete(listings::delete_listing),
        );

    // Booking lifecycle
    let booking_routes = Router::new()
        .route(
            "/api/bookings",
            post(bookings::create_booking).get(bookings::list_all_bookings),
        )
        .route(
            "/api/bookings/listing/:listing_id",
            get(bookings::listing_bookings),
        )
        .route("/api/bookings/:id", get(bookings::user_bookings))
        .route("/api/bookings/:id/status", put(bookings::update_status));

    // Image uploads, with a body limit sized for a full batch
    let upload_routes = Router::new()
        .route("/api/uploads", post(uploads::upload_images))
        .route("/api/uploads/profile", post(uploads::upload_profile_picture))
        .layer(DefaultBodyLimit::max(upload_body_limit));

    // Health and metrics (no authentication)
    let ops_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Ok(Router::new()
        .merge(ops_routes)
        .merge(auth_routes)
        .merge(user_routes)
        .merge(listing_routes)
        .merge(booking_routes)
        .merge(upload_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_secs)))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        crate::handlers::signup,
        crate::handlers::login,
        crate::handlers::auth::forgot_password,
        crate::handlers::auth::verify_otp,
        crate::handlers::change_password,
        // User routes
        crate::handlers::user::list_users,
        crate::handlers::user::get_user,
        crate::handlers::user::create_user,
        crate::handlers::user::update_user,
        crate::handlers::user::delete_user,
        crate::handlers::user::list_admins,
        crate::handlers::user::create_admin,
        // Post routes
        crate::handlers::post::list_posts,
        crate::handlers::post::get_post,
        crate::handlers::post::create_post,
        crate::handlers::post::update_post,
        crate::handlers::post::delete_post,
        crate::handlers::post::approve_post,
        crate::handlers::post::reject_post,
        crate::handlers::post::like_post,
        crate::handlers::post::comment_post,
        // Category routes
        crate::handlers::category::list_categories,
        crate::handlers::category::create_category,
        crate::handlers::category::update_category,
        crate::handlers::category::delete_category,
        // Banner routes
        crate::handlers::banner::list_banners,
        crate::handlers::banner::create_banner,
        crate::handlers::banner::update_banner,
        crate::handlers::banner::delete_banner,
        // Contact routes
        crate::handlers::contact::submit_contact,
        crate::handlers::contact::list_contacts,
        crate::handlers::contact::reply_contact,
        crate::handlers::contact::delete_contact,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::Paginated<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::error::AppError,
            // Auth
            crate::handlers::auth::SignupRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::ForgotPasswordRequest,
            crate::handlers::auth::VerifyOtpRequest,
            crate::handlers::auth::ChangePasswordRequest,
            // User
            crate::handlers::user::UserResponse,
            crate::handlers::user::CreateUserRequest,
            crate::handlers::user::UpdateUserRequest,
            crate::handlers::user::CreateAdminRequest,
            // Post
            crate::handlers::post::PostResponse,
            crate::handlers::post::CommentResponse,
            crate::handlers::post::CreatePostRequest,
            crate::handlers::post::UpdatePostRequest,
            crate::handlers::post::RejectPostRequest,
            crate::handlers::post::CommentRequest,
            crate::handlers::post::PostListQuery,
            // Category
            crate::handlers::category::CategoryResponse,
            crate::handlers::category::CreateCategoryRequest,
            crate::handlers::category::UpdateCategoryRequest,
            // Banner
            crate::handlers::banner::BannerResponse,
            crate::handlers::banner::CreateBannerRequest,
            crate::handlers::banner::UpdateBannerRequest,
            // Contact
            crate::handlers::contact::ContactMessageResponse,
            crate::handlers::contact::SubmitContactRequest,
            crate::handlers::contact::ReplyContactRequest,
        )
    ),
    tags(
        (name = "auth", description = "Authentication and password reset"),
        (name = "users", description = "User administration"),
        (name = "posts", description = "Posts, moderation and engagement"),
        (name = "categories", description = "Category management"),
        (name = "banners", description = "Site banners"),
        (name = "contact", description = "Contact form"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kbase=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting kbase API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    services::bootstrap_superadmin::ensure_bootstrap_superadmin(&db)
        .await
        .map_err(|e| anyhow::anyhow!("Superadmin bootstrap failed: {e}"))?;

    let email_service = services::email::EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, emails will be skipped");
    }

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(email_service));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    // ConnectInfo feeds the per-IP rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<crate::config::jwt::JwtConfig> {
    // JWT config — validated and cached
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(
    Extension(db): Extension<DatabaseConnection>,
) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "kbase API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}

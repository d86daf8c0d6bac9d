use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::{auth_middleware, optional_auth_middleware};
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public = public_routes(&rate_limit_config)
        .layer(middleware::from_fn(optional_auth_middleware));
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public).merge(protected)
}

/// Credential routes: signup, login, OTP password reset.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/signup", routing::post(handlers::signup))
        .route("/auth/login", routing::post(handlers::login))
        .route("/auth/forgot", routing::post(handlers::forgot_password))
        .route("/auth/verify-otp", routing::post(handlers::verify_otp));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public routes. Post reads run behind optional auth so the visibility
/// predicate can widen results for authors and moderators.
fn public_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Posts
        .route("/posts", routing::get(handlers::post::list_posts))
        .route("/posts/{id}", routing::get(handlers::post::get_post))
        // Categories
        .route(
            "/categories",
            routing::get(handlers::category::list_categories),
        )
        // Banners
        .route("/banners", routing::get(handlers::banner::list_banners))
        // Contact form
        .route("/contact", routing::post(handlers::contact::submit_contact));

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Authenticated routes; role gates live in the handlers.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route(
            "/auth/change-password",
            routing::post(handlers::change_password),
        )
        // Posts
        .route("/posts", routing::post(handlers::post::create_post))
        .route(
            "/posts/{id}",
            routing::put(handlers::post::update_post).delete(handlers::post::delete_post),
        )
        .route(
            "/posts/{id}/approve",
            routing::post(handlers::post::approve_post),
        )
        .route(
            "/posts/{id}/reject",
            routing::post(handlers::post::reject_post),
        )
        .route("/posts/{id}/like", routing::post(handlers::post::like_post))
        .route(
            "/posts/{id}/comment",
            routing::post(handlers::post::comment_post),
        )
        // Users (admin)
        .route(
            "/users",
            routing::get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/users/admins",
            routing::get(handlers::user::list_admins).post(handlers::user::create_admin),
        )
        .route(
            "/users/{id}",
            routing::get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        // Categories (admin writes)
        .route(
            "/categories",
            routing::post(handlers::category::create_category),
        )
        .route(
            "/categories/{id}",
            routing::put(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
        // Banners (admin writes)
        .route("/banners", routing::post(handlers::banner::create_banner))
        .route(
            "/banners/{id}",
            routing::put(handlers::banner::update_banner)
                .delete(handlers::banner::delete_banner),
        )
        // Contact (admin)
        .route("/contact", routing::get(handlers::contact::list_contacts))
        .route(
            "/contact/{id}/reply",
            routing::post(handlers::contact::reply_contact),
        )
        .route(
            "/contact/{id}",
            routing::delete(handlers::contact::delete_contact),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}

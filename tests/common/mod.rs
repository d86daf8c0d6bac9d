#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};
use tokio::sync::OnceCell;

static INIT: Once = Once::new();
static DB_READY: OnceCell<()> = OnceCell::const_new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
static CATEGORY_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Keep the governor out of the way for test bursts.
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = kbase::config::jwt::JwtConfig::from_env().unwrap();
        let _ = kbase::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Migrate and wipe leftover data exactly once per test binary; every
    // spawn_app waits until the reset has finished before serving.
    DB_READY
        .get_or_init(|| async {
            kbase::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
            cleanup_tables(&db).await;
        })
        .await;

    let email_service = kbase::services::email::EmailService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(kbase::routes::create_routes())
        .layer(axum::middleware::from_fn(
            kbase::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(email_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::new();

    TestApp {
        addr: addr_str,
        db,
        client,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "audit_logs",
        "comments",
        "post_likes",
        "posts",
        "otps",
        "banners",
        "contact_messages",
        "categories",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Sign up a fresh user and return (user_id, token, email).
pub async fn signup_user(app: &TestApp, name_prefix: &str) -> (i32, String, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let email = format!("{}_{}@test.com", name_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/signup"))
        .json(&serde_json::json!({
            "name": format!("{} {}", name_prefix, counter),
            "email": email,
        }))
        .send()
        .await
        .expect("Failed to sign up user");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.unwrap_or_else(|e| {
        panic!("Failed to parse signup response for '{email}': status={status}, error={e}");
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to sign up '{email}': status={status}, body={body}");
    }

    let user_id = body["data"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Signup response missing id: {body:?}")) as i32;
    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("Signup response missing token: {body:?}"))
        .to_string();
    (user_id, token, email)
}

/// Set a user's role by direct database update.
pub async fn set_role(db: &DatabaseConnection, user_id: i32, role: &str) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = $1 WHERE id = $2",
        vec![role.into(), user_id.into()],
    ))
    .await
    .expect("Failed to set user role");
}

pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    set_role(db, user_id, "admin").await;
}

pub async fn make_superadmin(db: &DatabaseConnection, user_id: i32) {
    set_role(db, user_id, "superadmin").await;
}

/// Set a user's password to a known value by direct database update.
pub async fn set_password(db: &DatabaseConnection, user_id: i32, password: &str) {
    let hash = kbase::utils::hash_password(password).unwrap();
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET password_hash = $1 WHERE id = $2",
        vec![hash.into(), user_id.into()],
    ))
    .await
    .expect("Failed to set user password");
}

/// Deactivate a user account.
pub async fn deactivate_user(db: &DatabaseConnection, user_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET is_active = FALSE WHERE id = $1",
        vec![user_id.into()],
    ))
    .await
    .expect("Failed to deactivate user");
}

/// Create a category through the API and return its id.
pub async fn create_category(app: &TestApp, admin_token: &str) -> i32 {
    let counter = CATEGORY_COUNTER.fetch_add(1, Ordering::SeqCst);

    let resp = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "name": format!("Test Category {}", counter),
            "slug": format!("test-category-{}", counter),
            "description": "A test category"
        }))
        .send()
        .await
        .expect("Failed to create category");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");

    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create category: status={status}, body={body}");
    }

    body["data"]["id"].as_i64().expect("Category missing id") as i32
}

/// Create a post through the API and return its id (status: pending).
pub async fn create_post(app: &TestApp, token: &str, category_id: i32, title: &str) -> i32 {
    let resp = app
        .client
        .post(app.url("/posts"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "content": "Some *markdown* content",
            "categoryId": category_id
        }))
        .send()
        .await
        .expect("Failed to create post");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");

    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create post: status={status}, body={body}");
    }

    body["data"]["id"].as_i64().expect("Post missing id") as i32
}

/// Create a post and approve it with the given admin token.
pub async fn create_published_post(
    app: &TestApp,
    author_token: &str,
    admin_token: &str,
    category_id: i32,
    title: &str,
) -> i32 {
    let post_id = create_post(app, author_token, category_id, title).await;

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/approve", post_id)))
        .bearer_auth(admin_token)
        .send()
        .await
        .expect("Failed to approve post");
    assert_eq!(resp.status(), 200, "approve failed for post {post_id}");

    post_id
}

/// Insert an OTP row directly, hashed with the production primitive.
pub async fn insert_otp(
    db: &DatabaseConnection,
    user_id: i32,
    code: &str,
    expires_in_minutes: i64,
    used: bool,
) {
    let now = chrono::Utc::now().naive_utc();
    let record = kbase::models::otp::ActiveModel {
        user_id: sea_orm::ActiveValue::Set(user_id),
        otp_hash: sea_orm::ActiveValue::Set(kbase::utils::hash_password(code).unwrap()),
        purpose: sea_orm::ActiveValue::Set("forgot_password".to_string()),
        used: sea_orm::ActiveValue::Set(used),
        expires_at: sea_orm::ActiveValue::Set(now + chrono::Duration::minutes(expires_in_minutes)),
        created_at: sea_orm::ActiveValue::Set(now),
        ..Default::default()
    };
    record.insert(db).await.expect("Failed to insert OTP");
}

/// Count audit rows for an action/target pair.
pub async fn count_audit_rows(db: &DatabaseConnection, action: &str, target_id: i32) -> i64 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT COUNT(*) FROM audit_logs WHERE action = $1 AND target_id = $2",
            vec![action.into(), target_id.into()],
        ))
        .await
        .expect("Failed to query audit logs")
        .expect("Count query returned no row");
    row.try_get_by_index::<i64>(0).unwrap()
}

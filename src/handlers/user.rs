use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, require_superadmin};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::{ApiResponse, Paginated, PaginationQuery};
use crate::services::email::EmailService;
use crate::services::user::UserService;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Role (user, admin, superadmin)
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Display name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Email address; the generated password is sent here
    #[validate(email)]
    pub email: String,
    /// Optional role, defaults to "user"
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    /// Display name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// Email address
    #[validate(email)]
    pub email: Option<String>,
    /// Role (user, admin, superadmin)
    pub role: Option<String>,
    /// Deactivation flag
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAdminRequest {
    /// Display name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Email address; the generated password is sent here
    #[validate(email)]
    pub email: String,
}

#[utoipa::path(
    get,
    path = "/api/users",
    security(("jwt_token" = [])),
    params(("pageNumber" = Option<u64>, Query, description = "Page number")),
    responses(
        (status = 200, description = "Page of users", body = Paginated<UserResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    let page = params.page();

    let service = UserService::new(db);
    let (users, total) = service.list(page).await?;
    let items = users.into_iter().map(UserResponse::from).collect();

    Ok(ApiResponse::ok(Paginated::new(items, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let service = UserService::new(db);
    let user = service.get_by_id(id).await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    security(("jwt_token" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created, credentials emailed", body = UserResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
    ),
    tag = "users"
)]
pub async fn create_user(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_admin(&auth_user)?;

    let service = UserService::new(db);
    let user = service
        .create(
            &payload.name,
            &payload.email,
            payload.role.as_deref(),
            &email_service,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(UserResponse::from(user)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_admin(&auth_user)?;

    let service = UserService::new(db);
    let user = service
        .update(
            id,
            payload.name,
            payload.email,
            payload.role,
            payload.is_active,
        )
        .await?;

    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User removed", body = serde_json::Value),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn delete_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let service = UserService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "User removed" }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/admins",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All admin and superadmin accounts", body = Vec<UserResponse>),
        (status = 403, description = "Superadmin only", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_admins(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_superadmin(&auth_user)?;

    let service = UserService::new(db);
    let admins = service.list_admins().await?;
    let items: Vec<UserResponse> = admins.into_iter().map(UserResponse::from).collect();

    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/users/admins",
    security(("jwt_token" = [])),
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Admin created, credentials emailed", body = UserResponse),
        (status = 403, description = "Superadmin only", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
    ),
    tag = "users"
)]
pub async fn create_admin(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Json(payload): Json<CreateAdminRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_superadmin(&auth_user)?;

    let service = UserService::new(db);
    let user = service
        .create_admin(&payload.name, &payload.email, &email_service)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(UserResponse::from(user)),
    ))
}

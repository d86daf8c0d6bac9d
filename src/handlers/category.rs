use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_admin;
use crate::middleware::AuthUser;
use crate::models::CategoryModel;
use crate::response::ApiResponse;
use crate::services::category::CategoryService;
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(c: CategoryModel) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    /// Unique category name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// URL slug (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub slug: String,
    /// Optional description
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories", body = Vec<CategoryResponse>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    let categories = service.list().await?;
    let items: Vec<CategoryResponse> = categories.into_iter().map(CategoryResponse::from).collect();

    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    security(("jwt_token" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Category name taken", body = AppError),
    ),
    tag = "categories"
)]
pub async fn create_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_admin(&auth_user)?;

    let service = CategoryService::new(db);
    let category = service
        .create(&payload.name, &payload.slug, payload.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(CategoryResponse::from(category)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "categories"
)]
pub async fn update_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_admin(&auth_user)?;

    let service = CategoryService::new(db);
    let category = service
        .update(id, payload.name, payload.slug, payload.description)
        .await?;

    Ok(ApiResponse::ok(CategoryResponse::from(category)))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category removed", body = serde_json::Value),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Category not found", body = AppError),
        (status = 409, description = "Category still referenced by posts", body = AppError),
    ),
    tag = "categories"
)]
pub async fn delete_category(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let service = CategoryService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Category removed" }),
    ))
}

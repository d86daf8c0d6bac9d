use crate::error::{AppError, AppResult};
use crate::middleware::auth::{parse_user_id, require_admin};
use crate::middleware::AuthUser;
use crate::models::BannerModel;
use crate::response::ApiResponse;
use crate::services::banner::BannerService;
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct BannerResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub link: Option<String>,
    pub is_active: bool,
    pub visible_from: Option<String>,
    pub visible_to: Option<String>,
    pub created_at: String,
}

impl From<BannerModel> for BannerResponse {
    fn from(b: BannerModel) -> Self {
        Self {
            id: b.id,
            title: b.title,
            content: b.content,
            link: b.link,
            is_active: b.is_active,
            visible_from: b.visible_from.map(|t| t.to_string()),
            visible_to: b.visible_to.map(|t| t.to_string()),
            created_at: b.created_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBannerRequest {
    /// Banner title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Banner body
    #[validate(length(min = 1))]
    pub content: String,
    /// Optional click-through link
    pub link: Option<String>,
    /// Start of the display window (inclusive)
    #[serde(rename = "visibleFrom")]
    pub visible_from: Option<NaiveDateTime>,
    /// End of the display window (inclusive)
    #[serde(rename = "visibleTo")]
    pub visible_to: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBannerRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[serde(rename = "visibleFrom")]
    pub visible_from: Option<NaiveDateTime>,
    #[serde(rename = "visibleTo")]
    pub visible_to: Option<NaiveDateTime>,
}

#[utoipa::path(
    get,
    path = "/api/banners",
    responses(
        (status = 200, description = "Active banners inside their display window", body = Vec<BannerResponse>),
    ),
    tag = "banners"
)]
pub async fn list_banners(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = BannerService::new(db);
    let banners = service.list_active().await?;
    let items: Vec<BannerResponse> = banners.into_iter().map(BannerResponse::from).collect();

    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/banners",
    security(("jwt_token" = [])),
    request_body = CreateBannerRequest,
    responses(
        (status = 201, description = "Banner created", body = BannerResponse),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "banners"
)]
pub async fn create_banner(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateBannerRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_admin(&auth_user)?;
    let created_by = parse_user_id(&auth_user)?;

    let service = BannerService::new(db);
    let banner = service
        .create(
            created_by,
            &payload.title,
            &payload.content,
            payload.link,
            payload.visible_from,
            payload.visible_to,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(BannerResponse::from(banner)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/banners/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Banner ID")),
    request_body = UpdateBannerRequest,
    responses(
        (status = 200, description = "Banner updated", body = BannerResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Banner not found", body = AppError),
    ),
    tag = "banners"
)]
pub async fn update_banner(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateBannerRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_admin(&auth_user)?;

    let service = BannerService::new(db);
    let banner = service
        .update(
            id,
            payload.title,
            payload.content,
            payload.link,
            payload.is_active,
            payload.visible_from,
            payload.visible_to,
        )
        .await?;

    Ok(ApiResponse::ok(BannerResponse::from(banner)))
}

#[utoipa::path(
    delete,
    path = "/api/banners/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Banner ID")),
    responses(
        (status = 200, description = "Banner removed", body = serde_json::Value),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Banner not found", body = AppError),
    ),
    tag = "banners"
)]
pub async fn delete_banner(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let service = BannerService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Banner removed" }),
    ))
}

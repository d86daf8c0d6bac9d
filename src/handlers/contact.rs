use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_admin;
use crate::middleware::AuthUser;
use crate::models::ContactMessageModel;
use crate::response::ApiResponse;
use crate::services::contact::ContactService;
use crate::services::email::EmailService;
use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactMessageResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// "open" or "replied"
    pub status: String,
    pub reply_message: Option<String>,
    pub replied_at: Option<String>,
    pub created_at: String,
}

impl From<ContactMessageModel> for ContactMessageResponse {
    fn from(m: ContactMessageModel) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            subject: m.subject,
            message: m.message,
            status: m.status,
            reply_message: m.reply_message,
            replied_at: m.replied_at.map(|t| t.to_string()),
            created_at: m.created_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitContactRequest {
    /// Sender name
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Sender email
    #[validate(email)]
    pub email: String,
    /// Subject line
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    /// Message body
    #[validate(length(min = 1))]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyContactRequest {
    /// Reply body sent to the submitter
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = SubmitContactRequest,
    responses(
        (status = 201, description = "Message stored, admin notified", body = ContactMessageResponse),
        (status = 400, description = "Missing fields", body = AppError),
    ),
    tag = "contact"
)]
pub async fn submit_contact(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<SubmitContactRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|_| AppError::Validation("Please provide all fields".to_string()))?;

    let service = ContactService::new(db);
    let message = service
        .submit(
            &payload.name,
            &payload.email,
            &payload.subject,
            &payload.message,
            &email_service,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(ContactMessageResponse::from(message)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/contact",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All contact messages, newest first", body = Vec<ContactMessageResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "contact"
)]
pub async fn list_contacts(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let service = ContactService::new(db);
    let messages = service.list().await?;
    let items: Vec<ContactMessageResponse> = messages
        .into_iter()
        .map(ContactMessageResponse::from)
        .collect();

    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/contact/{id}/reply",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Contact message ID")),
    request_body = ReplyContactRequest,
    responses(
        (status = 200, description = "Reply sent and recorded", body = serde_json::Value),
        (status = 400, description = "Missing reply message", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Contact message not found", body = AppError),
        (status = 500, description = "Email could not be sent", body = AppError),
    ),
    tag = "contact"
)]
pub async fn reply_contact(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ReplyContactRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let service = ContactService::new(db);
    service.reply(id, &payload.message, &email_service).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Reply sent successfully" }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/contact/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Contact message ID")),
    responses(
        (status = 200, description = "Contact message removed", body = serde_json::Value),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Contact message not found", body = AppError),
    ),
    tag = "contact"
)]
pub async fn delete_contact(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;

    let service = ContactService::new(db);
    service.delete(id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Contact message removed" }),
    ))
}

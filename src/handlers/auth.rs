use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::services::email::EmailService;
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    /// Display name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Email address; the generated password is sent here
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Account password
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// User ID
    pub id: i32,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Role (user, admin, superadmin)
    pub role: String,
    /// Bearer token
    pub token: String,
}

impl AuthResponse {
    fn new(user: UserModel, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered, password emailed", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
    ),
    tag = "auth"
)]
pub async fn signup(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    let (user, token) = service
        .register(&payload.name, &payload.email, &email_service)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(AuthResponse::new(user, token)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or deactivated account", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (user, token) = service.login(&payload.email, &payload.password).await?;

    Ok(ApiResponse::ok(AuthResponse::new(user, token)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    /// Email address
    #[validate(email)]
    pub email: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "OTP sent to email", body = serde_json::Value),
        (status = 404, description = "No such user", body = AppError),
        (status = 500, description = "Email could not be sent", body = AppError),
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .forgot_password(&payload.email, &email_service)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "OTP sent to email" }),
    ))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpRequest {
    /// Email address
    #[validate(email)]
    pub email: String,
    /// 6-digit reset code
    #[validate(length(min = 6, max = 6))]
    pub otp: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Password reset, temporary password emailed", body = serde_json::Value),
        (status = 400, description = "Invalid or expired OTP", body = AppError),
        (status = 404, description = "No such user", body = AppError),
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<VerifyOtpRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .verify_otp(&payload.email, &payload.otp, &email_service)
        .await?;

    Ok(ApiResponse::ok(serde_json::json!({
        "message": "Password reset successful. Check email for new password."
    })))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    /// Current password
    pub old_password: String,
    /// New password (min 8 characters)
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    security(("jwt_token" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = serde_json::Value),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Invalid old password", body = AppError),
    ),
    tag = "auth"
)]
pub async fn change_password(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = parse_user_id(&auth_user)?;

    let service = AuthService::new(db);
    service
        .change_password(user_id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Password updated successfully" }),
    ))
}

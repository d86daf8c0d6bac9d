use crate::error::{AppError, AppResult};
use crate::middleware::auth::{parse_user_id, require_admin};
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{CommentModel, PostModel};
use crate::response::{ApiResponse, Paginated};
use crate::services::email::EmailService;
use crate::services::moderation::ModerationService;
use crate::services::post::{PostListFilter, PostService};
use crate::services::visibility::Viewer;
use crate::utils::render_markdown;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    /// Post title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Post content (Markdown)
    #[validate(length(min = 1))]
    pub content: String,
    /// Category ID
    #[serde(rename = "categoryId")]
    pub category_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    /// Post title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// Post content (Markdown)
    #[validate(length(min = 1))]
    pub content: Option<String>,
    /// Category ID
    #[serde(rename = "categoryId")]
    pub category_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectPostRequest {
    /// Reason shown to the author
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentRequest {
    /// Comment text
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    /// Commenter display name
    pub author_name: String,
    pub text: String,
    pub created_at: String,
}

impl CommentResponse {
    fn new(comment: CommentModel, author_name: String) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            author_name,
            text: comment.body,
            created_at: comment.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: i32,
    pub author_id: i32,
    /// Author display name
    pub author_name: String,
    pub category_id: i32,
    /// Category name
    pub category_name: String,
    pub title: String,
    /// Raw Markdown content
    pub content: String,
    /// Sanitized rendered HTML
    pub content_html: String,
    /// Moderation status (pending, published, rejected)
    pub status: String,
    /// Present only while rejected
    pub reject_reason: Option<String>,
    pub published_at: Option<String>,
    pub view_count: i32,
    pub created_at: String,
    pub updated_at: String,
    /// User ids that like this post
    pub likes: Vec<i32>,
    pub comments: Vec<CommentResponse>,
}

impl PostResponse {
    fn from_parts(p: PostModel, author_name: String, category_name: String) -> Self {
        let content_html = render_markdown(&p.content);
        Self {
            id: p.id,
            author_id: p.author_id,
            author_name,
            category_id: p.category_id,
            category_name,
            title: p.title,
            content: p.content,
            content_html,
            status: p.status,
            reject_reason: p.reject_reason,
            published_at: p.published_at.map(|t| t.to_string()),
            view_count: p.view_count,
            created_at: p.created_at.to_string(),
            updated_at: p.updated_at.to_string(),
            likes: Vec::new(),
            comments: Vec::new(),
        }
    }

    fn with_engagement(mut self, likes: Vec<i32>, comments: Vec<CommentResponse>) -> Self {
        self.likes = likes;
        self.comments = comments;
        self
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostListQuery {
    /// Page number (fixed page size of 10)
    #[serde(rename = "pageNumber")]
    pub page_number: Option<u64>,
    /// Case-insensitive title keyword
    pub keyword: Option<String>,
    /// Filter by category ID
    pub category: Option<i32>,
    /// Filter by author ID
    #[serde(rename = "authorId")]
    pub author_id: Option<i32>,
    /// Filter by moderation status (honored for moderators and own feeds)
    pub status: Option<String>,
}

/// Assemble responses for a page of posts, batch-resolving display names.
async fn to_responses(
    service: &PostService,
    posts: Vec<PostModel>,
) -> AppResult<Vec<PostResponse>> {
    let author_ids: Vec<i32> = posts.iter().map(|p| p.author_id).collect();
    let category_ids: Vec<i32> = posts.iter().map(|p| p.category_id).collect();
    let authors = service.user_names(&author_ids).await?;
    let categories = service.category_names(&category_ids).await?;

    Ok(posts
        .into_iter()
        .map(|p| {
            let author_name = authors.get(&p.author_id).cloned().unwrap_or_default();
            let category_name = categories.get(&p.category_id).cloned().unwrap_or_default();
            PostResponse::from_parts(p, author_name, category_name)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/posts",
    params(
        ("pageNumber" = Option<u64>, Query, description = "Page number"),
        ("keyword" = Option<String>, Query, description = "Title keyword"),
        ("category" = Option<i32>, Query, description = "Category ID"),
        ("authorId" = Option<i32>, Query, description = "Author ID"),
        ("status" = Option<String>, Query, description = "Status filter"),
    ),
    responses(
        (status = 200, description = "Page of visible posts", body = Paginated<PostResponse>),
    ),
    tag = "posts"
)]
pub async fn list_posts(
    Extension(db): Extension<DatabaseConnection>,
    MaybeAuthUser(auth): MaybeAuthUser,
    Query(params): Query<PostListQuery>,
) -> AppResult<impl IntoResponse> {
    let viewer = Viewer::from_auth(auth.as_ref());
    let page = params.page_number.unwrap_or(1).max(1);

    let filter = PostListFilter {
        keyword: params.keyword,
        category_id: params.category,
        author_id: params.author_id,
        status: params.status,
    };

    let service = PostService::new(db);
    let (posts, total) = service.list(&viewer, filter, page).await?;
    let items = to_responses(&service, posts).await?;

    Ok(ApiResponse::ok(Paginated::new(items, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post not found or not visible", body = AppError),
    ),
    tag = "posts"
)]
pub async fn get_post(
    Extension(db): Extension<DatabaseConnection>,
    MaybeAuthUser(auth): MaybeAuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let viewer = Viewer::from_auth(auth.as_ref());

    let service = PostService::new(db);
    let post = service.get_visible(&viewer, id).await?;

    let likes = service.likes(id).await?;
    let comments = service.comments(id).await?;

    let mut commenter_ids: Vec<i32> = comments.iter().map(|c| c.user_id).collect();
    commenter_ids.push(post.author_id);
    let names = service.user_names(&commenter_ids).await?;
    let categories = service.category_names(&[post.category_id]).await?;

    let author_name = names.get(&post.author_id).cloned().unwrap_or_default();
    let category_name = categories
        .get(&post.category_id)
        .cloned()
        .unwrap_or_default();

    let comments = comments
        .into_iter()
        .map(|c| {
            let name = names.get(&c.user_id).cloned().unwrap_or_default();
            CommentResponse::new(c, name)
        })
        .collect();

    let response =
        PostResponse::from_parts(post, author_name, category_name).with_engagement(likes, comments);
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    security(("jwt_token" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created in pending state", body = PostResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "posts"
)]
pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = parse_user_id(&auth_user)?;

    let service = PostService::new(db);
    let post = service
        .create(user_id, &payload.title, &payload.content, payload.category_id)
        .await?;

    let items = to_responses(&service, vec![post]).await?;
    let response = items.into_iter().next().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Created post missing from response"))
    })?;

    Ok((StatusCode::CREATED, ApiResponse::ok(response)))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Published posts cannot be edited by their author", body = AppError),
        (status = 401, description = "Not the author or a moderator", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn update_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let viewer = Viewer::from_auth(Some(&auth_user));

    let service = PostService::new(db);
    let post = service
        .update(
            &viewer,
            id,
            payload.title,
            payload.content,
            payload.category_id,
        )
        .await?;

    let items = to_responses(&service, vec![post]).await?;
    let response = items.into_iter().next().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Updated post missing from response"))
    })?;

    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post removed", body = serde_json::Value),
        (status = 401, description = "Not the author or a moderator", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn delete_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let viewer = Viewer::from_auth(Some(&auth_user));

    let service = PostService::new(db);
    service.delete(&viewer, id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Post removed" }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/approve",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post approved and published", body = serde_json::Value),
        (status = 400, description = "Post is not pending", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn approve_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let admin_id = require_admin(&auth_user)?;

    let service = ModerationService::new(db);
    service.approve(admin_id, id, &email_service).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Post approved" }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/reject",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    request_body = RejectPostRequest,
    responses(
        (status = 200, description = "Post rejected", body = serde_json::Value),
        (status = 400, description = "Missing reason or post not pending", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn reject_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<RejectPostRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = require_admin(&auth_user)?;

    let service = ModerationService::new(db);
    service
        .reject(admin_id, id, &payload.reason, &email_service)
        .await?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "message": "Post rejected" }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Resulting like set (user ids)", body = Vec<i32>),
        (status = 404, description = "Post not found or not visible", body = AppError),
    ),
    tag = "posts"
)]
pub async fn like_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let viewer = Viewer::from_auth(Some(&auth_user));

    let service = PostService::new(db);
    let likes = service.toggle_like(&viewer, user_id, id).await?;

    Ok(ApiResponse::ok(likes))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/comment",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment appended", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Post not found or not visible", body = AppError),
    ),
    tag = "posts"
)]
pub async fn comment_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = parse_user_id(&auth_user)?;
    let viewer = Viewer::from_auth(Some(&auth_user));

    let service = PostService::new(db);
    let comment = service.add_comment(&viewer, user_id, id, &payload.text).await?;

    let names: HashMap<i32, String> = service.user_names(&[user_id]).await?;
    let author_name = names.get(&user_id).cloned().unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(CommentResponse::new(comment, author_name)),
    ))
}

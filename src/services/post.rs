use crate::{
    error::{AppError, AppResult},
    models::{
        comment, post, post_like, user, Category, Comment, CommentModel, Post, PostLike,
        PostModel, User, STATUS_PENDING, STATUS_REJECTED,
    },
    response::PAGE_SIZE,
    services::visibility::Viewer,
};
use sea_orm::{
    sea_query::{extension::postgres::PgExpr, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
};
use std::collections::HashMap;

pub struct PostService {
    db: DatabaseConnection,
}

#[derive(Debug, Default)]
pub struct PostListFilter {
    pub keyword: Option<String>,
    pub category_id: Option<i32>,
    pub author_id: Option<i32>,
    pub status: Option<String>,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// List posts the viewer may see, newest first, fixed page size.
    ///
    /// The status filter the caller asked for is folded through the
    /// visibility predicate: strangers and anonymous callers are pinned to
    /// published regardless of what they requested.
    pub async fn list(
        &self,
        viewer: &Viewer,
        filter: PostListFilter,
        page: u64,
    ) -> AppResult<(Vec<PostModel>, u64)> {
        let mut query = Post::find();

        if let Some(keyword) = filter.keyword.as_deref() {
            if !keyword.is_empty() {
                query = query.filter(
                    Expr::col((post::Entity, post::Column::Title))
                        .ilike(format!("%{}%", escape_like(keyword))),
                );
            }
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(post::Column::CategoryId.eq(category_id));
        }
        if let Some(author_id) = filter.author_id {
            query = query.filter(post::Column::AuthorId.eq(author_id));
        }
        if let Some(status) = viewer.status_filter(filter.author_id, filter.status) {
            query = query.filter(post::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, PAGE_SIZE);

        let total = paginator.num_items().await?;
        let posts = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((posts, total))
    }

    /// Fetch a single post the viewer may see and bump its view counter.
    ///
    /// Non-visible posts yield NotFound — existence is not revealed.
    pub async fn get_visible(&self, viewer: &Viewer, id: i32) -> AppResult<PostModel> {
        let mut post = self.get_by_id(id).await?;

        if !viewer.can_view(&post) {
            return Err(AppError::NotFound(
                "Post not found or not authorized to view".to_string(),
            ));
        }

        self.increment_view_count(id).await?;
        post.view_count += 1;
        Ok(post)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PostModel> {
        Post::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// Create a post; every post starts out pending review.
    pub async fn create(
        &self,
        author_id: i32,
        title: &str,
        content: &str,
        category_id: i32,
    ) -> AppResult<PostModel> {
        Category::find_by_id(category_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Category not found".to_string()))?;

        let now = chrono::Utc::now().naive_utc();

        let new_post = post::ActiveModel {
            author_id: sea_orm::ActiveValue::Set(author_id),
            category_id: sea_orm::ActiveValue::Set(category_id),
            title: sea_orm::ActiveValue::Set(title.to_string()),
            content: sea_orm::ActiveValue::Set(content.to_string()),
            status: sea_orm::ActiveValue::Set(STATUS_PENDING.to_string()),
            view_count: sea_orm::ActiveValue::Set(0),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let post = new_post.insert(&self.db).await?;
        Ok(post)
    }

    /// Update a post under the moderation rules:
    /// only the author or a moderator may edit; published posts are locked
    /// for their author; editing a rejected post sends it back to pending
    /// and clears the reject reason.
    pub async fn update(
        &self,
        viewer: &Viewer,
        id: i32,
        title: Option<String>,
        content: Option<String>,
        category_id: Option<i32>,
    ) -> AppResult<PostModel> {
        let existing = self.get_by_id(id).await?;

        if !viewer.is_author_of(&existing) && !viewer.is_moderator {
            return Err(AppError::Unauthorized(
                "Not authorized to update this post".to_string(),
            ));
        }

        if existing.status == crate::models::STATUS_PUBLISHED && !viewer.is_moderator {
            return Err(AppError::Validation(
                "Cannot edit published post".to_string(),
            ));
        }

        if let Some(category_id) = category_id {
            Category::find_by_id(category_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::Validation("Category not found".to_string()))?;
        }

        let was_rejected = existing.status == STATUS_REJECTED;
        let now = chrono::Utc::now().naive_utc();

        let mut active: post::ActiveModel = existing.into();
        if let Some(title) = title {
            active.title = sea_orm::ActiveValue::Set(title);
        }
        if let Some(content) = content {
            active.content = sea_orm::ActiveValue::Set(content);
        }
        if let Some(category_id) = category_id {
            active.category_id = sea_orm::ActiveValue::Set(category_id);
        }
        if was_rejected {
            active.status = sea_orm::ActiveValue::Set(STATUS_PENDING.to_string());
            active.reject_reason = sea_orm::ActiveValue::Set(None);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Delete a post; owners may delete from any state, moderators always.
    pub async fn delete(&self, viewer: &Viewer, id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;

        if !viewer.is_author_of(&existing) && !viewer.is_moderator {
            return Err(AppError::Unauthorized(
                "Not authorized to delete this post".to_string(),
            ));
        }

        Post::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    /// Toggle the caller's like and return the resulting like set.
    ///
    /// delete-then-insert inside one transaction, backed by the
    /// (post_id, user_id) unique constraint, so concurrent toggles cannot
    /// lose updates the way a read-modify-write over an embedded array would.
    pub async fn toggle_like(&self, viewer: &Viewer, user_id: i32, post_id: i32) -> AppResult<Vec<i32>> {
        let post = self.get_by_id(post_id).await?;
        if !viewer.can_view(&post) {
            return Err(AppError::NotFound(
                "Post not found or not authorized to view".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let deleted = PostLike::delete_many()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        if deleted.rows_affected == 0 {
            txn.execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "INSERT INTO post_likes (post_id, user_id, created_at) VALUES ($1, $2, NOW())
                 ON CONFLICT (post_id, user_id) DO NOTHING",
                vec![post_id.into(), user_id.into()],
            ))
            .await?;
        }

        txn.commit().await?;

        self.likes(post_id).await
    }

    /// User ids that currently like the post, oldest like first.
    pub async fn likes(&self, post_id: i32) -> AppResult<Vec<i32>> {
        let likes = PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .order_by_asc(post_like::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(likes.into_iter().map(|l| l.user_id).collect())
    }

    /// Append a comment. No edit, no delete, no ownership rules beyond
    /// authentication and being able to view the post.
    pub async fn add_comment(
        &self,
        viewer: &Viewer,
        user_id: i32,
        post_id: i32,
        body: &str,
    ) -> AppResult<CommentModel> {
        let post = self.get_by_id(post_id).await?;
        if !viewer.can_view(&post) {
            return Err(AppError::NotFound(
                "Post not found or not authorized to view".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let new_comment = comment::ActiveModel {
            post_id: sea_orm::ActiveValue::Set(post_id),
            user_id: sea_orm::ActiveValue::Set(user_id),
            body: sea_orm::ActiveValue::Set(body.to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = new_comment.insert(&self.db).await?;
        Ok(saved)
    }

    /// Comments for a post in insertion order.
    pub async fn comments(&self, post_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    /// Batch-resolve user display names for response assembly.
    pub async fn user_names(&self, user_ids: &[i32]) -> AppResult<HashMap<i32, String>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = User::find()
            .filter(user::Column::Id.is_in(user_ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(users.into_iter().map(|u| (u.id, u.name)).collect())
    }

    /// Batch-resolve category names for response assembly.
    pub async fn category_names(
        &self,
        category_ids: &[i32],
    ) -> AppResult<HashMap<i32, String>> {
        if category_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let categories = Category::find()
            .filter(crate::models::category::Column::Id.is_in(category_ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(categories.into_iter().map(|c| (c.id, c.name)).collect())
    }

    async fn increment_view_count(&self, id: i32) -> AppResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE posts SET view_count = view_count + 1 WHERE id = $1",
                [id.into()],
            ))
            .await?;
        Ok(())
    }
}

/// Escape LIKE wildcards so a keyword matches literally.
fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

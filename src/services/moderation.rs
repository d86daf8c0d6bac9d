use crate::{
    error::{AppError, AppResult},
    models::{
        audit_log, post, Post, PostModel, User, STATUS_PENDING, STATUS_PUBLISHED,
        STATUS_REJECTED,
    },
    services::email::EmailService,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};

/// Admin review of user-authored posts: the pending → published/rejected
/// transitions, each paired with an audit row and an author notification.
pub struct ModerationService {
    db: DatabaseConnection,
}

pub const ACTION_APPROVE_POST: &str = "approve_post";
pub const ACTION_REJECT_POST: &str = "reject_post";
const TARGET_TYPE_POST: &str = "post";

impl ModerationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// pending → published. Sets the publication timestamp, records the
    /// reviewing admin, clears any reject reason.
    pub async fn approve(
        &self,
        admin_id: i32,
        post_id: i32,
        email_service: &EmailService,
    ) -> AppResult<PostModel> {
        let existing = self.pending_post(post_id, "approved").await?;
        let title = existing.title.clone();
        let now = chrono::Utc::now().naive_utc();

        let mut active: post::ActiveModel = existing.into();
        active.status = sea_orm::ActiveValue::Set(STATUS_PUBLISHED.to_string());
        active.published_at = sea_orm::ActiveValue::Set(Some(now));
        active.admin_id = sea_orm::ActiveValue::Set(Some(admin_id));
        active.reject_reason = sea_orm::ActiveValue::Set(None);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let updated = active.update(&self.db).await?;

        self.append_audit(admin_id, ACTION_APPROVE_POST, post_id, None)
            .await?;

        self.notify_author(&updated, |email| async move {
            email_service.send_post_approved_email(&email, &title).await
        })
        .await;

        Ok(updated)
    }

    /// pending → rejected, with a mandatory reason.
    pub async fn reject(
        &self,
        admin_id: i32,
        post_id: i32,
        reason: &str,
        email_service: &EmailService,
    ) -> AppResult<PostModel> {
        if reason.trim().is_empty() {
            return Err(AppError::Validation(
                "A reject reason is required".to_string(),
            ));
        }

        let existing = self.pending_post(post_id, "rejected").await?;
        let title = existing.title.clone();
        let now = chrono::Utc::now().naive_utc();

        let mut active: post::ActiveModel = existing.into();
        active.status = sea_orm::ActiveValue::Set(STATUS_REJECTED.to_string());
        active.admin_id = sea_orm::ActiveValue::Set(Some(admin_id));
        active.reject_reason = sea_orm::ActiveValue::Set(Some(reason.to_string()));
        active.updated_at = sea_orm::ActiveValue::Set(now);
        let updated = active.update(&self.db).await?;

        self.append_audit(
            admin_id,
            ACTION_REJECT_POST,
            post_id,
            Some(serde_json::json!({ "reason": reason })),
        )
        .await?;

        let reason = reason.to_string();
        self.notify_author(&updated, |email| async move {
            email_service
                .send_post_rejected_email(&email, &title, &reason)
                .await
        })
        .await;

        Ok(updated)
    }

    /// The state machine only defines approve/reject out of pending.
    async fn pending_post(&self, post_id: i32, verb: &str) -> AppResult<PostModel> {
        let post = Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if post.status != STATUS_PENDING {
            return Err(AppError::Validation(format!(
                "Only pending posts can be {verb}"
            )));
        }

        Ok(post)
    }

    /// One immutable row per moderation action.
    async fn append_audit(
        &self,
        admin_id: i32,
        action: &str,
        post_id: i32,
        details: Option<serde_json::Value>,
    ) -> AppResult<()> {
        let now = chrono::Utc::now().naive_utc();
        let entry = audit_log::ActiveModel {
            admin_id: sea_orm::ActiveValue::Set(admin_id),
            action: sea_orm::ActiveValue::Set(action.to_string()),
            target_id: sea_orm::ActiveValue::Set(post_id),
            target_type: sea_orm::ActiveValue::Set(TARGET_TYPE_POST.to_string()),
            details: sea_orm::ActiveValue::Set(details),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        entry.insert(&self.db).await?;
        Ok(())
    }

    /// Mail the post author; failures are logged and swallowed so the
    /// moderation action itself still succeeds.
    async fn notify_author<F, Fut>(&self, post: &PostModel, send: F)
    where
        F: FnOnce(String) -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<()>>,
    {
        let author = match User::find_by_id(post.author_id).one(&self.db).await {
            Ok(Some(author)) => author,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Failed to load author for notification: {e}");
                return;
            }
        };

        if let Err(e) = send(author.email).await {
            tracing::warn!("Failed to send moderation email: {e}");
        }
    }
}

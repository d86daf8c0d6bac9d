use crate::{
    error::{AppError, AppResult},
    models::{contact_message, ContactMessage, ContactMessageModel},
    services::email::EmailService,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder};

pub struct ContactService {
    db: DatabaseConnection,
}

const STATUS_OPEN: &str = "open";
const STATUS_REPLIED: &str = "replied";

impl ContactService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Store a contact-form submission and notify the admin address.
    /// The message is saved either way; notification failure is swallowed.
    pub async fn submit(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
        email_service: &EmailService,
    ) -> AppResult<ContactMessageModel> {
        let now = chrono::Utc::now().naive_utc();
        let new_message = contact_message::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            email: sea_orm::ActiveValue::Set(email.to_string()),
            subject: sea_orm::ActiveValue::Set(subject.to_string()),
            message: sea_orm::ActiveValue::Set(message.to_string()),
            status: sea_orm::ActiveValue::Set(STATUS_OPEN.to_string()),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let saved = new_message.insert(&self.db).await?;

        if let Err(e) = email_service
            .send_contact_notification(name, email, subject, message)
            .await
        {
            tracing::warn!("Failed to send contact notification email: {e}");
        }

        Ok(saved)
    }

    pub async fn list(&self) -> AppResult<Vec<ContactMessageModel>> {
        let messages = ContactMessage::find()
            .order_by_desc(contact_message::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(messages)
    }

    /// Reply to the sender by email, then mark the message replied.
    ///
    /// The mail goes out first: if dispatch fails the request fails and the
    /// message stays open.
    pub async fn reply(
        &self,
        id: i32,
        message: &str,
        email_service: &EmailService,
    ) -> AppResult<ContactMessageModel> {
        let existing = self.get_by_id(id).await?;

        if message.trim().is_empty() {
            return Err(AppError::Validation(
                "Please provide a reply message".to_string(),
            ));
        }

        email_service
            .send_contact_reply(&existing.email, &existing.name, &existing.subject, message)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        let now = chrono::Utc::now().naive_utc();
        let mut active: contact_message::ActiveModel = existing.into();
        active.status = sea_orm::ActiveValue::Set(STATUS_REPLIED.to_string());
        active.reply_message = sea_orm::ActiveValue::Set(Some(message.to_string()));
        active.replied_at = sea_orm::ActiveValue::Set(Some(now));

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;
        ContactMessage::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn get_by_id(&self, id: i32) -> AppResult<ContactMessageModel> {
        ContactMessage::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Contact message not found".to_string()))
    }
}

use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel, ROLE_ADMIN, ROLE_SUPERADMIN, ROLE_USER},
    response::PAGE_SIZE,
    services::email::EmailService,
    utils::{generate_password, hash_password},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, page: u64) -> AppResult<(Vec<UserModel>, u64)> {
        let paginator = User::find()
            .order_by_asc(user::Column::Id)
            .paginate(&self.db, PAGE_SIZE);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Admin-created account: generated password, credentials mailed
    /// best-effort.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        role: Option<&str>,
        email_service: &EmailService,
    ) -> AppResult<UserModel> {
        let role = role.unwrap_or(ROLE_USER);
        validate_role(role)?;

        let (user, password) = self
            .insert_with_generated_password(name, email, role)
            .await?;

        if let Err(e) = email_service
            .send_account_created_email(&user.email, &password)
            .await
        {
            tracing::warn!("Failed to send account created email: {e}");
        }

        Ok(user)
    }

    pub async fn update(
        &self,
        id: i32,
        name: Option<String>,
        email: Option<String>,
        role: Option<String>,
        is_active: Option<bool>,
    ) -> AppResult<UserModel> {
        let existing = self.get_by_id(id).await?;

        if let Some(role) = role.as_deref() {
            validate_role(role)?;
        }
        if let Some(email) = email.as_deref() {
            if email != existing.email && self.email_taken(email).await? {
                return Err(AppError::Conflict("User already exists".to_string()));
            }
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = sea_orm::ActiveValue::Set(name);
        }
        if let Some(email) = email {
            active.email = sea_orm::ActiveValue::Set(email);
        }
        if let Some(role) = role {
            active.role = sea_orm::ActiveValue::Set(role);
        }
        if let Some(is_active) = is_active {
            active.is_active = sea_orm::ActiveValue::Set(is_active);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;
        User::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn list_admins(&self) -> AppResult<Vec<UserModel>> {
        let admins = User::find()
            .filter(user::Column::Role.is_in([ROLE_ADMIN, ROLE_SUPERADMIN]))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        Ok(admins)
    }

    /// Superadmin-created admin account.
    pub async fn create_admin(
        &self,
        name: &str,
        email: &str,
        email_service: &EmailService,
    ) -> AppResult<UserModel> {
        let (user, password) = self
            .insert_with_generated_password(name, email, ROLE_ADMIN)
            .await?;

        if let Err(e) = email_service
            .send_admin_granted_email(&user.email, &password)
            .await
        {
            tracing::warn!("Failed to send admin granted email: {e}");
        }

        Ok(user)
    }

    /// Returns the created user and the plaintext password, which exists
    /// only long enough to compose the notification mail.
    async fn insert_with_generated_password(
        &self,
        name: &str,
        email: &str,
        role: &str,
    ) -> AppResult<(UserModel, String)> {
        if self.email_taken(email).await? {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password = generate_password()?;
        let password_hash = hash_password(&password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            email: sea_orm::ActiveValue::Set(email.to_string()),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            role: sea_orm::ActiveValue::Set(role.to_string()),
            is_active: sea_orm::ActiveValue::Set(true),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        Ok((user, password))
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}

fn validate_role(role: &str) -> AppResult<()> {
    if role != ROLE_USER && role != ROLE_ADMIN && role != ROLE_SUPERADMIN {
        return Err(AppError::Validation(format!("Invalid role '{role}'")));
    }
    Ok(())
}

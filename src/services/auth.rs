use crate::{
    error::{AppError, AppResult},
    models::{otp, user, Otp, User, UserModel, OTP_PURPOSE_FORGOT_PASSWORD, ROLE_USER},
    services::email::EmailService,
    utils::{
        encode_token, generate_otp_code, generate_password, hash_password, verify_password,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

pub struct AuthService {
    db: DatabaseConnection,
}

/// OTP codes stay valid for ten minutes from creation.
const OTP_TTL_MINUTES: i64 = 10;

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new user with a generated password, mail the plaintext to
    /// the user (best-effort) and return the account plus a bearer token.
    ///
    /// The plaintext password is never persisted or logged.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        email_service: &EmailService,
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
            role: sea_orm::ActiveValue::Set(ROLE_USER.to_string()),
            is_active: sea_orm::ActiveValue::Set(true),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;

        // Welcome mail failure never fails registration.
        if let Err(e) = email_service.send_welcome_email(&user.email, &password).await {
            tracing::warn!("Failed to send welcome email: {e}");
        }

        let token = encode_token(&user.id.to_string())?;
        Ok((user, token))
    }

    /// Login with email + password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(UserModel, String)> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        let is_valid = verify_password(password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        if !user.is_active {
            return Err(AppError::Unauthorized(
                "User account is deactivated".to_string(),
            ));
        }

        let token = encode_token(&user.id.to_string())?;
        Ok((user, token))
    }

    /// Issue a password-reset OTP and mail the plaintext code.
    ///
    /// Unlike every other mail in the system, a dispatch failure here fails
    /// the request: the caller must know the code never left the building.
    pub async fn forgot_password(
        &self,
        email: &str,
        email_service: &EmailService,
    ) -> AppResult<()> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let code = generate_otp_code()?;
        let otp_hash = hash_password(&code)?;
        let now = chrono::Utc::now().naive_utc();
        let expires_at = now + chrono::Duration::minutes(OTP_TTL_MINUTES);

        let record = otp::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user.id),
            otp_hash: sea_orm::ActiveValue::Set(otp_hash),
            purpose: sea_orm::ActiveValue::Set(OTP_PURPOSE_FORGOT_PASSWORD.to_string()),
            used: sea_orm::ActiveValue::Set(false),
            expires_at: sea_orm::ActiveValue::Set(expires_at),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        record.insert(&self.db).await?;

        email_service
            .send_otp_email(&user.email, &code)
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        Ok(())
    }

    /// Verify a reset code against the newest unused, unexpired OTP; on
    /// success mark it used and mail a fresh temporary password.
    pub async fn verify_otp(
        &self,
        email: &str,
        code: &str,
        email_service: &EmailService,
    ) -> AppResult<()> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let now = chrono::Utc::now().naive_utc();

        // Older unused codes are implicitly superseded: only the most
        // recently created candidate is compared.
        let valid_otp = Otp::find()
            .filter(otp::Column::UserId.eq(user.id))
            .filter(otp::Column::Purpose.eq(OTP_PURPOSE_FORGOT_PASSWORD))
            .filter(otp::Column::Used.eq(false))
            .filter(otp::Column::ExpiresAt.gt(now))
            .order_by_desc(otp::Column::CreatedAt)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Invalid or expired OTP".to_string()))?;

        let is_match = verify_password(code, &valid_otp.otp_hash)?;
        if !is_match {
            return Err(AppError::Validation("Invalid OTP".to_string()));
        }

        // A used OTP is never revalidated.
        let mut used: otp::ActiveModel = valid_otp.into();
        used.used = sea_orm::ActiveValue::Set(true);
        used.update(&self.db).await?;

        let temp_password = generate_password()?;
        let new_hash = hash_password(&temp_password)?;
        let user_email = user.email.clone();

        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;

        if let Err(e) = email_service
            .send_temp_password_email(&user_email, &temp_password)
            .await
        {
            tracing::warn!("Failed to send temporary password email: {e}");
        }

        Ok(())
    }

    /// Change password for an authenticated user.
    pub async fn change_password(
        &self,
        user_id: i32,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let is_valid = verify_password(old_password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::Unauthorized("Invalid old password".to_string()));
        }

        let new_hash = hash_password(new_password)?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}

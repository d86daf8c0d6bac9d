use crate::error::AppResult;
use crate::models::{user, User, ROLE_SUPERADMIN};
use crate::utils::hash_password;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapSuperadminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl BootstrapSuperadminConfig {
    pub fn from_env() -> Option<Self> {
        let enabled = env::var("BOOTSTRAP_SUPERADMIN_ENABLED")
            .ok()
            .map(|v| v.trim().to_ascii_lowercase())
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "y" | "on"))
            .unwrap_or(false);

        if !enabled {
            return None;
        }

        Some(Self {
            name: env::var("BOOTSTRAP_SUPERADMIN_NAME").ok()?,
            email: env::var("BOOTSTRAP_SUPERADMIN_EMAIL").ok()?,
            password: env::var("BOOTSTRAP_SUPERADMIN_PASSWORD").ok()?,
        })
    }
}

/// Ensure a superadmin exists at startup:
/// - if any superadmin is already present, do nothing
/// - if the configured email exists, promote that account
/// - otherwise create a fresh superadmin
pub async fn ensure_bootstrap_superadmin(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapSuperadminConfig::from_env() else {
        return Ok(());
    };

    let superadmin_exists = User::find()
        .filter(user::Column::Role.eq(ROLE_SUPERADMIN))
        .one(db)
        .await?
        .is_some();
    if superadmin_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(user::Column::Email.eq(cfg.email.clone()))
        .one(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();

    if let Some(user) = existing {
        let mut active: user::ActiveModel = user.into();
        active.role = sea_orm::ActiveValue::Set(ROLE_SUPERADMIN.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(db).await?;
        tracing::info!("Promoted existing account to superadmin");
        return Ok(());
    }

    let password_hash = hash_password(&cfg.password)?;

    let new_user = user::ActiveModel {
        name: sea_orm::ActiveValue::Set(cfg.name),
        email: sea_orm::ActiveValue::Set(cfg.email),
        password_hash: sea_orm::ActiveValue::Set(password_hash),
        role: sea_orm::ActiveValue::Set(ROLE_SUPERADMIN.to_string()),
        is_active: sea_orm::ActiveValue::Set(true),
        created_at: sea_orm::ActiveValue::Set(now),
        updated_at: sea_orm::ActiveValue::Set(now),
        ..Default::default()
    };

    new_user.insert(db).await?;
    tracing::info!("Bootstrap superadmin created");
    Ok(())
}

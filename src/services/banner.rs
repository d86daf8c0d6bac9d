use crate::{
    error::{AppError, AppResult},
    models::{banner, Banner, BannerModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

pub struct BannerService {
    db: DatabaseConnection,
}

impl BannerService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Active banners inside their display window. Both bounds are optional
    /// and inclusive.
    pub async fn list_active(&self) -> AppResult<Vec<BannerModel>> {
        let now = chrono::Utc::now().naive_utc();

        let banners = Banner::find()
            .filter(banner::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(banner::Column::VisibleFrom.is_null())
                    .add(banner::Column::VisibleFrom.lte(now)),
            )
            .filter(
                Condition::any()
                    .add(banner::Column::VisibleTo.is_null())
                    .add(banner::Column::VisibleTo.gte(now)),
            )
            .order_by_desc(banner::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(banners)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<BannerModel> {
        Banner::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Banner not found".to_string()))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        created_by: i32,
        title: &str,
        content: &str,
        link: Option<String>,
        visible_from: Option<chrono::NaiveDateTime>,
        visible_to: Option<chrono::NaiveDateTime>,
    ) -> AppResult<BannerModel> {
        let now = chrono::Utc::now().naive_utc();
        let new_banner = banner::ActiveModel {
            title: sea_orm::ActiveValue::Set(title.to_string()),
            content: sea_orm::ActiveValue::Set(content.to_string()),
            link: sea_orm::ActiveValue::Set(link),
            is_active: sea_orm::ActiveValue::Set(true),
            visible_from: sea_orm::ActiveValue::Set(visible_from),
            visible_to: sea_orm::ActiveValue::Set(visible_to),
            created_by: sea_orm::ActiveValue::Set(created_by),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let banner = new_banner.insert(&self.db).await?;
        Ok(banner)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: i32,
        title: Option<String>,
        content: Option<String>,
        link: Option<String>,
        is_active: Option<bool>,
        visible_from: Option<chrono::NaiveDateTime>,
        visible_to: Option<chrono::NaiveDateTime>,
    ) -> AppResult<BannerModel> {
        let existing = self.get_by_id(id).await?;

        let now = chrono::Utc::now().naive_utc();
        let mut active: banner::ActiveModel = existing.into();
        if let Some(title) = title {
            active.title = sea_orm::ActiveValue::Set(title);
        }
        if let Some(content) = content {
            active.content = sea_orm::ActiveValue::Set(content);
        }
        if let Some(link) = link {
            active.link = sea_orm::ActiveValue::Set(Some(link));
        }
        if let Some(is_active) = is_active {
            active.is_active = sea_orm::ActiveValue::Set(is_active);
        }
        if let Some(visible_from) = visible_from {
            active.visible_from = sea_orm::ActiveValue::Set(Some(visible_from));
        }
        if let Some(visible_to) = visible_to {
            active.visible_to = sea_orm::ActiveValue::Set(Some(visible_to));
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;
        Banner::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}

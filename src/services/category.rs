use crate::{
    error::{AppError, AppResult},
    models::{category, post, Category, CategoryModel, Post},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

pub struct CategoryService {
    db: DatabaseConnection,
}

impl CategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryModel>> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CategoryModel> {
        Category::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        description: Option<String>,
    ) -> AppResult<CategoryModel> {
        if self.name_taken(name).await? {
            return Err(AppError::Conflict("Category already exists".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();
        let new_category = category::ActiveModel {
            name: sea_orm::ActiveValue::Set(name.to_string()),
            slug: sea_orm::ActiveValue::Set(slug.to_string()),
            description: sea_orm::ActiveValue::Set(description),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let category = new_category.insert(&self.db).await?;
        Ok(category)
    }

    pub async fn update(
        &self,
        id: i32,
        name: Option<String>,
        slug: Option<String>,
        description: Option<String>,
    ) -> AppResult<CategoryModel> {
        let existing = self.get_by_id(id).await?;

        if let Some(name) = name.as_deref() {
            if name != existing.name && self.name_taken(name).await? {
                return Err(AppError::Conflict("Category already exists".to_string()));
            }
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = name {
            active.name = sea_orm::ActiveValue::Set(name);
        }
        if let Some(slug) = slug {
            active.slug = sea_orm::ActiveValue::Set(slug);
        }
        if let Some(description) = description {
            active.description = sea_orm::ActiveValue::Set(Some(description));
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Deleting a category still referenced by posts is refused rather than
    /// leaving dangling references behind.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get_by_id(id).await?;

        let referencing = Post::find()
            .filter(post::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;
        if referencing > 0 {
            return Err(AppError::Conflict(
                "Category is referenced by existing posts".to_string(),
            ));
        }

        Category::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn name_taken(&self, name: &str) -> AppResult<bool> {
        let count = Category::find()
            .filter(category::Column::Name.eq(name))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}

use crate::error::CoreError;
use crate::models::{Category, NewCategoryData, UpdateCategoryData, DEFAULT_CATEGORIES};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use uuid::Uuid;

/// Category names are stored trimmed and lower-cased.
pub(crate) fn normalize_category_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("Category name cannot be empty".to_string()));
    }
    Ok(name)
}

#[async_trait]
impl super::CategoryRepository for SqliteRepository {
    async fn add_category(&self, data: NewCategoryData) -> Result<Category, CoreError> {
        let mut tx = self.pool().begin().await?;
        let category = Self::insert_category(&mut tx, data).await?;
        tx.commit().await?;

        tracing::debug!(category = %category.name, user_id = ?category.user_id, "category created");
        Ok(category)
    }

    async fn add_category_for_user(&self, data: NewCategoryData) -> Result<Category, CoreError> {
        let user_id = data.user_id.ok_or_else(|| {
            CoreError::InvalidInput("A selected category needs an owner".to_string())
        })?;

        let mut tx = self.pool().begin().await?;
        let category = Self::insert_category(&mut tx, data).await?;
        Self::insert_selection(&mut tx, user_id, &category).await?;
        tx.commit().await?;

        tracing::debug!(category = %category.name, user_id = %user_id, "category created and selected");
        Ok(category)
    }

    async fn find_category_by_id(&self, id: Uuid) -> Result<Category, CoreError> {
        let category: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        category.ok_or_else(|| CoreError::NotFound(format!("Category {} not found", id)))
    }

    async fn update_category(
        &self,
        id: Uuid,
        user_id: Uuid,
        data: UpdateCategoryData,
    ) -> Result<Category, CoreError> {
        let current = self.find_owned_category(id, user_id).await?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE categories SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(name) = &data.name {
            qb.push(", name = ");
            qb.push_bind(normalize_category_name(name)?);
        }
        if let Some(color) = data.color {
            qb.push(", color = ");
            qb.push_bind(color);
        }
        if let Some(icon) = data.icon {
            qb.push(", icon = ");
            qb.push_bind(icon);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" AND user_id = ");
        qb.push_bind(user_id);

        qb.build()
            .execute(self.pool())
            .await
            .map_err(|e| match CoreError::from(e) {
                CoreError::Duplicate(_) => CoreError::Duplicate(format!(
                    "Category '{}' already exists",
                    data.name.as_deref().unwrap_or(&current.name)
                )),
                other => other,
            })?;
        super::CategoryRepository::find_category_by_id(self, id).await
    }

    async fn delete_category(&self, id: Uuid, user_id: Uuid) -> Result<(), CoreError> {
        self.find_owned_category(id, user_id).await?;

        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Category {} not found", id)));
        }
        tracing::debug!(category_id = %id, "category deleted");
        Ok(())
    }

    async fn find_categories(&self, user_id: Option<Uuid>) -> Result<Vec<Category>, CoreError> {
        let categories = match user_id {
            Some(user_id) => {
                sqlx::query_as("SELECT * FROM categories WHERE user_id = $1 ORDER BY name ASC")
                    .bind(user_id)
                    .fetch_all(self.pool())
                    .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM categories ORDER BY name ASC")
                    .fetch_all(self.pool())
                    .await?
            }
        };
        Ok(categories)
    }

    async fn find_categories_for_user(&self, user_id: Uuid) -> Result<Vec<Category>, CoreError> {
        let selected: Vec<Uuid> =
            sqlx::query_scalar("SELECT category_id FROM user_categories WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(self.pool())
                .await?;

        if selected.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM categories WHERE id IN (");
        let mut separated = qb.separated(", ");
        for category_id in selected {
            separated.push_bind(category_id);
        }
        separated.push_unseparated(") ORDER BY name ASC");

        let categories = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(categories)
    }

    async fn find_default_categories(&self) -> Result<Vec<Category>, CoreError> {
        let categories =
            sqlx::query_as("SELECT * FROM categories WHERE is_default = 1 ORDER BY name ASC")
                .fetch_all(self.pool())
                .await?;
        Ok(categories)
    }

    async fn select_category(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;
        let category = Self::find_category_in(&mut tx, category_id).await?;
        let category = category
            .ok_or_else(|| CoreError::Reference(format!("Category {} not found", category_id)))?;
        Self::insert_selection(&mut tx, user_id, &category).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn deselect_category(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CoreError> {
        let result =
            sqlx::query("DELETE FROM user_categories WHERE user_id = $1 AND category_id = $2")
                .bind(user_id)
                .bind(category_id)
                .execute(self.pool())
                .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Category {} is not selected",
                category_id
            )));
        }
        Ok(())
    }

    async fn ensure_default_categories(&self) -> Result<Vec<Category>, CoreError> {
        let mut tx = self.pool().begin().await?;
        let now = Utc::now();
        for default in DEFAULT_CATEGORIES {
            sqlx::query(
                r#"INSERT INTO categories (id, name, color, icon, is_default, user_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, 1, NULL, $5, $6)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(default.name)
            .bind(default.color)
            .bind(default.icon)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        super::CategoryRepository::find_default_categories(self).await
    }
}

impl SqliteRepository {
    async fn find_category_in(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> Result<Option<Category>, CoreError> {
        let category = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(category)
    }

    /// Insert a category and read it back on the same transaction.
    async fn insert_category(
        tx: &mut Transaction<'_, Sqlite>,
        data: NewCategoryData,
    ) -> Result<Category, CoreError> {
        let name = normalize_category_name(&data.name)?;
        let id = Uuid::now_v7();
        let now = Utc::now();

        sqlx::query(
            r#"INSERT INTO categories (id, name, color, icon, is_default, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(data.color)
        .bind(data.icon)
        .bind(data.is_default)
        .bind(data.user_id)
        .bind(now)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(|e| match CoreError::from(e) {
            CoreError::Duplicate(_) => {
                CoreError::Duplicate(format!("Category '{}' already exists", name))
            }
            CoreError::Reference(_) => CoreError::Reference("Category owner not found".to_string()),
            other => other,
        })?;

        Self::find_category_in(tx, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Category {} not found", id)))
    }

    /// Add `category` to the user's selection, checking the user may use it.
    pub(crate) async fn insert_selection(
        tx: &mut Transaction<'_, Sqlite>,
        user_id: Uuid,
        category: &Category,
    ) -> Result<(), CoreError> {
        if !category.is_usable_by(user_id) {
            return Err(CoreError::Forbidden(format!(
                "Category '{}' belongs to another user",
                category.name
            )));
        }

        sqlx::query(
            "INSERT INTO user_categories (user_id, category_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(category.id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(|e| match CoreError::from(e) {
            CoreError::Duplicate(_) => {
                CoreError::Duplicate(format!("Category '{}' is already selected", category.name))
            }
            CoreError::Reference(_) => CoreError::Reference(format!("User {} not found", user_id)),
            other => other,
        })?;
        Ok(())
    }

    /// Fetch a category and verify `user_id` owns it.
    async fn find_owned_category(&self, id: Uuid, user_id: Uuid) -> Result<Category, CoreError> {
        let category: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        let category =
            category.ok_or_else(|| CoreError::NotFound(format!("Category {} not found", id)))?;

        if category.user_id != Some(user_id) {
            tracing::warn!(category_id = %id, user_id = %user_id, "category ownership check failed");
            return Err(CoreError::Forbidden(format!(
                "Category '{}' does not belong to this user",
                category.name
            )));
        }
        Ok(category)
    }
}

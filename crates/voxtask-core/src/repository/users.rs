use crate::error::CoreError;
use crate::models::{Category, NewUserData, User};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::UserRepository for SqliteRepository {
    async fn add_user(&self, data: NewUserData) -> Result<User, CoreError> {
        super::UserRepository::add_user_with_categories(self, data, &[]).await
    }

    async fn add_user_with_categories(
        &self,
        data: NewUserData,
        category_ids: &[Uuid],
    ) -> Result<User, CoreError> {
        let email = data.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(CoreError::InvalidInput("User email cannot be empty".to_string()));
        }

        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"INSERT INTO users (id, email, display_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&email)
        .bind(data.display_name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match CoreError::from(e) {
            CoreError::Duplicate(_) => {
                CoreError::Duplicate(format!("User '{}' already exists", email))
            }
            other => other,
        })?;

        for category_id in category_ids {
            let category: Option<Category> =
                sqlx::query_as("SELECT * FROM categories WHERE id = $1")
                    .bind(category_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let category = category.ok_or_else(|| {
                CoreError::Reference(format!("Category {} not found", category_id))
            })?;
            Self::insert_selection(&mut tx, id, &category).await?;
        }

        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(user_id = %id, categories = category_ids.len(), "user created");
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, CoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, CoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }
}

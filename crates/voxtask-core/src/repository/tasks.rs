use crate::error::CoreError;
use crate::models::{
    Category, NewTaskData, Task, TaskDetails, TaskFilter, UpdateTaskData,
};
use crate::repository::query_builder::{SqlQueryBuilder, TASK_DETAILS_SELECT};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, Transaction};
use uuid::Uuid;

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        let title = data.title.trim().to_string();
        if title.is_empty() {
            return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
        }
        if let Some(interval) = data.recurring_interval {
            if interval <= 0 {
                return Err(CoreError::InvalidInput(
                    "Recurring interval must be positive".to_string(),
                ));
            }
        }

        let mut tx = self.pool().begin().await?;

        if let Some(category_id) = data.category_id {
            Self::check_category_reference(&mut tx, category_id, data.user_id).await?;
        }

        let id = Uuid::now_v7();
        let now = Utc::now();
        let completed_at = data.is_completed.then_some(now);
        sqlx::query(
            r#"INSERT INTO tasks (
                id, title, description, category_id, priority, is_completed, completed_at,
                is_recurring, recurring_frequency, recurring_interval, due_date, user_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(data.description)
        .bind(data.category_id)
        .bind(data.priority.unwrap_or_default())
        .bind(data.is_completed)
        .bind(completed_at)
        .bind(data.is_recurring)
        .bind(data.recurring_frequency)
        .bind(data.recurring_interval)
        .bind(data.due_date)
        .bind(data.user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(category_id) = task.category_id {
            Self::adjust_task_count(&mut tx, category_id, 1).await?;
        }

        tx.commit().await?;
        tracing::debug!(task_id = %task.id, user_id = %task.user_id, "task created");
        Ok(task)
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<TaskDetails>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(TASK_DETAILS_SELECT);
        qb.push(" WHERE t.id = ");
        qb.push_bind(id);

        let task = qb.build_query_as().fetch_optional(self.pool()).await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTaskData,
    ) -> Result<Task, CoreError> {
        let mut tx = self.pool().begin().await?;

        let current = Self::find_owned_task(&mut tx, id, user_id).await?;

        if let Some(Some(category_id)) = data.category_id {
            Self::check_category_reference(&mut tx, category_id, user_id).await?;
        }

        Self::update_task_fields(&mut tx, id, &data).await?;

        if let Some(new_category) = data.category_id {
            if new_category != current.category_id {
                if let Some(old) = current.category_id {
                    Self::adjust_task_count(&mut tx, old, -1).await?;
                }
                if let Some(new) = new_category {
                    Self::adjust_task_count(&mut tx, new, 1).await?;
                }
            }
        }

        let updated: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_task(&self, id: Uuid, user_id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let task = Self::find_owned_task(&mut tx, id, user_id).await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }

        if let Some(category_id) = task.category_id {
            Self::adjust_task_count(&mut tx, category_id, -1).await?;
        }

        tx.commit().await?;
        tracing::debug!(task_id = %id, "task deleted");
        Ok(())
    }

    async fn find_tasks(
        &self,
        user_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskDetails>, CoreError> {
        let mut qb = SqlQueryBuilder::build_task_listing(user_id, filter);
        let tasks: Vec<TaskDetails> = qb.build_query_as().fetch_all(self.pool()).await?;
        tracing::debug!(user_id = %user_id, count = tasks.len(), "tasks listed");
        Ok(tasks)
    }
}

impl SqliteRepository {
    /// Fetch a task inside a transaction and verify `user_id` owns it.
    async fn find_owned_task(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Task, CoreError> {
        let task: Option<Task> = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        let task = task.ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if task.user_id != user_id {
            tracing::warn!(task_id = %id, user_id = %user_id, "task ownership check failed");
            return Err(CoreError::Forbidden(format!(
                "Task '{}' does not belong to this user",
                task.title
            )));
        }
        Ok(task)
    }

    /// A task may only point at its owner's categories or a default one.
    async fn check_category_reference(
        tx: &mut Transaction<'_, Sqlite>,
        category_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), CoreError> {
        let category: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
            .bind(category_id)
            .fetch_optional(&mut **tx)
            .await?;

        match category {
            None => Err(CoreError::Reference(format!(
                "Category {} not found",
                category_id
            ))),
            Some(category) if !category.is_usable_by(user_id) => Err(CoreError::Forbidden(
                format!("Category '{}' belongs to another user", category.name),
            )),
            Some(_) => Ok(()),
        }
    }

    async fn adjust_task_count(
        tx: &mut Transaction<'_, Sqlite>,
        category_id: Uuid,
        delta: i64,
    ) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE categories SET task_count = MAX(task_count + $1, 0) WHERE id = $2",
        )
        .bind(delta)
        .bind(category_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Update task fields within an existing transaction
    async fn update_task_fields(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        data: &UpdateTaskData,
    ) -> Result<(), CoreError> {
        let now = Utc::now();
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET updated_at = ");
        qb.push_bind(now);

        if let Some(title) = &data.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
            }
            qb.push(", title = ");
            qb.push_bind(title);
        }

        if let Some(description) = &data.description {
            qb.push(", description = ");
            qb.push_bind(description.clone());
        }

        if let Some(category_id) = data.category_id {
            qb.push(", category_id = ");
            qb.push_bind(category_id);
        }

        if let Some(priority) = data.priority {
            qb.push(", priority = ");
            qb.push_bind(priority);
        }

        if let Some(is_completed) = data.is_completed {
            qb.push(", is_completed = ");
            qb.push_bind(is_completed);
            qb.push(", completed_at = ");
            qb.push_bind(is_completed.then_some(now));
        }

        if let Some(is_recurring) = data.is_recurring {
            qb.push(", is_recurring = ");
            qb.push_bind(is_recurring);
        }

        if let Some(frequency) = data.recurring_frequency {
            qb.push(", recurring_frequency = ");
            qb.push_bind(frequency);
        }

        if let Some(interval) = data.recurring_interval {
            if matches!(interval, Some(i) if i <= 0) {
                return Err(CoreError::InvalidInput(
                    "Recurring interval must be positive".to_string(),
                ));
            }
            qb.push(", recurring_interval = ");
            qb.push_bind(interval);
        }

        if let Some(due_date) = data.due_date {
            qb.push(", due_date = ");
            qb.push_bind(due_date);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.build().execute(&mut **tx).await?;

        Ok(())
    }
}

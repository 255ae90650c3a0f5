use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    Category, NewCategoryData, NewTaskData, NewUserData, Task, TaskDetails, TaskFilter,
    UpdateCategoryData, UpdateTaskData, User,
};
use async_trait::async_trait;
use uuid::Uuid;

pub mod categories;
pub mod query_builder;
pub mod tasks;
pub mod users;

/// Domain-specific trait for user operations
#[async_trait]
pub trait UserRepository {
    async fn add_user(&self, data: NewUserData) -> Result<User, CoreError>;
    /// Creates the user and selects `category_ids` for them, all or nothing.
    async fn add_user_with_categories(
        &self,
        data: NewUserData,
        category_ids: &[Uuid],
    ) -> Result<User, CoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, CoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, CoreError>;
}

/// Domain-specific trait for category operations.
///
/// Mutations are scoped by the owning user: touching another user's
/// category, or a default one, fails with [`CoreError::Forbidden`].
#[async_trait]
pub trait CategoryRepository {
    async fn add_category(&self, data: NewCategoryData) -> Result<Category, CoreError>;
    /// Creates a category owned by `data.user_id` and selects it for that user
    /// in the same transaction.
    async fn add_category_for_user(&self, data: NewCategoryData) -> Result<Category, CoreError>;
    async fn find_category_by_id(&self, id: Uuid) -> Result<Category, CoreError>;
    async fn update_category(
        &self,
        id: Uuid,
        user_id: Uuid,
        data: UpdateCategoryData,
    ) -> Result<Category, CoreError>;
    async fn delete_category(&self, id: Uuid, user_id: Uuid) -> Result<(), CoreError>;
    /// All categories ordered by name, optionally only those owned by `user_id`.
    async fn find_categories(&self, user_id: Option<Uuid>) -> Result<Vec<Category>, CoreError>;
    /// Categories the user has opted into through `user_categories`.
    async fn find_categories_for_user(&self, user_id: Uuid) -> Result<Vec<Category>, CoreError>;
    async fn find_default_categories(&self) -> Result<Vec<Category>, CoreError>;
    async fn select_category(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CoreError>;
    async fn deselect_category(&self, user_id: Uuid, category_id: Uuid) -> Result<(), CoreError>;
    /// Inserts any missing default categories and returns all of them.
    async fn ensure_default_categories(&self) -> Result<Vec<Category>, CoreError>;
}

/// Domain-specific trait for task operations
#[async_trait]
pub trait TaskRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<TaskDetails>, CoreError>;
    async fn update_task(
        &self,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTaskData,
    ) -> Result<Task, CoreError>;
    async fn delete_task(&self, id: Uuid, user_id: Uuid) -> Result<(), CoreError>;
    async fn find_tasks(
        &self,
        user_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<TaskDetails>, CoreError>;
}

/// Main repository trait that composes all domain traits
pub trait Repository: UserRepository + CategoryRepository + TaskRepository + Send + Sync {}

/// SQLite implementation of the repository pattern
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Repository for SqliteRepository {}

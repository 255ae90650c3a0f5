use crate::error::{AgentError, AgentResult};
use uuid::Uuid;
use voxtask_core::error::CoreError;
use voxtask_core::models::Category;
use voxtask_core::repository::Repository;

/// Who is speaking and which categories their tasks may be filed under.
///
/// Bound once when a session starts and handed to every function call.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub categories: Vec<Category>,
}

impl SessionContext {
    pub fn new(user_id: Uuid, categories: Vec<Category>) -> Self {
        Self {
            user_id,
            categories,
        }
    }

    /// Loads the user's selected categories, or the defaults when they
    /// have not selected any.
    pub async fn bind(repo: &dyn Repository, user_id: Uuid) -> AgentResult<Self> {
        if repo.find_user_by_id(user_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("User '{}' not found", user_id)).into());
        }

        let mut categories = repo.find_categories_for_user(user_id).await?;
        if categories.is_empty() {
            tracing::info!(%user_id, "user has no selected categories, using defaults");
            categories = repo.find_default_categories().await?;
        }

        tracing::debug!(%user_id, categories = categories.len(), "session bound");
        Ok(Self::new(user_id, categories))
    }

    /// Finds a permitted category by id or by case-insensitive name.
    pub fn resolve_category(&self, text: &str) -> Option<&Category> {
        let text = text.trim();
        if let Ok(id) = Uuid::parse_str(text) {
            return self.categories.iter().find(|category| category.id == id);
        }
        let name = text.to_lowercase();
        self.categories.iter().find(|category| category.name == name)
    }
}

/// Accepts `user_<uuid>` participant identities or a bare UUID.
pub fn parse_identity(identity: &str) -> AgentResult<Uuid> {
    let identity = identity.trim();
    let raw = identity.strip_prefix("user_").unwrap_or(identity);
    Uuid::parse_str(raw)
        .map_err(|_| AgentError::Validation(format!("Invalid participant identity: '{}'", identity)))
}

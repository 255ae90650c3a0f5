use super::{non_blank, AgentServices, PriorityName};
use crate::assistant::{Classification, TaskDraft};
use crate::error::{AgentError, AgentResult};
use crate::session::SessionContext;
use schemars::JsonSchema;
use serde::Deserialize;
use voxtask_core::error::CoreError;
use voxtask_core::models::{Category, NewTaskData, Priority};

pub const CLASSIFICATION_FAILED: &str =
    "Sorry I had issues placing this into a category. Please try again.";
pub const CATEGORY_UNAVAILABLE: &str =
    "Sorry, that category is no longer available. Please try again.";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateTaskParams {
    /// The task title
    pub title: String,
    /// Optional task description
    pub description: Option<String>,
    /// Task category - will be auto-assigned if not provided
    pub category: Option<String>,
    /// Task priority - will be auto-assigned if not provided
    #[schemars(with = "Option<PriorityName>")]
    pub priority: Option<Priority>,
}

pub async fn create_task(
    services: &AgentServices,
    session: &SessionContext,
    params: CreateTaskParams,
) -> AgentResult<String> {
    let title = params.title.trim().to_string();
    if title.is_empty() {
        return Err(AgentError::Validation("title must not be empty".to_string()));
    }
    let description = non_blank(params.description);
    let category_hint = non_blank(params.category);

    let (category, priority) =
        match supplied_classification(services, session, category_hint.as_deref(), params.priority) {
            Some(pair) => {
                tracing::info!(title = %title, category = %pair.0.name, "using supplied category and priority");
                pair
            }
            None => {
                let draft = TaskDraft {
                    title: &title,
                    description: description.as_deref(),
                    category: category_hint.as_deref(),
                    priority: params.priority,
                };
                match services
                    .assistant
                    .suggest_task(&draft, &session.categories)
                    .await?
                {
                    Classification::Accepted(suggestion) => {
                        let priority = suggestion
                            .priority
                            .or(params.priority)
                            .unwrap_or_default();
                        (suggestion.category, priority)
                    }
                    Classification::Rejected { .. } => return Ok(CLASSIFICATION_FAILED.to_string()),
                }
            }
        };

    let data = NewTaskData {
        title,
        description,
        category_id: Some(category.id),
        priority: Some(priority),
        user_id: session.user_id,
        ..Default::default()
    };

    match services.repo.add_task(data).await {
        Ok(task) => {
            tracing::info!(task_id = %task.id, user_id = %session.user_id, "task created");
            Ok(format!(
                "Created task \"{}\" with category \"{}\" and priority {}",
                task.title, category.name, task.priority
            ))
        }
        Err(CoreError::Reference(reason)) => {
            tracing::warn!(category_id = %category.id, %reason, "category vanished before task insert");
            Ok(CATEGORY_UNAVAILABLE.to_string())
        }
        Err(e) => Err(e.into()),
    }
}

fn supplied_classification(
    services: &AgentServices,
    session: &SessionContext,
    category: Option<&str>,
    priority: Option<Priority>,
) -> Option<(Category, Priority)> {
    if !services.skip_when_supplied {
        return None;
    }
    let category = session.resolve_category(category?)?;
    Some((category.clone(), priority?))
}

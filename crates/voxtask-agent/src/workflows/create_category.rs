use super::{non_blank, AgentServices};
use crate::assistant::{is_hex_color, Classification};
use crate::error::{AgentError, AgentResult};
use crate::session::SessionContext;
use schemars::JsonSchema;
use serde::Deserialize;
use voxtask_core::error::CoreError;
use voxtask_core::models::NewCategoryData;

pub const STYLE_FAILED: &str =
    "Sorry I had issues choosing a color and icon for this category. Please try again.";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateCategoryParams {
    /// The category name
    pub name: String,
    /// Optional hex color code (e.g., "#FF0000")
    pub color: Option<String>,
    /// Optional emoji icon
    pub icon: Option<String>,
}

pub async fn create_category(
    services: &AgentServices,
    session: &SessionContext,
    params: CreateCategoryParams,
) -> AgentResult<String> {
    let name = params.name.trim().to_string();
    if name.is_empty() {
        return Err(AgentError::Validation("name must not be empty".to_string()));
    }
    let mut color = non_blank(params.color);
    if let Some(supplied) = &color {
        if !is_hex_color(supplied) {
            return Err(AgentError::Validation(format!(
                "color '{}' is not a hex code like #FF0000",
                supplied
            )));
        }
    }
    let mut icon = non_blank(params.icon);

    if color.is_none() || icon.is_none() {
        match services.assistant.suggest_style(&name).await? {
            Classification::Accepted(suggestion) => {
                color = color.or(Some(suggestion.color));
                icon = icon.or(Some(suggestion.icon));
            }
            Classification::Rejected { .. } => return Ok(STYLE_FAILED.to_string()),
        }
    }

    let data = NewCategoryData {
        name: name.clone(),
        color,
        icon,
        user_id: Some(session.user_id),
        is_default: false,
    };

    let category = match services.repo.add_category_for_user(data).await {
        Ok(category) => category,
        Err(CoreError::Duplicate(_)) => {
            tracing::warn!(name = %name, user_id = %session.user_id, "category already exists");
            return Ok(format!("Category \"{}\" already exists for this user", name));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(category_id = %category.id, user_id = %session.user_id, "category created");

    Ok(format!(
        "Created category \"{}\" with {} color and {} icon",
        name,
        category.color.as_deref().unwrap_or_default(),
        category.icon.as_deref().unwrap_or_default()
    ))
}

//! Language-model assisted classification.
//!
//! Replies from the completion service are untrusted. A reply that cannot
//! be read at all is an error; a reply that parses but names something
//! unusable comes back as [`Classification::Rejected`].

use crate::completion::{ChatMessage, CompletionRequest, CompletionService};
use crate::config::CompletionConfig;
use crate::error::{AgentError, AgentResult};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;
use voxtask_core::models::{Category, Priority};

const SYSTEM_PROMPT: &str =
    "You classify items for a voice-controlled todo app. Respond with a single JSON object and nothing else.";

const ICON_VOCABULARY: &str = "🛒 (shopping), 💼 (work), 🏠 (home), 📚 (school), 🏃 (fitness), \
❤️ (health), 👨‍👩‍👧‍👦 (family), ✈️ (travel), 💰 (finance), 👤 (personal)";

/// Outcome of validating a suggestion.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification<T> {
    Accepted(T),
    Rejected { reason: String },
}

impl<T> Classification<T> {
    fn rejected(reason: impl Into<String>) -> Self {
        Classification::Rejected {
            reason: reason.into(),
        }
    }
}

/// What the user said about a task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskDraft<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskSuggestion {
    /// Always one of the permitted categories.
    pub category: Category,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSuggestion {
    pub color: String,
    pub icon: String,
}

pub struct ClassificationAssistant {
    service: Arc<dyn CompletionService>,
    model: String,
    temperature: f32,
    json_mode: bool,
}

impl ClassificationAssistant {
    pub fn new(service: Arc<dyn CompletionService>, config: &CompletionConfig) -> Self {
        Self {
            service,
            model: config.model.clone(),
            temperature: config.temperature,
            json_mode: config.json_mode,
        }
    }

    /// Suggests a category from `permitted` and a priority for a task.
    pub async fn suggest_task(
        &self,
        draft: &TaskDraft<'_>,
        permitted: &[Category],
    ) -> AgentResult<Classification<TaskSuggestion>> {
        let reply = self.ask(task_prompt(draft, permitted)).await?;
        let fields = parse_reply(&reply)?;
        let classification = validate_task_suggestion(&fields, permitted);
        if let Classification::Rejected { reason } = &classification {
            tracing::warn!(title = draft.title, %reason, "task classification rejected");
        }
        Ok(classification)
    }

    /// Suggests a color and an icon for a category name.
    pub async fn suggest_style(&self, name: &str) -> AgentResult<Classification<StyleSuggestion>> {
        let reply = self.ask(style_prompt(name)).await?;
        let fields = parse_reply(&reply)?;
        let classification = validate_style_suggestion(&fields);
        if let Classification::Rejected { reason } = &classification {
            tracing::warn!(name, %reason, "category style suggestion rejected");
        }
        Ok(classification)
    }

    async fn ask(&self, prompt: String) -> AgentResult<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            temperature: self.temperature,
            json_mode: self.json_mode,
        };
        match self.service.complete(request).await? {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => {
                tracing::error!("completion service returned no content");
                Err(AgentError::NoContent)
            }
        }
    }
}

fn task_prompt(draft: &TaskDraft<'_>, permitted: &[Category]) -> String {
    let mut prompt = format!("Task title: \"{}\"\n", draft.title);
    if let Some(description) = draft.description {
        prompt.push_str(&format!("Description: \"{}\"\n", description));
    }
    if let Some(category) = draft.category {
        prompt.push_str(&format!("Suggested category: \"{}\"\n", category));
    }
    if let Some(priority) = draft.priority {
        prompt.push_str(&format!("Suggested priority: \"{}\"\n", priority));
    }

    let verb = if draft.category.is_none() || draft.priority.is_none() {
        "Suggest a"
    } else {
        "Validate and/or adjust the"
    };
    prompt.push_str(&format!("{} category and priority level for this task.\n", verb));
    prompt.push_str("When choosing a category respond with the category id and name.\n");
    prompt.push_str(
        "Response format: {\"category_id\": \"id\", \"category_name\": \"string\", \"priority\": \"Low\" | \"Medium\" | \"High\"}\n",
    );

    let available = permitted
        .iter()
        .map(|category| format!("{}: {}", category.id, category.name))
        .collect::<Vec<_>>()
        .join(", ");
    prompt.push_str(&format!("Available categories must be one of: {}", available));

    if draft.category.is_some() {
        prompt.push_str("\nPrefer to use the suggested category if it's reasonable.");
    }
    if draft.priority.is_some() {
        prompt.push_str(
            "\nPrefer to keep the suggested priority unless the content strongly indicates otherwise.",
        );
    }
    prompt
}

fn style_prompt(name: &str) -> String {
    format!(
        "Suggest a color (as hex code) and emoji icon for a category named \"{}\".\n\
         Common emojis: {}.\n\
         Response format: {{\"color\": \"#HEXCODE\", \"icon\": \"emoji\"}}",
        name, ICON_VOCABULARY
    )
}

/// Drops a surrounding markdown code fence, if any.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string, e.g. ```json
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_reply(content: &str) -> AgentResult<Map<String, Value>> {
    let json = strip_code_fence(content);
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => {
            tracing::error!(reply = %other, "completion reply is not a JSON object");
            Err(AgentError::MalformedSuggestion(
                "expected a JSON object".to_string(),
            ))
        }
        Err(e) => {
            tracing::error!(error = %e, "completion reply is not valid JSON");
            Err(AgentError::MalformedSuggestion(e.to_string()))
        }
    }
}

fn text_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn validate_task_suggestion(
    fields: &Map<String, Value>,
    permitted: &[Category],
) -> Classification<TaskSuggestion> {
    let Some(raw_id) = text_field(fields, "category_id") else {
        return Classification::rejected("no category id in suggestion");
    };
    let category = Uuid::parse_str(raw_id)
        .ok()
        .and_then(|id| permitted.iter().find(|category| category.id == id));
    let Some(category) = category else {
        let name = text_field(fields, "category_name").unwrap_or("?");
        return Classification::rejected(format!(
            "suggested category {} ({}) is not available",
            name, raw_id
        ));
    };

    let priority = match fields.get("priority") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => match raw.parse::<Priority>() {
            Ok(priority) => Some(priority),
            Err(e) => return Classification::rejected(e.to_string()),
        },
        Some(other) => return Classification::rejected(format!("Invalid priority: {}", other)),
    };

    Classification::Accepted(TaskSuggestion {
        category: category.clone(),
        priority,
    })
}

fn validate_style_suggestion(fields: &Map<String, Value>) -> Classification<StyleSuggestion> {
    let color = match text_field(fields, "color") {
        Some(color) if is_hex_color(color) => color.to_string(),
        Some(color) => return Classification::rejected(format!("'{}' is not a hex color", color)),
        None => return Classification::rejected("no color in suggestion"),
    };
    let Some(icon) = text_field(fields, "icon") else {
        return Classification::rejected("no icon in suggestion");
    };
    Classification::Accepted(StyleSuggestion {
        color,
        icon: icon.to_string(),
    })
}

/// `#RGB` or `#RRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .filter(|digits| digits.len() == 3 || digits.len() == 6)
        .is_some_and(|digits| digits.chars().all(|c| c.is_ascii_hexdigit()))
}

use super::{AgentServices, PriorityName};
use crate::error::AgentResult;
use crate::parser::parse_date_bound;
use crate::session::SessionContext;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use schemars::JsonSchema;
use serde::Deserialize;
use voxtask_core::models::{CategoryRef, Priority, TaskDetails, TaskFilter};
use voxtask_core::timezone::format_local_date;

pub const NO_TASKS: &str = "No tasks found matching your criteria.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksParams {
    /// Filter tasks by status ("pending" or "completed")
    pub status: Option<TaskStatus>,
    /// Filter tasks by category id or name
    pub category: Option<String>,
    /// Filter tasks by priority level
    #[schemars(with = "Option<PriorityName>")]
    pub priority: Option<Priority>,
    /// Show tasks due before this date (ISO format or e.g. "next friday")
    pub due_before: Option<String>,
    /// Show tasks due after this date (ISO format or e.g. "next friday")
    pub due_after: Option<String>,
    /// Show tasks due today
    pub due_today: Option<bool>,
    /// Show overdue tasks
    pub overdue: Option<bool>,
}

impl ListTasksParams {
    fn into_filter(self, now: DateTime<Utc>, tz: Tz) -> AgentResult<TaskFilter> {
        let mut filter = TaskFilter::at(now, tz);
        filter.completed = self.status.map(|status| status == TaskStatus::Completed);
        filter.category = super::non_blank(self.category)
            .and_then(|category| category.parse::<CategoryRef>().ok());
        filter.priority = self.priority;
        filter.due_before = self
            .due_before
            .as_deref()
            .map(|input| parse_date_bound(input, now, &tz))
            .transpose()?;
        filter.due_after = self
            .due_after
            .as_deref()
            .map(|input| parse_date_bound(input, now, &tz))
            .transpose()?;
        filter.due_today = self.due_today.unwrap_or(false);
        filter.overdue = self.overdue.unwrap_or(false);
        Ok(filter)
    }
}

pub async fn list_tasks(
    services: &AgentServices,
    session: &SessionContext,
    params: ListTasksParams,
) -> AgentResult<String> {
    list_tasks_at(services, session, params, Utc::now()).await
}

/// Like [`list_tasks`], with "now" pinned for relative filters.
pub async fn list_tasks_at(
    services: &AgentServices,
    session: &SessionContext,
    params: ListTasksParams,
    now: DateTime<Utc>,
) -> AgentResult<String> {
    tracing::info!(user_id = %session.user_id, ?params, "listing tasks");
    let filter = params.into_filter(now, services.timezone)?;
    let tasks = services.repo.find_tasks(session.user_id, &filter).await?;
    Ok(render_tasks(&tasks, &services.timezone))
}

fn render_tasks(tasks: &[TaskDetails], tz: &Tz) -> String {
    if tasks.is_empty() {
        return NO_TASKS.to_string();
    }
    let lines = tasks
        .iter()
        .map(|task| render_task(task, tz))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Found {} task(s):\n{}", tasks.len(), lines)
}

fn render_task(task: &TaskDetails, tz: &Tz) -> String {
    let mut line = format!(
        "- {} ({}, {} priority)",
        task.title,
        task.category_name.as_deref().unwrap_or("uncategorized"),
        task.priority
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (Due: {})", format_local_date(due, tz)));
    }
    if task.is_completed {
        line.push_str(" ✓");
    }
    line
}

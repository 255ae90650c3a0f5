//! Voice-callable operations.
//!
//! Each workflow validates its parameters, talks to the assistant and the
//! stores, and renders a sentence for the voice agent to speak. Conditions
//! the user can fix by rephrasing come back as `Ok` messages.

use crate::assistant::ClassificationAssistant;
use chrono_tz::Tz;
use schemars::JsonSchema;
use std::sync::Arc;
use voxtask_core::repository::Repository;

pub mod create_category;
pub mod create_task;
pub mod list_tasks;

pub use create_category::{create_category, CreateCategoryParams};
pub use create_task::{create_task, CreateTaskParams};
pub use list_tasks::{list_tasks, list_tasks_at, ListTasksParams, TaskStatus};

/// Shared handles every workflow runs against.
pub struct AgentServices {
    pub repo: Arc<dyn Repository>,
    pub assistant: ClassificationAssistant,
    /// Timezone for "today" and for rendered dates
    pub timezone: Tz,
    /// Create tasks without consulting the assistant when the caller
    /// already named a permitted category and a priority.
    pub skip_when_supplied: bool,
}

/// Schema stand-in for [`voxtask_core::models::Priority`].
#[derive(JsonSchema)]
#[allow(dead_code)]
pub(crate) enum PriorityName {
    Low,
    Medium,
    High,
}

/// Treats blank strings the same as missing ones.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

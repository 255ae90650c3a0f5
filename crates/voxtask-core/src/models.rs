use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid priority: {0}")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum RecurringFrequency {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurring frequency: {0}")]
pub struct ParseRecurringFrequencyError(String);

impl FromStr for RecurringFrequency {
    type Err = ParseRecurringFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(RecurringFrequency::Daily),
            "weekly" => Ok(RecurringFrequency::Weekly),
            "monthly" => Ok(RecurringFrequency::Monthly),
            _ => Err(ParseRecurringFrequencyError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub notifications_enabled: bool,
    pub dark_mode: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewUserData {
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    /// Always stored lower-cased.
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_default: bool,
    /// `None` for default categories shared by every user.
    pub user_id: Option<Uuid>,
    pub task_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Whether tasks owned by `user_id` may reference this category.
    pub fn is_usable_by(&self, user_id: Uuid) -> bool {
        self.is_default || self.user_id == Some(user_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewCategoryData {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub user_id: Option<Uuid>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryData {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub icon: Option<Option<String>>,
}

/// A system-provided category seeded at startup.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

pub const DEFAULT_CATEGORIES: &[DefaultCategory] = &[
    DefaultCategory { name: "work", color: "#FF0000", icon: "💼" },
    DefaultCategory { name: "personal", color: "#00FF00", icon: "👤" },
    DefaultCategory { name: "shopping", color: "#0000FF", icon: "🛒" },
    DefaultCategory { name: "health", color: "#FFA500", icon: "🏥" },
    DefaultCategory { name: "uncategorized", color: "#808080", icon: "📋" },
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub priority: Priority,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub recurring_interval: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task joined with the name of its category.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskDetails {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub priority: Priority,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub recurring_interval: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    /// Falls back to [`Priority::Medium`].
    pub priority: Option<Priority>,
    pub is_completed: bool,
    pub is_recurring: bool,
    pub recurring_frequency: Option<RecurringFrequency>,
    pub recurring_interval: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Option<Uuid>>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
    pub is_recurring: Option<bool>,
    pub recurring_frequency: Option<Option<RecurringFrequency>>,
    pub recurring_interval: Option<Option<i64>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// How a listing filter names a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRef {
    Id(Uuid),
    /// Matched case-insensitively against the stored name.
    Name(String),
}

impl FromStr for CategoryRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match Uuid::parse_str(s.trim()) {
            Ok(id) => CategoryRef::Id(id),
            Err(_) => CategoryRef::Name(s.trim().to_lowercase()),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskOrder {
    #[default]
    CreatedDesc,
    CreatedAsc,
    DueAsc,
    PriorityDesc,
}

/// Conjunctive filter for listing a user's tasks.
///
/// `now` and `timezone` anchor the relative filters: `due_today` covers
/// `[local midnight, next local midnight)` in `timezone`, and `overdue`
/// matches incomplete tasks due strictly before `now`.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub category: Option<CategoryRef>,
    pub priority: Option<Priority>,
    pub due_before: Option<DateTime<Utc>>,
    pub due_after: Option<DateTime<Utc>>,
    pub due_today: bool,
    pub overdue: bool,
    pub order: TaskOrder,
    pub now: DateTime<Utc>,
    pub timezone: Tz,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            completed: None,
            category: None,
            priority: None,
            due_before: None,
            due_after: None,
            due_today: false,
            overdue: false,
            order: TaskOrder::default(),
            now: Utc::now(),
            timezone: Tz::UTC,
        }
    }
}

impl TaskFilter {
    /// An empty filter anchored at `now` in `timezone`.
    pub fn at(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            now,
            timezone,
            ..Default::default()
        }
    }
}

//! The named functions exposed to the voice agent.

use crate::error::{AgentError, AgentResult};
use crate::session::SessionContext;
use crate::workflows::{
    create_category, create_task, list_tasks, AgentServices, CreateCategoryParams,
    CreateTaskParams, ListTasksParams,
};
use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[async_trait]
pub trait VoiceFunction: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON Schema of the accepted arguments.
    fn parameters(&self) -> Value;
    async fn execute(
        &self,
        services: &AgentServices,
        session: &SessionContext,
        arguments: Value,
    ) -> AgentResult<String>;
}

/// How a function is advertised to the upstream framework.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_default()
}

fn parse_arguments<T: DeserializeOwned>(function: &str, arguments: Value) -> AgentResult<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| AgentError::Validation(format!("{}: {}", function, e)))
}

pub struct CreateTaskFunction;

#[async_trait]
impl VoiceFunction for CreateTaskFunction {
    fn name(&self) -> &'static str {
        "createTask"
    }

    fn description(&self) -> &'static str {
        "Create a new task with optional category and priority. If category or priority are not provided, they will be automatically determined based on the task description."
    }

    fn parameters(&self) -> Value {
        schema_of::<CreateTaskParams>()
    }

    async fn execute(
        &self,
        services: &AgentServices,
        session: &SessionContext,
        arguments: Value,
    ) -> AgentResult<String> {
        let params = parse_arguments(self.name(), arguments)?;
        create_task(services, session, params).await
    }
}

pub struct ListTasksFunction;

#[async_trait]
impl VoiceFunction for ListTasksFunction {
    fn name(&self) -> &'static str {
        "listTasks"
    }

    fn description(&self) -> &'static str {
        "List all tasks for the current user with optional filtering by status, category, priority, or due date"
    }

    fn parameters(&self) -> Value {
        schema_of::<ListTasksParams>()
    }

    async fn execute(
        &self,
        services: &AgentServices,
        session: &SessionContext,
        arguments: Value,
    ) -> AgentResult<String> {
        let params = parse_arguments(self.name(), arguments)?;
        list_tasks(services, session, params).await
    }
}

pub struct CreateCategoryFunction;

#[async_trait]
impl VoiceFunction for CreateCategoryFunction {
    fn name(&self) -> &'static str {
        "createCategory"
    }

    fn description(&self) -> &'static str {
        "Create a new category for tasks with automatic or explicit visual identifiers. If color or icon are not provided, they will be automatically suggested based on the category name."
    }

    fn parameters(&self) -> Value {
        schema_of::<CreateCategoryParams>()
    }

    async fn execute(
        &self,
        services: &AgentServices,
        session: &SessionContext,
        arguments: Value,
    ) -> AgentResult<String> {
        let params = parse_arguments(self.name(), arguments)?;
        create_category(services, session, params).await
    }
}

pub struct FunctionRegistry {
    functions: Vec<Box<dyn VoiceFunction>>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: vec![
                Box::new(CreateTaskFunction),
                Box::new(ListTasksFunction),
                Box::new(CreateCategoryFunction),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn VoiceFunction> {
        self.functions
            .iter()
            .find(|function| function.name() == name)
            .map(|function| function.as_ref())
    }

    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.functions
            .iter()
            .map(|function| FunctionDeclaration {
                name: function.name(),
                description: function.description(),
                parameters: function.parameters(),
            })
            .collect()
    }

    /// Runs `name` with raw JSON arguments for the bound session.
    pub async fn call(
        &self,
        services: &AgentServices,
        session: &SessionContext,
        name: &str,
        arguments: Value,
    ) -> AgentResult<String> {
        let function = self
            .get(name)
            .ok_or_else(|| AgentError::Validation(format!("Unknown function: '{}'", name)))?;

        tracing::info!(function = name, user_id = %session.user_id, "executing voice function");
        let result = function.execute(services, session, arguments).await;
        if let Err(e) = &result {
            tracing::error!(function = name, code = e.code(), error = %e, "voice function failed");
        }
        result
    }
}

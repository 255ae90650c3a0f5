#![allow(dead_code)]

use assert_cmd::Command;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;
use voxtask_agent::assistant::ClassificationAssistant;
use voxtask_agent::completion::{CompletionRequest, CompletionService};
use voxtask_agent::config::CompletionConfig;
use voxtask_agent::error::{AgentError, AgentResult};
use voxtask_agent::session::SessionContext;
use voxtask_agent::workflows::AgentServices;
use voxtask_core::db::establish_connection;
use voxtask_core::models::{Category, NewUserData, User};
use voxtask_core::repository::{CategoryRepository, SqliteRepository, UserRepository};

/// Test harness for running the binary against a temporary database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// A command isolated from the caller's config files and API keys.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("voxtask").expect("Failed to find voxtask binary");
        cmd.current_dir(self.temp_dir.path())
            .env_remove("OPENAI_API_KEY")
            .env_remove("VOXTASK_COMPLETION__API_KEY")
            .env_remove("RUST_LOG")
            .env("VOXTASK_DATABASE_PATH", &self.db_path)
            .env("VOXTASK_TIMEZONE", "UTC")
            .env("VOXTASK_COMPLETION__BASE_URL", "http://127.0.0.1:9/v1/chat/completions")
            .env("VOXTASK_LOG__LEVEL", "warn");
        cmd
    }

    /// Like [`command`](Self::command), with a completion API key configured.
    pub fn keyed_command(&self) -> Command {
        let mut cmd = self.command();
        cmd.env("VOXTASK_COMPLETION__API_KEY", "sk-test");
        cmd
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Creates a user through the CLI and returns its id.
    pub fn add_user(&self, email: &str) -> String {
        let assert = self.run_success(&["user", "add", "--email", email]);
        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        stdout.trim().lines().last().unwrap().to_string()
    }
}

/// Completion service that replays canned replies in order.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Option<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Option<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Some(reply.into()));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The user prompt of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|request| request.messages.last())
            .map(|message| message.content.clone())
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> AgentResult<Option<String>> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::Completion("no scripted reply left".to_string()))
    }
}

/// A migrated database with one user who selected every default category.
pub struct TestEnv {
    _temp_dir: TempDir,
    pub repo: Arc<SqliteRepository>,
    pub completion: Arc<ScriptedCompletion>,
    pub user: User,
    pub session: SessionContext,
}

impl TestEnv {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = establish_connection(db_path.to_str().unwrap()).await.unwrap();
        let repo = Arc::new(SqliteRepository::new(pool));

        let defaults = repo.ensure_default_categories().await.unwrap();
        let default_ids: Vec<Uuid> = defaults.iter().map(|category| category.id).collect();
        let user = repo
            .add_user_with_categories(
                NewUserData {
                    email: "ada@example.com".to_string(),
                    display_name: Some("Ada".to_string()),
                },
                &default_ids,
            )
            .await
            .unwrap();
        let session = SessionContext::bind(repo.as_ref(), user.id).await.unwrap();

        Self {
            _temp_dir: temp_dir,
            repo,
            completion: ScriptedCompletion::new(Vec::new()),
            user,
            session,
        }
    }

    pub fn services(&self, skip_when_supplied: bool) -> AgentServices {
        AgentServices {
            repo: self.repo.clone(),
            assistant: ClassificationAssistant::new(
                self.completion.clone(),
                &CompletionConfig::default(),
            ),
            timezone: chrono_tz::Tz::UTC,
            skip_when_supplied,
        }
    }

    pub fn category(&self, name: &str) -> Category {
        self.session
            .categories
            .iter()
            .find(|category| category.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("no session category named {}", name))
    }

    /// A task classification reply naming `category`.
    pub fn task_reply(category: &Category, priority: &str) -> String {
        format!(
            r#"{{"category_id": "{}", "category_name": "{}", "priority": "{}"}}"#,
            category.id, category.name, priority
        )
    }
}

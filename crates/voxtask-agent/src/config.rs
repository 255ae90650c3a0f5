use crate::error::AgentError;
use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const CONFIG_FILE: &str = "voxtask.toml";
pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_path: String,
    /// IANA timezone used for "today" and for spoken dates
    pub timezone: String,
    pub log: LogConfig,
    pub completion: CompletionConfig,
    pub classification: ClassificationConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogConfig {
    /// Used when `RUST_LOG` is not set
    pub level: String,
    pub json: bool,
}

/// Settings for the chat-completions endpoint used for classification.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Ask the endpoint for a JSON object response
    pub json_mode: bool,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ClassificationConfig {
    /// Skip the language model when a task arrives with both a known
    /// category and a priority.
    pub skip_when_supplied: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "voxtask.db".to_string(),
            timezone: detect_system_timezone(),
            log: LogConfig::default(),
            completion: CompletionConfig::default(),
            classification: ClassificationConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENAI_CHAT_COMPLETIONS_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            json_mode: true,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Defaults, then `voxtask.toml`, then `VOXTASK_*` variables, then `OPENAI_API_KEY`.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("VOXTASK_").split("__"))
            .merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "completion.api_key".into()),
            )
    }

    pub fn new() -> Result<Self, AgentError> {
        let config: Config = Self::figment()
            .extract()
            .map_err(|e| AgentError::Config(e.to_string()))?;
        config.timezone()?;
        Ok(config)
    }

    pub fn timezone(&self) -> Result<Tz, AgentError> {
        validate_timezone(&self.timezone).map_err(AgentError::Config)
    }

    /// The completion API key; executing voice functions without one is fatal.
    pub fn api_key(&self) -> Result<&str, AgentError> {
        self.completion
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AgentError::Config(
                    "missing completion API key (set OPENAI_API_KEY or VOXTASK_COMPLETION__API_KEY)"
                        .to_string(),
                )
            })
    }
}

/// Validates that a timezone string is a valid IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, String> {
    Tz::from_str(timezone).map_err(|_| {
        format!(
            "Invalid timezone: '{}'. Use IANA timezone names like 'America/New_York'",
            timezone
        )
    })
}

/// Detects the system timezone, falling back to UTC if detection fails
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(local_tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&local_tz).is_ok() {
            return local_tz;
        }
    }

    "UTC".to_string()
}

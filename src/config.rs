//! Process configuration
//!
//! Everything comes from the environment. The reasoning-service credential is
//! the only hard requirement; the rest falls back to workable defaults.

use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-5-nano";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MAX_TOOL_CYCLES: u32 = 8;
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Librarian endpoint. Card search stays registered but reports itself
    /// unavailable when this is unset.
    pub librarian_url: Option<String>,
    pub max_tool_cycles: u32,
    pub llm_timeout: Duration,
    pub tool_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY not found in environment variables")]
    MissingApiKey,
    #[error("invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let model = lookup("ARBITER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let librarian_url = lookup("LIBRARIAN_URL").filter(|url| !url.trim().is_empty());

        let max_tool_cycles = match lookup("ARBITER_MAX_TOOL_CYCLES") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "ARBITER_MAX_TOOL_CYCLES",
                value: raw,
            })?,
            None => DEFAULT_MAX_TOOL_CYCLES,
        };

        Ok(Self {
            api_key,
            model,
            base_url,
            librarian_url,
            max_tool_cycles,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        })
    }
}

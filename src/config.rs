//! Runtime configuration for a research run.
//!
//! Values come from the environment (with `.env` support via dotenvy) and
//! can be overridden per-flag from the CLI.

use serde::Deserialize;
use std::env;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TAVILY_API_BASE: &str = "https://api.tavily.com";

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Chat completion model identifier.
    pub model: String,
    /// LLM sampling temperature.
    pub temperature: f32,
    /// Search results requested per query.
    pub max_search_results: usize,
    /// Plan size cap.
    pub max_questions: usize,
    /// Re-research bound: at most this many targeted rounds after the first.
    pub max_iterations: u32,
    /// Content slice per source fed to compression.
    pub chars_per_source: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_search_results: 5,
            max_questions: 10,
            max_iterations: 2,
            chars_per_source: 12_000,
        }
    }
}

impl RunConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            model: env::var("SCOUT_MODEL").unwrap_or(defaults.model),
            temperature: parse_env("SCOUT_TEMPERATURE", defaults.temperature),
            max_search_results: parse_env("SCOUT_MAX_SEARCH_RESULTS", defaults.max_search_results),
            max_questions: parse_env("SCOUT_MAX_QUESTIONS", defaults.max_questions),
            max_iterations: parse_env("SCOUT_MAX_ITERATIONS", defaults.max_iterations),
            chars_per_source: parse_env("SCOUT_CHARS_PER_SOURCE", defaults.chars_per_source),
        }
    }
}

/// Provider credentials and endpoints, separate from run tuning.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub tavily_api_key: String,
    pub tavily_api_base: String,
}

impl ProviderConfig {
    pub fn from_env() -> crate::types::Result<Self> {
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            crate::types::AppError::Config("OPENAI_API_KEY is not set".to_string())
        })?;
        let tavily_api_key = env::var("TAVILY_API_KEY").map_err(|_| {
            crate::types::AppError::Config("TAVILY_API_KEY is not set".to_string())
        })?;

        Ok(Self {
            openai_api_key,
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            tavily_api_key,
            tavily_api_base: env::var("TAVILY_API_BASE")
                .unwrap_or_else(|_| DEFAULT_TAVILY_API_BASE.to_string()),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

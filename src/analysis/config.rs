//! Configuration for analysis runs

use crate::analysis::code_quality::CodeAnalysisConfig;
use crate::github::RateLimitPolicy;
use crate::llm::backend::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for analysis runs. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Width of the bounded fetch pool.
    pub concurrency_limit: usize,
    /// Results per API page (GitHub max is 100).
    pub api_page_size: u8,
    pub api_timeout_secs: u64,
    pub rate_limit_max_retries: u32,
    pub rate_limit_max_wait_secs: u64,
    /// Fetch per-commit line stats (one extra request per commit).
    pub commit_stats: bool,
    pub clone_timeout_secs: u64,
    pub max_file_size: usize,
    pub target_language: String,
    pub lint: bool,
    /// Ask the LLM for a narrative summary of the code metrics.
    pub code_insights: bool,
    /// Leave fallback scores out of contributor quality averages.
    pub exclude_fallback_scores: bool,
    pub llm_model: String,
    pub llm_base_url: String,
    pub llm_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 20,
            api_page_size: 100,
            api_timeout_secs: 30,
            rate_limit_max_retries: 3,
            rate_limit_max_wait_secs: 900, // 15 minutes
            commit_stats: true,
            clone_timeout_secs: 300,
            max_file_size: 1_048_576, // 1MB
            target_language: "Python".to_string(),
            lint: true,
            code_insights: false,
            exclude_fallback_scores: true,
            llm_model: DEFAULT_MODEL.to_string(),
            llm_base_url: DEFAULT_BASE_URL.to_string(),
            llm_timeout_secs: 60,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Invalid(
                "concurrency_limit must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.api_page_size) {
            return Err(ConfigError::Invalid(format!(
                "api_page_size must be between 1 and 100, got {}",
                self.api_page_size
            )));
        }
        if !self.target_language.eq_ignore_ascii_case("python") {
            return Err(ConfigError::Invalid(format!(
                "target_language '{}' is not supported (only Python)",
                self.target_language
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    #[must_use]
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    #[must_use]
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_retries: self.rate_limit_max_retries,
            max_wait: Duration::from_secs(self.rate_limit_max_wait_secs),
        }
    }

    #[must_use]
    pub fn code_analysis(&self) -> CodeAnalysisConfig {
        CodeAnalysisConfig {
            target_language: "Python".to_string(),
            lint: self.lint,
            max_file_size: self.max_file_size,
            clone_timeout: Duration::from_secs(self.clone_timeout_secs),
        }
    }
}

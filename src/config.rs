//! Configuration
//!
//! Explicitly constructed and injected into the validator and the workflow
//! runner at call time. No process-global state.

use crate::error::{Result, WardenError};

/// Knobs for a single question-answering run.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// SQL generation attempts before the fallback strategy kicks in.
    pub max_retries: u32,
    /// Maximum accepted user question length, in characters.
    pub max_question_len: usize,
    /// Unknown table names at or below this length are treated as a
    /// forgotten subquery alias when building retry feedback. A heuristic,
    /// not a proof: a real two-letter table name will be misclassified.
    pub alias_name_max_len: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_question_len: 1000,
            alias_name_max_len: 2,
        }
    }
}

/// Connection settings for the text-generation service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| WardenError::Config("LLM_API_KEY is not set".to_string()))?;
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "llama-3.3-70b".to_string());
        let base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.cerebras.ai/v1".to_string());
        Ok(Self {
            api_key,
            model,
            base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_workflow_limits() {
        let config = WorkflowConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_question_len, 1000);
        assert_eq!(config.alias_name_max_len, 2);
    }
}

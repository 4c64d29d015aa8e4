use std::env;

use anyhow::Result;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Root directory of the versioned knowledge base.
    pub kb_dir: String,
    /// API key for the LLM validator - only needed with --validate.
    pub anthropic_api_key: String,
    /// Validator model id.
    pub model: String,
    /// Messages endpoint; overridable for self-hosted gateways.
    pub validator_url: String,
    /// Posts per validator batch.
    pub llm_batch_size: usize,
    /// Concurrent validator calls within a batch.
    pub llm_concurrency: usize,
    /// Validated products below this confidence are discarded.
    pub validation_threshold: f64,
    /// Validator request budget (calls per second).
    pub validator_rps: f64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a usable default except the API key, which is only
    /// required for validated scans.
    pub fn load() -> Result<Self> {
        Ok(Self {
            kb_dir: env::var("PERISCOPE_KB_DIR").unwrap_or_else(|_| "./knowledge".to_string()),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: env::var("PERISCOPE_MODEL")
                .unwrap_or_else(|_| "claude-3-5-sonnet-20241022".to_string()),
            validator_url: env::var("PERISCOPE_VALIDATOR_URL")
                .unwrap_or_else(|_| crate::validator::claude::DEFAULT_API_URL.to_string()),
            llm_batch_size: parse_env("PERISCOPE_LLM_BATCH_SIZE", 50),
            llm_concurrency: parse_env("PERISCOPE_LLM_CONCURRENCY", 4),
            validation_threshold: parse_env("PERISCOPE_VALIDATION_THRESHOLD", 0.6),
            validator_rps: parse_env("PERISCOPE_VALIDATOR_RPS", 1.0),
        })
    }

    /// Check that the validator is usable.
    /// Call this before any scan that passes --validate.
    pub fn require_validator(&self) -> Result<()> {
        if self.anthropic_api_key.is_empty() {
            anyhow::bail!(
                "ANTHROPIC_API_KEY not set. Add it to your .env file,\n\
                 or run the scan without --validate."
            );
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

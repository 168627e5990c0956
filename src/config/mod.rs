use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::narrative::{DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS};
use crate::observability::LogFormat;

/// Deployment environment; gates the underwriter schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Environment {
    #[default]
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Loan evaluation service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "loaneval")]
#[command(about = "Rule-driven SME loan evaluation service")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "LOANEVAL_LISTEN_ADDR")]
    pub listen_addr: String,

    /// Path to lending policy YAML file (built-in policy if not set)
    #[arg(long, env = "LOANEVAL_POLICY_PATH")]
    pub policy_path: Option<PathBuf>,

    /// Deployment environment
    #[arg(long, value_enum, default_value = "staging", env = "LOANEVAL_ENVIRONMENT")]
    pub environment: Environment,

    /// Shared API key expected in X-API-Key (auth disabled if not set)
    #[arg(long, env = "LOANEVAL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Public domain reported by the production schema fallback
    #[arg(long, default_value = "localhost", env = "LOANEVAL_PUBLIC_DOMAIN")]
    pub public_domain: String,

    /// OpenAI API key (narrative endpoints disabled if not set)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "LOANEVAL_OPENAI_BASE_URL")]
    pub openai_base_url: String,

    /// Chat model used for narratives
    #[arg(long, default_value = "gpt-4o-mini", env = "LOANEVAL_OPENAI_MODEL")]
    pub openai_model: String,

    /// Token limit per narrative completion
    #[arg(long, default_value = "300", env = "LOANEVAL_OPENAI_MAX_TOKENS")]
    pub openai_max_tokens: u32,

    /// Generate/check rounds before returning an unverified narrative
    #[arg(long, default_value = "3", env = "LOANEVAL_NARRATIVE_MAX_ATTEMPTS")]
    pub narrative_max_attempts: u32,

    /// Narrative HTTP client timeout in seconds
    #[arg(long, default_value = "20", env = "LOANEVAL_NARRATIVE_TIMEOUT_SECS")]
    pub narrative_timeout_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "60", env = "LOANEVAL_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// Maximum in-flight requests
    #[arg(long, default_value = "256", env = "LOANEVAL_MAX_CONCURRENCY")]
    pub max_concurrency: usize,

    /// Latency budget in milliseconds for decision endpoints
    #[arg(long, default_value = "100", env = "LOANEVAL_LATENCY_BUDGET_MS")]
    pub latency_budget_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "LOANEVAL_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "LOANEVAL_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value = "30", env = "LOANEVAL_SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Get request timeout as Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn narrative_timeout(&self) -> Duration {
        Duration::from_secs(self.narrative_timeout_secs)
    }

    /// Get shutdown timeout as Duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            policy_path: None,
            environment: Environment::Staging,
            api_key: None,
            public_domain: "localhost".to_string(),
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_max_tokens: 300,
            narrative_max_attempts: DEFAULT_MAX_ATTEMPTS,
            narrative_timeout_secs: 20,
            request_timeout_secs: 60,
            max_concurrency: 256,
            latency_budget_ms: 100,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            graceful_shutdown: true,
            shutdown_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.latency_budget_ms, 100);
        assert_eq!(config.openai_max_tokens, 300);
        assert_eq!(config.narrative_max_attempts, 3);
        assert!(!config.environment.is_production());
    }

    #[test]
    fn test_parse_flags() {
        let config = Config::try_parse_from([
            "loaneval",
            "--environment",
            "production",
            "--api-key",
            "secret",
            "--log-format",
            "json",
            "--max-concurrency",
            "8",
        ])
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.max_concurrency, 8);
    }

    #[test]
    fn test_duration_helpers() {
        let config = Config {
            request_timeout_secs: 10,
            narrative_timeout_secs: 5,
            shutdown_timeout_secs: 15,
            ..Default::default()
        };

        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.narrative_timeout(), Duration::from_secs(5));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(15));
    }
}

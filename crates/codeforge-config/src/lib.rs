//! Configuration loading for the codeforge pipeline
//!
//! Configuration lives in `.codeforge/config.toml`, discovered by walking
//! upward from the working directory. Every field has a default, so a missing
//! file yields a fully usable configuration.
//!
//! ```toml
//! [client]
//! model = "codegen-large"
//! fallback_models = ["codegen-medium", "codegen-small"]
//! max_attempts = 3
//!
//! [security]
//! policy = "warn"
//! ```

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Name of the configuration directory searched for during discovery.
pub const CONFIG_DIR: &str = ".codeforge";
/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Remote-call client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the chat-completion endpoint
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Primary model identifier
    pub model: String,
    /// Models tried in order when the primary is unavailable
    pub fallback_models: Vec<String>,
    /// Sampling temperature sent with every request
    pub temperature: f64,
    /// Maximum tokens requested per completion
    pub max_tokens: u32,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Total attempts per logical request (first try plus retries)
    pub max_attempts: u32,
    /// Base backoff in milliseconds; doubles each retry
    pub backoff_base_ms: u64,
    /// Requests allowed per rate window
    pub rate_limit: u32,
    /// Rate window length in seconds
    pub rate_window_secs: u64,
    /// Response cache file path, relative to the workspace root
    pub cache_path: String,
    /// Cache entry time-to-live in seconds
    pub cache_ttl_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key_env: "CODEFORGE_API_KEY".to_string(),
            model: "gpt-4".to_string(),
            fallback_models: vec!["gpt-4-turbo".to_string(), "gpt-3.5-turbo".to_string()],
            temperature: 0.2,
            max_tokens: 4096,
            timeout_secs: 60,
            max_attempts: 3,
            backoff_base_ms: 500,
            rate_limit: 30,
            rate_window_secs: 60,
            cache_path: ".codeforge/response-cache.json".to_string(),
            cache_ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Static-analysis thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Cyclomatic complexity above this is flagged
    pub max_complexity: u32,
    /// Nesting depth above this is flagged
    pub max_nesting_depth: u32,
    /// Artifacts longer than this (in lines) are flagged
    pub max_lines: u32,
    /// Comment-to-code ratio below this is flagged
    pub min_comment_ratio: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_complexity: 10,
            max_nesting_depth: 4,
            max_lines: 300,
            min_comment_ratio: 0.05,
        }
    }
}

/// Formatter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatterConfig {
    /// Indent width used by the fallback formatter
    pub indent_width: u8,
    /// Per-tool timeout in seconds
    pub tool_timeout_secs: u64,
    /// Skip external tools entirely and use only the fallback pass
    pub fallback_only: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            indent_width: 2,
            tool_timeout_secs: 30,
            fallback_only: false,
        }
    }
}

/// What to do when generated code trips a security finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityPolicy {
    /// Reject the artifact; it is not integrated
    Block,
    /// Integrate the artifact but surface the finding as a warning
    #[default]
    Warn,
}

/// Security section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Policy applied to security findings during validation
    pub policy: SecurityPolicy,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub client: ClientConfig,
    pub validator: ValidatorConfig,
    pub formatter: FormatterConfig,
    pub security: SecurityConfig,
}

impl Config {
    /// Loads configuration by discovering `.codeforge/config.toml` upward
    /// from `start_dir`. Returns defaults when no file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn discover(start_dir: &Utf8Path) -> Result<Self> {
        match find_config_file(start_dir) {
            Some(path) => Self::load(&path),
            None => {
                tracing::debug!(start_dir = %start_dir, "No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Loads configuration from an explicit file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("Invalid config file {path}"))?;
        tracing::debug!(path = %path, "Loaded configuration");
        Ok(config)
    }

    /// Minimal configuration for tests: single attempt, no fallback models,
    /// tiny rate window, fallback-only formatting.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Self {
            client: ClientConfig {
                model: "test-model".to_string(),
                fallback_models: Vec::new(),
                max_attempts: 1,
                backoff_base_ms: 0,
                rate_limit: 100,
                rate_window_secs: 1,
                cache_ttl_secs: 60,
                ..ClientConfig::default()
            },
            formatter: FormatterConfig {
                fallback_only: true,
                ..FormatterConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Walks upward from `start_dir` looking for `.codeforge/config.toml`.
#[must_use]
pub fn find_config_file(start_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.client.max_attempts, 3);
        assert_eq!(config.security.policy, SecurityPolicy::Warn);
        assert_eq!(config.validator.max_complexity, 10);
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let (_dir, root) = utf8_temp_dir();
        let config = Config::discover(&root).unwrap();
        assert_eq!(config.client.rate_limit, ClientConfig::default().rate_limit);
    }

    #[test]
    fn discover_finds_file_in_ancestor() {
        let (_dir, root) = utf8_temp_dir();
        let config_dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join(CONFIG_FILE),
            "[client]\nmodel = \"custom\"\n\n[security]\npolicy = \"block\"\n",
        )
        .unwrap();

        let nested = root.join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::discover(&nested).unwrap();
        assert_eq!(config.client.model, "custom");
        assert_eq!(config.security.policy, SecurityPolicy::Block);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Config, _> = toml::from_str("[client]\nmodle = \"typo\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str("[validator]\nmax_complexity = 20\n").unwrap();
        assert_eq!(config.validator.max_complexity, 20);
        assert_eq!(
            config.validator.max_nesting_depth,
            ValidatorConfig::default().max_nesting_depth
        );
    }
}

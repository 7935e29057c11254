//! PlanWise configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main PlanWise configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Moderation classifier configuration
    pub moderation: ModerationConfig,

    /// Clarification analyzer settings
    pub clarify: ClarifyConfig,

    /// Plan synthesis settings
    pub synthesis: SynthesisConfig,

    /// Task extraction settings
    pub extraction: ExtractionConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables are set. Call this early
    /// in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if std::env::var(&self.moderation.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Moderation API key not found. Set the {} environment variable.",
                self.moderation.api_key_env
            ));
        }
        if !(1..=planschema::MAX_QUESTIONS).contains(&self.clarify.max_questions) {
            return Err(eyre::eyre!(
                "clarify.max-questions must be between 1 and {}",
                planschema::MAX_QUESTIONS
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .planwise.yml
        let local_config = PathBuf::from(".planwise.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/planwise/planwise.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("planwise").join("planwise.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed: a broken config is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".planwise.yml")];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("planwise").join("planwise.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn read_api_key(env_var: &str) -> Result<String> {
    let key = std::env::var(env_var).context(format!("Environment variable {} is not set", env_var))?;
    if key.trim().is_empty() {
        return Err(eyre::eyre!("Environment variable {} is empty", env_var));
    }
    Ok(key.trim().to_string())
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" or "anthropic")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        read_api_key(&self.api_key_env)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 16384,
            timeout_ms: 120_000,
        }
    }
}

/// Moderation classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Moderation model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl ModerationConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        read_api_key(&self.api_key_env)
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            model: "omni-moderation-latest".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

/// Clarification analyzer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarifyConfig {
    /// Cap on the number of follow-up questions
    #[serde(rename = "max-questions")]
    pub max_questions: usize,

    /// Make sure timeframe and personality are always asked about
    #[serde(rename = "require-core-topics")]
    pub require_core_topics: bool,

    /// Maximum tokens for the analyzer reply
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for ClarifyConfig {
    fn default() -> Self {
        Self {
            max_questions: planschema::MAX_QUESTIONS,
            require_core_topics: true,
            max_tokens: 2048,
        }
    }
}

/// Plan synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling
    #[serde(rename = "top-p")]
    pub top_p: f32,

    /// Maximum tokens for the plan
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            max_tokens: 8192,
        }
    }
}

/// Task extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum tokens for the task list
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_tokens: 16384 }
    }
}

/// Prompt template overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory searched for `{name}.pmt` before the embedded templates
    pub dir: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".planwise/prompts"),
        }
    }
}

impl PromptsConfig {
    /// Expand a leading `~/` in the override directory
    pub fn expanded_dir(&self) -> PathBuf {
        match self.dir.to_str().and_then(|s| s.strip_prefix("~/")) {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| self.dir.clone()),
            None => self.dir.clone(),
        }
    }
}

//! LLM Client module for PlanWise
//!
//! Provides completion and moderation clients behind provider-agnostic traits.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod moderation;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use moderation::{ModerationClient, ModerationResult, OpenAIModerationClient};
pub use openai::OpenAIClient;
pub use types::{
    CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage, ToolCall, ToolChoice,
    ToolDefinition,
};

use crate::config::{LlmConfig, ModerationConfig};

/// Create an LLM client based on the provider specified in config
///
/// Supports "openai" and "anthropic" providers.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::Config(format!(
                "Unknown LLM provider: '{}'. Supported: openai, anthropic",
                other
            )))
        }
    }
}

/// Create the moderation client
pub fn create_moderator(config: &ModerationConfig, timeout_ms: u64) -> Result<Arc<dyn ModerationClient>, LlmError> {
    debug!(model = %config.model, "create_moderator: called");
    Ok(Arc::new(OpenAIModerationClient::from_config(config, timeout_ms)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_unknown_provider() {
        let config = LlmConfig {
            provider: "mystery".to_string(),
            ..LlmConfig::default()
        };
        let err = create_client(&config).err().unwrap();
        assert!(matches!(err, LlmError::Config(_)));
    }
}

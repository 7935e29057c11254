//! PlanWise - goal to clarified, scheduled plan
//!
//! PlanWise turns a user's loosely specified goal into a structured,
//! time-scheduled action plan through a short sequence of LLM calls.
//!
//! # Core Concepts
//!
//! - **One call per operation**: each operation is a single prompt and a
//!   single remote call; nothing is retried or queued
//! - **Typed replies**: structured answers come back through a forced tool
//!   call whose schema is generated from the `planschema` types
//! - **Stateless stages**: the caller carries goal, answers and plan text
//!   from one stage to the next
//!
//! # Modules
//!
//! - [`llm`] - completion and moderation clients (OpenAI, Anthropic)
//! - [`prompts`] - Handlebars prompt templates
//! - [`extract`] - structured output extraction
//! - [`ops`] - the four planning operations
//! - [`planner`] - facade with request ids and timeouts
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod ops;
pub mod planner;
pub mod prompts;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use error::PlanError;
pub use extract::ExtractionError;
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, ModerationClient, ModerationResult,
    OpenAIClient, create_client, create_moderator,
};
pub use ops::{Answer, PolicyVerdict};
pub use planner::Planner;
pub use prompts::PromptLoader;

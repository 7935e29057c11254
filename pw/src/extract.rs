//! Structured output extraction
//!
//! Turns the forced tool call in a completion response into a typed record.
//! Every failure is terminal and keeps enough detail for the caller to decide
//! what to do next; nothing here retries.

use planschema::{OutputContract, Validate, ValidationErrors};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::{CompletionResponse, ToolDefinition};

/// Why a structured reply could not be used
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("model did not call `{tool}`")]
    MissingStructuredResponse { tool: String },

    #[error("structured payload is not valid JSON: {source}")]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
    },

    #[error("structured payload violates the schema at {path}: {details}")]
    SchemaViolation { path: String, details: String },
}

impl ExtractionError {
    /// Location of the offending value for schema violations
    pub fn path(&self) -> Option<&str> {
        match self {
            ExtractionError::SchemaViolation { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for ExtractionError {
    fn from(errors: ValidationErrors) -> Self {
        let path = errors.first().map(|v| v.path.clone()).unwrap_or_else(|| "$".to_string());
        ExtractionError::SchemaViolation {
            path,
            details: errors.to_string(),
        }
    }
}

static FIELD_IN_MESSAGE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:missing|unknown|duplicate) field `([^`]+)`").ok());

/// Best-effort location for a typed deserialization failure
///
/// serde reports the offending field name inside the message, not as a path,
/// so this is the leaf field name only (`date`, not `tasks[1].duration.date`).
/// The full message, with line and column, stays in the error details.
fn error_path(error: &serde_json::Error) -> String {
    let message = error.to_string();
    let field = match &*FIELD_IN_MESSAGE {
        Some(re) => re.captures(&message),
        None => None,
    };
    field
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "$".to_string())
}

/// The tool definition that forces a reply of type `T`
pub fn tool_for<T: OutputContract>() -> ToolDefinition {
    ToolDefinition::new(T::TOOL_NAME, T::TOOL_DESCRIPTION, T::output_schema())
}

/// Deserialize the payload of the named tool call without checking invariants
///
/// Order matters: a missing call, then a payload that is not JSON at all,
/// then a payload of the wrong shape.
pub fn parse_structured<T: DeserializeOwned>(response: &CompletionResponse, tool: &str) -> Result<T, ExtractionError> {
    debug!(
        %tool,
        call_count = response.tool_calls.len(),
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        "parse_structured: called"
    );
    let Some(call) = response.find_tool_call(tool) else {
        warn!(%tool, stop_reason = ?response.stop_reason, "parse_structured: no structured response");
        return Err(ExtractionError::MissingStructuredResponse { tool: tool.to_string() });
    };

    if let Err(source) = serde_json::from_str::<serde::de::IgnoredAny>(&call.arguments) {
        warn!(%tool, error = %source, "parse_structured: malformed payload");
        return Err(ExtractionError::MalformedPayload { source });
    }

    serde_json::from_str(&call.arguments).map_err(|e| {
        warn!(%tool, error = %e, "parse_structured: schema violation");
        ExtractionError::SchemaViolation {
            path: error_path(&e),
            details: e.to_string(),
        }
    })
}

/// Deserialize and validate the forced reply for `T`
pub fn extract_structured<T: OutputContract>(response: &CompletionResponse) -> Result<T, ExtractionError> {
    let value: T = parse_structured(response, T::TOOL_NAME)?;
    value.validate()?;
    Ok(value)
}

//! Content moderation client
//!
//! The policy screen is a single call to a moderation classifier; this is a
//! separate seam from `LlmClient` because the request and response shapes
//! share nothing with chat completions.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::LlmError;
use super::error::retry_after_header;
use crate::config::ModerationConfig;

/// Outcome of one moderation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationResult {
    /// Whether the classifier flagged the input
    pub flagged: bool,
    /// Names of the categories that fired, sorted
    pub categories: Vec<String>,
}

/// A content classifier
#[async_trait]
pub trait ModerationClient: Send + Sync {
    /// Classify one piece of text
    async fn moderate(&self, input: &str) -> Result<ModerationResult, LlmError>;
}

/// OpenAI `/v1/moderations` client
pub struct OpenAIModerationClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl OpenAIModerationClient {
    /// Create a new client from configuration
    pub fn from_config(config: &ModerationConfig, timeout_ms: u64) -> Result<Self, LlmError> {
        debug!(model = %config.model, %timeout_ms, "OpenAIModerationClient::from_config: called");
        let api_key = config.get_api_key().map_err(|e| LlmError::Config(e.to_string()))?;

        let timeout = Duration::from_millis(timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    fn build_request_body(&self, input: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "input": input,
        })
    }
}

fn parse_response(api_response: ModerationResponse) -> Result<ModerationResult, LlmError> {
    debug!(result_count = api_response.results.len(), "parse_response: called");
    let Some(first) = api_response.results.into_iter().next() else {
        return Err(LlmError::InvalidResponse("moderation response had no results".to_string()));
    };

    let categories = first
        .categories
        .into_iter()
        .filter_map(|(name, hit)| hit.then_some(name))
        .collect();

    Ok(ModerationResult {
        flagged: first.flagged,
        categories,
    })
}

#[async_trait]
impl ModerationClient for OpenAIModerationClient {
    async fn moderate(&self, input: &str) -> Result<ModerationResult, LlmError> {
        debug!(%self.model, input_len = input.len(), "moderate: called");
        let url = format!("{}/v1/moderations", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_request_body(input))
            .send()
            .await
            .map_err(|e| {
                debug!(error = %e, "moderate: network error");
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Network(e)
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            debug!("moderate: rate limited (429)");
            return Err(LlmError::RateLimited {
                retry_after: retry_after_header(response.headers()),
            });
        }
        if !response.status().is_success() {
            debug!(%status, "moderate: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let api_response: ModerationResponse = response.json().await?;
        parse_response(api_response)
    }
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationEntry>,
}

#[derive(Debug, Deserialize)]
struct ModerationEntry {
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, bool>,
}

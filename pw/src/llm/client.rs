//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent (fresh context)
///
/// Every planning operation is one self-contained request: the caller
/// carries goal, answers and plan text forward explicitly, and nothing is
/// remembered between calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing::debug;

    use crate::llm::{ModerationClient, ModerationResult};

    /// Mock LLM client for unit tests
    ///
    /// Replays canned responses in order and records every request it saw.
    pub struct MockLlmClient {
        responses: Vec<CompletionResponse>,
        call_count: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
        delay: Option<Duration>,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<CompletionResponse>) -> Self {
            debug!(response_count = %responses.len(), "MockLlmClient::new: called");
            Self {
                responses,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        /// Sleep before answering, to exercise timeouts
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// The most recent request received
        pub fn last_request(&self) -> Option<CompletionRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::complete: called");
            self.requests.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            self.responses.get(idx).cloned().ok_or_else(|| {
                debug!("MockLlmClient::complete: no more mock responses");
                LlmError::InvalidResponse("No more mock responses".to_string())
            })
        }
    }

    /// Mock moderation endpoint flagging any input containing a marker word
    pub struct MockModerator {
        marker: String,
        inputs: Mutex<Vec<String>>,
    }

    impl MockModerator {
        pub fn flagging(marker: impl Into<String>) -> Self {
            Self {
                marker: marker.into(),
                inputs: Mutex::new(Vec::new()),
            }
        }

        pub fn inputs(&self) -> Vec<String> {
            self.inputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModerationClient for MockModerator {
        async fn moderate(&self, input: &str) -> Result<ModerationResult, LlmError> {
            self.inputs.lock().unwrap().push(input.to_string());
            let flagged = input.contains(&self.marker);
            Ok(ModerationResult {
                flagged,
                categories: if flagged { vec!["violence".to_string()] } else { vec![] },
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_returns_responses() {
            let client = MockLlmClient::new(vec![
                CompletionResponse::text("Response 1"),
                CompletionResponse::text("Response 2"),
            ]);

            let req = CompletionRequest::new("Test", "Hi", 1000);

            let resp1 = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp1.content, Some("Response 1".to_string()));

            let resp2 = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp2.content, Some("Response 2".to_string()));

            assert_eq!(client.call_count(), 2);
            assert_eq!(client.last_request().unwrap().system_prompt, "Test");
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::new(vec![]);
            let result = client.complete(CompletionRequest::new("Test", "Hi", 1000)).await;
            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_mock_moderator_flags_marker() {
            let moderator = MockModerator::flagging("forbidden");
            assert!(moderator.moderate("a forbidden plan").await.unwrap().flagged);
            assert!(!moderator.moderate("a fine plan").await.unwrap().flagged);
            assert_eq!(moderator.inputs().len(), 2);
        }
    }
}

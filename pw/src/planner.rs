//! Planner facade
//!
//! Bundles the clients, prompts and configuration behind the four public
//! planning operations. Every call gets its own request id and timeout;
//! dropping the returned future cancels the call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use planschema::{ClarificationResult, Task, TaskCollection};
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::PlanError;
use crate::llm::{LlmClient, LlmError, ModerationClient, create_client, create_moderator};
use crate::ops::{self, Answer, ExtractionInput, PolicyVerdict};
use crate::prompts::PromptLoader;

/// Entry point for planning operations
///
/// Holds only shared immutable state, so clones are cheap and calls may run
/// concurrently.
#[derive(Clone)]
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    moderator: Arc<dyn ModerationClient>,
    prompts: Arc<PromptLoader>,
    config: Arc<Config>,
}

impl Planner {
    /// Assemble a planner from explicit parts
    pub fn new(
        llm: Arc<dyn LlmClient>,
        moderator: Arc<dyn ModerationClient>,
        prompts: PromptLoader,
        config: Config,
    ) -> Self {
        debug!("Planner::new: called");
        Self {
            llm,
            moderator,
            prompts: Arc::new(prompts),
            config: Arc::new(config),
        }
    }

    /// Create the configured provider clients and prompt loader
    pub fn from_config(config: Config) -> Result<Self, PlanError> {
        debug!(provider = %config.llm.provider, "Planner::from_config: called");
        let llm = create_client(&config.llm)?;
        let moderator = create_moderator(&config.moderation, config.llm.timeout_ms)?;
        let prompts = PromptLoader::new(config.prompts.expanded_dir());
        Ok(Self::new(llm, moderator, prompts, config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.llm.timeout_ms)
    }

    /// Run one operation under its own span and the configured timeout
    async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T, PlanError>
    where
        F: Future<Output = Result<T, PlanError>>,
    {
        let request_id = Uuid::now_v7();
        let timeout = self.timeout();
        let span = info_span!("plan_op", %operation, %request_id);

        async move {
            debug!(timeout_ms = timeout.as_millis() as u64, "run: starting");
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => {
                    if let Err(ref e) = result {
                        warn!(error = %e, retryable = e.is_retryable(), "Operation failed");
                    }
                    result
                }
                Err(_) => {
                    warn!(timeout_ms = timeout.as_millis() as u64, "Operation timed out");
                    Err(LlmError::Timeout(timeout).into())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Screen goal and plan against the content policy
    pub async fn screen(&self, goal: &str, plan: &str) -> Result<PolicyVerdict, PlanError> {
        self.run("check_policy", ops::screen(self.moderator.as_ref(), goal, plan))
            .await
    }

    /// `true` when goal and plan are acceptable
    pub async fn check_policy(&self, goal: &str, plan: &str) -> Result<bool, PlanError> {
        Ok(self.screen(goal, plan).await?.is_compliant())
    }

    /// Decide which follow-up questions to ask
    pub async fn analyze_clarification(
        &self,
        goal: &str,
        plan: Option<&str>,
    ) -> Result<ClarificationResult, PlanError> {
        self.run(
            "analyze_clarification",
            ops::analyze(self.llm.as_ref(), &self.prompts, &self.config.clarify, goal, plan),
        )
        .await
    }

    /// Write the final markdown plan from the goal and the user's answers
    pub async fn synthesize_plan(&self, goal: &str, answers: &[Answer]) -> Result<String, PlanError> {
        self.run(
            "synthesize_plan",
            ops::synthesize(self.llm.as_ref(), &self.prompts, &self.config.synthesis, goal, answers),
        )
        .await
    }

    /// Convert a final plan into scheduled tasks, keeping the task name list
    pub async fn extract_task_collection(
        &self,
        goal: &str,
        plan: &str,
        clarification_answers: &serde_json::Value,
        final_plan: &str,
    ) -> Result<TaskCollection, PlanError> {
        let input = ExtractionInput {
            goal,
            plan,
            clarification_answers,
            final_plan,
        };
        let today = chrono::Local::now().date_naive();
        self.run(
            "extract_tasks",
            ops::extract_collection(
                self.llm.as_ref(),
                &self.prompts,
                &self.config.extraction,
                input,
                Some(today),
            ),
        )
        .await
    }

    /// Convert a final plan into scheduled tasks
    pub async fn extract_tasks(
        &self,
        goal: &str,
        plan: &str,
        clarification_answers: &serde_json::Value,
        final_plan: &str,
    ) -> Result<Vec<Task>, PlanError> {
        Ok(self
            .extract_task_collection(goal, plan, clarification_answers, final_plan)
            .await?
            .tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::{MockLlmClient, MockModerator};

    fn planner(llm: MockLlmClient, timeout_ms: u64) -> Planner {
        let mut config = Config::default();
        config.llm.timeout_ms = timeout_ms;
        Planner::new(
            Arc::new(llm),
            Arc::new(MockModerator::flagging("forbidden")),
            PromptLoader::embedded_only(),
            config,
        )
    }

    #[tokio::test]
    async fn test_check_policy() {
        let planner = planner(MockLlmClient::new(vec![]), 1_000);
        assert!(planner.check_policy("Learn guitar", "").await.unwrap());
        assert!(!planner.check_policy("Something forbidden", "").await.unwrap());
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let llm = MockLlmClient::new(vec![CompletionResponse::text("late")]).with_delay(Duration::from_millis(200));
        let planner = planner(llm, 20);

        let err = planner.synthesize_plan("goal", &[]).await.unwrap_err();
        assert!(matches!(err, PlanError::Transport(LlmError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_planner() {
        let llm = MockLlmClient::new(vec![CompletionResponse::text("a"), CompletionResponse::text("b")]);
        let planner = planner(llm, 1_000);
        let other = planner.clone();

        let (a, b) = tokio::join!(planner.synthesize_plan("g1", &[]), other.synthesize_plan("g2", &[]));
        let mut plans = vec![a.unwrap(), b.unwrap()];
        plans.sort();
        assert_eq!(plans, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_dropped_call_is_cancelled() {
        let llm = MockLlmClient::new(vec![CompletionResponse::text("never")]).with_delay(Duration::from_secs(5));
        let planner = planner(llm, 10_000);

        let raced = tokio::time::timeout(Duration::from_millis(20), planner.synthesize_plan("g", &[])).await;
        assert!(raced.is_err());
    }
}

//! Final plan synthesis

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SynthesisConfig;
use crate::error::PlanError;
use crate::llm::{CompletionRequest, LlmClient, LlmError, StopReason};
use crate::prompts::PromptLoader;

/// The user's answer to one clarification item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub keyword: String,
    pub details: String,
}

impl Answer {
    pub fn new(keyword: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            details: details.into(),
        }
    }
}

/// Build the user message: the goal, then one `keyword: details` line per answer
///
/// Answers keep their order and duplicates are passed through as given.
pub fn user_prompt(goal: &str, answers: &[Answer]) -> String {
    let details = answers
        .iter()
        .map(|a| format!("{}: {}", a.keyword, a.details))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "According to the following information, generate a tailored plan.\n\
         User's original goal: {goal}\n\
         Additional details:\n{details}"
    )
}

/// Write the final plan as free-form markdown
///
/// The text is returned exactly as the model produced it.
pub async fn synthesize(
    llm: &dyn LlmClient,
    prompts: &PromptLoader,
    config: &SynthesisConfig,
    goal: &str,
    answers: &[Answer],
) -> Result<String, PlanError> {
    debug!(goal_len = goal.len(), answer_count = answers.len(), "synthesize: called");
    let system_prompt = prompts.synthesize_prompt()?;
    let request = CompletionRequest::new(system_prompt, user_prompt(goal, answers), config.max_tokens)
        .sampling(Some(config.temperature), Some(config.top_p));

    let response = llm.complete(request).await?;
    debug!(
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        "synthesize: usage"
    );
    if response.stop_reason == StopReason::MaxTokens {
        warn!("Plan synthesis hit the token limit; the plan may be cut off");
    }

    let plan = response
        .content
        .ok_or_else(|| LlmError::InvalidResponse("plan synthesis returned no text".to_string()))?;
    info!(plan_len = plan.len(), "Plan synthesis finished");
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionResponse;
    use crate::llm::client::mock::MockLlmClient;

    #[test]
    fn test_user_prompt_keeps_order_and_duplicates() {
        let answers = vec![
            Answer::new("Timeframe", "3 months"),
            Answer::new("Level", "beginner"),
            Answer::new("Timeframe", "3 months"),
        ];
        let prompt = user_prompt("Learn guitar", &answers);
        assert!(prompt.contains("User's original goal: Learn guitar"));
        assert!(prompt.ends_with("Timeframe: 3 months\nLevel: beginner\nTimeframe: 3 months"));
    }

    #[tokio::test]
    async fn test_synthesize_returns_text_verbatim() {
        let plan = "# Guitar plan\n\n- Week 1: chords  \n";
        let client = MockLlmClient::new(vec![CompletionResponse::text(plan)]);
        let result = synthesize(
            &client,
            &PromptLoader::embedded_only(),
            &SynthesisConfig::default(),
            "Learn guitar",
            &[Answer::new("Level", "beginner")],
        )
        .await
        .unwrap();

        assert_eq!(result, plan);
        let request = client.last_request().unwrap();
        assert_eq!(request.temperature, Some(1.0));
        assert_eq!(request.top_p, Some(0.95));
        assert!(request.tools.is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_is_returned() {
        let client = MockLlmClient::new(vec![CompletionResponse::text("")]);
        let result = synthesize(&client, &PromptLoader::embedded_only(), &SynthesisConfig::default(), "g", &[])
            .await
            .unwrap();
        assert_eq!(result, "");
    }

    #[tokio::test]
    async fn test_no_text_is_invalid_response() {
        let client = MockLlmClient::new(vec![CompletionResponse::tool_call("x", "{}")]);
        let err = synthesize(&client, &PromptLoader::embedded_only(), &SynthesisConfig::default(), "g", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::Transport(LlmError::InvalidResponse(_))));
    }
}

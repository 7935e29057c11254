//! Task extraction
//!
//! Converts a finished markdown plan into scheduled task records through one
//! forced structured call.

use chrono::NaiveDate;
use planschema::{OutputContract, Task, TaskCollection};
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::error::PlanError;
use crate::extract::{extract_structured, tool_for};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{ExtractContext, PromptLoader};

/// Everything the extractor is told about the plan
#[derive(Debug, Clone, Copy)]
pub struct ExtractionInput<'a> {
    pub goal: &'a str,
    pub plan: &'a str,
    /// Carried-forward clarification context, embedded as JSON
    pub clarification_answers: &'a serde_json::Value,
    pub final_plan: &'a str,
}

impl ExtractionInput<'_> {
    /// Build the user message
    pub fn user_prompt(&self) -> String {
        let answers = self.clarification_answers.to_string();
        format!(
            "The user's goal:\n{}\n\nThe user's plan:\n{}\n\nThe further information:\n{}\n\nThe final plan:\n{}",
            self.goal, self.plan, answers, self.final_plan
        )
    }
}

/// Extract the full collection, including the model's task name list
///
/// An empty final plan yields an empty collection without calling the model.
pub async fn extract_collection(
    llm: &dyn LlmClient,
    prompts: &PromptLoader,
    config: &ExtractionConfig,
    input: ExtractionInput<'_>,
    today: Option<NaiveDate>,
) -> Result<TaskCollection, PlanError> {
    debug!(final_plan_len = input.final_plan.len(), ?today, "extract_collection: called");
    if input.final_plan.trim().is_empty() {
        warn!("Final plan is empty; nothing to extract");
        return Ok(TaskCollection {
            task_names: Vec::new(),
            tasks: Vec::new(),
        });
    }

    let system_prompt = prompts.extract_prompt(&ExtractContext {
        today,
        tool_name: TaskCollection::TOOL_NAME,
    })?;
    let request = CompletionRequest::new(system_prompt, input.user_prompt(), config.max_tokens)
        .force_tool(tool_for::<TaskCollection>());

    let response = llm.complete(request).await?;
    let collection: TaskCollection = extract_structured(&response)?;

    if let Some(mismatch) = collection.name_mismatch() {
        warn!(%mismatch, "Task names do not match the extracted tasks");
    }
    info!(task_count = collection.tasks.len(), "Task extraction finished");
    Ok(collection)
}

/// Extract the scheduled tasks of a final plan, in plan order
pub async fn extract(
    llm: &dyn LlmClient,
    prompts: &PromptLoader,
    config: &ExtractionConfig,
    input: ExtractionInput<'_>,
    today: Option<NaiveDate>,
) -> Result<Vec<Task>, PlanError> {
    Ok(extract_collection(llm, prompts, config, input, today).await?.tasks)
}

//! Clarifying-question generation
//!
//! Asks the model which pieces of information are still missing before a
//! plan can be written, then normalizes its answer so the count and
//! consistency rules always hold.

use planschema::{ClarificationItem, ClarificationResult, OutputContract, Validate};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::config::ClarifyConfig;
use crate::error::PlanError;
use crate::extract::{ExtractionError, parse_structured, tool_for};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{ClarifyContext, PromptLoader};

const NO_PLAN: &str = "No plan provided.";

static TIMEFRAME_TOPIC: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(time ?frame|timeline|deadline|target date|due date|(start|starting|end|finish) (date|time)|duration)\b")
        .ok()
});

static PERSONALITY_TOPIC: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(personality|temperament|character|working style)\b").ok());

/// A topic every plan needs, with the question asked when the model skipped it
struct CoreTopic {
    pattern: &'static LazyLock<Option<Regex>>,
    item: fn() -> ClarificationItem,
}

static CORE_TOPICS: &[CoreTopic] = &[
    CoreTopic {
        pattern: &TIMEFRAME_TOPIC,
        item: || {
            ClarificationItem::new(
                "Timeframe",
                "When do you want to start, and by when do you want to reach this goal?",
                "Start next Monday and finish within three months",
            )
        },
    },
    CoreTopic {
        pattern: &PERSONALITY_TOPIC,
        item: || {
            ClarificationItem::new(
                "Personality",
                "Describe your personality and how you like to work, so the plan fits your habits.",
                "I get bored with long sessions and stay motivated by short daily routines",
            )
        },
    },
];

impl CoreTopic {
    /// Only the keyword counts; guides mention times and dates in passing
    fn covered_by(&self, item: &ClarificationItem) -> bool {
        match &**self.pattern {
            Some(re) => re.is_match(&item.keyword),
            None => false,
        }
    }
}

/// Build the user message for the analyzer
pub fn user_prompt(goal: &str, plan: Option<&str>) -> String {
    let plan = plan.map(str::trim).filter(|p| !p.is_empty()).unwrap_or(NO_PLAN);
    format!("The information provided by the user:\nGoal or Idea: {goal}\nPlan: {plan}")
}

/// Decide which follow-up questions to ask about a goal and optional plan
pub async fn analyze(
    llm: &dyn LlmClient,
    prompts: &PromptLoader,
    config: &ClarifyConfig,
    goal: &str,
    plan: Option<&str>,
) -> Result<ClarificationResult, PlanError> {
    debug!(goal_len = goal.len(), has_plan = plan.is_some(), "analyze: called");
    let system_prompt = prompts.clarify_prompt(&ClarifyContext {
        max_questions: config.max_questions,
        tool_name: ClarificationResult::TOOL_NAME,
    })?;

    let request = CompletionRequest::new(system_prompt, user_prompt(goal, plan), config.max_tokens)
        .force_tool(tool_for::<ClarificationResult>());
    let response = llm.complete(request).await?;

    let raw: ClarificationResult = parse_structured(&response, ClarificationResult::TOOL_NAME)?;
    let result = normalize(raw, config)?;
    info!(
        needs_more_info = result.needs_more_info,
        item_count = result.items.len(),
        "Clarification analysis finished"
    );
    Ok(result)
}

/// Bring a parsed result in line with the question rules
///
/// Items without a need are dropped, a need without items is rejected, the
/// list is capped, and missing core topics are added when configured.
pub fn normalize(mut result: ClarificationResult, config: &ClarifyConfig) -> Result<ClarificationResult, ExtractionError> {
    debug!(
        needs_more_info = result.needs_more_info,
        item_count = result.items.len(),
        "normalize: called"
    );

    if !result.needs_more_info {
        if !result.items.is_empty() {
            warn!(
                dropped = result.items.len(),
                "Model said no more information is needed but listed questions; dropping them"
            );
            result.items.clear();
        }
        return Ok(result);
    }

    if result.items.is_empty() {
        return Err(ExtractionError::SchemaViolation {
            path: "items".to_string(),
            details: "more information is needed but no questions were given".to_string(),
        });
    }

    if result.items.len() > config.max_questions {
        warn!(
            received = result.items.len(),
            max = config.max_questions,
            "Too many clarification questions; truncating"
        );
        result.items.truncate(config.max_questions);
    }

    if config.require_core_topics {
        add_core_topics(&mut result.items, config.max_questions);
    }

    result.validate()?;
    Ok(result)
}

fn add_core_topics(items: &mut Vec<ClarificationItem>, max_questions: usize) {
    for topic in CORE_TOPICS {
        if items.iter().any(|item| topic.covered_by(item)) {
            continue;
        }
        let item = (topic.item)();
        debug!(keyword = %item.keyword, "add_core_topics: adding missing topic");

        if items.len() < max_questions {
            items.push(item);
            continue;
        }

        // At the cap: give up the last question that is not itself a core topic
        let replaceable = items
            .iter()
            .rposition(|existing| !CORE_TOPICS.iter().any(|t| t.covered_by(existing)));
        match replaceable {
            Some(idx) => items[idx] = item,
            None => warn!(keyword = %item.keyword, "No room for core clarification topic"),
        }
    }
}

//! Content-policy screening

use serde::Serialize;
use tracing::{debug, info};

use crate::error::PlanError;
use crate::llm::ModerationClient;

/// Outcome of screening a goal and plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum PolicyVerdict {
    Compliant,
    Violation { categories: Vec<String> },
}

impl PolicyVerdict {
    pub fn is_compliant(&self) -> bool {
        matches!(self, PolicyVerdict::Compliant)
    }
}

impl std::fmt::Display for PolicyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyVerdict::Compliant => write!(f, "compliant"),
            PolicyVerdict::Violation { categories } if categories.is_empty() => write!(f, "violation"),
            PolicyVerdict::Violation { categories } => write!(f, "violation ({})", categories.join(", ")),
        }
    }
}

/// Screen the raw user text with the moderation classifier
///
/// Goal and plan are joined with no separator so the classifier sees exactly
/// what the user typed.
pub async fn screen(moderator: &dyn ModerationClient, goal: &str, plan: &str) -> Result<PolicyVerdict, PlanError> {
    debug!(goal_len = goal.len(), plan_len = plan.len(), "screen: called");
    let input = format!("{goal}{plan}");
    let result = moderator.moderate(&input).await?;

    let verdict = if result.flagged {
        PolicyVerdict::Violation {
            categories: result.categories,
        }
    } else {
        PolicyVerdict::Compliant
    };
    info!(%verdict, "Policy screen finished");
    Ok(verdict)
}

/// `true` when the goal and plan pass the content policy
pub async fn check_policy(moderator: &dyn ModerationClient, goal: &str, plan: &str) -> Result<bool, PlanError> {
    Ok(screen(moderator, goal, plan).await?.is_compliant())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockModerator;

    #[tokio::test]
    async fn test_flagged_input_fails() {
        let moderator = MockModerator::flagging("weapon");
        assert!(!check_policy(&moderator, "Build a weapon", "").await.unwrap());
    }

    #[tokio::test]
    async fn test_benign_input_passes() {
        let moderator = MockModerator::flagging("weapon");
        assert!(check_policy(&moderator, "Learn guitar", "practice daily").await.unwrap());
    }

    #[tokio::test]
    async fn test_goal_and_plan_are_concatenated() {
        let moderator = MockModerator::flagging("weapon");
        // The marker only exists across the join
        let verdict = screen(&moderator, "Build a wea", "pon").await.unwrap();
        assert_eq!(
            verdict,
            PolicyVerdict::Violation {
                categories: vec!["violence".to_string()]
            }
        );
        assert_eq!(moderator.inputs(), vec!["Build a weapon".to_string()]);
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(PolicyVerdict::Compliant.to_string(), "compliant");
        let v = PolicyVerdict::Violation {
            categories: vec!["hate".to_string(), "violence".to_string()],
        };
        assert_eq!(v.to_string(), "violation (hate, violence)");
    }
}

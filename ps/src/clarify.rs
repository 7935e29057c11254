//! Clarifying questions asked before a plan is written

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::{Validate, Violation, child, require_text};

/// Upper bound on follow-up questions in one round
pub const MAX_QUESTIONS: usize = 8;

/// One piece of information the planner believes is missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClarificationItem {
    /// A keyword of information needed
    pub keyword: String,
    /// Instructions on what to provide
    pub guide: String,
    /// An example text that could give users a reference
    pub example: String,
}

impl ClarificationItem {
    pub fn new(keyword: impl Into<String>, guide: impl Into<String>, example: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            guide: guide.into(),
            example: example.into(),
        }
    }
}

/// Whether more information is needed, and what to ask for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClarificationResult {
    /// Indicates whether further information is needed
    pub needs_more_info: bool,
    /// List of additional information requirements, empty when no more information is needed
    pub items: Vec<ClarificationItem>,
}

impl ClarificationResult {
    /// A result that asks for nothing
    pub fn complete() -> Self {
        Self {
            needs_more_info: false,
            items: Vec::new(),
        }
    }
}

impl Validate for ClarificationResult {
    fn collect_violations(&self, path: &str, out: &mut Vec<Violation>) {
        let items_path = child(path, "items");
        match (self.needs_more_info, self.items.len()) {
            (false, 0) => {}
            (false, n) => out.push(Violation::new(
                items_path.clone(),
                format!("{n} item(s) present although no more information is needed"),
            )),
            (true, 0) => out.push(Violation::new(
                items_path.clone(),
                "more information is needed but no items were given",
            )),
            (true, n) if n > MAX_QUESTIONS => out.push(Violation::new(
                items_path.clone(),
                format!("{n} items exceeds the limit of {MAX_QUESTIONS}"),
            )),
            (true, _) => {}
        }

        for (i, item) in self.items.iter().enumerate() {
            let item_path = format!("{items_path}[{i}]");
            require_text(child(&item_path, "keyword"), &item.keyword, out);
            require_text(child(&item_path, "guide"), &item.guide, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(keyword: &str) -> ClarificationItem {
        ClarificationItem::new(keyword, "Tell us more", "e.g. something")
    }

    #[test]
    fn test_complete_is_valid() {
        assert!(ClarificationResult::complete().validate().is_ok());
    }

    #[test]
    fn test_items_without_need_is_a_violation() {
        let result = ClarificationResult {
            needs_more_info: false,
            items: vec![item("budget")],
        };
        assert_eq!(result.validate().unwrap_err().first().unwrap().path, "items");
    }

    #[test]
    fn test_need_without_items_is_a_violation() {
        let result = ClarificationResult {
            needs_more_info: true,
            items: vec![],
        };
        assert!(result.validate().is_err());
    }

    #[test]
    fn test_question_cap() {
        let at_cap = ClarificationResult {
            needs_more_info: true,
            items: (0..MAX_QUESTIONS).map(|i| item(&format!("k{i}"))).collect(),
        };
        assert!(at_cap.validate().is_ok());

        let over = ClarificationResult {
            needs_more_info: true,
            items: (0..=MAX_QUESTIONS).map(|i| item(&format!("k{i}"))).collect(),
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_blank_keyword() {
        let result = ClarificationResult {
            needs_more_info: true,
            items: vec![item("")],
        };
        assert_eq!(result.validate().unwrap_err().first().unwrap().path, "items[0].keyword");
    }

    #[test]
    fn test_deserialize_rejects_legacy_field_names() {
        let legacy = r#"{"flag": true, "info_needed": []}"#;
        assert!(serde_json::from_str::<ClarificationResult>(legacy).is_err());
    }
}

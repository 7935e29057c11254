//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to
//! embedded defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// Variables for the clarification system prompt
#[derive(Debug, Clone, Serialize)]
pub struct ClarifyContext {
    /// Upper bound on follow-up questions
    pub max_questions: usize,
    /// Tool the model must call
    pub tool_name: &'static str,
}

/// Variables for the extraction system prompt
#[derive(Debug, Clone, Serialize)]
pub struct ExtractContext {
    /// Anchor date for relative schedules
    pub today: Option<NaiveDate>,
    /// Tool the model must call
    pub tool_name: &'static str,
}

/// Loads and renders prompt templates
#[derive(Debug, Clone)]
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.planwise/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a prompt loader that checks `dir` before the embedded templates
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let dir_exists = dir.is_dir();
        debug!(?dir, %dir_exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            user_dir: if dir_exists { Some(dir.to_path_buf()) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, not HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found in user override");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<C: Serialize>(&self, template_name: &str, context: &C) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map(|s| s.trim().to_string())
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// System prompt for the clarification analyzer
    pub fn clarify_prompt(&self, context: &ClarifyContext) -> Result<String> {
        self.render("clarify", context)
    }

    /// System prompt for the plan synthesizer
    pub fn synthesize_prompt(&self) -> Result<String> {
        self.render("synthesize", &serde_json::json!({}))
    }

    /// System prompt for the task extractor
    pub fn extract_prompt(&self, context: &ExtractContext) -> Result<String> {
        self.render("extract", context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_clarify_prompt_renders_cap() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader
            .clarify_prompt(&ClarifyContext {
                max_questions: 5,
                tool_name: "further_info_analyzer",
            })
            .unwrap();

        assert!(prompt.contains("between 1 and 5"));
        assert!(prompt.contains("`further_info_analyzer`"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_extract_prompt_today_is_optional() {
        let loader = PromptLoader::embedded_only();
        let with_date = loader
            .extract_prompt(&ExtractContext {
                today: NaiveDate::from_ymd_opt(2024, 1, 1),
                tool_name: "submit_tasks",
            })
            .unwrap();
        assert!(with_date.contains("Today is 2024-01-01"));

        let without = loader
            .extract_prompt(&ExtractContext {
                today: None,
                tool_name: "submit_tasks",
            })
            .unwrap();
        assert!(!without.contains("Today is"));
    }

    #[test]
    fn test_synthesize_prompt() {
        let prompt = PromptLoader::embedded_only().synthesize_prompt().unwrap();
        assert!(prompt.contains("markdown"));
    }

    #[test]
    fn test_user_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("synthesize.pmt"), "Write a haiku plan.").unwrap();

        let loader = PromptLoader::new(dir.path());
        assert_eq!(loader.synthesize_prompt().unwrap(), "Write a haiku plan.");
        // Templates without an override still come from the binary
        assert!(loader.load_template("extract").unwrap().contains("Step 1"));
    }

    #[test]
    fn test_missing_override_dir_is_ignored() {
        let loader = PromptLoader::new("/nonexistent/prompts");
        assert!(loader.load_template("clarify").is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }

    #[test]
    fn test_broken_override_fails_to_render() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("clarify.pmt"), "{{#if}}").unwrap();
        let loader = PromptLoader::new(dir.path());
        let result = loader.clarify_prompt(&ClarifyContext {
            max_questions: 8,
            tool_name: "further_info_analyzer",
        });
        assert!(result.is_err());
    }
}

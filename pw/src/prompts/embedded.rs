//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Clarification analyzer system prompt
pub const CLARIFY: &str = include_str!("../../prompts/clarify.pmt");

/// Plan synthesizer system prompt
pub const SYNTHESIZE: &str = include_str!("../../prompts/synthesize.pmt");

/// Task extractor system prompt
pub const EXTRACT: &str = include_str!("../../prompts/extract.pmt");

/// Names of every embedded template
pub const NAMES: &[&str] = &["clarify", "synthesize", "extract"];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "clarify" => Some(CLARIFY),
        "synthesize" => Some(SYNTHESIZE),
        "extract" => Some(EXTRACT),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_clarify() {
        let clarify = get_embedded("clarify").unwrap();
        assert!(clarify.contains("planning consultant"));
        assert!(clarify.contains("Initial Review"));
        assert!(clarify.contains("Specificity Analysis"));
        assert!(clarify.contains("personality"));
        assert!(clarify.contains("{{max_questions}}"));
    }

    #[test]
    fn test_get_embedded_extract() {
        let extract = get_embedded("extract").unwrap();
        assert!(extract.contains("Step 1"));
        assert!(extract.contains("Step 2"));
        assert!(extract.contains("not overlap"));
    }

    #[test]
    fn test_every_name_resolves() {
        for name in NAMES {
            assert!(get_embedded(name).is_some(), "missing {name}");
        }
        assert!(get_embedded("unknown-template").is_none());
    }
}

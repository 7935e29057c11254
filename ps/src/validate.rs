//! Post-parse validation
//!
//! Deserialization only proves a payload has the right shape. The checks here
//! cover the invariants the JSON schema cannot express: ordered date ranges,
//! ordinal bounds, non-blank text, and question counts.

use thiserror::Error;

/// A single failed invariant, addressed by a JSONPath-like location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location of the offending value, e.g. `tasks[2].duration.end_date`
    pub path: String,
    /// What is wrong with it
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violation found in one value
#[derive(Debug, Clone, Error)]
#[error("{}", summary(.violations))]
pub struct ValidationErrors {
    pub violations: Vec<Violation>,
}

impl ValidationErrors {
    /// The first violation; there is always at least one
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

fn summary(violations: &[Violation]) -> String {
    match violations {
        [] => "no violations".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Types whose invariants can be checked after deserialization
pub trait Validate {
    /// Append every violation under `path` to `out`
    fn collect_violations(&self, path: &str, out: &mut Vec<Violation>);

    /// Check the value, returning all violations on failure
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut violations = Vec::new();
        self.collect_violations("$", &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { violations })
        }
    }
}

/// Push a violation when `value` is empty or whitespace only
pub(crate) fn require_text(path: String, value: &str, out: &mut Vec<Violation>) {
    if value.trim().is_empty() {
        out.push(Violation::new(path, "must not be empty"));
    }
}

/// Join a parent path and a child key
pub(crate) fn child(path: &str, key: &str) -> String {
    if path == "$" { key.to_string() } else { format!("{path}.{key}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(String);

    impl Validate for Named {
        fn collect_violations(&self, path: &str, out: &mut Vec<Violation>) {
            require_text(child(path, "name"), &self.0, out);
        }
    }

    #[test]
    fn test_validate_collects() {
        assert!(Named("ok".to_string()).validate().is_ok());

        let err = Named("  ".to_string()).validate().unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.first().unwrap().path, "name");
        assert_eq!(err.to_string(), "name: must not be empty");
    }

    #[test]
    fn test_child_paths() {
        assert_eq!(child("$", "tasks"), "tasks");
        assert_eq!(child("tasks[0]", "name"), "tasks[0].name");
    }
}

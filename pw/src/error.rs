//! Planning operation errors

use thiserror::Error;

use crate::extract::ExtractionError;
use crate::llm::LlmError;

/// Everything a planning operation can fail with
///
/// A flagged goal is not an error; see `PolicyVerdict`.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The remote call itself failed
    #[error(transparent)]
    Transport(#[from] LlmError),

    /// The model answered, but not with a usable structured reply
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A prompt template could not be loaded or rendered
    #[error("prompt error: {0}")]
    Prompt(String),
}

impl PlanError {
    /// Whether the same call could reasonably succeed if repeated
    pub fn is_retryable(&self) -> bool {
        match self {
            PlanError::Transport(e) => e.is_retryable(),
            PlanError::Extraction(_) | PlanError::Prompt(_) => false,
        }
    }
}

impl From<eyre::Report> for PlanError {
    fn from(report: eyre::Report) -> Self {
        PlanError::Prompt(format!("{:#}", report))
    }
}

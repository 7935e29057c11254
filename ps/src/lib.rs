//! PlanSchema - structured output contract for LLM-generated plans
//!
//! Defines the typed records a model must produce when it clarifies a goal
//! or turns a finished plan into scheduled tasks, and everything needed to
//! trust them afterwards.
//!
//! # Layers
//!
//! - **Shape**: serde types with `deny_unknown_fields`; a payload either
//!   deserializes into the exact record or is rejected.
//! - **Schema**: JSON schemas generated from the same types, attached to the
//!   forced structured call.
//! - **Invariants**: [`Validate`] checks what a schema cannot express
//!   (ordered ranges, ordinal bounds, question counts).
//! - **Expansion**: [`TaskDuration::occurrences`] turns a recurrence rule into
//!   concrete dates.
//!
//! # Example
//!
//! ```ignore
//! use planschema::{TaskCollection, Validate};
//!
//! let tasks: TaskCollection = serde_json::from_str(&payload)?;
//! tasks.validate()?;
//! for task in &tasks.tasks {
//!     println!("{}: {:?}", task.name, task.duration.occurrences());
//! }
//! ```

pub mod clarify;
pub mod cli;
pub mod schedule;
pub mod schema;
pub mod task;
pub mod validate;

pub use clarify::{ClarificationItem, ClarificationResult, MAX_QUESTIONS};
pub use schedule::ScheduleRule;
pub use schema::{OutputContract, output_schema};
pub use task::{Quantization, Task, TaskCollection, TaskDuration, TimeOfDay};
pub use validate::{Validate, ValidationErrors, Violation};

/// Parse a task file that holds either a full collection or a bare task list
pub fn parse_tasks(content: &str) -> Result<TaskCollection, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        let tasks: Vec<Task> = serde_json::from_value(value)?;
        let task_names = tasks.iter().map(|t| t.name.clone()).collect();
        return Ok(TaskCollection { task_names, tasks });
    }
    serde_json::from_value(value)
}

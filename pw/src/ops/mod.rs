//! The four planning operations
//!
//! Each operation is one prompt-and-invoke step against a remote model. They
//! share no state and never call each other; sequencing belongs to the
//! caller (see `Planner` and the interactive CLI).

pub mod clarify;
pub mod policy;
pub mod synthesize;
pub mod tasks;

pub use clarify::analyze;
pub use policy::{PolicyVerdict, check_policy, screen};
pub use synthesize::{Answer, synthesize};
pub use tasks::{ExtractionInput, extract, extract_collection};

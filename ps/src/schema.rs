//! JSON schemas for structured model output
//!
//! Each output type carries the name and description of the forced call the
//! model must answer with, and its input schema is generated from the Rust
//! type so the two can never drift apart.

use log::debug;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde::de::DeserializeOwned;

use crate::clarify::ClarificationResult;
use crate::task::TaskCollection;
use crate::validate::Validate;

/// A type the model is forced to produce through a named structured call
pub trait OutputContract: JsonSchema + DeserializeOwned + Validate {
    /// Name of the forced call
    const TOOL_NAME: &'static str;

    /// What the call is for, shown to the model
    const TOOL_DESCRIPTION: &'static str;

    /// Input schema for the forced call
    fn output_schema() -> serde_json::Value {
        output_schema::<Self>()
    }
}

impl OutputContract for ClarificationResult {
    const TOOL_NAME: &'static str = "further_info_analyzer";
    const TOOL_DESCRIPTION: &'static str = "Analyze the user's input comprehensively to determine what crucial \
                                            information is needed for creating a detailed, personalized plan.";
}

impl OutputContract for TaskCollection {
    const TOOL_NAME: &'static str = "submit_tasks";
    const TOOL_DESCRIPTION: &'static str = "Submit the complete, ordered list of scheduled tasks that together \
                                            cover the final plan.";

    fn output_schema() -> serde_json::Value {
        let mut schema = output_schema::<Self>();
        // Nullable but never absent
        require_property(&mut schema, "/properties/tasks/items", "quantization");
        schema
    }
}

/// Generate a self-contained schema for `T`
///
/// Subschemas are inlined and the meta-schema/title keys dropped, since
/// function-calling endpoints reject `$ref` into missing definitions and
/// have no use for the rest.
pub fn output_schema<T: JsonSchema>() -> serde_json::Value {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let root = settings.into_generator().into_root_schema_for::<T>();

    let mut value = match serde_json::to_value(&root) {
        Ok(value) => value,
        Err(e) => {
            debug!("output_schema: schema serialization failed: {}", e);
            serde_json::json!({ "type": "object" })
        }
    };

    if let Some(obj) = value.as_object_mut() {
        obj.remove("title");
        obj.remove("definitions");
    }

    value
}

/// Add `key` to the `required` list of the object schema at `pointer`
fn require_property(schema: &mut serde_json::Value, pointer: &str, key: &str) {
    let Some(object) = schema.pointer_mut(pointer).and_then(|v| v.as_object_mut()) else {
        debug!("require_property: no object schema at {}", pointer);
        return;
    };
    let required = object
        .entry("required")
        .or_insert_with(|| serde_json::Value::Array(Vec::new()));
    if let Some(list) = required.as_array_mut()
        && !list.iter().any(|v| v == key)
    {
        list.push(key.into());
    }
}

/// Look up a schema by the short name used on the command line
pub fn schema_by_name(name: &str) -> Option<serde_json::Value> {
    debug!("schema_by_name: {}", name);
    match name {
        "clarification" | "clarify" => Some(ClarificationResult::output_schema()),
        "tasks" | "task-collection" => Some(TaskCollection::output_schema()),
        _ => None,
    }
}

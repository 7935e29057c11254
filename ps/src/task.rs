//! Scheduled tasks extracted from a finished plan

use chrono::{NaiveDate, NaiveTime};
use log::debug;
use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::{InstanceType, Metadata, Schema, SchemaObject, StringValidation};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schedule::ScheduleRule;
use crate::validate::{Validate, Violation, child, require_text};

/// Wire format for a time of day
pub const TIME_FORMAT: &str = "%H:%M";

/// A wall-clock time in `HH:MM` (24-hour) form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

}

impl std::str::FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
            .map(Self)
            .map_err(|e| format!("invalid time of day '{}', expected HH:MM: {}", s, e))
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(TIME_FORMAT))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for TimeOfDay {
    fn schema_name() -> String {
        "TimeOfDay".to_string()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            metadata: Some(Box::new(Metadata {
                description: Some("Time of the day in HH:MM (24-hour) format".to_string()),
                ..Default::default()
            })),
            string: Some(Box::new(StringValidation {
                pattern: Some(r"^([01][0-9]|2[0-3]):[0-5][0-9]$".to_string()),
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}

/// Numeric progress target for a quantifiable task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Quantization {
    /// The start progress of the task
    pub progress_start: i64,
    /// The goal of the task
    pub goal: i64,
}

/// When a task happens: once, or repeatedly across a date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum TaskDuration {
    /// The task happens on one date
    SingleOccurrence {
        /// The date of the task in YYYY-MM-DD format
        date: NaiveDate,
    },

    /// The task repeats between two dates (inclusive)
    DateRange {
        /// The start date of the task in YYYY-MM-DD format
        start_date: NaiveDate,
        /// The end date of the task in YYYY-MM-DD format, not before the start date
        end_date: NaiveDate,
        /// Which dates inside the range the task applies to
        repeat: ScheduleRule,
    },
}

impl TaskDuration {
    /// Concrete dates this task applies to, ascending
    pub fn occurrences(&self) -> Vec<NaiveDate> {
        match self {
            Self::SingleOccurrence { date } => vec![*date],
            Self::DateRange {
                start_date,
                end_date,
                repeat,
            } => repeat.occurrences(*start_date, *end_date),
        }
    }
}

impl std::fmt::Display for TaskDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleOccurrence { date } => write!(f, "once on {date}"),
            Self::DateRange {
                start_date,
                end_date,
                repeat,
            } => write!(f, "{repeat}, {start_date} to {end_date}"),
        }
    }
}

impl Validate for TaskDuration {
    fn collect_violations(&self, path: &str, out: &mut Vec<Violation>) {
        if let Self::DateRange {
            start_date,
            end_date,
            repeat,
        } = self
        {
            if start_date > end_date {
                out.push(Violation::new(
                    child(path, "end_date"),
                    format!("end date {end_date} is before start date {start_date}"),
                ));
            }
            repeat.check(&child(path, "repeat"), *start_date, *end_date, out);
        }
    }
}

/// One scheduled, independently actionable task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Task {
    /// The name of the task
    pub name: String,
    /// The description of the task
    pub description: String,
    /// The duration type of the task
    pub duration: TaskDuration,
    /// The time of the day the task should be performed
    pub time_of_day: TimeOfDay,
    /// The quantization of the task, or null when progress is not measurable
    ///
    /// The key itself is required; only its value may be null.
    #[serde(deserialize_with = "Option::deserialize")]
    pub quantization: Option<Quantization>,
    /// Notes for the task
    #[serde(default)]
    pub notes: String,
}

impl Validate for Task {
    fn collect_violations(&self, path: &str, out: &mut Vec<Violation>) {
        require_text(child(path, "name"), &self.name, out);
        require_text(child(path, "description"), &self.description, out);
        self.duration.collect_violations(&child(path, "duration"), out);
    }
}

/// Every task a plan decomposes into, in plan order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TaskCollection {
    /// The names of the tasks, decided before writing their details
    pub task_names: Vec<String>,
    /// The list of tasks
    pub tasks: Vec<Task>,
}

impl TaskCollection {
    /// Describe how `task_names` disagrees with `tasks`, if it does
    ///
    /// The names are a planning aid for the model; a mismatch is worth
    /// reporting but not rejecting.
    pub fn name_mismatch(&self) -> Option<String> {
        if self.task_names.len() != self.tasks.len() {
            debug!(
                "TaskCollection::name_mismatch: {} names, {} tasks",
                self.task_names.len(),
                self.tasks.len()
            );
            return Some(format!(
                "{} task names but {} tasks",
                self.task_names.len(),
                self.tasks.len()
            ));
        }

        let differing: Vec<&str> = self
            .task_names
            .iter()
            .zip(&self.tasks)
            .filter(|(name, task)| name.trim() != task.name.trim())
            .map(|(name, _)| name.as_str())
            .collect();

        if differing.is_empty() {
            None
        } else {
            Some(format!("task names without matching task: {}", differing.join(", ")))
        }
    }
}

impl Validate for TaskCollection {
    fn collect_violations(&self, path: &str, out: &mut Vec<Violation>) {
        let tasks_path = child(path, "tasks");
        if self.tasks.is_empty() {
            out.push(Violation::new(tasks_path.clone(), "at least one task is required"));
        }
        for (i, task) in self.tasks.iter().enumerate() {
            task.collect_violations(&format!("{tasks_path}[{i}]"), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_duration_display() {
        let once = TaskDuration::SingleOccurrence { date: ymd(2024, 6, 1) };
        assert_eq!(once.to_string(), "once on 2024-06-01");

        let range = TaskDuration::DateRange {
            start_date: ymd(2024, 1, 1),
            end_date: ymd(2024, 1, 31),
            repeat: ScheduleRule::Everyday {},
        };
        assert_eq!(range.to_string(), "every day, 2024-01-01 to 2024-01-31");
    }

    fn sample_task() -> Task {
        Task {
            name: "Practice chords".to_string(),
            description: "Drill open chords".to_string(),
            duration: TaskDuration::DateRange {
                start_date: ymd(2024, 1, 1),
                end_date: ymd(2024, 3, 31),
                repeat: ScheduleRule::OnWeekday { days: vec![1, 3, 5] },
            },
            time_of_day: TimeOfDay::new(19, 30).unwrap(),
            quantization: Some(Quantization {
                progress_start: 0,
                goal: 8,
            }),
            notes: String::new(),
        }
    }

    #[test]
    fn test_time_of_day_parse() {
        let t: TimeOfDay = "07:05".parse().unwrap();
        assert_eq!(t.to_string(), "07:05");
        assert!("25:00".parse::<TimeOfDay>().is_err());
        assert!("evening".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_task_deserialize() {
        let json = r#"{
            "name": "Run",
            "description": "Easy 5k",
            "duration": {
                "type": "date_range",
                "start_date": "2024-01-01",
                "end_date": "2024-01-31",
                "repeat": {"kind": "periodic", "period_days": 7}
            },
            "time_of_day": "06:30",
            "quantization": null
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.notes, "");
        assert!(task.quantization.is_none());
        assert_eq!(task.duration.occurrences().len(), 5);
    }

    #[test]
    fn test_task_rejects_unknown_fields_and_bad_time() {
        let extra = r#"{"name":"a","description":"b","duration":{"type":"single_occurrence","date":"2024-01-01"},"time_of_day":"09:00","quantization":null,"notes":"","priority":1}"#;
        assert!(serde_json::from_str::<Task>(extra).is_err());

        let bad_time = r#"{"name":"a","description":"b","duration":{"type":"single_occurrence","date":"2024-01-01"},"time_of_day":"9am","quantization":null,"notes":""}"#;
        assert!(serde_json::from_str::<Task>(bad_time).is_err());
    }

    #[test]
    fn test_quantization_key_is_required() {
        let missing = r#"{"name":"a","description":"b","duration":{"type":"single_occurrence","date":"2024-01-01"},"time_of_day":"09:00","notes":""}"#;
        let err = serde_json::from_str::<Task>(missing).unwrap_err();
        assert!(err.to_string().contains("missing field `quantization`"));

        let null = missing.replace(r#""notes":"#, r#""quantization":null,"notes":"#);
        assert!(serde_json::from_str::<Task>(&null).unwrap().quantization.is_none());
    }

    #[test]
    fn test_duration_rejects_stray_keys() {
        let once = r#"{"type":"single_occurrence","date":"2024-01-01","end_date":"2024-01-31"}"#;
        assert!(serde_json::from_str::<TaskDuration>(once).is_err());

        let mixed = r#"{"type":"date_range","start_date":"2024-01-01","end_date":"2024-01-31",
                        "repeat":{"kind":"periodic","period_days":7,"days":[1,3]}}"#;
        assert!(serde_json::from_str::<TaskDuration>(mixed).is_err());
    }

    #[test]
    fn test_reversed_range_is_a_violation() {
        let mut task = sample_task();
        task.duration = TaskDuration::DateRange {
            start_date: ymd(2024, 2, 1),
            end_date: ymd(2024, 1, 1),
            repeat: ScheduleRule::Everyday {},
        };
        let collection = TaskCollection {
            task_names: vec![task.name.clone()],
            tasks: vec![task],
        };

        let err = collection.validate().unwrap_err();
        assert_eq!(err.first().unwrap().path, "tasks[0].duration.end_date");
    }

    #[test]
    fn test_blank_fields_are_violations() {
        let mut task = sample_task();
        task.name = " ".to_string();
        task.description = String::new();
        let err = task.validate().unwrap_err();
        assert_eq!(err.violations.len(), 2);
    }

    #[test]
    fn test_empty_collection_is_a_violation() {
        let collection = TaskCollection {
            task_names: vec![],
            tasks: vec![],
        };
        assert_eq!(collection.validate().unwrap_err().first().unwrap().path, "tasks");
    }

    #[test]
    fn test_name_mismatch() {
        let task = sample_task();
        let aligned = TaskCollection {
            task_names: vec!["Practice chords".to_string()],
            tasks: vec![task.clone()],
        };
        assert!(aligned.name_mismatch().is_none());

        let short = TaskCollection {
            task_names: vec![],
            tasks: vec![task.clone()],
        };
        assert!(short.name_mismatch().unwrap().contains("0 task names"));

        let renamed = TaskCollection {
            task_names: vec!["Scales".to_string()],
            tasks: vec![task],
        };
        assert!(renamed.name_mismatch().unwrap().contains("Scales"));
    }

    #[test]
    fn test_single_occurrence() {
        let d = TaskDuration::SingleOccurrence { date: ymd(2024, 5, 1) };
        assert_eq!(d.occurrences(), vec![ymd(2024, 5, 1)]);
        assert!(d.validate().is_ok());
    }
}

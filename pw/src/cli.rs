//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// PlanWise - goal to scheduled plan
#[derive(Parser)]
#[command(
    name = "pw",
    about = "Turn a loose goal into a clarified, scheduled action plan",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Screen a goal (and optional plan) against the content policy
    Check {
        /// The user's goal
        goal: String,

        /// The user's own plan, if any
        #[arg(short, long, default_value = "")]
        plan: String,
    },

    /// Ask which details are missing before a plan can be written
    Clarify {
        /// The user's goal
        goal: String,

        /// The user's own plan, if any
        #[arg(short, long)]
        plan: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Write the final markdown plan
    Synthesize {
        /// The user's goal
        goal: String,

        /// JSON file with a list of {keyword, details} answers
        #[arg(short, long)]
        answers: PathBuf,
    },

    /// Convert a final plan into scheduled tasks
    Tasks {
        /// The user's goal
        #[arg(short, long)]
        goal: String,

        /// The user's own plan, if any
        #[arg(short, long, default_value = "")]
        plan: String,

        /// JSON file with the clarification answers
        #[arg(short, long)]
        answers: Option<PathBuf>,

        /// Markdown file with the final plan
        #[arg(short = 'F', long)]
        final_plan: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Walk through the whole flow interactively
    Plan,
}

/// Path of the log file written by `pw`
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planwise")
        .join("logs")
        .join("planwise.log")
}

/// Generate the after_help text with API key status and the log location
pub fn generate_after_help(key_vars: &[&str]) -> String {
    debug!(?key_vars, "generate_after_help: called");
    let mut help = String::new();

    help.push_str("API Keys:\n");
    for var in key_vars {
        let set = std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false);
        let icon = if set { "\u{2705}" } else { "\u{274C}" };
        let status = if set { "set" } else { "not set" };
        help.push_str(&format!("  {} {:<18} {}\n", icon, var, status));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for operation results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clarify() {
        let cli = Cli::try_parse_from(["pw", "clarify", "Learn guitar", "--format", "json"]).unwrap();
        match cli.command {
            Some(Command::Clarify { goal, plan, format }) => {
                assert_eq!(goal, "Learn guitar");
                assert!(plan.is_none());
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_tasks_with_globals() {
        let cli = Cli::try_parse_from([
            "pw",
            "tasks",
            "-g",
            "Run a marathon",
            "-F",
            "plan.md",
            "-l",
            "debug",
            "-c",
            "custom.yml",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("custom.yml")));
        match cli.command {
            Some(Command::Tasks {
                goal, plan, final_plan, ..
            }) => {
                assert_eq!(goal, "Run a marathon");
                assert_eq!(plan, "");
                assert_eq!(final_plan, PathBuf::from("plan.md"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_synthesize_requires_answers() {
        assert!(Cli::try_parse_from(["pw", "synthesize", "Learn guitar"]).is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_after_help_lists_keys() {
        let help = generate_after_help(&["PLANWISE_SURELY_UNSET_KEY"]);
        assert!(help.contains("PLANWISE_SURELY_UNSET_KEY"));
        assert!(help.contains("not set"));
        assert!(help.contains("planwise.log"));
    }
}

//! CLI argument parsing for planschema

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "planschema")]
#[command(author, version = env!("GIT_DESCRIBE"), about = "Inspect and validate structured plan output", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the JSON schema for an output type
    Schema {
        /// Output type (clarification, tasks)
        #[arg(required = true)]
        name: String,
    },

    /// Validate a task file (collection or bare task list)
    Check {
        /// Path to the JSON file
        #[arg(required = true)]
        file: PathBuf,
    },

    /// List the concrete dates of every task in a file
    Occurrences {
        /// Path to the JSON file
        #[arg(required = true)]
        file: PathBuf,

        /// Only show the first N dates per task
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema() {
        let cli = Cli::parse_from(["planschema", "schema", "tasks"]);
        assert!(matches!(cli.command, Command::Schema { ref name } if name == "tasks"));
    }

    #[test]
    fn test_parse_occurrences_limit() {
        let cli = Cli::parse_from(["planschema", "occurrences", "tasks.json", "-l", "3"]);
        if let Command::Occurrences { file, limit } = cli.command {
            assert_eq!(file, PathBuf::from("tasks.json"));
            assert_eq!(limit, Some(3));
        } else {
            panic!("Expected Occurrences command");
        }
    }
}

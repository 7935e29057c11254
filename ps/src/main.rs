use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail, eyre};
use log::info;

use planschema::cli::{Cli, Command};
use planschema::{Validate, parse_tasks, schema};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("planschema starting");

    match cli.command {
        Command::Schema { name } => {
            let schema = schema::schema_by_name(&name)
                .ok_or_else(|| eyre!("Unknown schema '{}'. Use: clarification, tasks", name))?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Command::Check { file } => {
            let content = std::fs::read_to_string(&file).context(format!("Failed to read {}", file.display()))?;
            let collection = parse_tasks(&content).context("File does not match the task schema")?;

            if let Some(warning) = collection.name_mismatch() {
                println!("{} {}", "!".yellow(), warning);
            }

            match collection.validate() {
                Ok(()) => {
                    println!("{} {} task(s) valid", "✓".green(), collection.tasks.len());
                }
                Err(errors) => {
                    for violation in &errors.violations {
                        println!("{} {}", "✗".red(), violation);
                    }
                    bail!("{} violation(s) found", errors.violations.len());
                }
            }
        }
        Command::Occurrences { file, limit } => {
            let content = std::fs::read_to_string(&file).context(format!("Failed to read {}", file.display()))?;
            let collection = parse_tasks(&content).context("File does not match the task schema")?;

            for task in &collection.tasks {
                let dates = task.duration.occurrences();
                println!(
                    "{} {} ({} occurrence(s))",
                    task.time_of_day.to_string().dimmed(),
                    task.name.cyan(),
                    dates.len()
                );
                let shown = limit.unwrap_or(dates.len());
                for date in dates.iter().take(shown) {
                    println!("  {}", date);
                }
                if dates.len() > shown {
                    println!("  {}", format!("... {} more", dates.len() - shown).dimmed());
                }
            }
        }
    }

    Ok(())
}

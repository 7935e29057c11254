//! PlanWise - goal to scheduled plan
//!
//! CLI entry point for the planning operations and the interactive flow.

use std::fs;
use std::future::Future;
use std::path::Path;

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use planschema::{ClarificationResult, Task};
use planwise::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use planwise::config::Config;
use planwise::ops::{Answer, PolicyVerdict};
use planwise::planner::Planner;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let defaults = Config::default();
    let cmd = Cli::command().after_help(generate_after_help(&[defaults.llm.api_key_env.as_str()]));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "PlanWise loaded config");

    let Some(command) = cli.command else {
        let mut cmd = Cli::command().after_help(generate_after_help(&[config.llm.api_key_env.as_str()]));
        cmd.print_help()?;
        return Ok(());
    };

    config.validate()?;
    let planner = Planner::from_config(config).context("Failed to create planner")?;

    debug!(?command, "main: dispatching command");
    match command {
        Command::Check { goal, plan } => cmd_check(&planner, &goal, &plan).await,
        Command::Clarify { goal, plan, format } => cmd_clarify(&planner, &goal, plan.as_deref(), format).await,
        Command::Synthesize { goal, answers } => cmd_synthesize(&planner, &goal, &answers).await,
        Command::Tasks {
            goal,
            plan,
            answers,
            final_plan,
            format,
        } => cmd_tasks(&planner, &goal, &plan, answers.as_deref(), &final_plan, format).await,
        Command::Plan => cmd_plan(&planner).await,
    }
}

/// Run a planning call, giving up early on Ctrl-C
///
/// Dropping the call future aborts the in-flight request.
async fn interruptible<T, F>(fut: F) -> Result<T>
where
    F: Future<Output = Result<T, planwise::PlanError>>,
{
    tokio::select! {
        result = fut => Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted by Ctrl-C");
            bail!("Interrupted")
        }
    }
}

async fn cmd_check(planner: &Planner, goal: &str, plan: &str) -> Result<()> {
    debug!(%goal, "cmd_check: called");
    let verdict = interruptible(planner.screen(goal, plan))
        .await
        .context("Policy check failed")?;
    print_verdict(&verdict);
    Ok(())
}

async fn cmd_clarify(planner: &Planner, goal: &str, plan: Option<&str>, format: OutputFormat) -> Result<()> {
    debug!(%goal, ?format, "cmd_clarify: called");
    let result = interruptible(planner.analyze_clarification(goal, plan))
        .await
        .context("Clarification analysis failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_clarification(&result),
    }
    Ok(())
}

async fn cmd_synthesize(planner: &Planner, goal: &str, answers_path: &Path) -> Result<()> {
    debug!(%goal, ?answers_path, "cmd_synthesize: called");
    let content =
        fs::read_to_string(answers_path).context(format!("Failed to read {}", answers_path.display()))?;
    let answers: Vec<Answer> =
        serde_json::from_str(&content).context("Answers must be a JSON list of {keyword, details}")?;

    let plan = interruptible(planner.synthesize_plan(goal, &answers))
        .await
        .context("Plan synthesis failed")?;
    println!("{}", plan);
    Ok(())
}

async fn cmd_tasks(
    planner: &Planner,
    goal: &str,
    plan: &str,
    answers_path: Option<&Path>,
    final_plan_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    debug!(%goal, ?final_plan_path, ?format, "cmd_tasks: called");
    let answers = match answers_path {
        Some(path) => {
            let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content).context("Answers file is not valid JSON")?
        }
        None => serde_json::Value::Null,
    };
    let final_plan =
        fs::read_to_string(final_plan_path).context(format!("Failed to read {}", final_plan_path.display()))?;

    let tasks = interruptible(planner.extract_tasks(goal, plan, &answers, &final_plan))
        .await
        .context("Task extraction failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
        OutputFormat::Text => print_tasks(&tasks),
    }
    Ok(())
}

/// Read one line, treating Ctrl-C and Ctrl-D as a request to stop
fn read_line(rl: &mut DefaultEditor, prompt: &str, initial: &str) -> Result<Option<String>> {
    match rl.readline_with_initial(prompt, (initial, "")) {
        Ok(line) => {
            let _ = rl.add_history_entry(line.as_str());
            Ok(Some(line.trim().to_string()))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(eyre::eyre!("Failed to read input: {}", e)),
    }
}

async fn cmd_plan(planner: &Planner) -> Result<()> {
    debug!("cmd_plan: called");
    let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

    println!("{}", "PlanWise - describe a goal and get a scheduled plan".bold());
    println!("{}", "(Ctrl-C or Ctrl-D to quit)".dimmed());
    println!();

    let goal = loop {
        match read_line(&mut rl, &format!("{} ", "goal>".bright_green()), "")? {
            Some(goal) if !goal.is_empty() => break goal,
            Some(_) => continue,
            None => return Ok(()),
        }
    };
    let Some(plan) = read_line(&mut rl, &format!("{} ", "your plan (optional)>".bright_green()), "")? else {
        return Ok(());
    };

    let verdict = interruptible(planner.screen(&goal, &plan))
        .await
        .context("Policy check failed")?;
    if !verdict.is_compliant() {
        print_verdict(&verdict);
        return Ok(());
    }

    let clarification = interruptible(planner.analyze_clarification(&goal, Some(&plan)))
        .await
        .context("Clarification analysis failed")?;

    let mut answers = Vec::with_capacity(clarification.items.len());
    if clarification.needs_more_info {
        println!();
        println!("{}", "A few questions first (edit the suggested answer or press Enter):".bold());
        for item in &clarification.items {
            println!();
            println!("{} {}", item.keyword.cyan().bold(), item.guide.dimmed());
            let Some(details) = read_line(&mut rl, "> ", &item.example)? else {
                return Ok(());
            };
            answers.push(Answer::new(&item.keyword, details));
        }
    }

    println!();
    println!("{}", "Writing your plan...".dimmed());
    let final_plan = interruptible(planner.synthesize_plan(&goal, &answers))
        .await
        .context("Plan synthesis failed")?;
    println!();
    println!("{}", final_plan);

    println!();
    println!("{}", "Scheduling tasks...".dimmed());
    let carried = serde_json::to_value(&answers)?;
    let tasks = interruptible(planner.extract_tasks(&goal, &plan, &carried, &final_plan))
        .await
        .context("Task extraction failed")?;
    println!();
    print_tasks(&tasks);
    Ok(())
}

fn print_verdict(verdict: &PolicyVerdict) {
    match verdict {
        PolicyVerdict::Compliant => println!("{} {}", "✓".green(), verdict),
        PolicyVerdict::Violation { .. } => println!("{} {}", "✗".red(), verdict),
    }
}

fn print_clarification(result: &ClarificationResult) {
    if !result.needs_more_info {
        println!("{} No more information needed", "✓".green());
        return;
    }
    for (i, item) in result.items.iter().enumerate() {
        println!("{}. {}", i + 1, item.keyword.cyan().bold());
        println!("   {}", item.guide);
        println!("   {} {}", "e.g.".dimmed(), item.example.dimmed());
    }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("{}", "No tasks".dimmed());
        return;
    }
    for (i, task) in tasks.iter().enumerate() {
        let occurrences = task.duration.occurrences().len();
        println!(
            "{}. {} {} {}",
            i + 1,
            task.time_of_day.to_string().dimmed(),
            task.name.cyan().bold(),
            format!("({} occurrence(s))", occurrences).dimmed()
        );
        println!("   {}", task.description);
        println!("   {}", task.duration);
        if let Some(q) = &task.quantization {
            println!("   progress: {} -> {}", q.progress_start, q.goal);
        }
        if !task.notes.trim().is_empty() {
            println!("   {} {}", "note:".dimmed(), task.notes);
        }
    }
}

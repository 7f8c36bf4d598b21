use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use teller_engine::{AccountDirectory, ActionRegistry, WorkflowEngine, load_config, load_config_from_path, parse_workflow_file, settle};
use teller_types::{IssueSeverity, lint_definition};
use tracing::{info, warn};

/// Run and check Teller financial workflows.
#[derive(Parser, Debug)]
#[command(name = "teller", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a workflow against an accounts file and print the run report
    Run {
        /// Path to the workflow YAML/JSON
        workflow: PathBuf,

        /// Accounts file used to authenticate and settle balances
        #[arg(long)]
        accounts: PathBuf,

        /// Engine configuration file (defaults to TELLER_CONFIG_PATH or the user config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Commit the resulting balance back to the accounts file
        #[arg(long)]
        write_back: bool,
    },
    /// Report dangling references and unreachable steps in a workflow
    Check {
        /// Path to the workflow YAML/JSON
        workflow: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    init_tracing();
    match Cli::parse().command {
        Command::Run {
            workflow,
            accounts,
            config,
            write_back,
        } => run_workflow(workflow, accounts, config, write_back),
        Command::Check { workflow } => check_workflow(workflow),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_workflow(workflow: PathBuf, accounts_path: PathBuf, config: Option<PathBuf>, write_back: bool) -> Result<ExitCode> {
    let config = match config {
        Some(path) => load_config_from_path(&path)?,
        None => load_config()?,
    };
    let definition = parse_workflow_file(&workflow)?;
    let mut accounts = AccountDirectory::load(&accounts_path)?;

    let registry = ActionRegistry::with_builtins(Arc::new(accounts.clone()));
    let engine = WorkflowEngine::new(registry, config);
    let report = engine.execute(&definition);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if write_back {
        if settle(&report, &mut accounts).context("failed to settle run")? {
            accounts.save(&accounts_path)?;
            info!(path = %accounts_path.display(), "accounts file updated");
        } else {
            warn!(status = ?report.status, "run was not successful; accounts file left unchanged");
        }
    }

    Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn check_workflow(workflow: PathBuf) -> Result<ExitCode> {
    let definition = parse_workflow_file(&workflow)?;
    let issues = lint_definition(&definition);
    if issues.is_empty() {
        println!("{}: no issues found", workflow.display());
        return Ok(ExitCode::SUCCESS);
    }

    for issue in &issues {
        println!("{issue}");
    }
    let has_errors = issues.iter().any(|issue| issue.severity == IssueSeverity::Error);
    Ok(if has_errors { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

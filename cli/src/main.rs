//! CLI entrypoint for seminar
//!
//! This is the main binary that wires together all layers using
//! dependency injection: config and roster files in, SQLite store and
//! chat-completion adapters constructed here, and one simulation run per
//! invocation.

mod console;
mod menu;

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::ConsoleReporter;
use seminar_application::{NoObserver, RunSimulationInput, RunSimulationUseCase};
use seminar_infrastructure::{ChatClient, ConfigLoader, LlmJudge, RosterLoader, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Simulated classroom discussions with consensus-driven termination
#[derive(Parser, Debug)]
#[command(name = "seminar", version, about)]
struct Cli {
    /// Lesson plan to simulate: its id or 1-based index. Omit for an
    /// interactive menu.
    #[arg(long)]
    plan: Option<String>,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// List the available lesson plans and exit
    #[arg(long)]
    list_plans: bool,

    /// Suppress per-message console output
    #[arg(long, short)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("starting seminar");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };
    let params = config.simulation_params()?;

    // Roster files are authored outside this system; they only need to
    // exist and parse.
    let personas = RosterLoader::load_personas(
        &config.roster.personas,
        config.roster.persona_limit,
    )
    .context("loading personas")?;
    let plans =
        RosterLoader::load_lesson_plans(&config.roster.lesson_plans).context("loading lesson plans")?;

    if cli.list_plans {
        menu::print_plans(&plans);
        return Ok(());
    }

    let plan = menu::select_plan(&plans, cli.plan.as_deref())?;
    println!("Selected lesson plan: \"{}\"", plan.title);
    println!("Opening prompt: {}\n", plan.initial_prompt);

    // === Dependency Injection ===
    let store = Arc::new(
        SqliteStore::connect(&config.database.url, params.retry)
            .await
            .context("opening database")?,
    );
    store.migrate().await.context("preparing schema")?;

    let client_config = config.model.to_client_config()?;
    let generation = Arc::new(ChatClient::new(client_config.clone()));
    let judge = Arc::new(LlmJudge::new(Arc::new(ChatClient::new(client_config))));

    // Ctrl-C cancels the run; already-persisted rows stay durable.
    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\ninterrupt received, stopping after in-flight calls...");
                token.cancel();
            }
        });
    }

    let use_case = RunSimulationUseCase::new(generation, judge, store, params)
        .with_cancellation_token(token);

    let input = RunSimulationInput::new(plan.clone(), personas);
    let report = if cli.quiet {
        use_case
            .execute_with_observer(input, Arc::new(NoObserver))
            .await
    } else {
        use_case
            .execute_with_observer(input, Arc::new(ConsoleReporter::new()))
            .await
    };

    match report {
        Ok(report) => {
            console::print_report(&report);
            Ok(())
        }
        Err(e) => bail!("simulation failed: {}", e),
    }
}

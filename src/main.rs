use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::{LevelFilter, info};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;
mod config;

use cli::{Cli, Commands};
use config::Config;
use draftgate::DraftgateError;
use draftgate::agents::QualityGate;
use draftgate::domain::{LoopState, SessionRecord};
use draftgate::llm::{GroqClient, LlmClient};
use draftgate::runner::LoopRunner;
use draftgate::search::SearchClient;
use draftgate::web::{self, AppState};

fn setup_logging() -> Result<PathBuf> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("draftgate")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("draftgate.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // Open wide until the configured level is known; RUST_LOG still wins
    env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .parse_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(log_file)
}

/// Narrow logging to the configured level unless RUST_LOG is set
fn apply_log_level(cli: &Cli, config: &Config) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        return Ok(());
    }
    let level = if cli.is_verbose() {
        LevelFilter::Debug
    } else {
        config.log_filter()?
    };
    log::set_max_level(level);
    Ok(())
}

/// Build the LLM client; a missing credential stops startup
fn build_llm(config: &Config) -> Result<Arc<dyn LlmClient>> {
    match GroqClient::from_env(&config.llm.api_key_env, config.llm.to_groq_config()) {
        Ok(client) => Ok(Arc::new(client)),
        Err(DraftgateError::MissingCredential { env_var }) => {
            bail!("Missing {} in environment or .env file", env_var)
        }
        Err(e) => Err(e).context("Failed to set up LLM client"),
    }
}

fn build_runner(config: &Config) -> Result<LoopRunner> {
    let llm = build_llm(config)?;
    let search = config.search.build().context("Failed to set up search provider")?;
    info!(
        "Using model {} with {} search",
        llm.model(),
        search.name()
    );

    let gate = QualityGate::new(llm.clone()).with_acceptance_token(&config.review.acceptance_token);
    Ok(LoopRunner::from_clients(llm, search, config.review.runner_config()).with_gate(gate))
}

async fn handle_serve_command(bind: Option<SocketAddr>, config: &Config) -> Result<()> {
    let addr = bind.unwrap_or(config.server.bind);
    let runner = build_runner(config)?;

    println!("{} http://{}", "Serving on".green(), addr);
    web::serve(AppState::new(runner), addr)
        .await
        .context("Web server failed")?;
    Ok(())
}

async fn handle_run_command(task: &str, output: Option<&Path>, config: &Config) -> Result<()> {
    let runner = build_runner(config)?;

    println!("{} {}", "Task:".cyan(), task);
    let session = runner.run(task).await.context("Workflow failed")?;
    print_session(&session);

    if let Some(path) = output {
        fs::write(path, &session.draft)
            .context(format!("Failed to write report to {}", path.display()))?;
        println!("{} {}", "Exported report to".green(), path.display());
    }
    Ok(())
}

fn print_session(session: &SessionRecord) {
    for entry in &session.log {
        println!("  {}", entry.dimmed());
    }

    let state = match session.state {
        LoopState::Accepted => session.state.to_string().green(),
        _ => session.state.to_string().yellow(),
    };
    println!(
        "{} Report verified after {} iteration(s) ({})",
        "Done:".green().bold(),
        session.iteration_count,
        state
    );
    println!();
    println!("{}", session.draft);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Pick up GROQ_API_KEY and friends from a local .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(&cli, &config)?;

    info!("Starting with config from: {:?}", cli.config);

    match &cli.command {
        None => handle_serve_command(None, &config).await,
        Some(Commands::Serve { bind }) => handle_serve_command(*bind, &config).await,
        Some(Commands::Run { task, output }) => {
            handle_run_command(task, output.as_deref(), &config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_llm_missing_credential_is_error() {
        let mut config = Config::default();
        config.llm.api_key_env = "DRAFTGATE_TEST_UNSET_GROQ_KEY".to_string();

        let err = match build_llm(&config) {
            Ok(_) => panic!("expected a missing credential error"),
            Err(e) => e,
        };
        assert_eq!(
            err.to_string(),
            "Missing DRAFTGATE_TEST_UNSET_GROQ_KEY in environment or .env file"
        );
    }
}

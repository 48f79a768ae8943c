//! Roster - student records with PDF summaries and mail notifications

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roster::{
    accounts::{AccountStore, AccountsState},
    api,
    config::RosterConfig,
    fetcher::{Fetcher, FetcherState},
    notifier::Notifier,
    students::{StudentStore, StudentWorkflow, StudentsState},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "roster")]
#[command(author = "Roster Team")]
#[command(version)]
#[command(about = "Student records with PDF summaries and mail notifications")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ROSTER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("roster={},tower_http=debug", log_level).into());
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => RosterConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => RosterConfig::default(),
    };
    config.apply_env();

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_server(config: RosterConfig) -> Result<()> {
    tracing::info!("Starting Roster");

    let accounts = Arc::new(AccountStore::new(config.storage.accounts_dir()).await?);
    let students = Arc::new(StudentStore::new(config.storage.students_dir()).await?);
    let notifier = Arc::new(Notifier::from_config(config.mail.clone())?);
    let fetcher = Arc::new(Fetcher::new(&config.fetcher)?);

    let app = api::build_app(
        AccountsState {
            accounts: accounts.clone(),
            notifier: notifier.clone(),
        },
        StudentsState {
            accounts: accounts.clone(),
            workflow: Arc::new(StudentWorkflow::new(students, notifier.clone())),
        },
        FetcherState {
            accounts,
            fetcher,
            notifier,
        },
        &config.server,
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        "Roster is listening on http://{} (data in {}). Press Ctrl+C to stop.",
        addr,
        config.storage.base_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
    }
    tracing::info!("Shutting down...");
}

fn show_config(config: Option<&RosterConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}

//! linkcheck CLI
//!
//! Runs the link checking service and offers offline tools over its snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use linkcheck::{
    api::{self, AppState},
    error::Result,
    models::{Config, SetId, StatusCounts},
    report::{render_report, report_filename},
    services::{HttpProbe, LinkChecker},
    storage::{FileStore, LinkStore},
};
use tokio::net::TcpListener;

/// linkcheck - background URL reachability checker
#[derive(Parser, Debug)]
#[command(name = "linkcheck", version, about = "Background URL reachability checker")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "linkcheck.toml")]
    config: PathBuf,

    /// Override the snapshot file path
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API and run the checker until interrupted
    Serve {
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the number of workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Validate the configuration file
    Validate,

    /// Show snapshot info
    Info,

    /// Render a report from the snapshot
    Report {
        /// Link set ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<SetId>,

        /// Output file (default: report_<unix time>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    init_logging(cli.verbose, &config.logging.level);

    match &loaded {
        Ok(_) => log::info!("Loaded configuration from {}", cli.config.display()),
        Err(e) => log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        ),
    }

    if let Some(path) = cli.storage {
        config.storage.path = path;
    }

    match cli.command {
        Command::Serve { port, workers } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(workers) = workers {
                config.checker.workers = workers;
            }
            serve(config).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            let store = FileStore::new(&config.storage.path);
            store.restore().await?;

            let sets = store.get_all_sets().await;
            let counts: StatusCounts = sets.iter().collect();
            log::info!("Snapshot: {}", store.path().display());
            log::info!("Link sets: {}", sets.len());
            log::info!("Next id: {}", store.next_id().await);
            log::info!(
                "Links: {} ({} available, {} unavailable, {} pending)",
                counts.total(),
                counts.available,
                counts.unavailable,
                counts.pending
            );
        }

        Command::Report { ids, output } => {
            let store = FileStore::new(&config.storage.path);
            store.restore().await?;

            let sets = store.get_link_sets(&ids).await;
            if sets.len() < ids.len() {
                log::warn!("{} of {} link sets not found", ids.len() - sets.len(), ids.len());
            }
            let now = chrono::Utc::now();
            let report = render_report(&sets, now)?;

            let path = output.unwrap_or_else(|| PathBuf::from(report_filename(now)));
            std::fs::write(&path, &report)?;
            log::info!("Report written to {}", path.display());
        }
    }

    Ok(())
}

/// Restore, start the checker, serve until a shutdown signal, then stop and back up.
async fn serve(config: Config) -> Result<()> {
    config.validate()?;

    let store = Arc::new(FileStore::new(&config.storage.path));
    if let Err(e) = store.restore().await {
        log::error!("Restore failed: {}", e);
    }

    let probe = Arc::new(HttpProbe::from_config(&config.checker)?);
    let checker = Arc::new(LinkChecker::new(store.clone(), probe, &config.checker));
    checker.start();

    let listener = TcpListener::bind(config.server.bind_addr()).await?;
    let state = AppState::new(store.clone(), checker.clone());
    let served = api::serve(listener, state, shutdown_signal()).await;

    checker.stop().await;
    if let Err(e) = store.backup().await {
        log::error!("Backing up failed: {}", e);
    }

    served?;
    log::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutting down server...");
}

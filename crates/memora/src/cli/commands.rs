//! # CLI Layer
//!
//! Wires the process together: parse arguments, install logging, load the
//! configuration, open the API and dispatch to a handler on a
//! current-thread runtime.
//!
//! The library's futures are not `Send`, so everything runs on the one
//! thread that owns the runtime.

use anyhow::{Context, Result};
use clap::Parser;
use memoraapp::api::MemoraApi;
use memoraapp::config::MemoraConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::handlers::{self, AppState};
use super::setup::{Cli, Commands};

const LOG_ENV: &str = "MEMORA_LOG";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let state = create_app_state(&cli)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;
    runtime.block_on(dispatch(&state, cli.command))
}

/// Log to stderr. `MEMORA_LOG` takes a full filter directive; without it the
/// level is `warn`, or `debug` with `-v`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!(
                "invalid {} directive ({}); using {}",
                LOG_ENV, err, fallback
            );
            EnvFilter::new(fallback)
        }),
        Err(_) => EnvFilter::new(fallback),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn create_app_state(cli: &Cli) -> Result<AppState> {
    let mut config = MemoraConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    let data_dir = config.data_dir()?;
    let api = MemoraApi::open(&config)?;
    debug!(data_dir = %data_dir.display(), backend = api.backend_name(), "initialized");

    Ok(AppState {
        api,
        config,
        data_dir,
    })
}

async fn dispatch(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Vocab(cmd) => handlers::vocab(state, cmd).await,
        Commands::Writing(cmd) => handlers::writing(state, cmd).await,
        Commands::Classical(cmd) => handlers::classical(state, cmd).await,
        Commands::Export { out } => handlers::export(state, &out).await,
        Commands::Import { file, yes } => handlers::import(state, &file, yes).await,
        Commands::Config => handlers::config(state),
    }
}

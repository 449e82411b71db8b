//! # sv-worker CLI Interface
//!
//! Command parsing and wiring for the worker binary. All page-building logic
//! lives in [`sv_worker_core`]; this module loads config and secrets, builds
//! the concrete clients and hands them to a [`Coordinator`].
//!
//! ## Commands
//! - `run --config <file>`: sweep forever, sleeping between sweeps.
//! - `once --config <file>`: a single sweep, then exit. Handy for cron and
//!   for checking a new deployment.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sv_worker_core::config::WorkerConfig;
use sv_worker_core::metrics::TracingMetrics;
use sv_worker_core::render::MaudRenderer;
use sv_worker_core::sweep::{Coordinator, Services};

use crate::cache::RedisPageCache;
use crate::dropbox::DropboxConnector;
use crate::heroku::HerokuDomains;
use crate::load_config::{load_config, Secrets};
use crate::store::PgUserStore;

/// Periodically publish every user's storage folder as a single web page.
#[derive(Parser)]
#[clap(
    name = "sv-worker",
    version,
    about = "Publish each user's storage folder as a single web page"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep all users forever
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Sweep all users once and exit
    Once {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Async CLI entrypoint shared by `main` and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Run { config } => {
            let coordinator = build_coordinator(load_config(config)?).await?;
            tracing::info!(command = "run", "Starting worker");
            coordinator.run_forever().await;
            Ok(())
        }
        Commands::Once { config } => {
            let coordinator = build_coordinator(load_config(config)?).await?;
            tracing::info!(command = "once", "Starting single sweep");
            let report = coordinator.run_sweep().await;
            tracing::info!(
                command = "once",
                users = report.users.len(),
                failed_tasks = report.failed_tasks,
                "Sweep complete"
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise sweep report")?
            );
            Ok(())
        }
    }
}

async fn build_coordinator(config: WorkerConfig) -> Result<Coordinator> {
    config.trace_loaded();
    let secrets = Secrets::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("sv-worker/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let store = PgUserStore::connect(&secrets.database_connection)
        .await
        .context("Failed to connect to the user store")?;
    let cache = RedisPageCache::connect(&secrets.redis_address, secrets.redis_auth.as_deref())
        .await
        .context("Failed to connect to the page cache")?;

    let services = Services {
        storage: Arc::new(DropboxConnector::new(http.clone())),
        cache: Arc::new(cache),
        store: Arc::new(store),
        registrar: Arc::new(HerokuDomains::new(
            http,
            &secrets.heroku_app,
            &secrets.heroku_user,
            &secrets.heroku_token,
        )),
        renderer: Arc::new(MaudRenderer::new()),
        metrics: Arc::new(TracingMetrics::new("worker")),
    };

    Ok(Coordinator::new(config, services))
}

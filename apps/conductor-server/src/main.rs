//! Conductor server: hosts the automation module behind static authn/authz.

mod auth;
mod config;
mod http;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use automation::AutomationModule;
use automation::infra::storage::memory::MemoryStore;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::auth::AuthState;
use crate::config::{AppConfig, LogFormat, LoggingConfig};

#[derive(Debug, Parser)]
#[command(name = "conductor-server", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    init_logging(&cfg.logging)?;
    run(cfg).await
}

fn init_logging(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .with_context(|| format!("invalid log level '{}'", cfg.level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match cfg.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    // The in-memory store is the only backend shipped; state is lost on exit.
    let storage = MemoryStore::new();
    let store = storage.store();
    automation::seed::seed(&store, &cfg.seed)
        .await
        .context("failed to apply seed data")?;

    let oracle = Arc::new(static_authz_plugin::Service::from_config(&cfg.authz));
    let module = AutomationModule::builder(cfg.automation.clone(), store, oracle)
        .cancellation(cancel.child_token())
        .start()?;

    let authn = static_authn_plugin::Service::from_config(&cfg.authn);
    let router = http::build_router(
        &cfg.server,
        module.router(),
        AuthState::new(authn, &[http::HEALTH_PATH]),
    );

    let addr = http::parse_bind_address(&cfg.server.bind_addr)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("HTTP server bound on {}", addr);

    let signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal.cancel(),
            Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
        }
    });

    let served = http::serve(listener, router, cancel.clone()).await;
    cancel.cancel();
    module.shutdown().await;
    served
}

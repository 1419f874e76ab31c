//! # acl-init - Warden ACL bootstrap job
//!
//! Bootstraps the ACL system of a freshly formed server cluster, persists the
//! root token, and hands every server its own agent token.
//!
//! ## Flow
//! ```text
//! discover servers → read stored root token (Redis)
//!        ↓
//! PUT /v1/acl/bootstrap → persist root token (Redis)
//!        ↓
//! upsert agent policy → per server: reuse/create token → push to agent
//! ```
//!
//! Safe to re-run after any failure except a lost root token.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use warden_common::AclInitError;

mod config;
mod consul;
mod discovery;
mod provision;
mod retry;
mod rules;
mod state;
mod store;

use config::AppConfig;
use state::JobState;

/// Warden acl-init - ACL bootstrap and server token provisioning
#[derive(Parser, Debug)]
#[command(name = "acl-init")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/acl-init.toml")]
    config: String,

    /// Redis URL (overrides config)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Server host or IP; repeatable (overrides config)
    #[arg(short, long = "server", env = "SERVER_ADDRESSES", value_delimiter = ',')]
    servers: Vec<String>,

    /// Server HTTP API port (overrides config)
    #[arg(long, env = "HTTP_PORT")]
    http_port: Option<u16>,

    /// Store key of the bootstrap token (overrides config)
    #[arg(long, env = "BOOTSTRAP_TOKEN_KEY")]
    bootstrap_token_key: Option<String>,

    /// Only bootstrap and persist the root token
    #[arg(long, default_value = "false")]
    skip_server_tokens: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level, args.json_logs) {
        eprintln!("failed to initialise logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting Warden acl-init v{}", env!("CARGO_PKG_VERSION"));

    let result = tokio::select! {
        result = run(&args) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, aborting run");
            Err(anyhow::anyhow!("interrupted"))
        }
    };

    match result {
        Ok(()) => {
            info!("ACL bootstrap complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let message = format!("{:#}", e);
            error!(error = %message, "ACL bootstrap failed");
            let terminal = e.downcast_ref::<AclInitError>();
            if terminal.is_some_and(AclInitError::requires_manual_reset) {
                error!("Manual ACL reset required before this job can succeed");
            }
            let code = terminal.map_or(1, AclInitError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = AppConfig::load(&args.config, args)?;
    info!("Configuration loaded from {}", args.config);

    let servers = discovery::resolve_servers(&config.servers)
        .await
        .context("discovering server addresses")?;
    info!(servers = ?servers, "Server addresses resolved");

    let state = JobState::new(config).await?;
    info!(redis = %state.config.redis_url, "Redis connected");

    state
        .job
        .run_from_store(&servers)
        .await
        .context("bootstrapping servers")?;

    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}

//! Fleet Daemon - device reconciliation service
//!
//! The fleet daemon provides:
//! - A recurring reconciliation pass against the remote management service
//! - A durable ledger of which allow-listed devices were already modified
//! - A REST API and status page for inspecting the ledger

use clap::Parser;
use fleet_daemon::{error::DaemonError, DaemonConfig, DaemonResult, Reconciler, Scheduler, Server};
use fleet_gateway::MesGateway;
use fleet_ledger::{seed_from_file, DeviceLedger, SqliteLedger};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Fleet Daemon CLI
#[derive(Parser)]
#[command(name = "fleetd")]
#[command(about = "Fleet Daemon - device reconciliation service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FLEET_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "FLEET_LISTEN_ADDR")]
    listen: Option<String>,

    /// Allow-list seed file
    #[arg(long, env = "FLEET_SEED_FILE")]
    seed_file: Option<String>,

    /// Log level
    #[arg(long, env = "FLEET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "FLEET_LOG_JSON")]
    json: bool,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Initialize tracing; CLI flags win over the logging section
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(seed_file) = cli.seed_file {
        config.ledger.seed_file = seed_file;
    }

    config.validate()?;

    // Print startup banner
    println!(
        r#"
  ___ _        _
 | __| |___ __| |_
 | _|| / -_) -_)  _|
 |_| |_\___\___|\__|

  Fleet - Device Reconciliation Daemon
  Version: {}
  Remote: {}
  Interval: {}s
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.gateway.base_url,
        config.scheduler.interval_secs,
        config.server.listen_addr
    );

    // An unusable ledger is fatal
    let ledger = SqliteLedger::connect(&config.ledger.url, config.ledger.max_connections)
        .await
        .map_err(|e| {
            tracing::error!(url = %config.ledger.url, error = %e, "Could not open device ledger");
            e
        })?;
    let ledger: Arc<dyn DeviceLedger> = Arc::new(ledger);

    seed_from_file(ledger.as_ref(), &config.ledger.seed_file).await?;

    let gateway = Arc::new(MesGateway::new(config.gateway.clone())?);
    let reconciler = Reconciler::new(ledger.clone(), gateway, config.gateway.credentials())
        .with_command_delay(config.scheduler.command_delay());

    if cli.once {
        let summary = reconciler.run_once().await?;
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).map_err(|e| DaemonError::Server(e.to_string()))?
        );
        return Ok(());
    }

    let (scheduler, trigger_rx) = Scheduler::new(config.scheduler.interval(), reconciler);

    // Create and run server
    Server::new(config, ledger, scheduler, trigger_rx).run().await
}

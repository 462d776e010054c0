//! Wallet session synchronizer (v1)
//!
//! Connects to a wallet provider, keeps address / chain / balance in sync,
//! and renders the session whenever it changes.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   connect()    ┌──────────────────────┐   queries   ┌──────────────────┐
//!   │   main /     │───────────────▶│  SessionStateMachine │────────────▶│ ProviderGateway  │
//!   │   renderer   │◀───────────────│  (snapshot, tokens)  │◀────────────│ (timeouts)       │
//!   └──────────────┘  watch channel └──────────┬───────────┘             └────────┬─────────┘
//!                                              │ refresh_current()               │ events
//!                                    ┌─────────┴──────────┐              ┌────────▼─────────┐
//!                                    │  PollingScheduler  │◀─start/stop──│  SessionDriver   │
//!                                    │  (10s timer)       │              │  (subscription)  │
//!                                    └────────────────────┘              └──────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::U256;
use wallet_sync::config::validation::validate_config;
use wallet_sync::config::{load_config, ConfigError, SyncConfig};
use wallet_sync::lifecycle::{signals, startup, Shutdown};
use wallet_sync::observability::{logging, metrics};
use wallet_sync::provider::{MockWalletProvider, WalletProvider};
use wallet_sync::render::render;
use wallet_sync::session::ConnectOutcome;

#[derive(Parser)]
#[command(name = "wallet-sync")]
#[command(about = "Keep a wallet session (account, chain, balance) in sync", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `provider.rpc_url`.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Print snapshots as JSON instead of the text card.
    #[arg(long)]
    json: bool,

    /// Do not connect automatically on startup.
    #[arg(long)]
    no_connect: bool,

    /// Use an in-memory demo wallet instead of a JSON-RPC node.
    #[arg(long)]
    demo: bool,
}

fn resolve_config(cli: &Cli) -> Result<SyncConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SyncConfig::default(),
    };

    if let Some(url) = &cli.rpc_url {
        config.provider.rpc_url = url.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    Ok(config)
}

fn demo_provider() -> Arc<dyn WalletProvider> {
    let five_eth = U256::from(5u64) * U256::from(1_000_000_000_000_000_000u64);
    Arc::new(
        MockWalletProvider::new()
            .with_accounts(vec!["0xAbCdEf0123456789aBcDeF0123456789AbCd1234".to_string()])
            .with_chain_id("11155111")
            .with_balance(five_eth),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.observability);
    tracing::info!("wallet-sync v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let provider = if cli.demo {
        Some(demo_provider())
    } else {
        startup::build_provider(&config.provider)
    };

    let driver = startup::assemble(&config, provider);
    let machine = driver.machine().clone();
    let shutdown = Shutdown::new();

    let driver_task = tokio::spawn(driver.run(shutdown.subscribe()));

    let mut snapshots = machine.subscribe();
    let mut render_shutdown = shutdown.subscribe();
    let json = cli.json;
    let render_task = tokio::spawn(async move {
        loop {
            let snapshot = snapshots.borrow_and_update().clone();
            if json {
                match serde_json::to_string(&snapshot) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!(error = %e, "Failed to serialize snapshot"),
                }
            } else {
                println!("{}\n", render(&snapshot));
            }

            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = render_shutdown.recv() => break,
            }
        }
    });

    if !cli.no_connect {
        match machine.connect().await {
            ConnectOutcome::Connected { address, refresh } => {
                tracing::info!(address = %address, refresh = refresh.label(), "Session established")
            }
            other => tracing::info!(outcome = other.label(), "Session not established"),
        }
    }

    signals::wait_for_ctrl_c(&shutdown).await;

    if let Err(e) = driver_task.await {
        tracing::error!(error = %e, "Session driver task failed");
    }
    if let Err(e) = render_task.await {
        tracing::error!(error = %e, "Render task failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

//! record-relay CLI - queue-based record transfer between storage endpoints.

use clap::{Parser, Subcommand};
use record_relay::{connector, Config, Relay, RelayError, TargetConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{info, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "record-relay")]
#[command(about = "Transfer records between storage endpoints through a bounded queue")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "relay.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a transfer
    Run {
        /// Keep starting new cycles after each one completes
        #[arg(long)]
        repeat: bool,
    },

    /// Test source and target connectivity
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), RelayError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| RelayError::Config(e.to_string()))?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run { repeat } => {
            if repeat {
                config.relay.repeat = true;
            }

            // Signal handling for graceful shutdown (SIGINT and SIGTERM)
            let cancel = spawn_signal_handler();

            let relay = Relay::from_config(&config).await?;
            let report = relay.transfer(Some(cancel)).await?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                let headline = match report.status.as_str() {
                    "interrupted" => "Transfer interrupted.",
                    _ => "Transfer completed!",
                };
                println!("\n{}", headline);
                println!("  Run ID: {}", report.run_id);
                println!("  Duration: {:.2}s", report.duration_seconds);
                println!("  Cycles: {}", report.cycles);
                println!("  Records: {}", report.records_transferred);
                println!("  Throughput: {} records/sec", report.records_per_second);
                if report.records_lost > 0 {
                    println!("  Lost: {}", report.records_lost);
                }
            }
        }

        Commands::HealthCheck => {
            // Never provision during a health check.
            if let TargetConfig::Elasticsearch { recreate, .. } = &mut config.target {
                *recreate = false;
            }

            let source = connector::build_source(&config.source)?;
            source.health_check().await?;
            println!("source: ok");

            let sink = connector::build_sink(&config.target).await?;
            sink.health_check().await?;
            println!("target: ok");
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Map SIGINT (Ctrl-C) and SIGTERM onto the orchestrator's cancellation channel.
fn spawn_signal_handler() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigint = match signal(SignalKind::interrupt()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("failed to install SIGINT handler: {e}");
                    return;
                }
            };
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("failed to install SIGTERM handler: {e}");
                    return;
                }
            };
            tokio::select! {
                _ = sigint.recv() => eprintln!("\nReceived SIGINT. Shutting down gracefully..."),
                _ = sigterm.recv() => eprintln!("\nReceived SIGTERM. Shutting down gracefully..."),
            }
        }

        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            eprintln!("\nReceived Ctrl-C. Shutting down gracefully...");
        }

        let _ = tx.send(true);
    });

    rx
}

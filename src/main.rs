//! ngxmon binary entry point.
//!
//! Runs collection cycles on a fixed interval and writes every record
//! the collectors produce to stdout as JSON lines.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ngxmon::{Accumulator, AppConfig, ChannelAccumulator, Collector, NginxCollector};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ngxmon - nginx status metrics collector
#[derive(Parser, Debug)]
#[command(name = "ngxmon", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "NGXMON_CONFIG"
    )]
    config: String,

    /// Collection interval override (e.g. "30s")
    #[arg(long, env = "NGXMON_INTERVAL", value_parser = humantime::parse_duration)]
    interval: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ngxmon=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(interval) = cli.interval {
        config.interval = interval;
    }

    let (accumulator, records) = ChannelAccumulator::bounded(config.channel_capacity);
    let accumulator: Arc<dyn Accumulator> = Arc::new(accumulator);

    let collectors: Vec<NginxCollector> = config
        .nginx
        .iter()
        .cloned()
        .map(|collector| NginxCollector::new(collector, Arc::clone(&accumulator)))
        .collect();

    tracing::info!(
        collectors = collectors.len(),
        interval = ?config.interval,
        "Starting collection loop"
    );

    // Drain records to stdout as JSON lines until every sender is gone.
    let drain = std::thread::spawn(move || {
        let stdout = std::io::stdout();
        for record in records {
            match serde_json::to_string(&record) {
                Ok(line) => {
                    let mut out = stdout.lock();
                    let _ = writeln!(out, "{line}");
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize record"),
            }
        }
    });

    let mut ticker = tokio::time::interval(config.interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for collector in &collectors {
                    run_cycle(collector).await;
                }
            }
            _ = shutdown_signal() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    // Drop every sender so the drain thread sees the channel close.
    drop(collectors);
    drop(accumulator);
    if drain.join().is_err() {
        tracing::warn!("Record drain thread panicked");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Run one collection cycle and log the outcome.
async fn run_cycle<C: Collector>(collector: &C) {
    let start = std::time::Instant::now();
    tracing::debug!(collector = %collector.name(), "Running collection");

    match collector.collect().await {
        Ok(()) => {
            tracing::debug!(
                collector = %collector.name(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Collection succeeded"
            );
        }
        Err(e) => {
            tracing::error!(collector = %collector.name(), error = %e, "Collection failed");
        }
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

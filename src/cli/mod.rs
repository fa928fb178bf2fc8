//! CLI interface for rate-monitor
//!
//! Provides subcommands for:
//! - `run`: Start the scheduler until Ctrl-C
//! - `collect`: One collection pass in the foreground
//! - `latest`, `changes`, `history`, `status`: Query stored data
//! - `config`: Show the effective configuration

mod collect;
mod query;
mod run;

pub use collect::CollectArgs;
pub use query::{ChangesArgs, HistoryArgs, LatestArgs};
pub use run::RunArgs;

use crate::config::Config;
use crate::store::SnapshotStore;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "rate-monitor")]
#[command(about = "Collects shipping rates on a schedule and tracks price changes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the scheduler
    Run(RunArgs),
    /// Run one collection pass and exit
    Collect(CollectArgs),
    /// Latest known quote for every key
    Latest(LatestArgs),
    /// Recorded price changes, newest first
    Changes(ChangesArgs),
    /// Price history of one quote key
    History(HistoryArgs),
    /// Summary of stored data
    Status,
    /// Show configuration
    Config,
}

fn open_store(config: &Config) -> anyhow::Result<SnapshotStore> {
    Ok(SnapshotStore::open(config.store.clone())?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `status` subcommand
pub fn status(config: &Config, json: bool) -> anyhow::Result<()> {
    let status = open_store(config)?.scrape_status();
    if json {
        return print_json(&status);
    }

    println!("rate-monitor status");
    println!("  Data dir: {}", config.store.data_dir.display());
    match status.last_observed {
        Some(ts) => println!("  Last observed: {}", ts.to_rfc3339()),
        None => println!("  Last observed: never"),
    }
    println!("  Distinct quotes: {}", status.total_distinct_keys);
    println!("  Sources: {}", status.sources.join(", "));
    Ok(())
}

/// `config` subcommand
pub fn show_config(config: &Config) {
    println!("Current configuration:");
    println!(
        "  Scheduler: every {}s, run immediately: {}, single flight: {}",
        config.scheduler.interval_secs, config.scheduler.run_immediately, config.scheduler.single_flight
    );
    println!(
        "  Store: {} (lookback {} days, change log {} entries)",
        config.store.data_dir.display(),
        config.store.lookback_days,
        config.store.change_log_capacity
    );
    println!(
        "  Transport: timeout {}s, {} attempts, backoff {}ms",
        config.transport.timeout_secs, config.transport.max_retries, config.transport.retry_delay_ms
    );
    println!("  Provider: {}", config.provider.name());
    println!("  Carriers: {}", config.collection.carriers.join(", "));
    println!(
        "  Subjects: {} packages x {} routes",
        config.collection.packages.len(),
        config.collection.routes.len()
    );
    println!("  Log level: {} ({:?})", config.telemetry.log_level, config.telemetry.log_format);
}

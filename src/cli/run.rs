//! Run command implementation

use crate::config::Config;
use crate::model::{Change, RunResult};
use crate::scheduler::{Pipeline, RunObserver, Scheduler, SchedulerSlot};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Wait for the first interval instead of collecting at startup
    #[arg(long)]
    pub no_immediate: bool,
}

/// Logs a one-line summary of every run
struct LogObserver;

impl RunObserver for LogObserver {
    fn on_complete(&self, results: &[RunResult]) {
        let quotes: usize = results.iter().map(|r| r.quotes.len()).sum();
        let failed: Vec<&str> = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.source.as_str())
            .collect();
        tracing::info!(sources = results.len(), quotes, ?failed, "Run complete");
    }

    fn on_change(&self, changes: &[Change]) {
        for change in changes {
            tracing::info!(
                key = %change.quote.key(),
                old = %change.old_price,
                new = %change.new_price,
                percent = %change.change_percent.round_dp(2),
                "Price changed"
            );
        }
    }
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let pipeline = Pipeline::from_config(config)?;
        let run_immediately = config.scheduler.run_immediately && !self.no_immediate;

        let slot = SchedulerSlot::new();
        let scheduler = slot
            .init(
                || {
                    Scheduler::new(pipeline, config.scheduler.clone())
                        .with_observer(Arc::new(LogObserver))
                },
                run_immediately,
            )
            .await;

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown requested");
        scheduler.stop().await;

        let status = scheduler.status().await;
        if status.in_flight > 0 {
            tracing::warn!(in_flight = status.in_flight, "Exiting with runs still in flight");
        }
        Ok(())
    }
}

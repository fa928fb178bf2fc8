//! Collect command implementation

use super::print_json;
use crate::config::Config;
use crate::scheduler::Pipeline;
use clap::Args;
use serde_json::json;

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Skip the randomized pauses between requests
    #[arg(long)]
    pub no_pause: bool,
}

impl CollectArgs {
    pub async fn execute(&self, config: &Config, json: bool) -> anyhow::Result<()> {
        let mut config = config.clone();
        if self.no_pause {
            let collection = &mut config.collection;
            collection.source_pause_min_ms = 0;
            collection.source_pause_max_ms = 0;
            collection.subject_pause_min_ms = 0;
            collection.subject_pause_max_ms = 0;
        }

        let outcome = Pipeline::from_config(&config)?.execute().await;

        if json {
            return print_json(&json!({
                "run_id": outcome.run_id,
                "started_at": outcome.started_at,
                "finished_at": outcome.finished_at,
                "results": outcome.results,
                "saved": outcome.saved,
                "changes": outcome.changes,
            }));
        }

        println!("Run {}", outcome.run_id);
        for result in &outcome.results {
            let status = if result.success { "ok" } else { "FAILED" };
            println!("  {:<10} {:<6} {} quotes", result.source, status, result.quotes.len());
            if let Some(error) = &result.error {
                println!("             {}", error);
            }
        }
        println!("Saved {} new/changed quotes", outcome.saved);
        for change in &outcome.changes {
            println!(
                "  {}  {} -> {} ({}%)",
                change.quote.key(),
                change.old_price,
                change.new_price,
                change.change_percent.round_dp(2)
            );
        }
        Ok(())
    }
}

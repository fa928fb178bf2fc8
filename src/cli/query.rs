//! Read-only store queries

use super::{open_store, print_json};
use crate::config::Config;
use crate::model::QuoteKey;
use clap::Args;
use serde_json::json;

#[derive(Args, Debug)]
pub struct LatestArgs {
    /// Only show quotes from this source
    #[arg(long)]
    pub source: Option<String>,
}

impl LatestArgs {
    pub fn execute(&self, config: &Config, json: bool) -> anyhow::Result<()> {
        let mut quotes: Vec<_> = open_store(config)?
            .latest_quotes()
            .into_values()
            .filter(|q| {
                self.source
                    .as_ref()
                    .map_or(true, |source| q.source.eq_ignore_ascii_case(source))
            })
            .collect();
        quotes.sort_by(|a, b| a.key().cmp(&b.key()));

        if json {
            return print_json(&quotes);
        }
        if quotes.is_empty() {
            println!("No quotes stored");
        }
        for quote in &quotes {
            let days = quote
                .delivery_days
                .map_or_else(|| "-".to_string(), |d| format!("{}d", d));
            println!(
                "{:<10} {:<38} {:<8} {}->{}  {:>9} {}  {:>4}",
                quote.source,
                quote.service,
                quote.package,
                quote.origin,
                quote.destination,
                quote.price,
                quote.currency,
                days
            );
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ChangesArgs {
    /// Maximum number of changes to show
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,
}

impl ChangesArgs {
    pub fn execute(&self, config: &Config, json: bool) -> anyhow::Result<()> {
        let changes = open_store(config)?.all_changes(self.limit);
        if json {
            return print_json(&changes);
        }
        if changes.is_empty() {
            println!("No price changes recorded");
        }
        for change in &changes {
            let direction = if change.is_increase() { "up" } else { "down" };
            println!(
                "{}  {}  {} -> {} ({} {}%)",
                change.detected_at.format("%Y-%m-%d %H:%M"),
                change.quote.key(),
                change.old_price,
                change.new_price,
                direction,
                change.change_percent.round_dp(2)
            );
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Quote source, e.g. "UPS"
    #[arg(long)]
    pub source: String,

    /// Service tier, e.g. "UPS Ground"
    #[arg(long)]
    pub service: String,

    /// Subject id: "package|origin|destination"
    #[arg(long)]
    pub subject: String,

    /// Number of days to look back
    #[arg(short, long, default_value_t = 30)]
    pub days: u32,
}

impl HistoryArgs {
    pub fn execute(&self, config: &Config, json: bool) -> anyhow::Result<()> {
        let key = QuoteKey::new(&self.source, &self.service, &self.subject);
        let history = open_store(config)?.rate_history(&key, self.days);

        if json {
            let points: Vec<_> = history
                .iter()
                .map(|(ts, price)| json!({ "timestamp": ts, "price": price }))
                .collect();
            return print_json(&points);
        }
        if history.is_empty() {
            println!("No history for {} in the last {} days", key, self.days);
        }
        for (ts, price) in &history {
            println!("{}  {}", ts.to_rfc3339(), price);
        }
        Ok(())
    }
}

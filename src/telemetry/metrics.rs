//! Prometheus metrics

use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Completed collection runs
    Runs,
    /// Sources that produced no quotes or failed outright
    SourceFailures,
    /// Quotes returned by sources
    QuotesCollected,
    /// Price changes recorded by the store
    ChangesDetected,
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::Runs => "ratemon_runs_total",
            CounterMetric::SourceFailures => "ratemon_source_failures_total",
            CounterMetric::QuotesCollected => "ratemon_quotes_collected_total",
            CounterMetric::ChangesDetected => "ratemon_changes_detected_total",
        }
    }
}

/// Add to a counter, labelled by source where one applies
pub fn increment(metric: CounterMetric, source: Option<&str>, value: u64) {
    let name = metric.name();
    match source {
        Some(source) => ::metrics::counter!(name, "source" => source.to_string()).increment(value),
        None => ::metrics::counter!(name).increment(value),
    }
}

/// Record the wall-clock duration of a full collection run
pub fn record_run_duration(duration: Duration) {
    ::metrics::histogram!("ratemon_run_duration_ms").record(duration.as_secs_f64() * 1000.0);
}

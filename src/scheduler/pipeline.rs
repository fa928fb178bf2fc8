//! One collection pass: collect, persist, diff

use crate::collector::Collector;
use crate::config::Config;
use crate::model::{Change, Quote, RunResult};
use crate::source::{self, QuoteSource};
use crate::store::SnapshotStore;
use crate::telemetry::{self, CounterMetric};
use crate::transport::HttpTransport;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Notified after every recorded run
pub trait RunObserver: Send + Sync {
    /// Every run, with one result per source
    fn on_complete(&self, _results: &[RunResult]) {}

    /// Only runs that detected at least one price change
    fn on_change(&self, _changes: &[Change]) {}
}

/// What a single pipeline pass produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<RunResult>,
    /// Number of quotes written as new or changed
    pub saved: usize,
    pub changes: Vec<Change>,
}

/// Sources, orchestrator and store wired together
pub struct Pipeline {
    collector: Collector,
    sources: Vec<Arc<dyn QuoteSource>>,
    store: Arc<SnapshotStore>,
}

impl Pipeline {
    pub fn new(
        collector: Collector,
        sources: Vec<Arc<dyn QuoteSource>>,
        store: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            collector,
            sources,
            store,
        }
    }

    /// Build the full pipeline: resolve the provider, open the store and
    /// select the active sources
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = config.provider.clone().resolve()?;
        let transport = Arc::new(HttpTransport::new(config.transport.clone())?);
        let sources = source::active_sources(&provider, &config.collection.carriers, transport)?;
        let store = Arc::new(SnapshotStore::open(config.store.clone())?);

        tracing::info!(
            provider = provider.name(),
            sources = ?sources.iter().map(|s| s.id()).collect::<Vec<_>>(),
            data_dir = ?store.data_dir(),
            "Pipeline configured"
        );

        Ok(Self::new(Collector::from_config(&config.collection), sources, store))
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn sources(&self) -> &[Arc<dyn QuoteSource>] {
        &self.sources
    }

    /// Collect from every source and persist what succeeded.
    ///
    /// Never fails: source faults are inside the results and storage faults
    /// are logged, leaving zero saved quotes and no changes.
    pub async fn execute(&self) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = Instant::now();
        tracing::info!(%run_id, sources = self.sources.len(), "Collection run starting");

        let results = self.collector.run_all(&self.sources).await;
        let quotes: Vec<Quote> = results
            .iter()
            .filter(|r| r.success)
            .flat_map(|r| r.quotes.iter().cloned())
            .collect();

        let (saved, changes) = if quotes.is_empty() {
            (0, vec![])
        } else {
            self.persist(run_id, quotes).await
        };

        let elapsed = timer.elapsed();
        telemetry::increment(CounterMetric::Runs, None, 1);
        telemetry::increment(CounterMetric::ChangesDetected, None, changes.len() as u64);
        telemetry::record_run_duration(elapsed);

        tracing::info!(
            %run_id,
            saved,
            changes = changes.len(),
            failed = results.iter().filter(|r| !r.success).count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Collection run finished"
        );

        RunOutcome {
            run_id,
            started_at,
            finished_at: Utc::now(),
            results,
            saved,
            changes,
        }
    }

    async fn persist(&self, run_id: Uuid, quotes: Vec<Quote>) -> (usize, Vec<Change>) {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.save_quotes(quotes)).await {
            Ok(Ok((saved, changes))) => (saved.len(), changes),
            Ok(Err(e)) => {
                tracing::error!(%run_id, error = %e, "Failed to save quotes");
                (0, vec![])
            }
            Err(e) => {
                tracing::error!(%run_id, error = %e, "Store task failed");
                (0, vec![])
            }
        }
    }
}

//! Collection orchestrator
//!
//! Runs every active source over the full subject list, one source at a
//! time, and turns whatever happens into a `RunResult`. A source that
//! errors or panics yields a failed result and never affects the others.

use crate::config::CollectionConfig;
use crate::model::{RunResult, Subject};
use crate::source::{Pacing, QuoteSource};
use crate::telemetry::{self, CounterMetric};
use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinError;

/// Stateless fan-out over quote sources
#[derive(Debug, Clone)]
pub struct Collector {
    subjects: Arc<Vec<Subject>>,
    /// Pause between two sources
    source_pacing: Pacing,
    /// Pause between two subjects of the same source
    subject_pacing: Pacing,
}

impl Collector {
    pub fn new(subjects: Vec<Subject>, source_pacing: Pacing, subject_pacing: Pacing) -> Self {
        Self {
            subjects: Arc::new(subjects),
            source_pacing,
            subject_pacing,
        }
    }

    /// Subjects and pacing from the collection config
    pub fn from_config(config: &CollectionConfig) -> Self {
        Self::new(
            config.subjects(),
            config.source_pacing(),
            config.subject_pacing(),
        )
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Collect from each source in order, one result per source
    pub async fn run_all(&self, sources: &[Arc<dyn QuoteSource>]) -> Vec<RunResult> {
        let mut results = Vec::with_capacity(sources.len());

        for (i, source) in sources.iter().enumerate() {
            if i > 0 {
                self.source_pacing.pause().await;
            }

            tracing::info!(source = source.id(), subjects = self.subjects.len(), "Collecting");
            let result = self.run_one(Arc::clone(source)).await;

            if result.success {
                tracing::info!(source = %result.source, quotes = result.quotes.len(), "Collected");
            } else {
                tracing::warn!(
                    source = %result.source,
                    error = result.error.as_deref().unwrap_or("no quotes returned"),
                    "Collection failed"
                );
                telemetry::increment(CounterMetric::SourceFailures, Some(&result.source), 1);
            }
            telemetry::increment(
                CounterMetric::QuotesCollected,
                Some(&result.source),
                result.quotes.len() as u64,
            );

            results.push(result);
        }

        results
    }

    /// Run one source in its own task so a panic stays contained
    async fn run_one(&self, source: Arc<dyn QuoteSource>) -> RunResult {
        let subjects = Arc::clone(&self.subjects);
        let pacing = self.subject_pacing;
        let task_source = Arc::clone(&source);

        let handle =
            tokio::spawn(async move { task_source.collect_all(&subjects, pacing).await });

        match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => RunResult::failed(source.id(), e.to_string()),
            Err(e) => RunResult::failed(source.id(), join_failure(e)),
        }
    }
}

fn join_failure(err: JoinError) -> String {
    if err.is_cancelled() {
        return "collection task cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => format!("source panicked: {}", panic_message(&*payload)),
        Err(e) => e.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

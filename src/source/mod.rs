//! Quote sources
//!
//! A source turns a [`Subject`] into zero or more quotes. Built-in sources
//! estimate carrier prices from published rate cards; live sources query
//! a rate-shopping provider over HTTP.

mod address;
mod carriers;
mod easypost;
mod estimate;
mod registry;
mod shippo;
mod usps;

pub use carriers::{dhl, fedex, ups};
pub use easypost::EasyPostSource;
pub use estimate::{EstimatedSource, RateCard, RateTable, ServiceRate, Weighting};
pub use registry::SourceRegistry;
pub use shippo::ShippoSource;
pub use usps::UspsSource;

use crate::config::ProviderConfig;
use crate::model::{Quote, RunResult, Subject};
use crate::transport::{HttpTransport, TransportError};
use async_trait::async_trait;
use chrono::Utc;
use rand::random_range;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure to collect quotes for one subject or one source
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("provider error: {0}")]
    Api(String),

    #[error("unknown source: {0}")]
    UnknownSource(String),
}

/// Randomized pause used between requests to the same target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    /// No pause at all
    pub const NONE: Pacing = Pacing {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn between_millis(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms.max(min_ms)),
        }
    }

    /// Pick a delay uniformly within the bounds
    pub fn sample(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max <= min {
            return self.min;
        }
        Duration::from_millis(random_range(min..=max))
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// A price source
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Display name, also used as the quote `source`
    fn id(&self) -> &str;

    /// Quotes for a single subject
    async fn quote(&self, subject: &Subject) -> Result<Vec<Quote>, CollectionError>;

    /// Quote every subject in order.
    ///
    /// Per-subject failures are recorded in the result's error field and
    /// never stop the remaining subjects.
    async fn collect_all(
        &self,
        subjects: &[Subject],
        pacing: Pacing,
    ) -> Result<RunResult, CollectionError> {
        let timestamp = Utc::now();
        let mut quotes = Vec::new();
        let mut errors = Vec::new();

        for (i, subject) in subjects.iter().enumerate() {
            if i > 0 {
                pacing.pause().await;
            }

            match self.quote(subject).await {
                Ok(found) => {
                    tracing::debug!(source = self.id(), %subject, count = found.len(), "Collected quotes");
                    quotes.extend(found);
                }
                Err(e) => {
                    let message = format!("Error collecting {}: {}", subject, e);
                    tracing::error!(source = self.id(), "{}", message);
                    errors.push(message);
                }
            }
        }

        Ok(RunResult::collected(self.id(), timestamp, quotes, errors))
    }
}

/// Sources to run for the resolved provider.
///
/// A live provider replaces the per-carrier estimates entirely.
pub fn active_sources(
    provider: &ProviderConfig,
    carriers: &[String],
    transport: Arc<HttpTransport>,
) -> Result<Vec<Arc<dyn QuoteSource>>, CollectionError> {
    match provider {
        ProviderConfig::None => SourceRegistry::builtin(transport).select(carriers),
        ProviderConfig::EasyPost { api_key } => Ok(vec![Arc::new(EasyPostSource::new(
            api_key.clone(),
            transport,
        ))]),
        ProviderConfig::Shippo { api_key } => Ok(vec![Arc::new(ShippoSource::new(
            api_key.clone(),
            transport,
        ))]),
    }
}

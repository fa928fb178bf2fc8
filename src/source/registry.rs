//! Named source lookup

use super::carriers::{dhl, fedex, ups};
use super::{CollectionError, QuoteSource, UspsSource};
use crate::transport::HttpTransport;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Sources addressable by case-insensitive id
#[derive(Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, Arc<dyn QuoteSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four built-in carriers
    pub fn builtin(transport: Arc<HttpTransport>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(UspsSource::new(transport)));
        registry.register(Arc::new(ups()));
        registry.register(Arc::new(fedex()));
        registry.register(Arc::new(dhl()));
        registry
    }

    /// Add a source, replacing any with the same id
    pub fn register(&mut self, source: Arc<dyn QuoteSource>) {
        self.sources.insert(source.id().to_ascii_lowercase(), source);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn QuoteSource>, CollectionError> {
        self.sources
            .get(&id.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| CollectionError::UnknownSource(id.to_string()))
    }

    /// Sources for the requested ids, in request order
    pub fn select(&self, ids: &[String]) -> Result<Vec<Arc<dyn QuoteSource>>, CollectionError> {
        ids.iter().map(|id| self.get(id)).collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.sources.values().map(|s| s.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

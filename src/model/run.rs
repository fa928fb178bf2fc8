//! Per-source collection outcomes

use super::Quote;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one source's collection attempt within a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    /// True iff at least one quote was produced
    pub success: bool,
    pub quotes: Vec<Quote>,
    pub error: Option<String>,
}

impl RunResult {
    /// Build a result from whatever a source produced.
    ///
    /// Per-subject errors are joined with `"; "`. A source that produced
    /// no quotes is unsuccessful even when it reported no error.
    pub fn collected(
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
        quotes: Vec<Quote>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            source: source.into(),
            timestamp,
            success: !quotes.is_empty(),
            quotes,
            error: if errors.is_empty() {
                None
            } else {
                Some(errors.join("; "))
            },
        }
    }

    /// A source that failed outright
    pub fn failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            timestamp: Utc::now(),
            success: false,
            quotes: vec![],
            error: Some(error.into()),
        }
    }
}

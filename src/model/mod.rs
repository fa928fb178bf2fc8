//! Quote and delta model
//!
//! Value types shared by sources, the snapshot store and the scheduler

mod change;
pub(crate) mod quote;
mod run;

pub use change::Change;
pub use quote::{Package, Quote, QuoteKey, Route, Subject};
pub use run::RunResult;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted batch of new or changed quotes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub timestamp: DateTime<Utc>,
    pub quotes: Vec<Quote>,
}

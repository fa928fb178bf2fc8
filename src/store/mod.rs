//! Snapshot store
//!
//! Persists quote history as one JSON file per UTC day, answers
//! latest-value-per-key lookups and records detected price changes in a
//! bounded change log.
//!
//! Only new or changed quotes are written: each period file is a sparse,
//! append-only log of [`SnapshotEntry`] values.

mod file;

use crate::model::{Change, Quote, QuoteKey, SnapshotEntry};
use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Prices closer than this are considered unchanged
pub const PRICE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Upper bound on the number of days any query scans
pub const MAX_PERIODS: u32 = 3660;

const CHANGES_FILE: &str = "changes.json";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed store file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snapshot store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory holding period files and the change log
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Number of past days scanned for latest quotes
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Maximum number of changes retained in the change log
    #[serde(default = "default_change_log_capacity")]
    pub change_log_capacity: usize,

    /// Keep scanning older periods for keys missing from newer ones.
    ///
    /// Off by default: the scan stops at the first period holding any quotes.
    #[serde(default)]
    pub merge_lookback: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/rates")
}
fn default_lookback_days() -> u32 {
    7
}
fn default_change_log_capacity() -> usize {
    1000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            lookback_days: 7,
            change_log_capacity: 1000,
            merge_lookback: false,
        }
    }
}

/// Summary derived from the latest known quotes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeStatus {
    pub last_observed: Option<DateTime<Utc>>,
    pub total_distinct_keys: usize,
    pub sources: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PeriodFile {
    #[serde(default)]
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ChangeLogFile {
    #[serde(default)]
    changes: Vec<Change>,
}

/// File-backed quote history with change detection
#[derive(Debug)]
pub struct SnapshotStore {
    config: StoreConfig,
    /// Serializes every read-modify-write on period files and the change log
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Open a store, creating the data directory if needed
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.data_dir)?;
        Ok(Self {
            config,
            write_lock: Mutex::new(()),
        })
    }

    /// Open a store in `data_dir` with default settings
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open(StoreConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn period_path(&self, date: NaiveDate) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    fn changes_path(&self) -> PathBuf {
        self.config.data_dir.join(CHANGES_FILE)
    }

    /// Periods from `now` backward, newest first, at most [`MAX_PERIODS`]
    fn periods(now: DateTime<Utc>, days: u32) -> impl Iterator<Item = NaiveDate> {
        let today = now.date_naive();
        (0..days.min(MAX_PERIODS))
            .map_while(move |n| today.checked_sub_days(Days::new(u64::from(n))))
    }

    fn load_period(&self, date: NaiveDate) -> PeriodFile {
        file::read_or_empty(&self.period_path(date))
    }

    /// Latest known quote for every key
    pub fn latest_quotes(&self) -> HashMap<QuoteKey, Quote> {
        self.latest_quotes_at(Utc::now())
    }

    /// Latest known quotes as of `now`.
    ///
    /// Periods are scanned newest first; within a period, newest entry
    /// first. The first occurrence of a key wins.
    pub fn latest_quotes_at(&self, now: DateTime<Utc>) -> HashMap<QuoteKey, Quote> {
        let mut latest = HashMap::new();

        for date in Self::periods(now, self.config.lookback_days) {
            let period = self.load_period(date);
            for entry in period.entries.iter().rev() {
                for quote in &entry.quotes {
                    latest.entry(quote.key()).or_insert_with(|| quote.clone());
                }
            }

            if !latest.is_empty() && !self.config.merge_lookback {
                break;
            }
        }

        latest
    }

    /// Persist quotes that are new or whose price moved, returning
    /// `(saved, changes)`
    pub fn save_quotes(&self, quotes: Vec<Quote>) -> Result<(Vec<Quote>, Vec<Change>), StoreError> {
        self.save_quotes_at(quotes, Utc::now())
    }

    /// [`save_quotes`](Self::save_quotes) with an explicit clock
    pub fn save_quotes_at(
        &self,
        quotes: Vec<Quote>,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Quote>, Vec<Change>), StoreError> {
        if quotes.is_empty() {
            return Ok((vec![], vec![]));
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = self.latest_quotes_at(now);

        let mut saved = Vec::new();
        let mut changes = Vec::new();

        for quote in quotes {
            match latest.get(&quote.key()) {
                None => saved.push(quote),
                Some(previous) if (previous.price - quote.price).abs() > PRICE_EPSILON => {
                    changes.push(Change::between(previous.price, quote.clone(), now));
                    saved.push(quote);
                }
                Some(_) => {}
            }
        }

        if saved.is_empty() {
            tracing::debug!("No new or changed quotes, nothing written");
            return Ok((saved, changes));
        }

        let path = self.period_path(now.date_naive());
        let mut period: PeriodFile = file::read_for_update(&path)?;

        // Change log before the period entry, so a failed log write leaves
        // the old price as the baseline.
        if !changes.is_empty() {
            self.append_changes(&changes)?;
        }

        let timestamp = period
            .entries
            .last()
            .map_or(now, |last| last.timestamp.max(now));
        period.entries.push(SnapshotEntry {
            timestamp,
            quotes: saved.clone(),
        });
        file::write_json_atomic(&path, &period)?;

        tracing::debug!(
            path = ?path,
            saved = saved.len(),
            changes = changes.len(),
            "Appended snapshot entry"
        );

        Ok((saved, changes))
    }

    /// Append to the change log, keeping only the newest entries.
    /// Caller holds the write lock.
    fn append_changes(&self, changes: &[Change]) -> Result<(), StoreError> {
        let path = self.changes_path();
        let mut log: ChangeLogFile = file::read_for_update(&path)?;
        log.changes.extend_from_slice(changes);

        let capacity = self.config.change_log_capacity;
        if log.changes.len() > capacity {
            let excess = log.changes.len() - capacity;
            log.changes.drain(..excess);
        }

        file::write_json_atomic(&path, &log)
    }

    /// Most recent changes, newest first
    pub fn all_changes(&self, limit: usize) -> Vec<Change> {
        let log: ChangeLogFile = file::read_or_empty(&self.changes_path());
        log.changes.into_iter().rev().take(limit).collect()
    }

    /// Every snapshot entry from the last `days` periods, oldest first
    pub fn historical_quotes(&self, days: u32) -> Vec<SnapshotEntry> {
        self.historical_quotes_at(days, Utc::now())
    }

    pub fn historical_quotes_at(&self, days: u32, now: DateTime<Utc>) -> Vec<SnapshotEntry> {
        let mut entries: Vec<SnapshotEntry> = Self::periods(now, days)
            .flat_map(|date| self.load_period(date).entries)
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        entries
    }

    /// Price series for one key, oldest first
    pub fn rate_history(&self, key: &QuoteKey, days: u32) -> Vec<(DateTime<Utc>, Decimal)> {
        self.rate_history_at(key, days, Utc::now())
    }

    pub fn rate_history_at(
        &self,
        key: &QuoteKey,
        days: u32,
        now: DateTime<Utc>,
    ) -> Vec<(DateTime<Utc>, Decimal)> {
        self.historical_quotes_at(days, now)
            .into_iter()
            .flat_map(|entry| {
                let timestamp = entry.timestamp;
                entry
                    .quotes
                    .into_iter()
                    .filter(|q| q.key() == *key)
                    .map(move |q| (timestamp, q.price))
            })
            .collect()
    }

    /// Freshness summary of the latest known quotes
    pub fn scrape_status(&self) -> ScrapeStatus {
        Self::status_of(&self.latest_quotes())
    }

    pub fn scrape_status_at(&self, now: DateTime<Utc>) -> ScrapeStatus {
        Self::status_of(&self.latest_quotes_at(now))
    }

    fn status_of(latest: &HashMap<QuoteKey, Quote>) -> ScrapeStatus {
        let sources: BTreeSet<&str> = latest.values().map(|q| q.source.as_str()).collect();
        ScrapeStatus {
            last_observed: latest.values().map(|q| q.timestamp).max(),
            total_distinct_keys: latest.len(),
            sources: sources.into_iter().map(String::from).collect(),
        }
    }
}

//! End-to-end collection tests: sources through scheduler into the store

use async_trait::async_trait;
use rate_monitor::collector::Collector;
use rate_monitor::config::Config;
use rate_monitor::model::{Quote, Subject};
use rate_monitor::scheduler::{Pipeline, Scheduler, SchedulerConfig, SchedulerSlot};
use rate_monitor::source::{self, CollectionError, Pacing, QuoteSource};
use rate_monitor::store::SnapshotStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::assert_ok;

/// Carrier whose single service price can be moved between runs
struct AdjustableCarrier {
    price: Mutex<Decimal>,
}

#[async_trait]
impl QuoteSource for AdjustableCarrier {
    fn id(&self) -> &str {
        "Regional"
    }

    async fn quote(&self, subject: &Subject) -> Result<Vec<Quote>, CollectionError> {
        let price = *self.price.lock().unwrap();
        Ok(vec![Quote::new("Regional", "Next Day", subject, price, "USD", Some(1))])
    }
}

struct DownCarrier;

#[async_trait]
impl QuoteSource for DownCarrier {
    fn id(&self) -> &str {
        "Down"
    }

    async fn quote(&self, _subject: &Subject) -> Result<Vec<Quote>, CollectionError> {
        Err(CollectionError::Api("503 from rate portal".to_string()))
    }
}

fn collector() -> Collector {
    let mut config = Config::default().collection;
    config.source_pause_min_ms = 0;
    config.source_pause_max_ms = 0;
    config.subject_pause_min_ms = 0;
    config.subject_pause_max_ms = 0;
    Collector::from_config(&config)
}

fn quiet_scheduler() -> SchedulerConfig {
    SchedulerConfig {
        run_immediately: false,
        ..Default::default()
    }
}

async fn wait_for_runs(scheduler: &Scheduler, runs: u64) {
    for _ in 0..500 {
        let status = scheduler.status().await;
        if status.runs_completed >= runs && status.in_flight == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("scheduler did not complete {runs} runs");
}

#[tokio::test]
async fn test_estimated_carriers_with_partial_failure() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(assert_ok!(SnapshotStore::with_data_dir(dir.path())));
    let sources: Vec<Arc<dyn QuoteSource>> = vec![
        Arc::new(source::ups()),
        Arc::new(DownCarrier),
        Arc::new(source::fedex()),
        Arc::new(source::dhl()),
    ];
    let pipeline = Pipeline::new(collector(), sources, Arc::clone(&store));

    let outcome = pipeline.execute().await;

    assert_eq!(outcome.results.len(), 4);
    assert!(outcome.results[0].success);
    assert!(!outcome.results[1].success);
    assert_eq!(outcome.results[1].error.as_ref().unwrap().matches("; ").count(), 5);
    assert!(outcome.results[2].success);
    assert!(outcome.results[3].success);

    let collected: usize = outcome.results.iter().map(|r| r.quotes.len()).sum();
    assert_eq!(outcome.saved, collected);
    assert_eq!(store.latest_quotes().len(), collected);

    let status = store.scrape_status();
    assert_eq!(status.sources, vec!["DHL", "FedEx", "UPS"]);

    // Rate cards are static, so a second pass changes nothing
    let second = pipeline.execute().await;
    assert_eq!(second.saved, 0);
    assert!(second.changes.is_empty());
}

#[tokio::test]
async fn test_scheduler_reports_each_change_once() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SnapshotStore::with_data_dir(dir.path()).unwrap());
    let carrier = Arc::new(AdjustableCarrier {
        price: Mutex::new(dec!(24.00)),
    });
    let pipeline = Pipeline::new(collector(), vec![carrier.clone()], Arc::clone(&store));
    let scheduler = Scheduler::new(pipeline, quiet_scheduler());

    scheduler.run_now();
    wait_for_runs(&scheduler, 1).await;
    assert!(scheduler.status().await.recent_changes.is_empty());

    *carrier.price.lock().unwrap() = dec!(26.40);
    scheduler.run_now();
    wait_for_runs(&scheduler, 2).await;

    let status = scheduler.status().await;
    // Six subjects in the default configuration
    assert_eq!(status.recent_changes.len(), 6);
    assert!(status.recent_changes.iter().all(|c| c.change_percent == dec!(10)));

    scheduler.run_now();
    wait_for_runs(&scheduler, 3).await;
    assert!(scheduler.status().await.recent_changes.is_empty());
    assert_eq!(store.all_changes(100).len(), 6);
}

#[tokio::test]
async fn test_slot_keeps_single_scheduler() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SnapshotStore::with_data_dir(dir.path()).unwrap());
    let slot = SchedulerSlot::new();

    let build = || {
        Scheduler::new(
            Pipeline::new(collector(), vec![Arc::new(source::ups())], Arc::clone(&store)),
            quiet_scheduler(),
        )
    };
    let first = slot.init(build, true).await;
    let second = slot.init(build, true).await;

    assert!(Arc::ptr_eq(&first, &second));
    wait_for_runs(&first, 1).await;

    let status = first.status().await;
    assert!(status.is_running);
    assert_eq!(status.runs_completed, 1);
    assert_eq!(status.last_results[0].source, "UPS");
    first.stop().await;
}

#[test]
fn test_pacing_from_config() {
    let config = Config::default().collection;
    assert_eq!(
        config.source_pacing(),
        Pacing::between_millis(1000, 3000)
    );
}

//! Integration tests for the on-disk snapshot layout

use chrono::{TimeZone, Utc};
use rate_monitor::model::{Package, Quote, QuoteKey, Route, Subject};
use rate_monitor::store::{SnapshotStore, StoreConfig};
use rust_decimal_macros::dec;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

fn subject() -> Subject {
    Subject::new(
        Package {
            name: "Medium".to_string(),
            length: dec!(12),
            width: dec!(8),
            height: dec!(6),
            weight: dec!(5),
        },
        Route {
            name: "US Domestic (NY to LA)".to_string(),
            origin_zip: "10001".to_string(),
            origin_country: "US".to_string(),
            destination_zip: "90001".to_string(),
            destination_country: "US".to_string(),
        },
    )
}

#[test]
fn test_period_files_are_named_by_utc_day() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::with_data_dir(dir.path()).unwrap();
    let late = Utc.with_ymd_and_hms(2026, 5, 31, 23, 59, 0).unwrap();
    let early = Utc.with_ymd_and_hms(2026, 6, 1, 0, 1, 0).unwrap();

    let quote = Quote::new("UPS", "UPS Ground", &subject(), dec!(18.12), "USD", Some(5));
    assert_ok!(store.save_quotes_at(vec![quote.clone().observed_at(late)], late));
    let moved = Quote::new("UPS", "UPS Ground", &subject(), dec!(18.90), "USD", Some(5));
    let (_, changes) = store.save_quotes_at(vec![moved.observed_at(early)], early).unwrap();
    assert_eq!(changes.len(), 1);

    assert!(dir.path().join("2026-05-31.json").exists());
    assert!(dir.path().join("2026-06-01.json").exists());
    assert!(dir.path().join("changes.json").exists());

    let raw = std::fs::read_to_string(dir.path().join("2026-06-01.json")).unwrap();
    let body: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["quotes"][0]["source"], "UPS");
    assert_eq!(entries[0]["quotes"][0]["package"], "Medium");
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let now = Utc.with_ymd_and_hms(2026, 4, 2, 9, 30, 0).unwrap();
    let quote = Quote::new("FedEx", "FedEx Ground", &subject(), dec!(17.75), "USD", Some(5));

    {
        let store = SnapshotStore::with_data_dir(dir.path()).unwrap();
        store.save_quotes_at(vec![quote.clone()], now).unwrap();
    }

    let reopened = SnapshotStore::with_data_dir(dir.path()).unwrap();
    let latest = reopened.latest_quotes_at(now);
    assert_eq!(latest.get(&quote.key()).map(|q| q.price), Some(dec!(17.75)));

    let (saved, changes) = reopened.save_quotes_at(vec![quote], now).unwrap();
    assert!(saved.is_empty());
    assert!(changes.is_empty());
}

#[test]
fn test_reads_hand_written_period() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("2026-02-14.json"),
        r#"{"entries":[{"timestamp":"2026-02-14T08:00:00Z","quotes":[
            {"source":"DHL","service":"DHL Express Worldwide","package":"Small",
             "origin":"10001","origin_country":"US","destination":"SW1A 1AA",
             "destination_country":"GB","price":"91.80","currency":"USD"}
        ]}]}"#,
    )
    .unwrap();
    let store = SnapshotStore::with_data_dir(dir.path()).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 2, 14, 18, 0, 0).unwrap();

    let key = QuoteKey::new("DHL", "DHL Express Worldwide", "Small|10001|SW1A 1AA");
    let quote = store.latest_quotes_at(now).remove(&key).unwrap();
    assert_eq!(quote.price, dec!(91.80));
    assert_eq!(quote.delivery_days, None);

    let history = store.rate_history_at(&key, 7, now);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].0, Utc.with_ymd_and_hms(2026, 2, 14, 8, 0, 0).unwrap());
}

#[test]
fn test_corrupt_change_log_is_replaced_on_write() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("changes.json"), "{ not json").unwrap();
    let store = SnapshotStore::with_data_dir(dir.path()).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 4, 2, 9, 30, 0).unwrap();

    assert!(store.all_changes(10).is_empty());

    let first = Quote::new("USPS", "Priority Mail", &subject(), dec!(16.20), "USD", None);
    let second = Quote::new("USPS", "Priority Mail", &subject(), dec!(16.95), "USD", None);
    store.save_quotes_at(vec![first], now).unwrap();
    store.save_quotes_at(vec![second], now).unwrap();

    assert_eq!(store.all_changes(10).len(), 1);
    let quarantined = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .any(|e| e.file_name().to_string_lossy().starts_with("changes.json.corrupt-"));
    assert!(quarantined);
}

#[test]
fn test_unwritable_data_dir_is_an_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    assert_err!(SnapshotStore::open(StoreConfig {
        data_dir: blocker.join("rates"),
        ..Default::default()
    }));
}

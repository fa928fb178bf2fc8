//! Benchmarks for change detection against stored history

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rate_monitor::config::CollectionConfig;
use rate_monitor::model::Quote;
use rate_monitor::source::{dhl, fedex, ups};
use rate_monitor::store::SnapshotStore;
use rust_decimal_macros::dec;
use tempfile::TempDir;

/// One full pass of the built-in rate cards over the default subjects
fn batch() -> Vec<Quote> {
    let subjects = CollectionConfig::default().subjects();
    let cards = [ups(), fedex(), dhl()];
    subjects
        .iter()
        .flat_map(|subject| cards.iter().flat_map(move |card| card.estimate(subject)))
        .collect()
}

fn seeded_store(days: i64) -> (TempDir, SnapshotStore) {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::with_data_dir(dir.path()).unwrap();
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    for day in 0..days {
        let mut quotes = batch();
        for quote in &mut quotes {
            quote.price += dec!(0.25) * rust_decimal::Decimal::from(day);
        }
        store.save_quotes_at(quotes, start + Duration::days(day)).unwrap();
    }
    (dir, store)
}

fn benchmark_latest_quotes(c: &mut Criterion) {
    let (_dir, store) = seeded_store(7);
    let now = Utc.with_ymd_and_hms(2026, 1, 7, 18, 0, 0).unwrap();

    c.bench_function("latest_quotes_7_days", |b| {
        b.iter(|| store.latest_quotes_at(black_box(now)))
    });
}

fn benchmark_unchanged_batch(c: &mut Criterion) {
    let (_dir, store) = seeded_store(1);
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 18, 0, 0).unwrap();

    c.bench_function("save_unchanged_batch", |b| {
        b.iter_batched(
            batch,
            |quotes| store.save_quotes_at(quotes, now).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, benchmark_latest_quotes, benchmark_unchanged_batch);
criterion_main!(benches);

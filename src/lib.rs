//! rate-monitor: periodic shipping rate collection and change tracking
//!
//! This library provides the core components for:
//! - Quote sources: carrier rate cards, USPS calculator, EasyPost and Shippo
//! - Collection across sources with per-source failure isolation
//! - A file-backed snapshot store with price change detection
//! - A timer-driven scheduler with on-demand runs and status snapshots
//! - Logging and Prometheus metrics

pub mod cli;
pub mod collector;
pub mod config;
pub mod model;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod transport;

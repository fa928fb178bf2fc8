//! Configuration types for rate-monitor

use crate::model::{Package, Route, Subject};
use crate::scheduler::SchedulerConfig;
use crate::source::Pacing;
use crate::store::StoreConfig;
use crate::telemetry::LogFormat;
use crate::transport::TransportConfig;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// What gets priced, by whom, and how fast
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    /// Built-in carriers to run when no live provider is configured
    #[serde(default = "default_carriers")]
    pub carriers: Vec<String>,

    #[serde(default = "default_packages")]
    pub packages: Vec<Package>,

    #[serde(default = "default_routes")]
    pub routes: Vec<Route>,

    /// Pause between two sources (milliseconds)
    #[serde(default = "default_pause_min_ms")]
    pub source_pause_min_ms: u64,
    #[serde(default = "default_pause_max_ms")]
    pub source_pause_max_ms: u64,

    /// Pause between two subjects of one source (milliseconds)
    #[serde(default = "default_pause_min_ms")]
    pub subject_pause_min_ms: u64,
    #[serde(default = "default_pause_max_ms")]
    pub subject_pause_max_ms: u64,
}

fn default_carriers() -> Vec<String> {
    ["usps", "ups", "fedex", "dhl"].into_iter().map(String::from).collect()
}
fn default_packages() -> Vec<Package> {
    vec![
        package("Small", 6, 4, 2, 1),
        package("Medium", 12, 8, 6, 5),
        package("Large", 18, 12, 10, 15),
    ]
}
fn default_routes() -> Vec<Route> {
    vec![
        route("US Domestic (NY to LA)", "10001", "US", "90001", "US"),
        route("US to UK", "10001", "US", "SW1A 1AA", "GB"),
    ]
}
fn default_pause_min_ms() -> u64 {
    1000
}
fn default_pause_max_ms() -> u64 {
    3000
}

fn package(name: &str, length: i64, width: i64, height: i64, weight: i64) -> Package {
    Package {
        name: name.to_string(),
        length: Decimal::from(length),
        width: Decimal::from(width),
        height: Decimal::from(height),
        weight: Decimal::from(weight),
    }
}

fn route(name: &str, origin: &str, origin_country: &str, dest: &str, dest_country: &str) -> Route {
    Route {
        name: name.to_string(),
        origin_zip: origin.to_string(),
        origin_country: origin_country.to_string(),
        destination_zip: dest.to_string(),
        destination_country: dest_country.to_string(),
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            carriers: default_carriers(),
            packages: default_packages(),
            routes: default_routes(),
            source_pause_min_ms: default_pause_min_ms(),
            source_pause_max_ms: default_pause_max_ms(),
            subject_pause_min_ms: default_pause_min_ms(),
            subject_pause_max_ms: default_pause_max_ms(),
        }
    }
}

impl CollectionConfig {
    /// Every package on every route
    pub fn subjects(&self) -> Vec<Subject> {
        Subject::cross_product(&self.packages, &self.routes)
    }

    pub fn source_pacing(&self) -> Pacing {
        Pacing::between_millis(self.source_pause_min_ms, self.source_pause_max_ms)
    }

    pub fn subject_pacing(&self) -> Pacing {
        Pacing::between_millis(self.subject_pause_min_ms, self.subject_pause_max_ms)
    }
}

/// Live rate-shopping provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Built-in per-carrier sources
    #[default]
    None,
    EasyPost {
        #[serde(default)]
        api_key: String,
    },
    Shippo {
        #[serde(default)]
        api_key: String,
    },
}

impl ProviderConfig {
    /// Fill in API keys from `EASYPOST_API_KEY` / `SHIPPO_API_KEY`
    pub fn resolve(self) -> anyhow::Result<Self> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve against an arbitrary environment lookup.
    ///
    /// With no provider configured, a present EasyPost key wins over a
    /// Shippo key. An explicitly chosen provider without any key is an error.
    pub fn resolve_with(self, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let lookup = |name: &str| env(name).filter(|key| !key.trim().is_empty());

        match self {
            ProviderConfig::None => Ok(if let Some(api_key) = lookup("EASYPOST_API_KEY") {
                ProviderConfig::EasyPost { api_key }
            } else if let Some(api_key) = lookup("SHIPPO_API_KEY") {
                ProviderConfig::Shippo { api_key }
            } else {
                ProviderConfig::None
            }),
            ProviderConfig::EasyPost { api_key } if api_key.is_empty() => lookup("EASYPOST_API_KEY")
                .map(|api_key| ProviderConfig::EasyPost { api_key })
                .ok_or_else(|| anyhow::anyhow!("EasyPost provider selected but no API key configured")),
            ProviderConfig::Shippo { api_key } if api_key.is_empty() => lookup("SHIPPO_API_KEY")
                .map(|api_key| ProviderConfig::Shippo { api_key })
                .ok_or_else(|| anyhow::anyhow!("Shippo provider selected but no API key configured")),
            configured => Ok(configured),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::None => "estimated",
            ProviderConfig::EasyPost { .. } => "EasyPost",
            ProviderConfig::Shippo { .. } => "Shippo",
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [scheduler]
            interval_secs = 900
            run_immediately = false

            [store]
            data_dir = "/var/lib/rates"
            lookback_days = 3

            [transport]
            timeout_secs = 10
            max_retries = 5

            [collection]
            carriers = ["ups", "fedex"]
            source_pause_min_ms = 0
            source_pause_max_ms = 0

            [[collection.packages]]
            name = "Envelope"
            length = 12
            width = 9
            height = 0.5
            weight = 0.25

            [[collection.routes]]
            name = "Chicago to Toronto"
            origin_zip = "60601"
            origin_country = "US"
            destination_zip = "M5H 2N2"
            destination_country = "CA"

            [provider]
            kind = "shippo"
            api_key = "shippo_live_abc"

            [telemetry]
            log_level = "debug"
            log_format = "json"
            metrics_port = 9090
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scheduler.interval_secs, 900);
        assert!(!config.scheduler.run_immediately);
        assert_eq!(config.store.data_dir, PathBuf::from("/var/lib/rates"));
        assert_eq!(config.store.lookback_days, 3);
        assert_eq!(config.transport.max_retries, 5);
        assert_eq!(config.transport.retry_delay_ms, 5000);
        assert_eq!(config.collection.carriers, vec!["ups", "fedex"]);
        assert_eq!(config.collection.packages[0].height, dec!(0.5));
        assert_eq!(config.collection.subjects().len(), 1);
        assert_eq!(config.collection.source_pacing(), Pacing::NONE);
        assert_eq!(
            config.provider,
            ProviderConfig::Shippo {
                api_key: "shippo_live_abc".to_string()
            }
        );
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.telemetry.metrics_port, Some(9090));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scheduler.interval_secs, 3600);
        assert_eq!(config.store.lookback_days, 7);
        assert_eq!(config.store.change_log_capacity, 1000);
        assert_eq!(config.collection.carriers.len(), 4);
        assert_eq!(config.collection.subjects().len(), 6);
        assert_eq!(config.provider, ProviderConfig::None);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
        assert!(config.telemetry.metrics_port.is_none());
    }

    #[test]
    fn test_default_subject_order() {
        let subjects = CollectionConfig::default().subjects();
        assert_eq!(subjects[0].to_string(), "Small on US Domestic (NY to LA)");
        assert_eq!(subjects[1].to_string(), "Small on US to UK");
        assert_eq!(subjects[5].to_string(), "Large on US to UK");
    }

    #[test]
    fn test_provider_probe_prefers_easypost() {
        let resolved = ProviderConfig::None
            .resolve_with(env(&[("EASYPOST_API_KEY", "ez"), ("SHIPPO_API_KEY", "sh")]))
            .unwrap();
        assert_eq!(resolved, ProviderConfig::EasyPost { api_key: "ez".to_string() });

        let resolved = ProviderConfig::None
            .resolve_with(env(&[("SHIPPO_API_KEY", "sh")]))
            .unwrap();
        assert_eq!(resolved.name(), "Shippo");

        let resolved = ProviderConfig::None
            .resolve_with(env(&[("EASYPOST_API_KEY", "  ")]))
            .unwrap();
        assert_eq!(resolved, ProviderConfig::None);
    }

    #[test]
    fn test_provider_key_from_env() {
        let resolved = ProviderConfig::Shippo { api_key: String::new() }
            .resolve_with(env(&[("SHIPPO_API_KEY", "sh")]))
            .unwrap();
        assert_eq!(resolved, ProviderConfig::Shippo { api_key: "sh".to_string() });

        let configured = ProviderConfig::EasyPost { api_key: "file".to_string() }
            .resolve_with(env(&[("EASYPOST_API_KEY", "env")]))
            .unwrap();
        assert_eq!(configured, ProviderConfig::EasyPost { api_key: "file".to_string() });
    }

    #[test]
    fn test_provider_without_key_is_rejected() {
        let result = ProviderConfig::EasyPost { api_key: String::new() }.resolve_with(env(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]\ninterval_secs = 60").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.scheduler.interval_secs, 60);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let config: Config = toml::from_str(include_str!("../config.toml.example")).unwrap();
        let defaults = CollectionConfig::default();

        assert_eq!(config.provider, ProviderConfig::None);
        assert_eq!(config.collection.packages, defaults.packages);
        assert_eq!(config.collection.routes, defaults.routes);
        assert_eq!(config.scheduler.interval_secs, 3600);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}

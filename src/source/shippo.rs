//! Shippo rate shopping

use super::address::{ship_from, ship_to};
use super::{CollectionError, QuoteSource};
use crate::model::{Quote, Subject};
use crate::transport::{HttpTransport, Request};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://api.goshippo.com";

#[derive(Debug, Deserialize)]
struct Shipment {
    #[serde(default)]
    rates: Vec<Rate>,
}

#[derive(Debug, Deserialize)]
struct Rate {
    provider: String,
    #[serde(default)]
    servicelevel: Option<ServiceLevel>,
    amount: Decimal,
    currency: String,
    #[serde(default)]
    estimated_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ServiceLevel {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl Rate {
    fn service(&self) -> String {
        self.servicelevel
            .as_ref()
            .and_then(|level| level.name.clone().or_else(|| level.token.clone()))
            .unwrap_or_default()
    }
}

/// Live multi-carrier quotes from Shippo
pub struct ShippoSource {
    api_key: String,
    transport: Arc<HttpTransport>,
    base_url: String,
}

impl ShippoSource {
    pub fn new(api_key: impl Into<String>, transport: Arc<HttpTransport>) -> Self {
        Self {
            api_key: api_key.into(),
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl QuoteSource for ShippoSource {
    fn id(&self) -> &str {
        "Shippo"
    }

    async fn quote(&self, subject: &Subject) -> Result<Vec<Quote>, CollectionError> {
        let package = &subject.package;
        let body = json!({
            "address_from": ship_from(&subject.route),
            "address_to": ship_to(&subject.route),
            "parcels": [{
                "length": package.length.to_string(),
                "width": package.width.to_string(),
                "height": package.height.to_string(),
                "distance_unit": "in",
                "weight": package.weight.to_string(),
                "mass_unit": "lb",
            }],
            "async": false,
        });

        let request = Request::post_json(format!("{}/shipments/", self.base_url), body)
            .header("Accept", "application/json")
            .header("Authorization", &format!("ShippoToken {}", self.api_key));

        let shipment: Shipment = self
            .transport
            .send(&request)
            .await?
            .json()
            .await
            .map_err(|e| CollectionError::Parse(e.to_string()))?;

        Ok(shipment
            .rates
            .into_iter()
            .map(|rate| {
                let service = rate.service();
                Quote::new(
                    normalize_provider(&rate.provider),
                    service,
                    subject,
                    rate.amount,
                    rate.currency,
                    rate.estimated_days,
                )
            })
            .collect())
    }
}

fn normalize_provider(provider: &str) -> String {
    let name = match provider.to_ascii_lowercase().as_str() {
        "usps" => "USPS",
        "ups" => "UPS",
        "fedex" => "FedEx",
        "dhl_express" => "DHL Express",
        "dhl_ecommerce" => "DHL",
        "canada_post" => "Canada Post",
        "royal_mail" => "Royal Mail",
        "australia_post" => "Australia Post",
        _ => provider,
    };
    name.to_string()
}

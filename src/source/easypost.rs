//! EasyPost rate shopping

use super::address::{ship_from, ship_to};
use super::{CollectionError, QuoteSource};
use crate::model::{Quote, Subject};
use crate::transport::{HttpTransport, Request};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://api.easypost.com/v2";

#[derive(Debug, Deserialize)]
struct Shipment {
    #[serde(default)]
    rates: Vec<Rate>,
}

#[derive(Debug, Deserialize)]
struct Rate {
    carrier: String,
    service: String,
    rate: Decimal,
    currency: String,
    #[serde(default)]
    delivery_days: Option<u32>,
}

/// Live multi-carrier quotes from EasyPost.
///
/// One shipment is created per subject; every returned rate becomes a quote
/// attributed to the underlying carrier.
pub struct EasyPostSource {
    api_key: String,
    transport: Arc<HttpTransport>,
    base_url: String,
}

impl EasyPostSource {
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
impl QuoteSource for EasyPostSource {
    fn id(&self) -> &str {
        "EasyPost"
    }

    async fn quote(&self, subject: &Subject) -> Result<Vec<Quote>, CollectionError> {
        let package = &subject.package;
        let body = json!({
            "shipment": {
                "from_address": ship_from(&subject.route),
                "to_address": ship_to(&subject.route),
                "parcel": {
                    "length": package.length,
                    "width": package.width,
                    "height": package.height,
                    // ounces
                    "weight": package.weight * dec!(16),
                },
            }
        });

        let request = Request::post_json(format!("{}/shipments", self.base_url), body)
            .header("Accept", "application/json")
            .basic_auth(self.api_key.as_str());

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
                Quote::new(
                    normalize_carrier(&rate.carrier),
                    rate.service,
                    subject,
                    rate.rate,
                    rate.currency,
                    rate.delivery_days,
                )
            })
            .collect())
    }
}

fn normalize_carrier(carrier: &str) -> &str {
    match carrier {
        "FedExSmartPost" => "FedEx",
        "DHL" | "DHLExpress" => "DHL Express",
        "DHLGlobalMail" => "DHL",
        "CanadaPost" => "Canada Post",
        "RoyalMail" => "Royal Mail",
        other => other,
    }
}

//! USPS retail calculator lookup with rate-card fallback

use super::carriers::usps_card;
use super::estimate::EstimatedSource;
use super::{CollectionError, QuoteSource};
use crate::model::{Quote, Subject};
use crate::transport::{HttpTransport, Request};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://postcalc.usps.com";

#[derive(Debug, Deserialize)]
struct MailServicesResponse {
    #[serde(rename = "MailServices", default)]
    mail_services: Vec<MailService>,
}

#[derive(Debug, Deserialize)]
struct MailService {
    #[serde(rename = "ServiceName", default)]
    service_name: String,
    #[serde(rename = "TotalPrice", default)]
    total_price: Option<Decimal>,
    #[serde(rename = "DeliveryTimeLine", default)]
    delivery_time_line: String,
}

/// USPS quotes.
///
/// Domestic parcels are priced by the public postage calculator; anything it
/// cannot answer, and every international parcel, comes from the rate card.
pub struct UspsSource {
    transport: Arc<HttpTransport>,
    base_url: String,
    estimates: EstimatedSource,
}

impl UspsSource {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            estimates: EstimatedSource::new("USPS", usps_card()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn calculator_quotes(&self, subject: &Subject) -> Result<Vec<Quote>, CollectionError> {
        let package = &subject.package;
        let route = &subject.route;

        let request = Request::get(format!("{}/Calculator/GetMailServices", self.base_url))
            .header("Accept", "application/json")
            .query("countrycode", "US")
            .query("mailtype", "Package")
            .query("pricetype", "RETAIL")
            .query("oz", route.origin_zip.as_str())
            .query("dz", route.destination_zip.as_str())
            .query("length", package.length.to_string())
            .query("width", package.width.to_string())
            .query("height", package.height.to_string())
            .query("weight", package.weight.to_string())
            .query("rect", "true");

        let response = self.transport.send(&request).await?;
        let body: MailServicesResponse = response
            .json()
            .await
            .map_err(|e| CollectionError::Parse(e.to_string()))?;

        Ok(body
            .mail_services
            .into_iter()
            .filter_map(|service| {
                let price = service.total_price.filter(|p| *p > Decimal::ZERO)?;
                Some(Quote::new(
                    "USPS",
                    service.service_name,
                    subject,
                    price,
                    "USD",
                    parse_delivery_days(&service.delivery_time_line),
                ))
            })
            .collect())
    }
}

#[async_trait]
impl QuoteSource for UspsSource {
    fn id(&self) -> &str {
        "USPS"
    }

    async fn quote(&self, subject: &Subject) -> Result<Vec<Quote>, CollectionError> {
        let route = &subject.route;
        if route.origin_country != "US" || route.destination_country != "US" {
            return Ok(self.estimates.estimate(subject));
        }

        match self.calculator_quotes(subject).await {
            Ok(quotes) if !quotes.is_empty() => Ok(quotes),
            Ok(_) => {
                tracing::debug!(%subject, "Calculator returned no services, using estimates");
                Ok(self.estimates.estimate(subject))
            }
            Err(e) => {
                tracing::warn!(%subject, error = %e, "Calculator lookup failed, using estimates");
                Ok(self.estimates.estimate(subject))
            }
        }
    }
}

/// First whole number in a delivery description such as "2-3 business days"
fn parse_delivery_days(description: &str) -> Option<u32> {
    let digits: String = description
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

//! Quote and subject types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parcel with dimensions (inches) and weight (pounds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub weight: Decimal,
}

impl Package {
    /// Cubic volume in inches
    pub fn volume(&self) -> Decimal {
        self.length * self.width * self.height
    }

    /// "LxWxH" display string
    pub fn dimensions(&self) -> String {
        format!("{}x{}x{}", self.length, self.width, self.height)
    }
}

/// An origin/destination pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub origin_zip: String,
    pub origin_country: String,
    pub destination_zip: String,
    pub destination_country: String,
}

impl Route {
    /// True when origin and destination are in the same country
    pub fn is_domestic(&self) -> bool {
        self.origin_country == self.destination_country
    }
}

/// The thing being priced: one package shipped along one route
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub package: Package,
    pub route: Route,
}

impl Subject {
    pub fn new(package: Package, route: Route) -> Self {
        Self { package, route }
    }

    /// Full cross-product of packages and routes, package-major
    pub fn cross_product(packages: &[Package], routes: &[Route]) -> Vec<Subject> {
        packages
            .iter()
            .flat_map(|p| routes.iter().map(move |r| Subject::new(p.clone(), r.clone())))
            .collect()
    }

    /// Identifier used in quote keys
    pub fn id(&self) -> String {
        subject_id(
            &self.package.name,
            &self.route.origin_zip,
            &self.route.destination_zip,
        )
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.package.name, self.route.name)
    }
}

fn subject_id(package: &str, origin: &str, destination: &str) -> String {
    format!("{}|{}|{}", package, origin, destination)
}

/// Identity of "the same priced thing" across observations.
///
/// Price and timestamp are deliberately not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuoteKey {
    pub source: String,
    pub service: String,
    pub subject: String,
}

impl QuoteKey {
    pub fn new(
        source: impl Into<String>,
        service: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            service: service.into(),
            subject: subject.into(),
        }
    }
}

impl fmt::Display for QuoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.source, self.service, self.subject)
    }
}

/// A single price observation from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Carrier or provider that produced the price
    pub source: String,
    /// Service tier (e.g. "UPS Ground")
    pub service: String,
    /// Package name
    pub package: String,
    /// Origin postal code
    pub origin: String,
    pub origin_country: String,
    /// Destination postal code
    pub destination: String,
    pub destination_country: String,
    /// Quoted price
    pub price: Decimal,
    /// ISO currency code
    pub currency: String,
    /// Estimated transit time
    #[serde(default)]
    pub delivery_days: Option<u32>,
    /// When the price was observed
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a quote for a subject, stamped with the current time
    pub fn new(
        source: impl Into<String>,
        service: impl Into<String>,
        subject: &Subject,
        price: Decimal,
        currency: impl Into<String>,
        delivery_days: Option<u32>,
    ) -> Self {
        Self {
            source: source.into(),
            service: service.into(),
            package: subject.package.name.clone(),
            origin: subject.route.origin_zip.clone(),
            origin_country: subject.route.origin_country.clone(),
            destination: subject.route.destination_zip.clone(),
            destination_country: subject.route.destination_country.clone(),
            price,
            currency: currency.into(),
            delivery_days,
            timestamp: Utc::now(),
        }
    }

    /// Override the observation time
    pub fn observed_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn subject_id(&self) -> String {
        subject_id(&self.package, &self.origin, &self.destination)
    }

    pub fn key(&self) -> QuoteKey {
        QuoteKey::new(&self.source, &self.service, self.subject_id())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rust_decimal_macros::dec;

    pub fn package() -> Package {
        Package {
            name: "Small".to_string(),
            length: dec!(6),
            width: dec!(4),
            height: dec!(2),
            weight: dec!(1),
        }
    }

    pub fn route() -> Route {
        Route {
            name: "US Domestic (NY to LA)".to_string(),
            origin_zip: "10001".to_string(),
            origin_country: "US".to_string(),
            destination_zip: "90001".to_string(),
            destination_country: "US".to_string(),
        }
    }

    pub fn subject() -> Subject {
        Subject::new(package(), route())
    }

    pub fn quote(source: &str, service: &str, price: Decimal) -> Quote {
        Quote::new(source, service, &subject(), price, "USD", None)
    }
}

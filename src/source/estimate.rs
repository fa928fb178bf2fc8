//! Rate-card based price estimates

use super::{CollectionError, QuoteSource};
use crate::model::{Package, Quote, Route, Subject};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// How the chargeable weight of a package is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    /// Actual weight only
    Actual,
    /// Larger of actual weight and `volume / divisor`
    Dimensional { divisor: Decimal },
}

impl Weighting {
    pub const DIM_139: Weighting = Weighting::Dimensional {
        divisor: Decimal::from_parts(139, 0, 0, false, 0),
    };

    pub fn billable_weight(&self, package: &Package) -> Decimal {
        match *self {
            Weighting::Actual => package.weight,
            Weighting::Dimensional { divisor } => package.weight.max(package.volume() / divisor),
        }
    }
}

/// Price components of one service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRate {
    pub service: &'static str,
    pub base: Decimal,
    pub per_lb: Decimal,
    pub delivery_days: Option<u32>,
    /// Service is not offered above this weight
    pub max_weight: Option<Decimal>,
}

impl ServiceRate {
    pub fn new(service: &'static str, base: Decimal, per_lb: Decimal, delivery_days: Option<u32>) -> Self {
        Self {
            service,
            base,
            per_lb,
            delivery_days,
            max_weight: None,
        }
    }

    pub fn max_weight(mut self, weight: Decimal) -> Self {
        self.max_weight = Some(weight);
        self
    }
}

/// Services for one class of route, with surcharges applied to every service
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub services: Vec<ServiceRate>,
    /// Fuel/international surcharge applied to the whole price
    pub multiplier: Decimal,
    /// `(volume threshold, factor)` pairs, each applied when volume exceeds the threshold
    pub volume_surcharges: Vec<(Decimal, Decimal)>,
}

impl RateTable {
    pub fn new(multiplier: Decimal, services: Vec<ServiceRate>) -> Self {
        Self {
            services,
            multiplier,
            volume_surcharges: vec![],
        }
    }

    pub fn with_volume_surcharge(mut self, threshold: Decimal, factor: Decimal) -> Self {
        self.volume_surcharges.push((threshold, factor));
        self
    }
}

/// Which routes a carrier serves and which table prices them
#[derive(Debug, Clone, PartialEq)]
pub struct RateCard {
    pub weighting: Weighting,
    pub domestic: RateTable,
    pub international: RateTable,
    /// Domestic pricing only applies within this country
    pub domestic_country: Option<&'static str>,
    /// Only routes originating here are served
    pub origin_country: Option<&'static str>,
}

impl RateCard {
    /// Table for a route, or `None` when the route is not served
    pub fn table_for(&self, route: &Route) -> Option<&RateTable> {
        if let Some(origin) = self.origin_country {
            if route.origin_country != origin {
                return None;
            }
        }

        let domestic = route.is_domestic()
            && self
                .domestic_country
                .map_or(true, |country| route.origin_country == country);

        Some(if domestic {
            &self.domestic
        } else {
            &self.international
        })
    }

    /// Estimated `(service, price, delivery days)` rows for a subject
    pub fn estimate(&self, subject: &Subject) -> Vec<(&'static str, Decimal, Option<u32>)> {
        let Some(table) = self.table_for(&subject.route) else {
            return vec![];
        };

        let package = &subject.package;
        let weight = self.weighting.billable_weight(package);
        let volume = package.volume();

        table
            .services
            .iter()
            .filter(|rate| rate.max_weight.map_or(true, |max| package.weight <= max))
            .map(|rate| {
                let mut price = (rate.base + weight * rate.per_lb) * table.multiplier;
                for &(threshold, factor) in &table.volume_surcharges {
                    if volume > threshold {
                        price *= factor;
                    }
                }
                (rate.service, price.round_dp(2), rate.delivery_days)
            })
            .collect()
    }
}

/// Source that prices subjects from a static rate card
pub struct EstimatedSource {
    name: &'static str,
    card: RateCard,
    currency: &'static str,
}

impl EstimatedSource {
    pub fn new(name: &'static str, card: RateCard) -> Self {
        Self {
            name,
            card,
            currency: "USD",
        }
    }

    pub fn card(&self) -> &RateCard {
        &self.card
    }

    /// Quotes computed from the rate card alone
    pub fn estimate(&self, subject: &Subject) -> Vec<Quote> {
        self.card
            .estimate(subject)
            .into_iter()
            .map(|(service, price, days)| {
                Quote::new(self.name, service, subject, price, self.currency, days)
            })
            .collect()
    }
}

#[async_trait]
impl QuoteSource for EstimatedSource {
    fn id(&self) -> &str {
        self.name
    }

    async fn quote(&self, subject: &Subject) -> Result<Vec<Quote>, CollectionError> {
        Ok(self.estimate(subject))
    }
}

/// Surcharge-free multiplier
pub(crate) const FLAT: Decimal = Decimal::ONE;

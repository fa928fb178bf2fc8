//! Published rate cards for the built-in carriers

use super::estimate::{EstimatedSource, RateCard, RateTable, ServiceRate, Weighting, FLAT};
use rust_decimal_macros::dec;

/// UPS, zone 8 domestic and Western Europe international sheets
pub fn ups() -> EstimatedSource {
    EstimatedSource::new(
        "UPS",
        RateCard {
            weighting: Weighting::DIM_139,
            domestic: RateTable::new(
                dec!(1.15),
                vec![
                    ServiceRate::new("UPS Ground", dec!(12.50), dec!(0.75), Some(5)),
                    ServiceRate::new("UPS 3 Day Select", dec!(18.00), dec!(1.20), Some(3)),
                    ServiceRate::new("UPS 2nd Day Air", dec!(28.00), dec!(2.00), Some(2)),
                    ServiceRate::new("UPS Next Day Air Saver", dec!(45.00), dec!(3.50), Some(1)),
                    ServiceRate::new("UPS Next Day Air", dec!(55.00), dec!(4.00), Some(1)),
                ],
            ),
            international: RateTable::new(
                dec!(1.20),
                vec![
                    ServiceRate::new("UPS Worldwide Express", dec!(85.00), dec!(8.00), Some(2)),
                    ServiceRate::new("UPS Worldwide Expedited", dec!(65.00), dec!(6.00), Some(4)),
                    ServiceRate::new("UPS Worldwide Saver", dec!(75.00), dec!(7.00), Some(3)),
                    ServiceRate::new("UPS Standard (International)", dec!(45.00), dec!(4.00), Some(7)),
                ],
            ),
            domestic_country: None,
            origin_country: None,
        },
    )
}

/// FedEx, zone 8 domestic and international sheets
pub fn fedex() -> EstimatedSource {
    EstimatedSource::new(
        "FedEx",
        RateCard {
            weighting: Weighting::DIM_139,
            domestic: RateTable::new(
                dec!(1.16),
                vec![
                    ServiceRate::new("FedEx Ground", dec!(11.80), dec!(0.70), Some(5)),
                    ServiceRate::new("FedEx Home Delivery", dec!(12.50), dec!(0.75), Some(5)),
                    ServiceRate::new("FedEx Express Saver", dec!(22.00), dec!(1.80), Some(3)),
                    ServiceRate::new("FedEx 2Day", dec!(30.00), dec!(2.20), Some(2)),
                    ServiceRate::new("FedEx 2Day AM", dec!(35.00), dec!(2.50), Some(2)),
                    ServiceRate::new("FedEx Priority Overnight", dec!(52.00), dec!(3.80), Some(1)),
                    ServiceRate::new("FedEx Standard Overnight", dec!(48.00), dec!(3.50), Some(1)),
                ],
            ),
            international: RateTable::new(
                dec!(1.22),
                vec![
                    ServiceRate::new("FedEx International Priority", dec!(80.00), dec!(7.50), Some(2)),
                    ServiceRate::new("FedEx International Economy", dec!(55.00), dec!(5.00), Some(5)),
                    ServiceRate::new("FedEx International First", dec!(95.00), dec!(9.00), Some(1)),
                    ServiceRate::new("FedEx International Ground", dec!(40.00), dec!(3.50), Some(7)),
                ],
            ),
            domestic_country: None,
            origin_country: None,
        },
    )
}

/// DHL Express; domestic service only within the US
pub fn dhl() -> EstimatedSource {
    EstimatedSource::new(
        "DHL",
        RateCard {
            weighting: Weighting::DIM_139,
            domestic: RateTable::new(
                dec!(1.18),
                vec![
                    ServiceRate::new("DHL Express Domestic", dec!(35.00), dec!(2.50), Some(2)),
                    ServiceRate::new("DHL Express 12:00", dec!(55.00), dec!(4.00), Some(1)),
                ],
            ),
            international: RateTable::new(
                dec!(1.20),
                vec![
                    ServiceRate::new("DHL Express Worldwide", dec!(70.00), dec!(6.50), Some(3)),
                    ServiceRate::new("DHL Express 9:00", dec!(120.00), dec!(10.00), Some(2)),
                    ServiceRate::new("DHL Express 12:00", dec!(100.00), dec!(8.50), Some(2)),
                    ServiceRate::new("DHL Economy Select", dec!(50.00), dec!(4.50), Some(6)),
                ],
            ),
            domestic_country: Some("US"),
            origin_country: None,
        },
    )
}

/// USPS retail estimates: actual weight, volume surcharges on domestic parcels
pub(crate) fn usps_card() -> RateCard {
    RateCard {
        weighting: Weighting::Actual,
        domestic: RateTable::new(
            FLAT,
            vec![
                ServiceRate::new("Priority Mail", dec!(8.70), dec!(1.50), None),
                ServiceRate::new("Priority Mail Express", dec!(28.75), dec!(2.00), None),
                ServiceRate::new("USPS Ground Advantage", dec!(5.50), dec!(0.80), None),
                ServiceRate::new("Media Mail", dec!(3.65), dec!(0.65), None),
            ],
        )
        .with_volume_surcharge(dec!(500), dec!(1.2))
        .with_volume_surcharge(dec!(1000), dec!(1.3)),
        international: RateTable::new(
            FLAT,
            vec![
                ServiceRate::new("Priority Mail International", dec!(45.00), dec!(5.00), None),
                ServiceRate::new("Priority Mail Express International", dec!(65.00), dec!(7.00), None),
                ServiceRate::new("First-Class Package International", dec!(15.00), dec!(3.00), None)
                    .max_weight(dec!(4)),
            ],
        ),
        domestic_country: None,
        origin_country: Some("US"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::quote::fixtures;
    use crate::model::{Package, Route, Subject};
    use rust_decimal::Decimal;

    fn large() -> Package {
        Package {
            name: "Large".to_string(),
            length: dec!(18),
            width: dec!(12),
            height: dec!(10),
            weight: dec!(15),
        }
    }

    fn to_uk() -> Route {
        Route {
            name: "US to UK".to_string(),
            origin_zip: "10001".to_string(),
            origin_country: "US".to_string(),
            destination_zip: "SW1A 1AA".to_string(),
            destination_country: "GB".to_string(),
        }
    }

    fn price_of(rows: &[(&'static str, Decimal, Option<u32>)], service: &str) -> Decimal {
        rows.iter().find(|r| r.0 == service).unwrap().1
    }

    #[test]
    fn test_ups_ground_small_domestic() {
        // (12.50 + 1 * 0.75) * 1.15
        let rows = ups().card().estimate(&fixtures::subject());
        assert_eq!(rows.len(), 5);
        assert_eq!(price_of(&rows, "UPS Ground"), dec!(15.24));
    }

    #[test]
    fn test_fedex_uses_dimensional_weight() {
        let subject = Subject::new(large(), fixtures::route());
        let rows = fedex().card().estimate(&subject);
        // 2160 / 139 = 15.54 lb billable
        let ground = price_of(&rows, "FedEx Ground");
        assert!(ground > (dec!(11.80) + dec!(15) * dec!(0.70)) * dec!(1.16));
    }

    #[test]
    fn test_dhl_international_tables() {
        let rows = dhl().card().estimate(&Subject::new(fixtures::package(), to_uk()));
        assert_eq!(rows.len(), 4);
        // (70 + 6.50) * 1.20
        assert_eq!(price_of(&rows, "DHL Express Worldwide"), dec!(91.80));
    }

    #[test]
    fn test_usps_volume_surcharges() {
        let subject = Subject::new(large(), fixtures::route());
        let rows = usps_card().estimate(&subject);
        // (8.70 + 15 * 1.50) * 1.2 * 1.3
        assert_eq!(price_of(&rows, "Priority Mail"), dec!(48.67));
    }

    #[test]
    fn test_usps_first_class_weight_cap() {
        let rows = usps_card().estimate(&Subject::new(large(), to_uk()));
        assert_eq!(rows.len(), 2);
        let rows = usps_card().estimate(&Subject::new(fixtures::package(), to_uk()));
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_usps_requires_us_origin() {
        let mut route = to_uk();
        route.origin_country = "CA".to_string();
        assert!(usps_card().estimate(&Subject::new(fixtures::package(), route)).is_empty());
    }
}

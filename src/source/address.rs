//! Placeholder street addresses for rate-shopping requests

use crate::model::Route;
use serde_json::{json, Value};

/// Sender address at the route's origin postal code
pub(super) fn ship_from(route: &Route) -> Value {
    json!({
        "street1": "123 Main St",
        "city": "New York",
        "state": "NY",
        "zip": route.origin_zip,
        "country": route.origin_country,
    })
}

/// Recipient address at the route's destination postal code
pub(super) fn ship_to(route: &Route) -> Value {
    if route.destination_country == "US" {
        json!({
            "street1": "456 Oak Ave",
            "city": "Los Angeles",
            "state": "CA",
            "zip": route.destination_zip,
            "country": route.destination_country,
        })
    } else {
        json!({
            "street1": "10 Downing St",
            "city": "London",
            "zip": route.destination_zip,
            "country": route.destination_country,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::quote::fixtures;

    #[test]
    fn test_recipient_city_follows_destination() {
        let mut route = fixtures::route();
        assert_eq!(ship_to(&route)["city"], "Los Angeles");
        assert_eq!(ship_from(&route)["zip"], "10001");

        route.destination_country = "GB".to_string();
        let to = ship_to(&route);
        assert_eq!(to["city"], "London");
        assert!(to.get("state").is_none());
    }
}

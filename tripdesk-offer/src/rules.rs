use chrono::NaiveDate;
use serde::Deserialize;
use tripdesk_core::{CoreError, CoreResult};

use crate::models::{Offer, TransportMode};

/// Validates a full offer record. Runs on create and on the merged record
/// after a partial update.
pub fn validate_offer(offer: &Offer) -> CoreResult<()> {
    if offer.date_to < offer.date_from {
        return Err(CoreError::Validation(
            "date_to must not be before date_from".to_string(),
        ));
    }
    if offer.capacity_available < 0 {
        return Err(CoreError::Validation(
            "capacity_available cannot be negative".to_string(),
        ));
    }
    if offer.capacity_available > offer.capacity_total {
        return Err(CoreError::Validation(
            "capacity_available cannot exceed capacity_total".to_string(),
        ));
    }
    if offer.price_transport_mode.is_self_arranged() && offer.price_transport_amount.is_some() {
        return Err(CoreError::Validation(format!(
            "price_transport_amount must be null for transport_mode={}",
            offer.price_transport_mode.as_str()
        )));
    }
    if offer.price_housing < 0 {
        return Err(CoreError::Validation(
            "price_housing cannot be negative".to_string(),
        ));
    }
    if offer.price_food < 0 {
        return Err(CoreError::Validation(
            "price_food cannot be negative".to_string(),
        ));
    }
    if let Some(amount) = offer.price_transport_amount {
        if amount < 0 {
            return Err(CoreError::Validation(
                "price_transport_amount cannot be negative".to_string(),
            ));
        }
    }
    Ok(())
}

/// Browse/list filters. Everything except the price range is a store
/// predicate; the price range works on the derived total price and is
/// applied in application code after the other predicates so the rule stays
/// store-agnostic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferFilter {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub capacity_min: Option<i32>,
    pub capacity_max: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub season: Option<String>,
    pub type_of_stay: Option<Vec<String>>,
    pub transport_mode: Option<TransportMode>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
}

impl OfferFilter {
    /// Store-level predicates (everything but price).
    pub fn matches_store(&self, offer: &Offer) -> bool {
        if let Some(origin) = &self.origin {
            if !contains_ci(&offer.origin, origin) {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if !contains_ci(&offer.destination, destination) {
                return false;
            }
        }
        if let Some(min) = self.capacity_min {
            if offer.capacity_available < min {
                return false;
            }
        }
        if let Some(max) = self.capacity_max {
            if offer.capacity_available > max {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if offer.date_from < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if offer.date_to > to {
                return false;
            }
        }
        if let Some(season) = &self.season {
            if !offer.season.eq_ignore_ascii_case(season) {
                return false;
            }
        }
        if let Some(stays) = &self.type_of_stay {
            // Any-of membership.
            let hit = stays.iter().any(|wanted| {
                offer
                    .type_of_stay
                    .iter()
                    .any(|have| have.eq_ignore_ascii_case(wanted))
            });
            if !hit {
                return false;
            }
        }
        if let Some(mode) = self.transport_mode {
            if offer.price_transport_mode != mode {
                return false;
            }
        }
        true
    }

    /// Derived total-price predicate, applied after the store filters.
    pub fn matches_price(&self, offer: &Offer) -> bool {
        let price = offer.total_price();
        if let Some(min) = self.price_min {
            if price < min {
                return false;
            }
        }
        if let Some(max) = self.price_max {
            if price > max {
                return false;
            }
        }
        true
    }

    /// Applies the price range to an already store-filtered list.
    pub fn apply_price_range(&self, offers: Vec<Offer>) -> Vec<Offer> {
        if self.price_min.is_none() && self.price_max.is_none() {
            return offers;
        }
        offers
            .into_iter()
            .filter(|o| self.matches_price(o))
            .collect()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OfferDraft;

    fn offer() -> Offer {
        OfferDraft {
            destination_name: "Dolomites".to_string(),
            country: "Italy".to_string(),
            city: Some("Ortisei".to_string()),
            origin: "Munich".to_string(),
            destination: "Val Gardena".to_string(),
            capacity_available: 6,
            capacity_total: 10,
            date_from: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2026, 1, 17).unwrap(),
            season: "winter".to_string(),
            type_of_stay: vec!["hotel".to_string(), "ski".to_string()],
            price_housing: 700,
            price_food: 150,
            price_transport_mode: TransportMode::TrainBus,
            price_transport_amount: Some(120),
            short_description: "Ski week".to_string(),
            extended_description: None,
            image_url: None,
            image_credit_source: None,
            image_credit_author: None,
            image_credit_link: None,
        }
        .into_offer("agent-1".to_string())
    }

    #[test]
    fn accepts_a_valid_offer() {
        assert!(validate_offer(&offer()).is_ok());
    }

    #[test]
    fn rejects_inverted_date_range() {
        let mut o = offer();
        o.date_to = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert!(matches!(validate_offer(&o), Err(CoreError::Validation(_))));
    }

    #[test]
    fn rejects_available_above_total() {
        let mut o = offer();
        o.capacity_available = 11;
        assert!(validate_offer(&o).is_err());
    }

    #[test]
    fn rejects_transport_amount_for_self_arranged_modes() {
        for mode in [TransportMode::CarOwn, TransportMode::NoTransport] {
            let mut o = offer();
            o.price_transport_mode = mode;
            assert!(validate_offer(&o).is_err());
            o.price_transport_amount = None;
            assert!(validate_offer(&o).is_ok());
        }
    }

    #[test]
    fn rejects_negative_prices() {
        let mut o = offer();
        o.price_food = -1;
        assert!(validate_offer(&o).is_err());
    }

    #[test]
    fn substring_filters_are_case_insensitive() {
        let filter = OfferFilter {
            destination: Some("gardena".to_string()),
            ..Default::default()
        };
        assert!(filter.matches_store(&offer()));

        let filter = OfferFilter {
            origin: Some("vienna".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches_store(&offer()));
    }

    #[test]
    fn type_of_stay_is_any_of() {
        let filter = OfferFilter {
            type_of_stay: Some(vec!["camping".to_string(), "ski".to_string()]),
            ..Default::default()
        };
        assert!(filter.matches_store(&offer()));

        let filter = OfferFilter {
            type_of_stay: Some(vec!["camping".to_string()]),
            ..Default::default()
        };
        assert!(!filter.matches_store(&offer()));
    }

    #[test]
    fn price_range_uses_derived_total() {
        // 700 + 150 + 120 = 970
        let filter = OfferFilter {
            price_min: Some(900),
            price_max: Some(1000),
            ..Default::default()
        };
        let kept = filter.apply_price_range(vec![offer()]);
        assert_eq!(kept.len(), 1);

        let filter = OfferFilter {
            price_max: Some(950),
            ..Default::default()
        };
        assert!(filter.apply_price_range(vec![offer()]).is_empty());
    }
}

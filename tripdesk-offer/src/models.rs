use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the package gets travellers to the destination.
///
/// `CarOwn` and `NoTransport` mean the agency sells no transport leg, so a
/// transport price is forbidden for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    TrainBus,
    Plane,
    CarOwn,
    #[serde(rename = "none")]
    NoTransport,
}

impl TransportMode {
    /// Modes where the agency provides no transport and no price may be set.
    pub fn is_self_arranged(&self) -> bool {
        matches!(self, TransportMode::CarOwn | TransportMode::NoTransport)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::TrainBus => "train_bus",
            TransportMode::Plane => "plane",
            TransportMode::CarOwn => "car_own",
            TransportMode::NoTransport => "none",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "train_bus" => Some(TransportMode::TrainBus),
            "plane" => Some(TransportMode::Plane),
            "car_own" => Some(TransportMode::CarOwn),
            "none" => Some(TransportMode::NoTransport),
            _ => None,
        }
    }
}

/// A bookable travel package published by an agent.
///
/// `capacity_available` is a display cache refreshed on confirm/cancel.
/// Admission decisions never read it; they recompute availability from the
/// sum of CONFIRMED orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: Uuid,
    pub agent_session_id: String,
    pub destination_name: String,
    pub country: String,
    pub city: Option<String>,
    pub origin: String,
    pub destination: String,
    pub capacity_available: i32,
    pub capacity_total: i32,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub season: String,
    pub type_of_stay: Vec<String>,
    pub price_housing: i64,
    pub price_food: i64,
    pub price_transport_mode: TransportMode,
    pub price_transport_amount: Option<i64>,
    pub short_description: String,
    pub extended_description: Option<String>,
    pub image_url: Option<String>,
    pub image_credit_source: Option<String>,
    pub image_credit_author: Option<String>,
    pub image_credit_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Housing + food + transport, the price used for range filtering and
    /// order totals.
    pub fn total_price(&self) -> i64 {
        self.price_housing + self.price_food + self.price_transport_amount.unwrap_or(0)
    }

    /// Price for an order that selected `mode`, excluding the transport
    /// component when the customer drives themselves.
    pub fn price_for_transport(&self, mode: TransportMode) -> i64 {
        let transport = if mode == TransportMode::CarOwn {
            0
        } else {
            self.price_transport_amount.unwrap_or(0)
        };
        self.price_housing + self.price_food + transport
    }
}

/// Payload for creating an offer; the store assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferDraft {
    pub destination_name: String,
    pub country: String,
    #[serde(default)]
    pub city: Option<String>,
    pub origin: String,
    pub destination: String,
    pub capacity_available: i32,
    pub capacity_total: i32,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub season: String,
    #[serde(default)]
    pub type_of_stay: Vec<String>,
    pub price_housing: i64,
    #[serde(default)]
    pub price_food: i64,
    pub price_transport_mode: TransportMode,
    #[serde(default)]
    pub price_transport_amount: Option<i64>,
    pub short_description: String,
    #[serde(default)]
    pub extended_description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_credit_source: Option<String>,
    #[serde(default)]
    pub image_credit_author: Option<String>,
    #[serde(default)]
    pub image_credit_link: Option<String>,
}

impl OfferDraft {
    pub fn into_offer(self, agent_session_id: String) -> Offer {
        let now = Utc::now();
        Offer {
            id: Uuid::new_v4(),
            agent_session_id,
            destination_name: self.destination_name,
            country: self.country,
            city: self.city,
            origin: self.origin,
            destination: self.destination,
            capacity_available: self.capacity_available,
            capacity_total: self.capacity_total,
            date_from: self.date_from,
            date_to: self.date_to,
            season: self.season,
            type_of_stay: self.type_of_stay,
            price_housing: self.price_housing,
            price_food: self.price_food,
            price_transport_mode: self.price_transport_mode,
            price_transport_amount: self.price_transport_amount,
            short_description: self.short_description,
            extended_description: self.extended_description,
            image_url: self.image_url,
            image_credit_source: self.image_credit_source,
            image_credit_author: self.image_credit_author,
            image_credit_link: self.image_credit_link,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an offer. Absent fields keep their current value;
/// the merged record is re-validated as a whole.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferPatch {
    pub destination_name: Option<String>,
    pub country: Option<String>,
    #[serde(default, with = "double_option")]
    pub city: Option<Option<String>>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub capacity_available: Option<i32>,
    pub capacity_total: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub season: Option<String>,
    pub type_of_stay: Option<Vec<String>>,
    pub price_housing: Option<i64>,
    pub price_food: Option<i64>,
    pub price_transport_mode: Option<TransportMode>,
    #[serde(default, with = "double_option")]
    pub price_transport_amount: Option<Option<i64>>,
    pub short_description: Option<String>,
    #[serde(default, with = "double_option")]
    pub extended_description: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub image_credit_source: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub image_credit_author: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub image_credit_link: Option<Option<String>>,
}

impl OfferPatch {
    /// Merge the patch into `offer` in place and bump `updated_at`.
    pub fn apply(self, offer: &mut Offer) {
        if let Some(v) = self.destination_name {
            offer.destination_name = v;
        }
        if let Some(v) = self.country {
            offer.country = v;
        }
        if let Some(v) = self.city {
            offer.city = v;
        }
        if let Some(v) = self.origin {
            offer.origin = v;
        }
        if let Some(v) = self.destination {
            offer.destination = v;
        }
        if let Some(v) = self.capacity_available {
            offer.capacity_available = v;
        }
        if let Some(v) = self.capacity_total {
            offer.capacity_total = v;
        }
        if let Some(v) = self.date_from {
            offer.date_from = v;
        }
        if let Some(v) = self.date_to {
            offer.date_to = v;
        }
        if let Some(v) = self.season {
            offer.season = v;
        }
        if let Some(v) = self.type_of_stay {
            offer.type_of_stay = v;
        }
        if let Some(v) = self.price_housing {
            offer.price_housing = v;
        }
        if let Some(v) = self.price_food {
            offer.price_food = v;
        }
        if let Some(v) = self.price_transport_mode {
            offer.price_transport_mode = v;
        }
        if let Some(v) = self.price_transport_amount {
            offer.price_transport_amount = v;
        }
        if let Some(v) = self.short_description {
            offer.short_description = v;
        }
        if let Some(v) = self.extended_description {
            offer.extended_description = v;
        }
        if let Some(v) = self.image_url {
            offer.image_url = v;
        }
        if let Some(v) = self.image_credit_source {
            offer.image_credit_source = v;
        }
        if let Some(v) = self.image_credit_author {
            offer.image_credit_author = v;
        }
        if let Some(v) = self.image_credit_link {
            offer.image_credit_link = v;
        }
        offer.updated_at = Utc::now();
    }
}

/// Distinguishes "field absent" from "field set to null" in PATCH bodies.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> OfferDraft {
        OfferDraft {
            destination_name: "Lofoten".to_string(),
            country: "Norway".to_string(),
            city: None,
            origin: "Oslo".to_string(),
            destination: "Svolvaer".to_string(),
            capacity_available: 8,
            capacity_total: 8,
            date_from: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2026, 6, 8).unwrap(),
            season: "summer".to_string(),
            type_of_stay: vec!["cabin".to_string()],
            price_housing: 900,
            price_food: 200,
            price_transport_mode: TransportMode::Plane,
            price_transport_amount: Some(300),
            short_description: "Midnight sun".to_string(),
            extended_description: None,
            image_url: None,
            image_credit_source: None,
            image_credit_author: None,
            image_credit_link: None,
        }
    }

    #[test]
    fn total_price_sums_all_components() {
        let offer = draft().into_offer("agent-1".to_string());
        assert_eq!(offer.total_price(), 1400);
    }

    #[test]
    fn car_own_selection_excludes_transport_component() {
        let offer = draft().into_offer("agent-1".to_string());
        assert_eq!(offer.price_for_transport(TransportMode::CarOwn), 1100);
        assert_eq!(offer.price_for_transport(TransportMode::Plane), 1400);
    }

    #[test]
    fn transport_mode_round_trips_through_wire_names() {
        for raw in ["train_bus", "plane", "car_own", "none"] {
            let mode = TransportMode::parse(raw).unwrap();
            assert_eq!(mode.as_str(), raw);
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{raw}\""));
        }
        assert!(TransportMode::parse("boat").is_none());
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let mut offer = draft().into_offer("agent-1".to_string());
        offer.city = Some("Svolvaer".to_string());

        let patch: OfferPatch = serde_json::from_str(r#"{"city": null}"#).unwrap();
        patch.apply(&mut offer);
        assert_eq!(offer.city, None);

        offer.city = Some("Svolvaer".to_string());
        let patch: OfferPatch = serde_json::from_str(r#"{"origin": "Bergen"}"#).unwrap();
        patch.apply(&mut offer);
        assert_eq!(offer.city.as_deref(), Some("Svolvaer"));
        assert_eq!(offer.origin, "Bergen");
    }
}

use chrono::NaiveDate;
use serde::Deserialize;
use tripdesk_core::CoreError;
use tripdesk_offer::{OfferFilter, TransportMode};

use crate::error::AppError;

/// Query-string view of `OfferFilter`. `type_of_stay` arrives as a
/// comma-separated list, `transport_mode` as its wire name.
#[derive(Debug, Default, Deserialize)]
pub struct OfferFilterQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub capacity_min: Option<i32>,
    pub capacity_max: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub season: Option<String>,
    pub type_of_stay: Option<String>,
    pub transport_mode: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
}

impl OfferFilterQuery {
    pub fn into_filter(self) -> Result<OfferFilter, AppError> {
        let transport_mode = match self.transport_mode.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(TransportMode::parse(raw).ok_or_else(|| {
                AppError::from(CoreError::Validation(format!(
                    "unknown transport_mode: {raw}"
                )))
            })?),
        };
        let type_of_stay = self.type_of_stay.map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });
        Ok(OfferFilter {
            origin: self.origin,
            destination: self.destination,
            capacity_min: self.capacity_min,
            capacity_max: self.capacity_max,
            date_from: self.date_from,
            date_to: self.date_to,
            season: self.season,
            type_of_stay,
            transport_mode,
            price_min: self.price_min,
            price_max: self.price_max,
        })
    }
}

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tripdesk_core::{CoreError, CoreResult, SessionId};
use tripdesk_offer::{Offer, OfferFilter, OfferRepository, TransportMode};
use uuid::Uuid;

use crate::ledger::OrderLedger;
use crate::models::{response_sort_group, CustomerNote, Order, ResponseStatus};
use crate::repository::NoteRepository;
use crate::responses::ResponseTracker;

/// Secondary sort key for the all-offers view; the primary key is always
/// the response group (accepted, undecided, rejected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Price,
    Date,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// An offer annotated with the browsing customer's stance and note.
#[derive(Debug, Serialize)]
pub struct OfferWithStatus {
    #[serde(flatten)]
    pub offer: Offer,
    pub status: Option<ResponseStatus>,
    pub note: Option<String>,
}

/// Stateless orchestration over the offer store, the response tracker, the
/// note store and the order ledger.
pub struct BookingWorkflow {
    offers: Arc<dyn OfferRepository>,
    notes: Arc<dyn NoteRepository>,
    tracker: Arc<ResponseTracker>,
    ledger: Arc<OrderLedger>,
}

impl BookingWorkflow {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        notes: Arc<dyn NoteRepository>,
        tracker: Arc<ResponseTracker>,
        ledger: Arc<OrderLedger>,
    ) -> Self {
        Self {
            offers,
            notes,
            tracker,
            ledger,
        }
    }

    /// Offers the customer can still act on: everything matching the filter
    /// minus the ones they already accepted or rejected.
    pub async fn list_available(
        &self,
        customer: &SessionId,
        filter: &OfferFilter,
    ) -> CoreResult<Vec<Offer>> {
        let accepted = self
            .tracker
            .offer_ids_with_status(customer, ResponseStatus::Accepted)
            .await?;
        let rejected = self
            .tracker
            .offer_ids_with_status(customer, ResponseStatus::Rejected)
            .await?;

        let offers = self.offers.list(filter).await?;
        let offers = filter.apply_price_range(offers);
        Ok(offers
            .into_iter()
            .filter(|o| !accepted.contains(&o.id) && !rejected.contains(&o.id))
            .collect())
    }

    /// Every offer with the customer's stance and note attached, optionally
    /// narrowed to one partition, grouped accepted < undecided < rejected
    /// and sorted within each group by the caller-chosen key.
    pub async fn list_all_with_status(
        &self,
        customer: &SessionId,
        filter: &OfferFilter,
        status_filter: Option<ResponseStatus>,
        sort: SortKey,
        dir: SortDir,
    ) -> CoreResult<Vec<OfferWithStatus>> {
        let status_map = self.tracker.status_map(customer).await?;
        let notes_map: std::collections::HashMap<Uuid, String> = self
            .notes
            .list_for_customer(customer)
            .await?
            .into_iter()
            .map(|n| (n.offer_id, n.note_text))
            .collect();

        let offers = self.offers.list(filter).await?;
        let offers = filter.apply_price_range(offers);

        let mut rows: Vec<OfferWithStatus> = offers
            .into_iter()
            .map(|offer| {
                let status = status_map.get(&offer.id).copied();
                let note = notes_map.get(&offer.id).cloned();
                OfferWithStatus {
                    offer,
                    status,
                    note,
                }
            })
            .filter(|row| match status_filter {
                None => true,
                // Absent rows belong to the undecided partition.
                Some(ResponseStatus::Undecided) => {
                    matches!(row.status, None | Some(ResponseStatus::Undecided))
                }
                Some(wanted) => row.status == Some(wanted),
            })
            .collect();

        sort_offers_with_status(&mut rows, sort, dir);
        Ok(rows)
    }

    /// Accept-to-order shortcut. This is the first capacity checkpoint;
    /// `OrderLedger::confirm` is the second, authoritative one, because
    /// other customers may confirm between the two steps.
    pub async fn confirm_travel(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        number_of_people: i32,
        selected_transport_mode: TransportMode,
    ) -> CoreResult<Order> {
        self.ledger
            .create(customer, offer_id, number_of_people, selected_transport_mode)
            .await
    }

    /// Offer detail annotated with the customer's note; any offer may be
    /// expanded, not just accepted ones.
    pub async fn offer_detail(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
    ) -> CoreResult<OfferWithStatus> {
        let offer = self
            .offers
            .get(offer_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Offer not found".to_string()))?;
        let status = self.tracker.get(customer, offer_id).await?.map(|r| r.status);
        let note = self
            .notes
            .get(customer, offer_id)
            .await?
            .map(|n| n.note_text);
        Ok(OfferWithStatus {
            offer,
            status,
            note,
        })
    }

    pub async fn upsert_note(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        note_text: String,
    ) -> CoreResult<CustomerNote> {
        self.notes.upsert(customer, offer_id, note_text).await
    }

    pub async fn get_note(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
    ) -> CoreResult<Option<CustomerNote>> {
        self.notes.get(customer, offer_id).await
    }
}

/// Group order is fixed; the direction only flips the secondary key.
pub fn sort_offers_with_status(rows: &mut [OfferWithStatus], sort: SortKey, dir: SortDir) {
    rows.sort_by(|a, b| {
        let group = response_sort_group(a.status).cmp(&response_sort_group(b.status));
        if group != Ordering::Equal {
            return group;
        }
        let secondary = match sort {
            SortKey::Price => a.offer.total_price().cmp(&b.offer.total_price()),
            SortKey::Date => a.offer.date_from.cmp(&b.offer.date_from),
            SortKey::Name => a.offer.destination_name.cmp(&b.offer.destination_name),
        };
        match dir {
            SortDir::Asc => secondary,
            SortDir::Desc => secondary.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tripdesk_offer::OfferDraft;

    fn offer(name: &str, housing: i64, date: NaiveDate) -> Offer {
        OfferDraft {
            destination_name: name.to_string(),
            country: "Italy".to_string(),
            city: None,
            origin: "Rome".to_string(),
            destination: name.to_string(),
            capacity_available: 4,
            capacity_total: 4,
            date_from: date,
            date_to: date + chrono::Duration::days(7),
            season: "summer".to_string(),
            type_of_stay: Vec::new(),
            price_housing: housing,
            price_food: 0,
            price_transport_mode: TransportMode::NoTransport,
            price_transport_amount: None,
            short_description: String::new(),
            extended_description: None,
            image_url: None,
            image_credit_source: None,
            image_credit_author: None,
            image_credit_link: None,
        }
        .into_offer("agent-1".to_string())
    }

    fn row(name: &str, housing: i64, status: Option<ResponseStatus>) -> OfferWithStatus {
        OfferWithStatus {
            offer: offer(name, housing, NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()),
            status,
            note: None,
        }
    }

    #[test]
    fn groups_dominate_the_secondary_key() {
        let mut rows = vec![
            row("Naples", 100, Some(ResponseStatus::Rejected)),
            row("Turin", 900, Some(ResponseStatus::Accepted)),
            row("Milan", 500, None),
            row("Genoa", 300, Some(ResponseStatus::Undecided)),
        ];
        sort_offers_with_status(&mut rows, SortKey::Price, SortDir::Asc);
        let names: Vec<&str> = rows.iter().map(|r| r.offer.destination_name.as_str()).collect();
        // Accepted first despite highest price; rejected last despite lowest.
        assert_eq!(names, vec!["Turin", "Genoa", "Milan", "Naples"]);
    }

    #[test]
    fn desc_flips_only_the_secondary_key() {
        let mut rows = vec![
            row("Bari", 100, Some(ResponseStatus::Accepted)),
            row("Como", 400, Some(ResponseStatus::Accepted)),
            row("Pisa", 200, Some(ResponseStatus::Rejected)),
        ];
        sort_offers_with_status(&mut rows, SortKey::Price, SortDir::Desc);
        let names: Vec<&str> = rows.iter().map(|r| r.offer.destination_name.as_str()).collect();
        // Accepted group still first, prices descending inside it.
        assert_eq!(names, vec!["Como", "Bari", "Pisa"]);
    }

    #[test]
    fn name_key_sorts_alphabetically_within_group() {
        let mut rows = vec![row("Verona", 100, None), row("Ancona", 200, None)];
        sort_offers_with_status(&mut rows, SortKey::Name, SortDir::Asc);
        assert_eq!(rows[0].offer.destination_name, "Ancona");
    }
}

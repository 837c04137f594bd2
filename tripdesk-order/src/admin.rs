use std::sync::Arc;

use tripdesk_core::{CoreError, CoreResult, SessionId};
use tripdesk_offer::{validate_offer, Offer, OfferDraft, OfferFilter, OfferPatch, OfferRepository};
use uuid::Uuid;

use crate::locks::OfferLocks;
use crate::repository::OrderRepository;

/// Agent-side offer management. Lives next to the ledger because deletion
/// must consult the confirmed-order sum: an offer with live confirmed
/// bookings cannot be removed.
pub struct OfferAdmin {
    offers: Arc<dyn OfferRepository>,
    orders: Arc<dyn OrderRepository>,
    locks: Arc<OfferLocks>,
}

impl OfferAdmin {
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        orders: Arc<dyn OrderRepository>,
        locks: Arc<OfferLocks>,
    ) -> Self {
        Self {
            offers,
            orders,
            locks,
        }
    }

    pub async fn create(&self, agent: &SessionId, draft: OfferDraft) -> CoreResult<Offer> {
        let offer = draft.into_offer(agent.as_str().to_string());
        validate_offer(&offer)?;
        self.offers.insert(&offer).await?;
        tracing::info!(offer_id = %offer.id, destination = %offer.destination_name, "offer created");
        Ok(offer)
    }

    pub async fn get(&self, offer_id: Uuid) -> CoreResult<Offer> {
        self.offers
            .get(offer_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Offer not found".to_string()))
    }

    /// Merges the patch and re-validates the whole record before writing.
    pub async fn update(&self, offer_id: Uuid, patch: OfferPatch) -> CoreResult<Offer> {
        let mut offer = self.get(offer_id).await?;
        patch.apply(&mut offer);
        validate_offer(&offer)?;
        self.offers.update(&offer).await?;
        Ok(offer)
    }

    /// Removal is refused while confirmed orders still reference the offer;
    /// the agent has to wait for cancellations or handle them out of band.
    pub async fn delete(&self, offer_id: Uuid) -> CoreResult<()> {
        let _guard = self.locks.acquire(offer_id).await;
        self.get(offer_id).await?;
        let confirmed = self.orders.confirmed_people(offer_id).await?;
        if confirmed > 0 {
            return Err(CoreError::Validation(format!(
                "offer still has {confirmed} confirmed traveller(s); cancel their orders before deleting"
            )));
        }
        self.offers.delete(offer_id).await?;
        tracing::info!(offer_id = %offer_id, "offer deleted");
        Ok(())
    }

    pub async fn list(&self, filter: &OfferFilter) -> CoreResult<Vec<Offer>> {
        let offers = self.offers.list(filter).await?;
        Ok(filter.apply_price_range(offers))
    }
}

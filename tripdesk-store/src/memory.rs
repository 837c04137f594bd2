use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tripdesk_core::{CoreError, CoreResult, SessionId};
use tripdesk_offer::{Offer, OfferFilter, OfferRepository};
use tripdesk_order::{
    CustomerNote, CustomerResponse, NoteRepository, Order, OrderRepository, OrderStatus,
    ResponseRepository, ResponseStatus,
};
use uuid::Uuid;

/// In-process backend implementing every repository trait over hash maps.
///
/// Used by the test suite and selectable via `database.backend = "memory"`.
/// All the booking invariants live in the ledger, so this backend only has
/// to be a faithful row store.
#[derive(Default)]
pub struct MemoryStore {
    offers: RwLock<HashMap<Uuid, Offer>>,
    orders: RwLock<HashMap<Uuid, Order>>,
    responses: RwLock<HashMap<(String, Uuid), CustomerResponse>>,
    notes: RwLock<HashMap<(String, Uuid), CustomerNote>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OfferRepository for MemoryStore {
    async fn insert(&self, offer: &Offer) -> CoreResult<()> {
        self.offers.write().await.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Offer>> {
        Ok(self.offers.read().await.get(&id).cloned())
    }

    async fn update(&self, offer: &Offer) -> CoreResult<()> {
        let mut offers = self.offers.write().await;
        match offers.get_mut(&offer.id) {
            Some(slot) => {
                *slot = offer.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound("Offer not found".to_string())),
        }
    }

    async fn delete(&self, id: Uuid) -> CoreResult<()> {
        match self.offers.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound("Offer not found".to_string())),
        }
    }

    async fn list(&self, filter: &OfferFilter) -> CoreResult<Vec<Offer>> {
        let offers = self.offers.read().await;
        let mut matched: Vec<Offer> = offers
            .values()
            .filter(|o| filter.matches_store(o))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert(&self, order: &Order) -> CoreResult<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, customer: &SessionId, id: Uuid) -> CoreResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .get(&id)
            .filter(|o| o.customer_session_id == customer.as_str())
            .cloned())
    }

    async fn update(&self, order: &Order) -> CoreResult<()> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(slot) => {
                *slot = order.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound("Order not found".to_string())),
        }
    }

    async fn list_for_customer(
        &self,
        customer: &SessionId,
        status: Option<OrderStatus>,
    ) -> CoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|o| o.customer_session_id == customer.as_str())
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn confirmed_people(&self, offer_id: Uuid) -> CoreResult<i32> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.offer_id == offer_id && o.status == OrderStatus::Confirmed)
            .map(|o| o.number_of_people)
            .sum())
    }

    async fn delete(&self, customer: &SessionId, id: Uuid) -> CoreResult<()> {
        let mut orders = self.orders.write().await;
        let owned = orders
            .get(&id)
            .map(|o| o.customer_session_id == customer.as_str())
            .unwrap_or(false);
        if !owned {
            return Err(CoreError::NotFound("Order not found".to_string()));
        }
        orders.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ResponseRepository for MemoryStore {
    async fn upsert(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        status: ResponseStatus,
    ) -> CoreResult<CustomerResponse> {
        let key = (customer.as_str().to_string(), offer_id);
        let mut responses = self.responses.write().await;
        let response = responses
            .entry(key)
            .and_modify(|existing| existing.status = status)
            .or_insert_with(|| CustomerResponse {
                id: Uuid::new_v4(),
                customer_session_id: customer.as_str().to_string(),
                offer_id,
                status,
                created_at: Utc::now(),
            });
        Ok(response.clone())
    }

    async fn get(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
    ) -> CoreResult<Option<CustomerResponse>> {
        let key = (customer.as_str().to_string(), offer_id);
        Ok(self.responses.read().await.get(&key).cloned())
    }

    async fn list_for_customer(&self, customer: &SessionId) -> CoreResult<Vec<CustomerResponse>> {
        Ok(self
            .responses
            .read()
            .await
            .values()
            .filter(|r| r.customer_session_id == customer.as_str())
            .cloned()
            .collect())
    }

    async fn list_by_status(
        &self,
        customer: &SessionId,
        status: ResponseStatus,
    ) -> CoreResult<Vec<CustomerResponse>> {
        Ok(self
            .responses
            .read()
            .await
            .values()
            .filter(|r| r.customer_session_id == customer.as_str() && r.status == status)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn upsert(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        note_text: String,
    ) -> CoreResult<CustomerNote> {
        let key = (customer.as_str().to_string(), offer_id);
        let mut notes = self.notes.write().await;
        let note = notes
            .entry(key)
            .and_modify(|existing| {
                existing.note_text = note_text.clone();
                existing.updated_at = Utc::now();
            })
            .or_insert_with(|| {
                let now = Utc::now();
                CustomerNote {
                    customer_session_id: customer.as_str().to_string(),
                    offer_id,
                    note_text,
                    created_at: now,
                    updated_at: now,
                }
            });
        Ok(note.clone())
    }

    async fn get(&self, customer: &SessionId, offer_id: Uuid) -> CoreResult<Option<CustomerNote>> {
        let key = (customer.as_str().to_string(), offer_id);
        Ok(self.notes.read().await.get(&key).cloned())
    }

    async fn list_for_customer(&self, customer: &SessionId) -> CoreResult<Vec<CustomerNote>> {
        Ok(self
            .notes
            .read()
            .await
            .values()
            .filter(|n| n.customer_session_id == customer.as_str())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> SessionId {
        SessionId::new("cust-1")
    }

    #[tokio::test]
    async fn response_upsert_overwrites_instead_of_duplicating() {
        let store = MemoryStore::new();
        let offer_id = Uuid::new_v4();

        ResponseRepository::upsert(&store, &customer(), offer_id, ResponseStatus::Accepted)
            .await
            .unwrap();
        ResponseRepository::upsert(&store, &customer(), offer_id, ResponseStatus::Rejected)
            .await
            .unwrap();

        let all = ResponseRepository::list_for_customer(&store, &customer())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, ResponseStatus::Rejected);
    }

    #[tokio::test]
    async fn orders_are_scoped_to_their_session() {
        let store = MemoryStore::new();
        let order = Order::new(
            "cust-1".to_string(),
            Uuid::new_v4(),
            2,
            tripdesk_offer::TransportMode::Plane,
        );
        OrderRepository::insert(&store, &order).await.unwrap();

        assert!(OrderRepository::get(&store, &customer(), order.id)
            .await
            .unwrap()
            .is_some());
        let stranger = SessionId::new("cust-2");
        assert!(OrderRepository::get(&store, &stranger, order.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn note_upsert_replaces_text() {
        let store = MemoryStore::new();
        let offer_id = Uuid::new_v4();
        NoteRepository::upsert(&store, &customer(), offer_id, "first".to_string())
            .await
            .unwrap();
        let note = NoteRepository::upsert(&store, &customer(), offer_id, "second".to_string())
            .await
            .unwrap();
        assert_eq!(note.note_text, "second");
        let listed = NoteRepository::list_for_customer(&store, &customer())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}

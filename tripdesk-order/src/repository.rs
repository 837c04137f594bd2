use async_trait::async_trait;
use tripdesk_core::{CoreResult, SessionId};
use uuid::Uuid;

use crate::models::{CustomerNote, CustomerResponse, Order, OrderStatus, ResponseStatus};

/// Data access for orders. `confirmed_people` is the aggregate the ledger
/// derives availability from; it must reflect committed writes immediately.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> CoreResult<()>;

    /// Lookup scoped to the owning customer; other sessions see not-found.
    async fn get(&self, customer: &SessionId, id: Uuid) -> CoreResult<Option<Order>>;

    async fn update(&self, order: &Order) -> CoreResult<()>;

    async fn list_for_customer(
        &self,
        customer: &SessionId,
        status: Option<OrderStatus>,
    ) -> CoreResult<Vec<Order>>;

    /// `sum(number_of_people)` over CONFIRMED orders for the offer.
    async fn confirmed_people(&self, offer_id: Uuid) -> CoreResult<i32>;

    /// Physical row removal.
    async fn delete(&self, customer: &SessionId, id: Uuid) -> CoreResult<()>;
}

/// Data access for customer responses, keyed by (customer, offer).
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Overwrite-on-conflict: a second accept/reject for the same pair
    /// replaces the prior status instead of adding a row.
    async fn upsert(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        status: ResponseStatus,
    ) -> CoreResult<CustomerResponse>;

    async fn get(&self, customer: &SessionId, offer_id: Uuid)
        -> CoreResult<Option<CustomerResponse>>;

    async fn list_for_customer(&self, customer: &SessionId) -> CoreResult<Vec<CustomerResponse>>;

    async fn list_by_status(
        &self,
        customer: &SessionId,
        status: ResponseStatus,
    ) -> CoreResult<Vec<CustomerResponse>>;
}

/// Key-value-like store for per-(customer, offer) notes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn upsert(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        note_text: String,
    ) -> CoreResult<CustomerNote>;

    async fn get(&self, customer: &SessionId, offer_id: Uuid) -> CoreResult<Option<CustomerNote>>;

    async fn list_for_customer(&self, customer: &SessionId) -> CoreResult<Vec<CustomerNote>>;
}

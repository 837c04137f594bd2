use async_trait::async_trait;
use tripdesk_core::CoreResult;
use uuid::Uuid;

use crate::models::Offer;
use crate::rules::OfferFilter;

/// Data access for offers. Implementations must support atomic single-row
/// create/update; the derived price range of `OfferFilter` is applied by
/// callers, not here.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn insert(&self, offer: &Offer) -> CoreResult<()>;

    async fn get(&self, id: Uuid) -> CoreResult<Option<Offer>>;

    async fn update(&self, offer: &Offer) -> CoreResult<()>;

    async fn delete(&self, id: Uuid) -> CoreResult<()>;

    /// All offers matching the store-level predicates of `filter`.
    async fn list(&self, filter: &OfferFilter) -> CoreResult<Vec<Offer>>;
}

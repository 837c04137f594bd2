use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tripdesk_core::{CoreResult, SessionId};
use uuid::Uuid;

use crate::models::{CustomerResponse, ResponseStatus};
use crate::repository::ResponseRepository;

/// Tracks per-customer accept/reject/undecided stances on offers. Every
/// write is an upsert keyed by (customer, offer); re-accepting or rejecting
/// overwrites the prior stance.
pub struct ResponseTracker {
    responses: Arc<dyn ResponseRepository>,
}

impl ResponseTracker {
    pub fn new(responses: Arc<dyn ResponseRepository>) -> Self {
        Self { responses }
    }

    pub async fn accept(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
    ) -> CoreResult<CustomerResponse> {
        self.set_status(customer, offer_id, ResponseStatus::Accepted)
            .await
    }

    pub async fn reject(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
    ) -> CoreResult<CustomerResponse> {
        self.set_status(customer, offer_id, ResponseStatus::Rejected)
            .await
    }

    pub async fn set_status(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        status: ResponseStatus,
    ) -> CoreResult<CustomerResponse> {
        let response = self.responses.upsert(customer, offer_id, status).await?;
        tracing::debug!(customer = %customer, offer_id = %offer_id, status = status.as_str(), "response recorded");
        Ok(response)
    }

    pub async fn get(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
    ) -> CoreResult<Option<CustomerResponse>> {
        self.responses.get(customer, offer_id).await
    }

    pub async fn list_by_status(
        &self,
        customer: &SessionId,
        status: ResponseStatus,
    ) -> CoreResult<Vec<CustomerResponse>> {
        self.responses.list_by_status(customer, status).await
    }

    /// Offer ids the customer has taken the given stance on.
    pub async fn offer_ids_with_status(
        &self,
        customer: &SessionId,
        status: ResponseStatus,
    ) -> CoreResult<HashSet<Uuid>> {
        Ok(self
            .responses
            .list_by_status(customer, status)
            .await?
            .into_iter()
            .map(|r| r.offer_id)
            .collect())
    }

    /// offer_id -> status for every response the customer has recorded.
    pub async fn status_map(
        &self,
        customer: &SessionId,
    ) -> CoreResult<HashMap<Uuid, ResponseStatus>> {
        Ok(self
            .responses
            .list_for_customer(customer)
            .await?
            .into_iter()
            .map(|r| (r.offer_id, r.status))
            .collect())
    }
}

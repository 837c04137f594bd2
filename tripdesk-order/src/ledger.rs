use std::sync::Arc;

use serde::Serialize;
use tripdesk_core::{CoreError, CoreResult, SessionId};
use tripdesk_offer::{Offer, OfferRepository, TransportMode};
use uuid::Uuid;

use crate::locks::OfferLocks;
use crate::models::{GiftDetails, Order, OrderPatch, OrderStatus};
use crate::repository::OrderRepository;

/// Order detail view: the order joined with its offer, the capacity still
/// open on the offer and the price for the selected transport.
#[derive(Debug, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub offer: Offer,
    pub remaining_capacity: i32,
    pub total_price: i64,
}

/// Owns the order lifecycle and its capacity accounting.
///
/// Capacity is never a stored counter decremented at creation: availability
/// is derived from the live sum of CONFIRMED orders at the moment of each
/// admission decision. A PENDING order that never confirms therefore never
/// touches capacity. The `capacity_available` field on the offer is only a
/// display cache, refreshed after every confirm/cancel.
pub struct OrderLedger {
    offers: Arc<dyn OfferRepository>,
    orders: Arc<dyn OrderRepository>,
    locks: Arc<OfferLocks>,
}

impl OrderLedger {
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

    /// First capacity checkpoint: admits a PENDING order only while the
    /// offer still has room. `confirm` re-checks later, because other
    /// customers may confirm in between.
    pub async fn create(
        &self,
        customer: &SessionId,
        offer_id: Uuid,
        number_of_people: i32,
        selected_transport_mode: TransportMode,
    ) -> CoreResult<Order> {
        if number_of_people <= 0 {
            return Err(CoreError::Validation(
                "number_of_people must be positive".to_string(),
            ));
        }

        let _guard = self.locks.acquire(offer_id).await;

        let offer = self.require_offer(offer_id).await?;
        let confirmed = self.orders.confirmed_people(offer_id).await?;
        let available = offer.capacity_total - confirmed;
        if available < number_of_people {
            return Err(CoreError::CapacityExceeded {
                available,
                requested: number_of_people,
            });
        }

        let order = Order::new(
            customer.as_str().to_string(),
            offer_id,
            number_of_people,
            selected_transport_mode,
        );
        self.orders.insert(&order).await?;
        tracing::info!(order_id = %order.id, offer_id = %offer_id, people = number_of_people, "order created");
        Ok(order)
    }

    /// Updates a PENDING order. Any other status reads as not found, so a
    /// caller cannot tell a foreign order from a sealed one.
    pub async fn update(
        &self,
        customer: &SessionId,
        order_id: Uuid,
        patch: OrderPatch,
    ) -> CoreResult<Order> {
        // Locate the offer before taking its lock; the order is re-read
        // under the lock so the capacity check sees a settled state.
        let probe = self.require_pending(customer, order_id).await?;
        let _guard = self.locks.acquire(probe.offer_id).await;
        let mut order = self.require_pending(customer, order_id).await?;

        if let Some(people) = patch.number_of_people {
            if people <= 0 {
                return Err(CoreError::Validation(
                    "number_of_people must be positive".to_string(),
                ));
            }
            if let Some(offer) = self.offers.get(order.offer_id).await? {
                let confirmed = self.orders.confirmed_people(order.offer_id).await?;
                // Exclude this order's own reservation if it were already
                // counted, to avoid double-counting on resize.
                let own = if order.status == OrderStatus::Confirmed {
                    order.number_of_people
                } else {
                    0
                };
                let available = offer.capacity_total - confirmed + own;
                if available < people {
                    return Err(CoreError::CapacityExceeded {
                        available,
                        requested: people,
                    });
                }
            }
            order.number_of_people = people;
        }

        if let Some(mode) = patch.selected_transport_mode {
            order.selected_transport_mode = mode;
        }

        if let Some(requirements) = patch.special_requirements {
            order.special_requirements = requirements;
        }

        match patch.is_gift {
            Some(false) => {
                // Disabling clears the whole sub-record.
                order.gift = None;
            }
            Some(true) => {
                let recipient_email = patch
                    .gift_recipient_email
                    .or_else(|| order.gift.as_ref().map(|g| g.recipient_email.clone()));
                let recipient_name = patch
                    .gift_recipient_name
                    .or_else(|| order.gift.as_ref().map(|g| g.recipient_name.clone()));
                let sender_name = patch
                    .gift_sender_name
                    .or_else(|| order.gift.as_ref().map(|g| g.sender_name.clone()));
                match (recipient_email, recipient_name, sender_name) {
                    (Some(recipient_email), Some(recipient_name), Some(sender_name)) => {
                        order.gift = Some(GiftDetails {
                            recipient_email,
                            recipient_name,
                            sender_name,
                            note: patch.gift_note,
                            subject: patch.gift_subject,
                        });
                    }
                    _ => {
                        return Err(CoreError::Validation(
                            "Gift requires recipient email, recipient name, and sender name"
                                .to_string(),
                        ));
                    }
                }
            }
            None => {
                if let Some(gift) = order.gift.as_mut() {
                    if let Some(v) = patch.gift_recipient_email {
                        gift.recipient_email = v;
                    }
                    if let Some(v) = patch.gift_recipient_name {
                        gift.recipient_name = v;
                    }
                    if let Some(v) = patch.gift_sender_name {
                        gift.sender_name = v;
                    }
                    if let Some(v) = patch.gift_note {
                        gift.note = Some(v);
                    }
                    if let Some(v) = patch.gift_subject {
                        gift.subject = Some(v);
                    }
                }
            }
        }

        self.orders.update(&order).await?;
        Ok(order)
    }

    /// Second, authoritative capacity checkpoint. On failure the order stays
    /// PENDING and the caller gets the capacity error; retrying after
    /// capacity frees up succeeds.
    pub async fn confirm(&self, customer: &SessionId, order_id: Uuid) -> CoreResult<Order> {
        let probe = self.require_pending(customer, order_id).await?;
        let _guard = self.locks.acquire(probe.offer_id).await;
        let mut order = self.require_pending(customer, order_id).await?;

        let mut offer = self.require_offer(order.offer_id).await?;
        let confirmed = self.orders.confirmed_people(order.offer_id).await?;
        let available = offer.capacity_total - confirmed;
        if available < order.number_of_people {
            tracing::warn!(
                order_id = %order.id,
                offer_id = %order.offer_id,
                available,
                requested = order.number_of_people,
                "confirm rejected, capacity exhausted"
            );
            return Err(CoreError::CapacityExceeded {
                available,
                requested: order.number_of_people,
            });
        }

        order.status = OrderStatus::Confirmed;
        order.confirmed_at = Some(chrono::Utc::now());
        self.orders.update(&order).await?;

        // Refresh the display cache; admission never reads it.
        offer.capacity_available = offer.capacity_total - confirmed - order.number_of_people;
        self.offers.update(&offer).await?;

        tracing::info!(order_id = %order.id, offer_id = %order.offer_id, "order confirmed");
        Ok(order)
    }

    /// Cancels a PENDING or CONFIRMED order. A confirmed order releases its
    /// seats; a pending one never held any.
    pub async fn cancel(&self, customer: &SessionId, order_id: Uuid) -> CoreResult<Order> {
        let probe = self.require_order(customer, order_id).await?;
        let _guard = self.locks.acquire(probe.offer_id).await;
        let mut order = self.require_order(customer, order_id).await?;

        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(CoreError::Validation(format!(
                "cannot cancel a {} order",
                order.status.as_str()
            )));
        }
        let was_confirmed = order.status == OrderStatus::Confirmed;

        order.status = OrderStatus::Cancelled;
        self.orders.update(&order).await?;

        if was_confirmed {
            if let Some(mut offer) = self.offers.get(order.offer_id).await? {
                let confirmed = self.orders.confirmed_people(order.offer_id).await?;
                offer.capacity_available = offer.capacity_total - confirmed;
                self.offers.update(&offer).await?;
            }
        }

        tracing::info!(order_id = %order.id, offer_id = %order.offer_id, was_confirmed, "order cancelled");
        Ok(order)
    }

    /// Physically removes a CANCELLED or DELETED order.
    pub async fn purge(&self, customer: &SessionId, order_id: Uuid) -> CoreResult<()> {
        let order = self.require_order(customer, order_id).await?;
        if !matches!(order.status, OrderStatus::Cancelled | OrderStatus::Deleted) {
            return Err(CoreError::Validation(format!(
                "only cancelled or deleted orders can be removed, this one is {}",
                order.status.as_str()
            )));
        }
        self.orders.delete(customer, order_id).await
    }

    /// Empty-trash: marks every CANCELLED order DELETED and returns how many
    /// were affected. Rows stay in place until purged individually.
    pub async fn purge_all_cancelled(&self, customer: &SessionId) -> CoreResult<u64> {
        let cancelled = self
            .orders
            .list_for_customer(customer, Some(OrderStatus::Cancelled))
            .await?;
        let mut count = 0u64;
        for mut order in cancelled {
            order.status = OrderStatus::Deleted;
            self.orders.update(&order).await?;
            count += 1;
        }
        tracing::info!(customer = %customer, count, "cancelled orders marked deleted");
        Ok(count)
    }

    pub async fn list(
        &self,
        customer: &SessionId,
        status: Option<OrderStatus>,
    ) -> CoreResult<Vec<Order>> {
        self.orders.list_for_customer(customer, status).await
    }

    pub async fn get(&self, customer: &SessionId, order_id: Uuid) -> CoreResult<Order> {
        self.require_order(customer, order_id).await
    }

    /// Order + offer view used by the order detail endpoint. The remaining
    /// capacity shown for a PENDING order already subtracts its own party,
    /// so the customer sees what would be left after confirming.
    pub async fn get_details(&self, customer: &SessionId, order_id: Uuid) -> CoreResult<OrderDetails> {
        let order = self.require_order(customer, order_id).await?;
        let offer = self.require_offer(order.offer_id).await?;

        let confirmed = self.orders.confirmed_people(order.offer_id).await?;
        let mut remaining_capacity = offer.capacity_total - confirmed;
        if order.status == OrderStatus::Pending {
            remaining_capacity -= order.number_of_people;
        }
        let total_price = offer.price_for_transport(order.selected_transport_mode);

        Ok(OrderDetails {
            order,
            offer,
            remaining_capacity,
            total_price,
        })
    }

    /// Current availability for a prospective booking against `offer_id`.
    pub async fn available_capacity(&self, offer_id: Uuid) -> CoreResult<i32> {
        let offer = self.require_offer(offer_id).await?;
        let confirmed = self.orders.confirmed_people(offer_id).await?;
        Ok(offer.capacity_total - confirmed)
    }

    async fn require_offer(&self, offer_id: Uuid) -> CoreResult<Offer> {
        self.offers
            .get(offer_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Offer not found".to_string()))
    }

    async fn require_order(&self, customer: &SessionId, order_id: Uuid) -> CoreResult<Order> {
        self.orders
            .get(customer, order_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Order not found".to_string()))
    }

    async fn require_pending(&self, customer: &SessionId, order_id: Uuid) -> CoreResult<Order> {
        let order = self.require_order(customer, order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(CoreError::NotFound(
                "Order not found or not pending".to_string(),
            ));
        }
        Ok(order)
    }
}

use std::sync::Arc;

use tripdesk_offer::OfferRepository;
use tripdesk_order::{
    BookingWorkflow, NoteRepository, OfferAdmin, OfferLocks, OrderLedger, OrderRepository,
    ResponseRepository, ResponseTracker,
};

#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<OfferAdmin>,
    pub workflow: Arc<BookingWorkflow>,
    pub ledger: Arc<OrderLedger>,
    pub tracker: Arc<ResponseTracker>,
}

impl AppState {
    /// Wires the booking components over whatever backend provides the
    /// repositories; one lock registry is shared so agent-side deletion and
    /// customer-side booking serialize on the same per-offer locks.
    pub fn new(
        offers: Arc<dyn OfferRepository>,
        orders: Arc<dyn OrderRepository>,
        responses: Arc<dyn ResponseRepository>,
        notes: Arc<dyn NoteRepository>,
    ) -> Self {
        let locks = Arc::new(OfferLocks::new());
        let ledger = Arc::new(OrderLedger::new(
            offers.clone(),
            orders.clone(),
            locks.clone(),
        ));
        let tracker = Arc::new(ResponseTracker::new(responses));
        let workflow = Arc::new(BookingWorkflow::new(
            offers.clone(),
            notes,
            tracker.clone(),
            ledger.clone(),
        ));
        let admin = Arc::new(OfferAdmin::new(offers, orders, locks));

        Self {
            admin,
            workflow,
            ledger,
            tracker,
        }
    }
}

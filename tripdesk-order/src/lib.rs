pub mod admin;
pub mod ledger;
pub mod locks;
pub mod models;
pub mod repository;
pub mod responses;
pub mod workflow;

pub use admin::OfferAdmin;
pub use ledger::{OrderDetails, OrderLedger};
pub use locks::OfferLocks;
pub use models::{
    decode_requirements, encode_requirements, response_sort_group, CustomerNote, CustomerResponse,
    GiftDetails, Order, OrderPatch, OrderStatus, ResponseStatus, DEFAULT_GIFT_SUBJECT,
};
pub use repository::{NoteRepository, OrderRepository, ResponseRepository};
pub use responses::ResponseTracker;
pub use workflow::{BookingWorkflow, OfferWithStatus, SortDir, SortKey};

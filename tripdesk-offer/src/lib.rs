pub mod models;
pub mod repository;
pub mod rules;

pub use models::{Offer, OfferDraft, OfferPatch, TransportMode};
pub use repository::OfferRepository;
pub use rules::{validate_offer, OfferFilter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripdesk_offer::TransportMode;
use uuid::Uuid;

pub const DEFAULT_GIFT_SUBJECT: &str = "You've been gifted a trip!";

/// Order lifecycle. PENDING is the only entry point; DELETED is terminal
/// and reachable only from CANCELLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
    Deleted,
}

impl OrderStatus {
    /// Transition table. No transition re-enters PENDING.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) | (Cancelled, Deleted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Deleted => "DELETED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PENDING" => Some(OrderStatus::Pending),
            "CONFIRMED" => Some(OrderStatus::Confirmed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "DELETED" => Some(OrderStatus::Deleted),
            _ => None,
        }
    }
}

/// Gift sub-record, present only when the order is a gift. Recipient email,
/// recipient name and sender name are mandatory when enabling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftDetails {
    pub recipient_email: String,
    pub recipient_name: String,
    pub sender_name: String,
    pub note: Option<String>,
    pub subject: Option<String>,
}

impl GiftDetails {
    pub fn subject_or_default(&self) -> &str {
        self.subject.as_deref().unwrap_or(DEFAULT_GIFT_SUBJECT)
    }
}

/// A customer's concrete booking request against an offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_session_id: String,
    pub offer_id: Uuid,
    pub number_of_people: i32,
    pub selected_transport_mode: TransportMode,
    pub special_requirements: Vec<String>,
    pub gift: Option<GiftDetails>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(
        customer_session_id: String,
        offer_id: Uuid,
        number_of_people: i32,
        selected_transport_mode: TransportMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_session_id,
            offer_id,
            number_of_people,
            selected_transport_mode,
            special_requirements: Vec::new(),
            gift: None,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            confirmed_at: None,
        }
    }

    pub fn is_gift(&self) -> bool {
        self.gift.is_some()
    }
}

/// Comma-delimited persistence encoding for the requirements set. Commas
/// inside a tag are stripped so the encoding stays unambiguous.
pub fn encode_requirements(requirements: &[String]) -> Option<String> {
    if requirements.is_empty() {
        return None;
    }
    Some(
        requirements
            .iter()
            .map(|r| r.replace(',', " ").trim().to_string())
            .filter(|r| !r.is_empty())
            .collect::<Vec<_>>()
            .join(","),
    )
}

pub fn decode_requirements(raw: Option<&str>) -> Vec<String> {
    match raw {
        None | Some("") => Vec::new(),
        Some(s) => s.split(',').map(|r| r.trim().to_string()).collect(),
    }
}

/// Partial update for a PENDING order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
    pub number_of_people: Option<i32>,
    pub selected_transport_mode: Option<TransportMode>,
    pub special_requirements: Option<Vec<String>>,
    pub is_gift: Option<bool>,
    pub gift_recipient_email: Option<String>,
    pub gift_recipient_name: Option<String>,
    pub gift_sender_name: Option<String>,
    pub gift_note: Option<String>,
    pub gift_subject: Option<String>,
}

/// A customer's stance on an offer, one row per (customer, offer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Accepted,
    Rejected,
    Undecided,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Accepted => "ACCEPTED",
            ResponseStatus::Rejected => "REJECTED",
            ResponseStatus::Undecided => "UNDECIDED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ACCEPTED" => Some(ResponseStatus::Accepted),
            "REJECTED" => Some(ResponseStatus::Rejected),
            "UNDECIDED" => Some(ResponseStatus::Undecided),
            _ => None,
        }
    }
}

/// Primary sort group for the all-offers view: ACCEPTED first, then
/// undecided (explicit or absent), REJECTED last.
pub fn response_sort_group(status: Option<ResponseStatus>) -> u8 {
    match status {
        Some(ResponseStatus::Accepted) => 0,
        None | Some(ResponseStatus::Undecided) => 1,
        Some(ResponseStatus::Rejected) => 2,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub customer_session_id: String,
    pub offer_id: Uuid,
    pub status: ResponseStatus,
    pub created_at: DateTime<Utc>,
}

/// Free-text annotation per (customer, offer), independent of the order and
/// response lifecycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerNote {
    pub customer_session_id: String,
    pub offer_id: Uuid,
    pub note_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_lifecycle() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Cancelled.can_transition_to(Deleted));

        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Deleted.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Deleted));
    }

    #[test]
    fn requirements_encoding_round_trips() {
        let tags = vec!["vegan".to_string(), "ground floor".to_string()];
        let encoded = encode_requirements(&tags).unwrap();
        assert_eq!(encoded, "vegan,ground floor");
        assert_eq!(decode_requirements(Some(&encoded)), tags);

        assert_eq!(encode_requirements(&[]), None);
        assert!(decode_requirements(None).is_empty());
        assert!(decode_requirements(Some("")).is_empty());
    }

    #[test]
    fn requirements_with_embedded_commas_stay_unambiguous() {
        let tags = vec!["no nuts, please".to_string()];
        let encoded = encode_requirements(&tags).unwrap();
        assert_eq!(decode_requirements(Some(&encoded)).len(), 1);
    }

    #[test]
    fn sort_group_merges_absent_and_undecided() {
        assert_eq!(response_sort_group(Some(ResponseStatus::Accepted)), 0);
        assert_eq!(response_sort_group(None), 1);
        assert_eq!(response_sort_group(Some(ResponseStatus::Undecided)), 1);
        assert_eq!(response_sort_group(Some(ResponseStatus::Rejected)), 2);
    }

    #[test]
    fn gift_subject_defaults() {
        let gift = GiftDetails {
            recipient_email: "kim@example.com".to_string(),
            recipient_name: "Kim".to_string(),
            sender_name: "Alex".to_string(),
            note: None,
            subject: None,
        };
        assert_eq!(gift.subject_or_default(), DEFAULT_GIFT_SUBJECT);
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
        assert_eq!(OrderStatus::parse("CANCELLED"), Some(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::parse("pending"), None);
    }
}

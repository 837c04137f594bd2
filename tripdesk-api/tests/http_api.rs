use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tripdesk_api::{app, AppState};
use tripdesk_offer::OfferRepository;
use tripdesk_order::{NoteRepository, OrderRepository, ResponseRepository};
use tripdesk_store::MemoryStore;

fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    app(AppState::new(
        store.clone() as Arc<dyn OfferRepository>,
        store.clone() as Arc<dyn OrderRepository>,
        store.clone() as Arc<dyn ResponseRepository>,
        store as Arc<dyn NoteRepository>,
    ))
}

fn offer_payload() -> Value {
    json!({
        "destination_name": "Lisbon Getaway",
        "country": "Portugal",
        "origin": "Berlin",
        "destination": "Lisbon",
        "capacity_available": 2,
        "capacity_total": 2,
        "date_from": "2026-06-01",
        "date_to": "2026-06-08",
        "season": "summer",
        "type_of_stay": ["hotel"],
        "price_housing": 700,
        "price_food": 150,
        "price_transport_mode": "plane",
        "price_transport_amount": 120,
        "short_description": "A week by the Tagus"
    })
}

async fn send(app: &Router, method: &str, uri: &str, session: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-session-id", session);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn offer_crud_round_trips_through_the_envelope() {
    let app = test_app();

    let (status, body) = send(&app, "POST", "/api/v1/agent/offers", "agent-1", Some(offer_payload())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].is_null());
    let offer_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["destination_name"], "Lisbon Getaway");
    assert_eq!(body["data"]["agent_session_id"], "agent-1");

    let (status, body) = send(&app, "GET", "/api/v1/agent/offers", "agent-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/agent/offers/{offer_id}");
    let (status, body) = send(&app, "PUT", &uri, "agent-1", Some(json!({"price_housing": 650}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price_housing"], 650);

    let (status, _) = send(&app, "DELETE", &uri, "agent-1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "GET", &uri, "agent-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn invalid_offers_are_rejected_with_a_validation_code() {
    let app = test_app();

    let mut payload = offer_payload();
    payload["date_to"] = json!("2026-05-01");
    let (status, body) = send(&app, "POST", "/api/v1/agent/offers", "agent-1", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["data"].is_null());

    // Self-arranged transport cannot carry a transport price.
    let mut payload = offer_payload();
    payload["price_transport_mode"] = json!("car_own");
    let (status, body) = send(&app, "POST", "/api/v1/agent/offers", "agent-1", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn overbooking_surfaces_as_a_conflict() {
    let app = test_app();

    let (_, body) = send(&app, "POST", "/api/v1/agent/offers", "agent-1", Some(offer_payload())).await;
    let offer_id = body["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/customer/offers/{offer_id}/confirm-travel");
    let booking = json!({"number_of_people": 2, "selected_transport_mode": "plane"});
    let (status, body) = send(&app, "POST", &uri, "alice", Some(booking)).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "PENDING");

    let confirm = format!("/api/v1/customer/orders/{order_id}/confirm");
    let (status, _) = send(&app, "POST", &confirm, "alice", None).await;
    assert_eq!(status, StatusCode::OK);

    // The offer is full now, a second party of one cannot even be admitted.
    let booking = json!({"number_of_people": 1, "selected_transport_mode": "train_bus"});
    let (status, body) = send(&app, "POST", &uri, "bob", Some(booking)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Insufficient capacity"));
}

#[tokio::test]
async fn orders_are_scoped_to_the_presenting_session() {
    let app = test_app();

    let (_, body) = send(&app, "POST", "/api/v1/agent/offers", "agent-1", Some(offer_payload())).await;
    let offer_id = body["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/customer/offers/{offer_id}/confirm-travel");
    let booking = json!({"number_of_people": 1, "selected_transport_mode": "plane"});
    let (status, body) = send(&app, "POST", &uri, "alice", Some(booking)).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/v1/customer/orders", "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/v1/customer/orders", "bob", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    // Bob cannot read Alice's order either.
    let uri = format!("/api/v1/customer/orders/{order_id}");
    let (status, body) = send(&app, "GET", &uri, "bob", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn notes_and_stances_ride_along_the_status_view() {
    let app = test_app();

    let (_, body) = send(&app, "POST", "/api/v1/agent/offers", "agent-1", Some(offer_payload())).await;
    let offer_id = body["data"]["id"].as_str().unwrap().to_string();

    let accept = format!("/api/v1/customer/offers/{offer_id}/accept");
    let (status, _) = send(&app, "POST", &accept, "alice", None).await;
    assert_eq!(status, StatusCode::OK);

    let note = format!("/api/v1/customer/offers/{offer_id}/note");
    let (status, _) = send(&app, "PUT", &note, "alice", Some(json!({"note_text": "ask about balconies"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/v1/customer/offers/all", "alice", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "ACCEPTED");
    assert_eq!(rows[0]["note"], "ask about balconies");

    // An unknown stance in the filter is a caller error.
    let (status, body) = send(&app, "GET", "/api/v1/customer/offers/all?status=MAYBE", "alice", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

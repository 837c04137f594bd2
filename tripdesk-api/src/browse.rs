use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use tripdesk_core::{CoreError, SessionId};
use tripdesk_offer::TransportMode;
use tripdesk_order::{ResponseStatus, SortDir, SortKey};
use uuid::Uuid;

use crate::error::{ok, AppError};
use crate::filters::OfferFilterQuery;
use crate::state::AppState;

/// Customer-side browsing: available offers, the unified status view,
/// accept/reject, notes and the confirm-travel shortcut.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customer/offers", get(list_available))
        .route("/customer/offers/all", get(list_all_with_status))
        .route("/customer/offers/{id}", get(offer_detail))
        .route("/customer/offers/{id}/accept", post(accept_offer))
        .route("/customer/offers/{id}/reject", post(reject_offer))
        .route("/customer/offers/{id}/status", put(set_offer_status))
        .route("/customer/offers/{id}/note", put(upsert_note).get(get_note))
        .route("/customer/offers/{id}/confirm-travel", post(confirm_travel))
}

#[derive(Debug, Deserialize)]
struct StatusViewQuery {
    status: Option<String>,
    #[serde(default)]
    sort: SortKey,
    #[serde(default, rename = "order")]
    dir: SortDir,
}

#[derive(Debug, Deserialize)]
struct SetStatusBody {
    status: String,
}

#[derive(Debug, Deserialize)]
struct NoteBody {
    note_text: String,
}

#[derive(Debug, Deserialize)]
struct ConfirmTravelBody {
    number_of_people: i32,
    selected_transport_mode: TransportMode,
}

fn parse_response_status(raw: &str) -> Result<ResponseStatus, AppError> {
    ResponseStatus::parse(&raw.to_uppercase())
        .ok_or_else(|| CoreError::Validation(format!("unknown response status: {raw}")).into())
}

/// GET /api/v1/customer/offers
/// Offers the customer has neither accepted nor rejected.
async fn list_available(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Query(query): Query<OfferFilterQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let filter = query.into_filter()?;
    let offers = state.workflow.list_available(&session, &filter).await?;
    Ok(ok(offers))
}

/// GET /api/v1/customer/offers/all
/// Every offer with the customer's stance and note, grouped and sorted.
async fn list_all_with_status(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Query(query): Query<StatusViewQuery>,
    Query(filter_query): Query<OfferFilterQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status_filter = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(parse_response_status(raw)?),
    };
    let filter = filter_query.into_filter()?;
    let rows = state
        .workflow
        .list_all_with_status(&session, &filter, status_filter, query.sort, query.dir)
        .await?;
    Ok(ok(rows))
}

/// GET /api/v1/customer/offers/{id}
async fn offer_detail(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let detail = state.workflow.offer_detail(&session, offer_id).await?;
    Ok(ok(detail))
}

/// POST /api/v1/customer/offers/{id}/accept
async fn accept_offer(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let response = state.tracker.accept(&session, offer_id).await?;
    Ok(ok(response))
}

/// POST /api/v1/customer/offers/{id}/reject
async fn reject_offer(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let response = state.tracker.reject(&session, offer_id).await?;
    Ok(ok(response))
}

/// PUT /api/v1/customer/offers/{id}/status
async fn set_offer_status(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(offer_id): Path<Uuid>,
    Json(body): Json<SetStatusBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = parse_response_status(&body.status)?;
    let response = state.tracker.set_status(&session, offer_id, status).await?;
    Ok(ok(response))
}

/// PUT /api/v1/customer/offers/{id}/note
async fn upsert_note(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(offer_id): Path<Uuid>,
    Json(body): Json<NoteBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let note = state
        .workflow
        .upsert_note(&session, offer_id, body.note_text)
        .await?;
    Ok(ok(note))
}

/// GET /api/v1/customer/offers/{id}/note
async fn get_note(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let note = state.workflow.get_note(&session, offer_id).await?;
    Ok(ok(note))
}

/// POST /api/v1/customer/offers/{id}/confirm-travel
/// First capacity checkpoint; creates a PENDING order.
async fn confirm_travel(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(offer_id): Path<Uuid>,
    Json(body): Json<ConfirmTravelBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let order = state
        .workflow
        .confirm_travel(
            &session,
            offer_id,
            body.number_of_people,
            body.selected_transport_mode,
        )
        .await?;
    Ok(ok(order))
}

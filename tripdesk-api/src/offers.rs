use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use tripdesk_core::SessionId;
use tripdesk_offer::{OfferDraft, OfferPatch};
use uuid::Uuid;

use crate::error::{ok, AppError};
use crate::filters::OfferFilterQuery;
use crate::state::AppState;

/// Agent-side offer management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/agent/offers", get(list_offers).post(create_offer))
        .route(
            "/agent/offers/{id}",
            get(get_offer).put(update_offer).delete(delete_offer),
        )
}

/// GET /api/v1/agent/offers
async fn list_offers(
    State(state): State<AppState>,
    Query(query): Query<OfferFilterQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let filter = query.into_filter()?;
    let offers = state.admin.list(&filter).await?;
    Ok(ok(offers))
}

/// POST /api/v1/agent/offers
async fn create_offer(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Json(draft): Json<OfferDraft>,
) -> Result<Json<serde_json::Value>, AppError> {
    let offer = state.admin.create(&session, draft).await?;
    Ok(ok(offer))
}

/// GET /api/v1/agent/offers/{id}
async fn get_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let offer = state.admin.get(offer_id).await?;
    Ok(ok(offer))
}

/// PUT /api/v1/agent/offers/{id}
async fn update_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<Uuid>,
    Json(patch): Json<OfferPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    let offer = state.admin.update(offer_id, patch).await?;
    Ok(ok(offer))
}

/// DELETE /api/v1/agent/offers/{id}
/// Refused while confirmed orders still reference the offer.
async fn delete_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin.delete(offer_id).await?;
    Ok(ok(serde_json::json!({ "deleted": true })))
}

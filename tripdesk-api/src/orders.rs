use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tripdesk_core::{CoreError, SessionId};
use tripdesk_order::{OrderPatch, OrderStatus};
use uuid::Uuid;

use crate::error::{ok, AppError};
use crate::state::AppState;

/// Customer-side order lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customer/orders",
            get(list_orders).delete(purge_cancelled_orders),
        )
        .route(
            "/customer/orders/{id}",
            get(get_order).put(update_order).delete(purge_order),
        )
        .route("/customer/orders/{id}/confirm", post(confirm_order))
        .route("/customer/orders/{id}/cancel", post(cancel_order))
}

#[derive(Debug, Deserialize)]
struct ListOrdersQuery {
    status: Option<String>,
}

/// GET /api/v1/customer/orders
async fn list_orders(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(OrderStatus::parse(&raw.to_uppercase()).ok_or_else(|| {
            AppError::from(CoreError::Validation(format!(
                "unknown order status: {raw}"
            )))
        })?),
    };
    let orders = state.ledger.list(&session, status).await?;
    Ok(ok(orders))
}

/// GET /api/v1/customer/orders/{id}
/// Order joined with its offer, remaining capacity, price and note.
async fn get_order(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let details = state.ledger.get_details(&session, order_id).await?;
    let note = state
        .workflow
        .get_note(&session, details.order.offer_id)
        .await?;
    Ok(ok(json!({
        "order": details.order,
        "offer": details.offer,
        "remaining_capacity": details.remaining_capacity,
        "total_price": details.total_price,
        "note": note.map(|n| n.note_text).unwrap_or_default(),
    })))
}

/// PUT /api/v1/customer/orders/{id}
/// Only PENDING orders are editable.
async fn update_order(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(order_id): Path<Uuid>,
    Json(patch): Json<OrderPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    let order = state.ledger.update(&session, order_id, patch).await?;
    Ok(ok(order))
}

/// POST /api/v1/customer/orders/{id}/confirm
/// The authoritative capacity checkpoint.
async fn confirm_order(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let order = state.ledger.confirm(&session, order_id).await?;
    Ok(ok(order))
}

/// POST /api/v1/customer/orders/{id}/cancel
async fn cancel_order(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let order = state.ledger.cancel(&session, order_id).await?;
    Ok(ok(order))
}

/// DELETE /api/v1/customer/orders/{id}
/// Physical removal, only for cancelled or deleted orders.
async fn purge_order(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.ledger.purge(&session, order_id).await?;
    Ok(ok(json!({ "deleted": true })))
}

/// DELETE /api/v1/customer/orders
/// Empty-trash: marks every cancelled order deleted.
async fn purge_cancelled_orders(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted_count = state.ledger.purge_all_cancelled(&session).await?;
    Ok(ok(json!({ "deleted_count": deleted_count })))
}

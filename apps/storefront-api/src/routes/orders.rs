//! Order history endpoints.
//!
//! Orders are read-only through the API: they are created by checkout and
//! never mutated here. Totals come straight from the frozen `total_cents`
//! column, not recomputed from lines.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use boutique_core::{CoreError, Order, OrderStatus};
use boutique_db::OrderLine;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummaryResponse {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineResponse>,
}

fn line_response(line: OrderLine) -> OrderLineResponse {
    OrderLineResponse {
        product_id: line.product_id,
        product_name: line.product_name,
        quantity: line.quantity,
        unit_price_cents: line.unit_price_cents,
        total_cents: line.total_cents,
    }
}

fn summary_response(order: Order) -> OrderSummaryResponse {
    OrderSummaryResponse {
        id: order.id,
        order_number: order.order_number,
        status: order.status,
        total_cents: order.total_cents,
        created_at: order.created_at,
    }
}

/// Builds the full order view (summary plus ledger lines).
///
/// Also used by the checkout handler for its 201 body.
pub(crate) async fn order_response(
    state: &AppState,
    order: Order,
) -> Result<OrderResponse, ApiError> {
    let lines = state.db.orders().lines_for_order(&order.id).await?;

    Ok(OrderResponse {
        id: order.id,
        order_number: order.order_number,
        status: order.status,
        total_cents: order.total_cents,
        delivery_date: order.delivery_date,
        notes: order.notes,
        created_at: order.created_at,
        lines: lines.into_iter().map(line_response).collect(),
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /mes-commandes/ lists the caller's order history, newest first.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<OrderSummaryResponse>>, ApiError> {
    let orders = state.db.orders().orders_for_user(&user.id).await?;

    Ok(Json(orders.into_iter().map(summary_response).collect()))
}

/// GET /commande/{id}/ returns one order with its lines, scoped to the caller.
///
/// Another user's order id answers 404, exactly like an unknown id.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .db
        .orders()
        .order_for_user(&id, &user.id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id))?;

    let response = order_response(&state, order).await?;
    Ok(Json(response))
}

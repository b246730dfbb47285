//! Cart endpoints.
//!
//! All operations are scoped to the authenticated user's own open cart.
//! Lines of another user's cart are reported not-found, never forbidden,
//! so callers cannot probe for foreign ids.
//!
//! ## Stock Checks
//! ```text
//! add/update line ──► checked against live stock (resulting quantity)
//!        │
//!        ▼
//! cart sits open ──► stock may drift (other checkouts)
//!        │
//!        ▼
//! checkout ──► re-checked per line inside the transaction
//! ```
//! The add-time check gives early feedback; the checkout re-check is the
//! one that guarantees no over-selling.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use boutique_core::validation::validate_quantity;
use boutique_core::{CoreError, Product, MAX_CART_LINES, MAX_LINE_QUANTITY};
use boutique_db::repository::cart::new_cart_line;
use boutique_db::CartLineDetail;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::routes::orders::{order_response, OrderResponse};
use crate::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Body of the add/update endpoints. `quantite` defaults to 1 to match
/// the storefront form, which omits the field for a plain "add" click.
#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    #[serde(default = "default_quantity")]
    pub quantite: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Reads the quantity out of an optional JSON body.
///
/// A request without a JSON content type counts as an empty body (default
/// quantity); malformed JSON or a non-integer quantity is a 400 in the
/// standard error envelope rather than axum's built-in rejection reply.
fn quantity_from_body(payload: Result<Json<QuantityBody>, JsonRejection>) -> Result<i64, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body.quantite),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(default_quantity()),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    /// True when the line's quantity now exceeds live stock (drift since
    /// add-time); the cart page warns before checkout rejects.
    pub exceeds_stock: bool,
    pub product_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: String,
    pub lines: Vec<CartLineResponse>,
    pub total_cents: i64,
}

fn line_response(line: CartLineDetail) -> CartLineResponse {
    let subtotal_cents = line.subtotal().cents();
    let exceeds_stock = line.exceeds_stock();

    CartLineResponse {
        id: line.id,
        product_id: line.product_id,
        product_name: line.product_name,
        quantity: line.quantity,
        unit_price_cents: line.unit_price_cents,
        subtotal_cents,
        exceeds_stock,
        product_active: line.product_active,
    }
}

/// Builds the full cart view for a user, creating the open cart if absent.
async fn cart_response(state: &AppState, user_id: &str) -> Result<CartResponse, ApiError> {
    let cart = state.db.carts().get_or_create_open_cart(user_id).await?;
    let lines = state.db.carts().line_details(&cart.id).await?;

    let total_cents = lines.iter().map(|line| line.subtotal().cents()).sum();

    Ok(CartResponse {
        id: cart.id,
        lines: lines.into_iter().map(line_response).collect(),
        total_cents,
    })
}

fn ensure_stock(product: &Product, requested: i64) -> Result<(), ApiError> {
    if product.stock_quantity < requested {
        return Err(CoreError::InsufficientStock {
            name: product.name.clone(),
            available: product.stock_quantity,
            requested,
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /panier/ returns the caller's open cart with line details and total.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn view(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let response = cart_response(&state, &user.id).await?;
    Ok(Json(response))
}

/// POST /panier/ajouter/{product_id}/ adds a product to the open cart.
///
/// Creates the line at the product's current display price, or increases
/// an existing line. The stock check uses the resulting line quantity.
#[tracing::instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    user: CurrentUser,
    payload: Result<Json<QuantityBody>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let quantity = quantity_from_body(payload)?;
    validate_quantity(quantity).map_err(CoreError::from)?;

    let product = state
        .db
        .catalog()
        .active_product(&product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

    let cart = state.db.carts().get_or_create_open_cart(&user.id).await?;

    match state.db.carts().find_line(&cart.id, &product_id).await? {
        Some(line) => {
            let new_quantity = line.quantity + quantity;
            if new_quantity > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_quantity,
                    max: MAX_LINE_QUANTITY,
                }
                .into());
            }
            ensure_stock(&product, new_quantity)?;

            state
                .db
                .carts()
                .update_line_quantity(&line.id, new_quantity)
                .await?;
        }
        None => {
            let line_count = state.db.carts().count_lines(&cart.id).await?;
            if line_count >= MAX_CART_LINES as i64 {
                return Err(ApiError::BadRequest(format!(
                    "Cart cannot hold more than {} distinct products",
                    MAX_CART_LINES
                )));
            }
            ensure_stock(&product, quantity)?;

            // Unit price captured here; later catalog repricing leaves the
            // line untouched
            let line = new_cart_line(
                &cart.id,
                &product_id,
                quantity,
                product.display_price().cents(),
            );
            state.db.carts().insert_line(&line).await?;
        }
    }

    state.db.carts().touch_cart(&cart.id).await?;

    tracing::debug!(product_id = %product_id, quantity, "Added product to cart");

    let response = cart_response(&state, &user.id).await?;
    Ok(Json(response))
}

/// POST /panier/modifier/{line_id}/ replaces a line's quantity.
///
/// A quantity ≤ 0 removes the line, matching the storefront's "set to
/// zero to delete" behavior.
#[tracing::instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(line_id): Path<String>,
    user: CurrentUser,
    payload: Result<Json<QuantityBody>, JsonRejection>,
) -> Result<Json<CartResponse>, ApiError> {
    let quantity = quantity_from_body(payload)?;

    let line = state
        .db
        .carts()
        .line_for_user(&line_id, &user.id)
        .await?
        .ok_or_else(|| CoreError::CartLineNotFound(line_id.clone()))?;

    if quantity <= 0 {
        state.db.carts().delete_line(&line.id).await?;
    } else {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let product = state
            .db
            .catalog()
            .active_product(&line.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
        ensure_stock(&product, quantity)?;

        state
            .db
            .carts()
            .update_line_quantity(&line.id, quantity)
            .await?;
    }

    state.db.carts().touch_cart(&line.cart_id).await?;

    let response = cart_response(&state, &user.id).await?;
    Ok(Json(response))
}

/// POST /panier/retirer/{line_id}/ removes a line unconditionally.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(line_id): Path<String>,
    user: CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let line = state
        .db
        .carts()
        .line_for_user(&line_id, &user.id)
        .await?
        .ok_or_else(|| CoreError::CartLineNotFound(line_id.clone()))?;

    state.db.carts().delete_line(&line.id).await?;
    state.db.carts().touch_cart(&line.cart_id).await?;

    let response = cart_response(&state, &user.id).await?;
    Ok(Json(response))
}

/// POST /panier/commander/ checks out the open cart.
///
/// The heavy lifting (claim, stock decrement, order + ledger insert) is a
/// single database transaction; this handler just maps the outcome.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.db.orders().checkout(&user.id).await?;

    tracing::info!(
        order_number = %order.order_number,
        total_cents = order.total_cents,
        "Order placed"
    );

    let response = order_response(&state, order).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

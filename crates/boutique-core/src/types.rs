//! # Domain Types
//!
//! Core domain types for the boutique storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog                      Cart                     Checkout         │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌─────────────────────┐      │
//! │  │  Category    │   │  Cart            │   │  Order              │      │
//! │  │  Variant     │   │  ├── status      │   │  ├── order_number   │      │
//! │  │  Product     │◄──│  └── CartLine    │──►│  └── total (frozen) │      │
//! │  │  ├── prices  │   │      ├── qty     │   │                     │      │
//! │  │  ├── stock   │   │      └── unit    │   │  Sale (ledger)      │      │
//! │  │  └── promo   │   │          price   │   │  └── one per line   │      │
//! │  └──────────────┘   └──────────────────┘   └─────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Entities carry:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (barcode, order_number) - human-readable
//!
//! ## Derived Values Are Never Stored
//! Margin, stock value, low-stock, display price, sub-totals and cart totals
//! are computed from the persisted fields on every access. There is no cached
//! copy to drift out of sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product category (unique name, owns zero or more products).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across categories.
    pub name: String,

    /// Free-form description (may be empty).
    pub description: String,

    /// Optional image path (served elsewhere).
    pub image_path: Option<String>,

    /// Whether the category is active (soft delete).
    pub is_active: bool,

    /// When the category was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Variant
// =============================================================================

/// A product variant/model (e.g. "500ml", "Rouge").
///
/// Optionally referenced by products; deleting a variant nulls the
/// reference rather than cascading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Variant {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Free-form description (may be empty).
    pub description: String,

    /// When the variant was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the catalog.
    pub name: String,

    /// Free-form description (may be empty).
    pub description: String,

    /// Owning category (required).
    pub category_id: String,

    /// Optional variant/model reference.
    pub variant_id: Option<String>,

    /// Purchase (cost) price in cents. Always positive.
    pub purchase_price_cents: i64,

    /// Regular sale price in cents. Always positive.
    pub sale_price_cents: i64,

    /// Current stock level. Never negative.
    pub stock_quantity: i64,

    /// Low-stock threshold.
    pub minimum_stock: i64,

    /// Barcode (EAN-13 etc.), unique when present.
    pub barcode: Option<String>,

    /// Optional image path (served elsewhere).
    pub image_path: Option<String>,

    /// Whether the product is currently on promotion.
    pub on_promotion: bool,

    /// Discounted price in cents, only meaningful while on promotion.
    pub promo_price_cents: Option<i64>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the purchase price as Money.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Returns the regular sale price as Money.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Returns the price a buyer actually pays right now.
    ///
    /// The promo price applies only while `on_promotion` is set, a promo
    /// price exists, and it undercuts the regular price. Anything else
    /// falls back to the regular sale price.
    pub fn display_price(&self) -> Money {
        Money::from_cents(effective_price_cents(
            self.sale_price_cents,
            self.on_promotion,
            self.promo_price_cents,
        ))
    }

    /// Returns the discount percentage while a promotion is effective.
    pub fn discount_percent(&self) -> Option<f64> {
        match self.promo_price_cents {
            Some(promo) if self.on_promotion && promo > 0 && promo < self.sale_price_cents => {
                let sale = self.sale_price_cents as f64;
                Some((sale - promo as f64) / sale * 100.0)
            }
            _ => None,
        }
    }

    /// Margin percentage: ((sale − purchase) / purchase) × 100.
    ///
    /// Returns 0 when the purchase price is not positive, so a free or
    /// mispriced product never divides by zero.
    pub fn margin_percent(&self) -> f64 {
        if self.purchase_price_cents <= 0 {
            return 0.0;
        }
        let purchase = self.purchase_price_cents as f64;
        (self.sale_price_cents as f64 - purchase) / purchase * 100.0
    }

    /// Unit margin in money terms (sale − purchase).
    #[inline]
    pub fn unit_margin(&self) -> Money {
        self.sale_price() - self.purchase_price()
    }

    /// Value of the stock on hand at purchase price.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.purchase_price().multiply_quantity(self.stock_quantity)
    }

    /// True when stock has fallen to or under the minimum threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.minimum_stock
    }

    /// Checks whether `quantity` units can currently be sold.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && self.stock_quantity >= quantity
    }
}

/// The price a buyer pays given the raw pricing columns.
///
/// Single source of truth for the promotion rule, shared by [`Product`] and
/// by query projections that carry the same three columns.
pub fn effective_price_cents(
    sale_price_cents: i64,
    on_promotion: bool,
    promo_price_cents: Option<i64>,
) -> i64 {
    match promo_price_cents {
        Some(promo) if on_promotion && promo > 0 && promo < sale_price_cents => promo,
        _ => sale_price_cents,
    }
}

// =============================================================================
// Cart Status
// =============================================================================

/// Lifecycle status of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// Open cart, still being mutated by its owner.
    InProgress,
    /// Checked out; an order exists for this cart. Terminal.
    Validated,
    /// Abandoned/cancelled. Terminal.
    Cancelled,
}

impl CartStatus {
    /// Stable string form, matching the persisted representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CartStatus::InProgress => "in_progress",
            CartStatus::Validated => "validated",
            CartStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for CartStatus {
    fn default() -> Self {
        CartStatus::InProgress
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A shopping cart. Its total is always derived from its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning user id. Nullable in the schema; the API always sets it.
    pub user_id: Option<String>,

    /// Lifecycle status. A user has at most one `in_progress` cart,
    /// enforced by get-or-create in the application layer.
    pub status: CartStatus,

    /// When the cart was created.
    pub created_at: DateTime<Utc>,

    /// When the cart was last touched.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One product entry within a cart.
///
/// The unit price is captured when the line is created (the product's
/// display price at that instant) and never re-read from the product,
/// so later price changes don't silently reprice open carts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning cart.
    pub cart_id: String,

    /// Referenced product. Unique per (cart, product) pair.
    pub product_id: String,

    /// Quantity, always ≥ 1.
    pub quantity: i64,

    /// Unit price in cents, captured at add-time.
    pub unit_price_cents: i64,

    /// When the line was added.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Captured unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line sub-total: quantity × unit price.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// Sums line sub-totals into a cart total.
///
/// This is THE cart-total definition: every place that needs a cart total
/// (cart view, checkout snapshot) goes through here, which keeps the
/// invariant `total == Σ quantity × unit_price` true by construction.
pub fn cart_total(lines: &[CartLine]) -> Money {
    lines
        .iter()
        .fold(Money::zero(), |acc, line| acc + line.subtotal())
}

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created by checkout, awaiting preparation.
    Pending,
    /// Being prepared for delivery.
    Preparing,
    /// Delivered to the customer.
    Delivered,
    /// Cancelled after creation.
    Cancelled,
}

impl OrderStatus {
    /// Stable string form, matching the persisted representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order created by checkout. One-to-one with a validated cart.
///
/// `total_cents` is frozen at creation from the cart's captured line
/// prices and is never recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The validated cart this order was created from (unique).
    pub cart_id: String,

    /// Business identifier: `CMD-YYYYMMDD-NNNN`, a per-day sequence.
    pub order_number: String,

    /// Fulfilment status.
    pub status: OrderStatus,

    /// Frozen total in cents.
    pub total_cents: i64,

    /// Optional delivery date.
    pub delivery_date: Option<DateTime<Utc>>,

    /// Free-form notes (may be empty).
    pub notes: String,

    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Frozen total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// An immutable ledger entry, one per order line.
///
/// Sales are written once during checkout and never updated; reporting
/// reads them in aggregate. They survive later order/cart mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Product sold.
    pub product_id: String,

    /// Quantity sold, always ≥ 1.
    pub quantity: i64,

    /// Unit price in cents, copied from the cart line.
    pub unit_price_cents: i64,

    /// Line total in cents: quantity × unit price at write time.
    pub total_cents: i64,

    /// Back-reference to the originating order.
    pub order_id: Option<String>,

    /// When the sale was recorded.
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

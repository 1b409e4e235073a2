//! # Domain Types
//!
//! Persisted records of the checkout engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐         ┌─────────────────┐                       │
//! │  │    Product      │         │  CashRegister   │  one open per user    │
//! │  │  stock_quantity │         │  open → closed  │                       │
//! │  └────────┬────────┘         └─────────────────┘                       │
//! │           │ snapshot                                                    │
//! │  ┌────────▼────────┐  1:N  ┌─────────────────┐                         │
//! │  │   OrderItem     │◄──────│     Order       │                         │
//! │  └─────────────────┘       │  status         │                         │
//! │                            │  payment_status │                         │
//! │  ┌─────────────────┐  N:1  └───────┬─────────┘                         │
//! │  │    Payment      │───────────────┤                                   │
//! │  │  append-only    │               │ 1:N                               │
//! │  └─────────────────┘       ┌───────▼──────────┐                        │
//! │                            │OrderStatusHistory│  append-only           │
//! │                            └──────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4, used for relations
//! - Business ID where one exists (`sku`, `order_number`), human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, TaxRate};
use crate::status::OrderStatus;

// =============================================================================
// Product
// =============================================================================

/// A product as seen by the checkout engine.
///
/// The catalog is owned elsewhere. This engine only ever writes
/// `stock_quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub organization_id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// List price in cents.
    pub base_price_cents: i64,

    /// Promotional price in cents. Wins over `base_price_cents` when set.
    pub sale_price_cents: Option<i64>,

    /// VAT in basis points (1800 = 18%).
    pub vat_rate_bps: u32,

    /// Whether the stock ledger counts this product.
    pub track_inventory: bool,

    /// Quantity on hand. Never negative for tracked products.
    pub stock_quantity: i64,

    /// `low_stock` reports the product at or below this quantity.
    pub low_stock_threshold: i64,

    /// Soft delete flag.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price a line is charged when the caller gives no explicit price.
    #[inline]
    pub fn effective_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents.unwrap_or(self.base_price_cents))
    }

    #[inline]
    pub fn vat_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.vat_rate_bps)
    }

    /// Whether `quantity` can be sold right now, ignoring concurrency.
    ///
    /// The ledger's conditional update is the authority; this is for
    /// display ("in stock" badges).
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && (!self.track_inventory || self.stock_quantity >= quantity)
    }
}

// =============================================================================
// Payment Status on the Order
// =============================================================================

/// Money state of an order, as summarised on the order header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl OrderPaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderPaymentStatus::Unpaid => "unpaid",
            OrderPaymentStatus::Paid => "paid",
            OrderPaymentStatus::Refunded => "refunded",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash, counted into the drawer.
    Cash,
    CreditCard,
    DebitCard,
    BankTransfer,
    Wallet,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Wallet => "wallet",
        }
    }

    /// Card payments are reported together as `card_sales`.
    pub const fn is_card(&self) -> bool {
        matches!(self, PaymentMethod::CreditCard | PaymentMethod::DebitCard)
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    PartiallyRefunded,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::PartiallyRefunded => "partially_refunded",
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order header. Created atomically with its items, never deleted.
///
/// `total_cents = subtotal_cents + tax_cents - discount_cents + shipping_cents`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub organization_id: String,
    pub branch_id: String,
    pub customer_id: Option<String>,
    /// The principal that rang the sale up.
    pub cashier_id: String,
    /// `ORD-YYYYMMDD-XXXXXXXX`
    pub order_number: String,
    pub channel: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    /// Free text, refunds append their reason here.
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item. Snapshot of the product at the time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Name at time of sale (frozen).
    pub product_name: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
    /// `unit_price_cents × quantity`
    pub line_total_cents: i64,
    pub tax_cents: i64,
    /// `line_total_cents + tax_cents`
    pub total_price_cents: i64,
    /// Whether stock was decremented for this line (restored on refund).
    pub track_inventory: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment or a payment reversal. Append-only.
///
/// A reversal is a new row with a negative `amount_cents` and
/// `reverses_payment_id` pointing at the original.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub organization_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub reverses_payment_id: Option<String>,
    /// External reference (card auth code, transfer id).
    pub reference: Option<String>,
    /// Reversal reason.
    pub reason: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn is_reversal(&self) -> bool {
        self.reverses_payment_id.is_some()
    }
}

// =============================================================================
// Order Status History
// =============================================================================

/// One audited status transition.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderStatusHistory {
    pub id: String,
    pub order_id: String,
    /// `None` for the creation entry.
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub notes: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cash Register
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    Open,
    Closed,
}

/// A cashier's shift. `open → closed` is terminal; a new shift is a new row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegister {
    pub id: String,
    pub organization_id: String,
    pub branch_id: String,
    pub user_id: String,
    /// Float in the drawer at open.
    pub opening_cents: i64,
    /// Counted cash at close.
    pub closing_cents: Option<i64>,
    pub status: RegisterStatus,
    pub cash_sales_cents: i64,
    pub card_sales_cents: i64,
    pub total_sales_cents: i64,
    pub total_orders: i64,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashRegister {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == RegisterStatus::Open
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

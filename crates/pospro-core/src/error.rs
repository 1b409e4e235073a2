//! # Error Types
//!
//! Domain errors for the checkout engine.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pospro-core (this file)                                               │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  pospro-db                                                             │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  pospro-engine                                                         │
//! │  └── EngineError      - What callers see, classified by ErrorKind      │
//! │                                                                         │
//! │  ErrorKind: Validation │ Conflict │ NotFound │ Infrastructure          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conflict and not-found variants carry enough context (available stock,
//! current status) to render a message without a second lookup.

use serde::Serialize;
use thiserror::Error;

use crate::money::Money;
use crate::status::OrderStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification used by the request layer to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input. The caller must change the request.
    Validation,
    /// A business rule rejected the request (stock, state, open shift).
    Conflict,
    /// A referenced entity does not exist for this organization.
    NotFound,
    /// Storage timeout or unavailability. The whole operation may be retried.
    Infrastructure,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the checkout engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product does not exist in the caller's organization.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but has been deactivated.
    #[error("Product {name} ({product_id}) is not active")]
    ProductInactive { product_id: String, name: String },

    /// Tracked product does not have enough stock on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Conditional decrement affects 0 rows, stock on hand = 3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "COKE-330", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Coca-Cola 330ml in stock"
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        sku: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Order does not exist in the caller's organization.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order has already been refunded.
    #[error("Order {0} is already refunded")]
    AlreadyRefunded(String),

    /// Order status does not allow the requested operation.
    #[error("Order {order_id} is {current_status}, cannot move to {attempted}")]
    InvalidOrderStatus {
        order_id: String,
        current_status: OrderStatus,
        attempted: OrderStatus,
    },

    /// The cashier already has an open register.
    #[error("Register already open for user {user_id}")]
    RegisterAlreadyOpen { user_id: String },

    /// The cashier has no open register to close.
    #[error("No open register for user {user_id}")]
    NoOpenRegister { user_id: String },

    /// Order-level discount is larger than everything it could reduce.
    #[error("Discount {discount} exceeds order total before discount {maximum}")]
    DiscountExceedsTotal { discount: Money, maximum: Money },

    /// Checkout without any line items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies this error for the request layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::NoOpenRegister { .. } => ErrorKind::NotFound,

            CoreError::ProductInactive { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::AlreadyRefunded(_)
            | CoreError::InvalidOrderStatus { .. }
            | CoreError::RegisterAlreadyOpen { .. } => ErrorKind::Conflict,

            CoreError::DiscountExceedsTotal { .. }
            | CoreError::EmptyCart
            | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any storage is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., whitespace inside an id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

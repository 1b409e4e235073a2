//! # pospro-core: Pure Business Logic for PosPro
//!
//! Everything the checkout engine decides without touching storage lives
//! here: money arithmetic, order pricing, the order state machine, request
//! validation and the register reconciliation math.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PosPro Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Request layer (external, authenticated)               │   │
//! │  │    Checkout ── RefundOrder ── OpenRegister ── CloseRegister     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Principal + typed request              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  pospro-engine (units of work)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pospro-core (THIS CRATE) ★                      │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ │   │
//! │  │   │  money  │ │ pricing │ │ status  │ │ register │ │requests │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └─────────┘ │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          pospro-db (stock ledger, orders, payments)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Persisted records (Product, Order, Payment, CashRegister, ...)
//! - [`money`] - Integer-cent `Money` and `TaxRate`
//! - [`pricing`] - Order totals from line items
//! - [`status`] - Order status transition rules
//! - [`register`] - Z-report reconciliation
//! - [`requests`] - Typed operation requests and the caller `Principal`
//! - [`validation`] - Field-level input checks
//! - [`error`] - Domain error types and their taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use pospro_core::money::{Money, TaxRate};
//! use pospro_core::pricing::{price_order, DiscountPolicy, PricingLine};
//!
//! let lines = [PricingLine::new(Money::from_cents(10_000), 2, TaxRate::from_bps(1800))];
//! let totals = price_order(
//!     &lines,
//!     Money::from_cents(1_000),
//!     Money::from_cents(500),
//!     DiscountPolicy::Reject,
//! )
//! .unwrap();
//!
//! assert_eq!(totals.subtotal.cents(), 20_000);
//! assert_eq!(totals.tax.cents(), 3_600);
//! assert_eq!(totals.total.cents(), 23_100);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod register;
pub mod requests;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{Money, TaxRate};
pub use status::OrderStatus;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default maximum number of lines in a single checkout.
///
/// The engine configuration can lower or raise this per deployment.
pub const MAX_CART_ITEMS: usize = 100;

/// Default maximum quantity on a single line.
///
/// Catches typos at the till (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest amount accepted in any money field of a request, in cents.
///
/// Sums of a shift's worth of such amounts stay far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Minimum length of a refund or cancellation reason, after trimming.
pub const MIN_REASON_LENGTH: usize = 3;

/// Maximum length of a refund or cancellation reason.
pub const MAX_REASON_LENGTH: usize = 500;

/// Sales channel recorded when the caller does not name one.
pub const DEFAULT_CHANNEL: &str = "pos";

/// Page size used by list operations when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page a list operation returns.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Maximum length of a free-text search term.
pub const MAX_SEARCH_LENGTH: usize = 100;

//! # pospro-engine: Checkout Engine for PosPro
//!
//! Atomic units of work over the stock ledger, orders, payments and cash
//! registers. Every public operation either commits completely or leaves
//! no trace.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request layer (authenticated Principal + typed request)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Engine::checkout / refund / cancel / close_register / ...              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  retry::with_retry ── transient storage error ──► re-run whole unit     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout.rs | refund.rs | register.rs   (one transaction each)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pospro-db: StockLedger, OrderRepository, PaymentRepository, ...        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`checkout`] - Order creation, settlement, fulfilment, cancellation and
//!   lookups (order listing, product search)
//! - [`refund`] - Full refunds with stock restore and payment reversal
//! - [`register`] - Shift open/close and the Z-report
//! - [`config`] - TOML configuration with environment overrides
//! - [`retry`] - Whole-unit retry on transient storage errors
//! - [`telemetry`] - `tracing` subscriber setup
//! - [`error`] - `EngineError` and its `ErrorKind` classification
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use pospro_engine::{Engine, EngineConfig};
//! use pospro_core::requests::{CheckoutItem, CheckoutRequest, Principal, Role};
//! use pospro_core::PaymentMethod;
//!
//! let engine = Engine::connect(EngineConfig::load(None)?).await?;
//! let cashier = Principal::new("org-1", "cashier-1", Role::Cashier);
//!
//! // 2 × 100.00 at 18% VAT, 10.00 off, 5.00 shipping
//! let mut request = CheckoutRequest::new("branch-1", vec![CheckoutItem::new("laptop-id", 2)])
//!     .paid_with(PaymentMethod::Cash);
//! request.discount_cents = 1_000;
//! request.shipping_cents = 500;
//!
//! let details = engine.checkout(&cashier, &request).await?;
//! assert_eq!(details.order.total_cents, 23_100); // 231.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod config;
pub mod error;
pub mod refund;
pub mod register;
pub mod retry;
pub mod telemetry;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};

use tracing::info;

use pospro_core::register::ZReport;
use pospro_core::requests::{
    AdvanceOrderRequest, CancelRequest, CheckoutRequest, CloseRegisterRequest, OpenRegisterRequest,
    OrderDetails, OrderFilter, OrderPage, PageRequest, Principal, RefundRequest,
    SettleOrderRequest,
};
use pospro_core::{CashRegister, Product};
use pospro_db::Database;

use crate::retry::with_retry;

// =============================================================================
// Engine
// =============================================================================

/// Entry point for the request layer.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Engine {
    db: Database,
    config: EngineConfig,
}

impl Engine {
    /// Validates the configuration and opens the database.
    pub async fn connect(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let db = Database::new(config.database.db_config()).await?;

        info!(
            path = %config.database.path.display(),
            max_connections = config.database.max_connections,
            "Checkout engine ready"
        );

        Ok(Engine { db, config })
    }

    /// Wraps an already open database.
    pub fn with_database(db: Database, config: EngineConfig) -> Self {
        Engine { db, config }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// See [`checkout::create_order`].
    pub async fn checkout(
        &self,
        principal: &Principal,
        request: &CheckoutRequest,
    ) -> EngineResult<OrderDetails> {
        with_retry(&self.config.retry, || {
            checkout::create_order(&self.db, &self.config.checkout, principal, request)
        })
        .await
    }

    pub async fn settle_order(
        &self,
        principal: &Principal,
        request: &SettleOrderRequest,
    ) -> EngineResult<OrderDetails> {
        with_retry(&self.config.retry, || {
            checkout::settle_order(&self.db, principal, request)
        })
        .await
    }

    pub async fn advance_order(
        &self,
        principal: &Principal,
        request: &AdvanceOrderRequest,
    ) -> EngineResult<OrderDetails> {
        with_retry(&self.config.retry, || {
            checkout::advance_order(&self.db, principal, request)
        })
        .await
    }

    pub async fn cancel(
        &self,
        principal: &Principal,
        request: &CancelRequest,
    ) -> EngineResult<OrderDetails> {
        with_retry(&self.config.retry, || {
            checkout::cancel_order(&self.db, principal, request)
        })
        .await
    }

    /// See [`refund::refund_order`].
    pub async fn refund(
        &self,
        principal: &Principal,
        request: &RefundRequest,
    ) -> EngineResult<OrderDetails> {
        with_retry(&self.config.retry, || {
            refund::refund_order(&self.db, principal, request)
        })
        .await
    }

    pub async fn get_order(
        &self,
        principal: &Principal,
        order_id: &str,
    ) -> EngineResult<OrderDetails> {
        with_retry(&self.config.retry, || {
            checkout::get_order(&self.db, principal, order_id)
        })
        .await
    }

    /// See [`checkout::list_orders`].
    pub async fn list_orders(
        &self,
        principal: &Principal,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> EngineResult<OrderPage> {
        with_retry(&self.config.retry, || {
            checkout::list_orders(&self.db, principal, filter, page)
        })
        .await
    }

    pub async fn search_products(
        &self,
        principal: &Principal,
        term: &str,
        limit: u32,
    ) -> EngineResult<Vec<Product>> {
        with_retry(&self.config.retry, || {
            checkout::search_products(&self.db, principal, term, limit)
        })
        .await
    }

    // =========================================================================
    // Registers
    // =========================================================================

    pub async fn open_register(
        &self,
        principal: &Principal,
        request: &OpenRegisterRequest,
    ) -> EngineResult<CashRegister> {
        with_retry(&self.config.retry, || {
            register::open_register(&self.db, principal, request)
        })
        .await
    }

    /// See [`register::close_register`].
    pub async fn close_register(
        &self,
        principal: &Principal,
        request: &CloseRegisterRequest,
    ) -> EngineResult<ZReport> {
        with_retry(&self.config.retry, || {
            register::close_register(&self.db, principal, request)
        })
        .await
    }

    pub async fn current_register(
        &self,
        principal: &Principal,
    ) -> EngineResult<Option<CashRegister>> {
        with_retry(&self.config.retry, || {
            register::current_register(&self.db, principal)
        })
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

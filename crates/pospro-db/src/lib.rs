//! # pospro-db: Database Layer for PosPro
//!
//! SQLite storage for the checkout engine, through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PosPro Data Flow                                 │
//! │                                                                         │
//! │  Engine::checkout(principal, request)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pospro-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ StockLedger   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │ 001_initial_ │  │   │
//! │  │   │ Transactions  │    │ PaymentRepo   │    │   schema.sql │  │   │
//! │  │   │               │    │ RegisterRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                SQLite Database (WAL, busy timeout)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Stock ledger and repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pospro_db::{Database, DbConfig, StockLedger};
//!
//! let db = Database::new(DbConfig::new("pospro.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! let reservation = StockLedger::reserve_and_decrement(&mut tx, &org_id, &product_id, 2).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::{generate_order_number, OrderRepository, Transition};
pub use repository::payment::{NewPayment, PaymentRepository};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::register::RegisterRepository;
pub use repository::stock::{Reservation, StockError, StockLedger};

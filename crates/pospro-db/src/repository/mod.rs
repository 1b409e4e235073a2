//! # Repository Module
//!
//! SQL for the checkout engine, one module per table family.
//!
//! ## Two Kinds of Access
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reads (pool)                         Writes (caller's transaction)     │
//! │  ─────────────                        ─────────────────────────────     │
//! │  db.orders().details(org, id)         let mut tx = db.begin().await?;   │
//! │  db.products().get_by_barcode(..)     StockLedger::reserve_and_         │
//! │  db.registers().current(org, user)        decrement(&mut tx, ..)        │
//! │                                       OrderRepository::insert(&mut tx,  │
//! │                                           &order)                       │
//! │                                       PaymentRepository::record(..)     │
//! │                                       tx.commit().await?;               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Write functions take `&mut SqliteConnection` so several of them compose
//! into one atomic unit. Nothing in this module commits.
//!
//! ## Available Repositories
//!
//! - [`StockLedger`] - conditional stock decrement and restore
//! - [`ProductRepository`] - product lookups, low stock, seeding
//! - [`OrderRepository`] - orders, items, status history, transitions
//! - [`PaymentRepository`] - payments and reversals
//! - [`RegisterRepository`] - cashier shifts and shift totals
//!
//! [`StockLedger`]: stock::StockLedger
//! [`ProductRepository`]: product::ProductRepository
//! [`OrderRepository`]: order::OrderRepository
//! [`PaymentRepository`]: payment::PaymentRepository
//! [`RegisterRepository`]: register::RegisterRepository

pub mod order;
pub mod payment;
pub mod product;
pub mod register;
pub mod stock;

/// `%term%` for a `LIKE ... ESCAPE '\'` clause, with the term's own
/// wildcards escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

//! # Stock Ledger
//!
//! The only writer of `products.stock_quantity`.
//!
//! ## Atomic Check-and-Adjust
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Till A (qty 3)                    Till B (qty 3)     stock = 4         │
//! │       │                                  │                              │
//! │       ▼                                  │                              │
//! │  UPDATE products                         │                              │
//! │     SET stock_quantity = stock_quantity - 3                             │
//! │   WHERE id = ? AND stock_quantity >= 3   │                              │
//! │  → 1 row, stock = 1  (holds write lock)  │                              │
//! │       │                                  ▼                              │
//! │    COMMIT ─────────────────────────► same UPDATE (after busy wait)      │
//! │                                     → 0 rows                            │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                                  read row: available = 1                │
//! │                                  InsufficientStock { available: 1 }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no read-then-write: the condition and the decrement are one
//! statement, so no interleaving can take stock below zero.
//!
//! Both functions run on a caller-held connection, inside the caller's
//! transaction. Nothing here commits.

use chrono::Utc;
use sqlx::SqliteConnection;
use thiserror::Error;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::product::{ProductRepository, PRODUCT_COLUMNS};
use pospro_core::Product;

/// Why a decrement was refused, or the storage failure that stopped it.
#[derive(Debug, Error)]
pub enum StockError {
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    #[error("Product {name} ({product_id}) is not active")]
    ProductInactive { product_id: String, name: String },

    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        sku: String,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for StockError {
    fn from(err: sqlx::Error) -> Self {
        StockError::Db(err.into())
    }
}

/// Outcome of a successful reservation.
#[derive(Debug, Clone)]
pub struct Reservation {
    /// Product row after the decrement. For a tracked product
    /// `stock_quantity` is the new quantity on hand.
    pub product: Product,
    /// `false` for untracked products, whose stock was left untouched.
    pub tracked: bool,
}

impl Reservation {
    /// New quantity on hand, `None` for untracked products.
    pub fn new_quantity(&self) -> Option<i64> {
        self.tracked.then_some(self.product.stock_quantity)
    }
}

/// Conditional stock adjustments.
pub struct StockLedger;

impl StockLedger {
    /// Decrements stock by `quantity` if, and only if, enough is on hand.
    ///
    /// ## Errors
    /// * `ProductNotFound` - not in the caller's organization
    /// * `ProductInactive` - deactivated
    /// * `InsufficientStock` - tracked and `stock_quantity < quantity`
    ///
    /// Untracked products succeed without changing anything.
    pub async fn reserve_and_decrement(
        conn: &mut SqliteConnection,
        organization_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> Result<Reservation, StockError> {
        if quantity <= 0 {
            return Err(DbError::InvalidData(format!(
                "stock decrement must be positive, got {quantity}"
            ))
            .into());
        }

        let sql = format!(
            r#"
            UPDATE products SET
                stock_quantity = stock_quantity - ?1,
                updated_at = ?2
            WHERE id = ?3
              AND organization_id = ?4
              AND is_active = 1
              AND track_inventory = 1
              AND stock_quantity >= ?1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let decremented = sqlx::query_as::<_, Product>(&sql)
            .bind(quantity)
            .bind(Utc::now())
            .bind(product_id)
            .bind(organization_id)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(product) = decremented {
            debug!(
                product_id = %product_id,
                quantity = quantity,
                remaining = product.stock_quantity,
                "Stock decremented"
            );
            return Ok(Reservation {
                product,
                tracked: true,
            });
        }

        // The conditional update matched nothing; the row says why.
        let product = ProductRepository::find(conn, organization_id, product_id)
            .await?
            .ok_or_else(|| StockError::ProductNotFound {
                product_id: product_id.to_string(),
            })?;

        if !product.is_active {
            return Err(StockError::ProductInactive {
                product_id: product.id,
                name: product.name,
            });
        }

        if !product.track_inventory {
            debug!(product_id = %product_id, "Untracked product, stock unchanged");
            return Ok(Reservation {
                product,
                tracked: false,
            });
        }

        Err(StockError::InsufficientStock {
            product_id: product.id,
            sku: product.sku,
            name: product.name,
            available: product.stock_quantity,
            requested: quantity,
        })
    }

    /// Puts `quantity` back on hand.
    ///
    /// Never fails on business grounds: a missing or untracked product is a
    /// no-op and returns `None`. Inactive products are restored too, the
    /// goods physically came back.
    pub async fn restore(
        conn: &mut SqliteConnection,
        organization_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<Option<i64>> {
        if quantity <= 0 {
            return Err(DbError::InvalidData(format!(
                "stock restore must be positive, got {quantity}"
            )));
        }

        let restored: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products SET
                stock_quantity = stock_quantity + ?1,
                updated_at = ?2
            WHERE id = ?3
              AND organization_id = ?4
              AND track_inventory = 1
            RETURNING stock_quantity
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;

        debug!(
            product_id = %product_id,
            quantity = quantity,
            new_quantity = ?restored,
            "Stock restored"
        );

        Ok(restored)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::NewProduct;
    use crate::{Database, DbConfig};

    const ORG: &str = "org-1";

    async fn setup() -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&NewProduct::new(ORG, "COKE-330", "Coca-Cola 330ml", 299).stock(4))
            .await
            .unwrap();
        (db, product)
    }

    #[tokio::test]
    async fn test_decrement_and_restore() {
        let (db, product) = setup().await;

        let mut tx = db.begin().await.unwrap();
        let reservation = StockLedger::reserve_and_decrement(&mut tx, ORG, &product.id, 3)
            .await
            .unwrap();
        assert_eq!(reservation.new_quantity(), Some(1));

        let restored = StockLedger::restore(&mut tx, ORG, &product.id, 3)
            .await
            .unwrap();
        assert_eq!(restored, Some(4));
        tx.commit().await.unwrap();

        assert_eq!(db.products().stock_of(ORG, &product.id).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_insufficient_stock_reports_available() {
        let (db, product) = setup().await;

        let mut tx = db.begin().await.unwrap();
        let err = StockLedger::reserve_and_decrement(&mut tx, ORG, &product.id, 5)
            .await
            .unwrap_err();

        match err {
            StockError::InsufficientStock {
                available,
                requested,
                sku,
                ..
            } => {
                assert_eq!(available, 4);
                assert_eq!(requested, 5);
                assert_eq!(sku, "COKE-330");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exact_quantity_leaves_zero() {
        let (db, product) = setup().await;

        let mut tx = db.begin().await.unwrap();
        let reservation = StockLedger::reserve_and_decrement(&mut tx, ORG, &product.id, 4)
            .await
            .unwrap();
        assert_eq!(reservation.new_quantity(), Some(0));

        let err = StockLedger::reserve_and_decrement(&mut tx, ORG, &product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::InsufficientStock { available: 0, .. }));
    }

    #[tokio::test]
    async fn test_missing_and_foreign_products() {
        let (db, product) = setup().await;

        let mut tx = db.begin().await.unwrap();
        let err = StockLedger::reserve_and_decrement(&mut tx, ORG, "missing", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::ProductNotFound { .. }));

        let err = StockLedger::reserve_and_decrement(&mut tx, "other-org", &product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::ProductNotFound { .. }));
    }

    #[tokio::test]
    async fn test_inactive_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&NewProduct::new(ORG, "OLD", "Discontinued", 100).stock(10).inactive())
            .await
            .unwrap();

        let mut tx = db.begin().await.unwrap();
        let err = StockLedger::reserve_and_decrement(&mut tx, ORG, &product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::ProductInactive { .. }));
    }

    #[tokio::test]
    async fn test_untracked_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&NewProduct::new(ORG, "SERVICE", "Gift wrap", 150).untracked())
            .await
            .unwrap();

        let mut tx = db.begin().await.unwrap();
        let reservation = StockLedger::reserve_and_decrement(&mut tx, ORG, &product.id, 500)
            .await
            .unwrap();
        assert!(!reservation.tracked);
        assert_eq!(reservation.new_quantity(), None);

        let restored = StockLedger::restore(&mut tx, ORG, &product.id, 500)
            .await
            .unwrap();
        assert_eq!(restored, None);
        tx.commit().await.unwrap();

        assert_eq!(db.products().stock_of(ORG, &product.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let (db, product) = setup().await;
        let mut tx = db.begin().await.unwrap();

        let err = StockLedger::reserve_and_decrement(&mut tx, ORG, &product.id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::Db(DbError::InvalidData(_))));

        let err = StockLedger::restore(&mut tx, ORG, &product.id, -1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidData(_)));
    }
}

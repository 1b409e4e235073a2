//! # Product Repository
//!
//! Catalog reads for the checkout engine.
//!
//! The catalog itself is managed elsewhere. This repository looks products
//! up (by id, barcode scan or name/SKU search), reports stock levels and
//! inserts rows for seeding and tests. Stock is written only by [`StockLedger`].
//!
//! [`StockLedger`]: crate::repository::stock::StockLedger
//!
//! ## Barcode Scan
//! ```text
//! Scanner reads "5449000000996"
//!      │
//!      ▼
//! get_by_barcode(org, "5449000000996") ← idx_products_org_barcode
//!      │
//!      ▼
//! Product { sku: "COKE-330", stock_quantity: 48, .. }
//!      │
//!      ▼
//! CheckoutItem { product_id, quantity: 1 }
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use pospro_core::validation::{
    validate_amount_cents, validate_product_name, validate_sku, validate_tax_rate_bps,
};
use pospro_core::Product;

pub(crate) const PRODUCT_COLUMNS: &str = "id, organization_id, sku, barcode, name, \
     base_price_cents, sale_price_cents, vat_rate_bps, track_inventory, stock_quantity, \
     low_stock_threshold, is_active, created_at, updated_at";

// =============================================================================
// New Product
// =============================================================================

/// Input for [`ProductRepository::insert`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub organization_id: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub base_price_cents: i64,
    pub sale_price_cents: Option<i64>,
    pub vat_rate_bps: u32,
    pub track_inventory: bool,
    pub stock_quantity: i64,
    pub low_stock_threshold: i64,
    pub is_active: bool,
}

impl NewProduct {
    /// A tracked, active product with no stock and no VAT.
    pub fn new(
        organization_id: impl Into<String>,
        sku: impl Into<String>,
        name: impl Into<String>,
        base_price_cents: i64,
    ) -> Self {
        NewProduct {
            organization_id: organization_id.into(),
            sku: sku.into(),
            barcode: None,
            name: name.into(),
            base_price_cents,
            sale_price_cents: None,
            vat_rate_bps: 0,
            track_inventory: true,
            stock_quantity: 0,
            low_stock_threshold: 0,
            is_active: true,
        }
    }

    pub fn stock(mut self, quantity: i64) -> Self {
        self.stock_quantity = quantity;
        self
    }

    pub fn vat_bps(mut self, bps: u32) -> Self {
        self.vat_rate_bps = bps;
        self
    }

    pub fn sale_price(mut self, cents: i64) -> Self {
        self.sale_price_cents = Some(cents);
        self
    }

    pub fn barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn untracked(mut self) -> Self {
        self.track_inventory = false;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    fn validate(&self) -> DbResult<()> {
        let invalid = |e: pospro_core::ValidationError| DbError::InvalidData(e.to_string());

        validate_sku(&self.sku).map_err(invalid)?;
        validate_product_name(&self.name).map_err(invalid)?;
        validate_tax_rate_bps(self.vat_rate_bps).map_err(invalid)?;
        validate_amount_cents("base_price", self.base_price_cents).map_err(invalid)?;
        if let Some(sale) = self.sale_price_cents {
            validate_amount_cents("sale_price", sale).map_err(invalid)?;
        }
        if self.track_inventory {
            validate_amount_cents("stock_quantity", self.stock_quantity).map_err(invalid)?;
        }
        Ok(())
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product reads.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_by_barcode(&org_id, "5449000000996").await?;
/// let low = repo.low_stock(&org_id, 50).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by id within an organization.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No such product in this organization
    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, organization_id, id).await
    }

    /// Same as [`get_by_id`](Self::get_by_id) on a caller-held connection,
    /// so a unit of work sees its own uncommitted writes.
    pub async fn find(
        conn: &mut SqliteConnection,
        organization_id: &str,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND organization_id = ?2"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(product)
    }

    /// Looks up an active product by scanned barcode.
    pub async fn get_by_barcode(
        &self,
        organization_id: &str,
        barcode: &str,
    ) -> DbResult<Option<Product>> {
        let barcode = barcode.trim();
        debug!(barcode = %barcode, "Looking up product by barcode");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE organization_id = ?1 AND barcode = ?2 AND is_active = 1
             LIMIT 1"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(organization_id)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Active products whose name, SKU or barcode contains `term`
    /// (ASCII case-insensitive), by name.
    pub async fn search(
        &self,
        organization_id: &str,
        term: &str,
        limit: u32,
    ) -> DbResult<Vec<Product>> {
        let pattern = contains_pattern(term.trim());

        let sql = format!(
            r#"SELECT {PRODUCT_COLUMNS} FROM products
             WHERE organization_id = ?1
               AND is_active = 1
               AND (name LIKE ?2 ESCAPE '\'
                    OR sku LIKE ?2 ESCAPE '\'
                    OR barcode LIKE ?2 ESCAPE '\')
             ORDER BY name ASC, sku ASC
             LIMIT ?3"#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(organization_id)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(term = %term, count = products.len(), "Product search");
        Ok(products)
    }

    /// Current quantity on hand.
    pub async fn stock_of(&self, organization_id: &str, id: &str) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT stock_quantity FROM products WHERE id = ?1 AND organization_id = ?2",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        quantity.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Number of products in an organization.
    pub async fn count(&self, organization_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE organization_id = ?1")
                .bind(organization_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Active tracked products at or below their low-stock threshold,
    /// emptiest first.
    pub async fn low_stock(&self, organization_id: &str, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE organization_id = ?1
               AND is_active = 1
               AND track_inventory = 1
               AND stock_quantity <= low_stock_threshold
             ORDER BY stock_quantity ASC, name ASC
             LIMIT ?2"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(organization_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Low stock products");
        Ok(products)
    }

    /// Inserts a product.
    ///
    /// ## Errors
    /// * `InvalidData` - SKU, name, VAT rate or amounts are malformed
    /// * `UniqueViolation` - SKU already used in the organization
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        new.validate()?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            organization_id: new.organization_id.clone(),
            sku: new.sku.trim().to_string(),
            barcode: new.barcode.clone(),
            name: new.name.trim().to_string(),
            base_price_cents: new.base_price_cents,
            sale_price_cents: new.sale_price_cents,
            vat_rate_bps: new.vat_rate_bps,
            track_inventory: new.track_inventory,
            stock_quantity: new.stock_quantity,
            low_stock_threshold: new.low_stock_threshold,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, organization_id, sku, barcode, name,
                base_price_cents, sale_price_cents, vat_rate_bps,
                track_inventory, stock_quantity, low_stock_threshold, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&product.id)
        .bind(&product.organization_id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.base_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.vat_rate_bps)
        .bind(product.track_inventory)
        .bind(product.stock_quantity)
        .bind(product.low_stock_threshold)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: product.sku.clone(),
            },
            other => other,
        })?;

        Ok(product)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    const ORG: &str = "org-1";

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup().await;
        let repo = db.products();

        let inserted = repo
            .insert(
                &NewProduct::new(ORG, "COKE-330", "Coca-Cola 330ml", 299)
                    .vat_bps(1800)
                    .stock(48),
            )
            .await
            .unwrap();

        let fetched = repo.get_by_id(ORG, &inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku, "COKE-330");
        assert_eq!(fetched.vat_rate_bps, 1800);
        assert_eq!(fetched.stock_quantity, 48);
        assert!(fetched.track_inventory);
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_organization() {
        let db = setup().await;
        let repo = db.products();
        let p = repo
            .insert(&NewProduct::new(ORG, "SKU-1", "Thing", 100))
            .await
            .unwrap();

        assert!(repo.get_by_id("other-org", &p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_barcode() {
        let db = setup().await;
        let repo = db.products();
        repo.insert(
            &NewProduct::new(ORG, "COKE-330", "Coca-Cola 330ml", 299).barcode("5449000000996"),
        )
        .await
        .unwrap();

        let found = repo.get_by_barcode(ORG, " 5449000000996 ").await.unwrap();
        assert_eq!(found.unwrap().sku, "COKE-330");
        assert!(repo.get_by_barcode(ORG, "000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_low_stock() {
        let db = setup().await;
        let repo = db.products();
        repo.insert(&NewProduct::new(ORG, "LOW", "Low", 100).stock(2).low_stock_threshold(5))
            .await
            .unwrap();
        repo.insert(&NewProduct::new(ORG, "EMPTY", "Empty", 100).stock(0).low_stock_threshold(5))
            .await
            .unwrap();
        repo.insert(
            &NewProduct::new(ORG, "PLENTY", "Plenty", 100)
                .stock(50)
                .low_stock_threshold(5),
        )
        .await
        .unwrap();
        repo.insert(
            &NewProduct::new(ORG, "SERVICE", "Service", 100)
                .untracked()
                .low_stock_threshold(5),
        )
        .await
        .unwrap();

        let low = repo.low_stock(ORG, 10).await.unwrap();
        let skus: Vec<_> = low.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["EMPTY", "LOW"]);
    }

    #[tokio::test]
    async fn test_duplicate_sku() {
        let db = setup().await;
        let repo = db.products();
        repo.insert(&NewProduct::new(ORG, "DUP", "One", 100)).await.unwrap();

        let err = repo
            .insert(&NewProduct::new(ORG, "DUP", "Two", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_invalid_product_rejected() {
        let db = setup().await;
        let err = db
            .products()
            .insert(&NewProduct::new(ORG, "BAD SKU", "Bad", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_stock_of_missing_product() {
        let db = setup().await;
        let err = db.products().stock_of(ORG, "nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_search_matches_name_sku_and_barcode() {
        let db = setup().await;
        let repo = db.products();
        repo.insert(
            &NewProduct::new(ORG, "COKE-330", "Coca-Cola 330ml", 299).barcode("5449000000996"),
        )
        .await
        .unwrap();
        repo.insert(&NewProduct::new(ORG, "COKE-ZERO", "Coke Zero", 299))
            .await
            .unwrap();
        repo.insert(&NewProduct::new(ORG, "TEA-1", "Green Tea", 350))
            .await
            .unwrap();
        repo.insert(&NewProduct::new(ORG, "COKE-OLD", "Coke Classic", 250).inactive())
            .await
            .unwrap();
        repo.insert(&NewProduct::new("other-org", "COKE-330", "Coca-Cola 330ml", 299))
            .await
            .unwrap();

        let by_name = repo.search(ORG, "coca", 10).await.unwrap();
        let skus: Vec<_> = by_name.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["COKE-330"]);

        let by_sku = repo.search(ORG, " coke- ", 10).await.unwrap();
        let skus: Vec<_> = by_sku.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["COKE-330", "COKE-ZERO"]);

        let by_barcode = repo.search(ORG, "54490", 10).await.unwrap();
        assert_eq!(by_barcode.len(), 1);

        assert_eq!(repo.search(ORG, "coke", 1).await.unwrap().len(), 1);
        assert!(repo.search(ORG, "_", 10).await.unwrap().is_empty());
    }
}

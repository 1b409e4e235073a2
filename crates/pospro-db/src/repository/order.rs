//! # Order Repository
//!
//! Order headers, line snapshots and the status history.
//!
//! ## Conditional Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transition(order, from: [completed, confirmed, ...], to: refunded)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE orders                                                          │
//! │     SET previous_status = status, status = 'refunded', ...              │
//! │   WHERE id = ? AND organization_id = ? AND status IN (...)              │
//! │  RETURNING *                                                            │
//! │       │                                                                 │
//! │       ├── 1 row  → (Order, previous_status)   caller continues          │
//! │       └── 0 rows → None                       caller classifies:        │
//! │                                               missing / already there / │
//! │                                               wrong state               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two concurrent refunds of the same order both issue this update; only
//! the first matches a refundable status, the second sees `refunded` and
//! matches nothing.
//!
//! Orders are never deleted. Items and history rows are never updated.
//!
//! ## Listing
//! [`OrderRepository::list`] counts and pages through one filter in the same
//! read snapshot, so `total` always agrees with the page it comes with.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use crate::repository::payment::PaymentRepository;
use pospro_core::requests::{OrderDetails, OrderFilter, OrderPage};
use pospro_core::{
    Order, OrderItem, OrderPaymentStatus, OrderStatus, OrderStatusHistory, PaymentMethod,
};

/// Generates a human-readable order number: `ORD-YYYYMMDD-XXXXXXXX`.
///
/// The suffix is the first 8 hex digits of a v4 UUID, uppercased.
pub fn generate_order_number(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "ORD-{}-{}",
        at.format("%Y%m%d"),
        suffix[..8].to_uppercase()
    )
}

/// A conditional status change.
#[derive(Debug, Clone)]
pub struct Transition<'a> {
    /// Statuses the order may currently be in. Empty matches nothing.
    pub from: &'a [OrderStatus],
    pub to: OrderStatus,
    pub payment_status: Option<OrderPaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    /// Appended to `orders.notes` with a ` | ` separator.
    pub append_note: Option<String>,
    pub at: DateTime<Utc>,
}

impl<'a> Transition<'a> {
    pub fn new(from: &'a [OrderStatus], to: OrderStatus, at: DateTime<Utc>) -> Self {
        Transition {
            from,
            to,
            payment_status: None,
            payment_method: None,
            append_note: None,
            at,
        }
    }

    pub fn payment_status(mut self, status: OrderPaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn append_note(mut self, note: impl Into<String>) -> Self {
        self.append_note = Some(note.into());
        self
    }
}

/// Repository for orders.
///
/// Reads run on the pool; writes take the caller's transaction.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order header by id within an organization.
    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, organization_id, id).await
    }

    /// Order with its items, payments and status history, read from one
    /// snapshot.
    pub async fn details(
        &self,
        organization_id: &str,
        id: &str,
    ) -> DbResult<Option<OrderDetails>> {
        let mut tx = self.pool.begin().await?;
        let details = Self::load_details(&mut tx, organization_id, id).await?;
        tx.commit().await?;
        Ok(details)
    }

    /// One page of an organization's orders, newest first.
    ///
    /// `filter` is expected to be validated; its search term is matched as
    /// a substring of the order id or order number.
    pub async fn list(
        &self,
        organization_id: &str,
        filter: &OrderFilter,
        skip: u32,
        limit: u32,
    ) -> DbResult<OrderPage> {
        const WHERE: &str = r#"
            WHERE organization_id = ?1
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR customer_id = ?3)
              AND (?4 IS NULL OR created_at >= ?4)
              AND (?5 IS NULL OR created_at <= ?5)
              AND (?6 IS NULL
                   OR id LIKE ?6 ESCAPE '\'
                   OR order_number LIKE ?6 ESCAPE '\')
        "#;

        let pattern = filter.search.as_deref().map(contains_pattern);
        let mut tx = self.pool.begin().await?;

        let count_sql = format!("SELECT COUNT(*) FROM orders {WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(organization_id)
            .bind(filter.status)
            .bind(&filter.customer_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&pattern)
            .fetch_one(&mut *tx)
            .await?;

        let page_sql = format!(
            "SELECT * FROM orders {WHERE} ORDER BY created_at DESC, rowid DESC LIMIT ?7 OFFSET ?8"
        );
        let orders = sqlx::query_as::<_, Order>(&page_sql)
            .bind(organization_id)
            .bind(filter.status)
            .bind(&filter.customer_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(&pattern)
            .bind(limit)
            .bind(skip)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            total,
            returned = orders.len(),
            skip,
            limit,
            "Listed orders"
        );

        Ok(OrderPage {
            total,
            skip,
            limit,
            orders,
        })
    }

    /// Order header on a caller-held connection.
    pub async fn find(
        conn: &mut SqliteConnection,
        organization_id: &str,
        id: &str,
    ) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE id = ?1 AND organization_id = ?2",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(order)
    }

    /// Line snapshots in insertion order.
    pub async fn items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ?1 ORDER BY rowid",
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Status history, oldest first.
    pub async fn history(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<Vec<OrderStatusHistory>> {
        let history = sqlx::query_as::<_, OrderStatusHistory>(
            "SELECT * FROM order_status_history WHERE order_id = ?1 ORDER BY created_at, rowid",
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(history)
    }

    /// Everything attached to an order, on a caller-held connection.
    pub async fn load_details(
        conn: &mut SqliteConnection,
        organization_id: &str,
        id: &str,
    ) -> DbResult<Option<OrderDetails>> {
        let Some(order) = Self::find(conn, organization_id, id).await? else {
            return Ok(None);
        };

        let items = Self::items(conn, &order.id).await?;
        let payments = PaymentRepository::list(conn, &order.id).await?;
        let history = Self::history(conn, &order.id).await?;

        Ok(Some(OrderDetails {
            order,
            items,
            payments,
            history,
        }))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts an order header.
    pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id,
            order_number = %order.order_number,
            status = %order.status,
            total_cents = order.total_cents,
            "Inserting order"
        );

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, organization_id, branch_id, customer_id, cashier_id,
                order_number, channel,
                subtotal_cents, tax_cents, discount_cents, shipping_cents, total_cents,
                status, payment_status, payment_method, notes,
                created_at, updated_at, completed_at, cancelled_at, refunded_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.organization_id)
        .bind(&order.branch_id)
        .bind(&order.customer_id)
        .bind(&order.cashier_id)
        .bind(&order.order_number)
        .bind(&order.channel)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.discount_cents)
        .bind(order.shipping_cents)
        .bind(order.total_cents)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.payment_method)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.completed_at)
        .bind(order.cancelled_at)
        .bind(order.refunded_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a line snapshot.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
        debug!(
            order_id = %item.order_id,
            product_id = %item.product_id,
            quantity = item.quantity,
            total_price_cents = item.total_price_cents,
            "Inserting order item"
        );

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, product_id, product_name, sku, quantity,
                unit_price_cents, tax_rate_bps, line_total_cents, tax_cents,
                total_price_cents, track_inventory, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(&item.sku)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.tax_rate_bps)
        .bind(item.line_total_cents)
        .bind(item.tax_cents)
        .bind(item.total_price_cents)
        .bind(item.track_inventory)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Appends a status history row.
    pub async fn append_history(
        conn: &mut SqliteConnection,
        order_id: &str,
        from_status: Option<OrderStatus>,
        to_status: OrderStatus,
        notes: Option<&str>,
        created_by: &str,
        at: DateTime<Utc>,
    ) -> DbResult<OrderStatusHistory> {
        let entry = OrderStatusHistory {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            from_status,
            to_status,
            notes: notes.map(str::to_string),
            created_by: created_by.to_string(),
            created_at: at,
        };

        debug!(
            order_id = %order_id,
            from = ?from_status,
            to = %to_status,
            "Appending status history"
        );

        sqlx::query(
            r#"
            INSERT INTO order_status_history (
                id, order_id, from_status, to_status, notes, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.order_id)
        .bind(entry.from_status)
        .bind(entry.to_status)
        .bind(&entry.notes)
        .bind(&entry.created_by)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Moves an order to `transition.to` if it is currently in one of
    /// `transition.from`.
    ///
    /// ## Returns
    /// * `Ok(Some((order, previous)))` - updated row and the status it left
    /// * `Ok(None)` - no order in this organization matched the condition
    pub async fn transition(
        conn: &mut SqliteConnection,
        organization_id: &str,
        order_id: &str,
        transition: &Transition<'_>,
    ) -> DbResult<Option<(Order, OrderStatus)>> {
        if transition.from.is_empty() {
            return Ok(None);
        }

        // Status names are fixed identifiers, not caller input.
        let from_list = transition
            .from
            .iter()
            .map(|s| format!("'{}'", s.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            r#"
            UPDATE orders SET
                previous_status = status,
                status = ?1,
                payment_status = CASE
                    WHEN ?2 = 'refunded' AND payment_status = 'unpaid' THEN payment_status
                    ELSE COALESCE(?2, payment_status)
                END,
                payment_method = COALESCE(?3, payment_method),
                notes = CASE
                    WHEN ?4 IS NULL THEN notes
                    WHEN notes IS NULL OR notes = '' THEN ?4
                    ELSE notes || ' | ' || ?4
                END,
                completed_at = COALESCE(?5, completed_at),
                cancelled_at = COALESCE(?6, cancelled_at),
                refunded_at = COALESCE(?7, refunded_at),
                updated_at = ?8
            WHERE id = ?9
              AND organization_id = ?10
              AND status IN ({from_list})
            RETURNING *
            "#
        );

        let to = transition.to;
        let at = transition.at;
        let completed_at = (to == OrderStatus::Completed).then_some(at);
        let cancelled_at =
            matches!(to, OrderStatus::Cancelled | OrderStatus::Failed).then_some(at);
        let refunded_at = (to == OrderStatus::Refunded).then_some(at);

        let row = sqlx::query(&sql)
            .bind(to)
            .bind(transition.payment_status)
            .bind(transition.payment_method)
            .bind(&transition.append_note)
            .bind(completed_at)
            .bind(cancelled_at)
            .bind(refunded_at)
            .bind(at)
            .bind(order_id)
            .bind(organization_id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(row) = row else {
            debug!(order_id = %order_id, to = %to, "Transition matched no order");
            return Ok(None);
        };

        let order = Order::from_row(&row)?;
        let previous: Option<OrderStatus> = row.try_get("previous_status")?;
        let previous = previous.ok_or_else(|| {
            DbError::Internal(format!("order {order_id} transitioned without a previous status"))
        })?;

        debug!(
            order_id = %order_id,
            from = %previous,
            to = %order.status,
            "Order transitioned"
        );

        Ok(Some((order, previous)))
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

    fn pending_order(id: &str) -> Order {
        let now = Utc::now();
        Order {
            id: id.to_string(),
            organization_id: ORG.to_string(),
            branch_id: "branch-1".to_string(),
            customer_id: None,
            cashier_id: "cashier-1".to_string(),
            order_number: generate_order_number(now),
            channel: "pos".to_string(),
            subtotal_cents: 20_000,
            tax_cents: 3_600,
            discount_cents: 1_000,
            shipping_cents: 500,
            total_cents: 23_100,
            status: OrderStatus::Pending,
            payment_status: OrderPaymentStatus::Unpaid,
            payment_method: None,
            notes: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            cancelled_at: None,
            refunded_at: None,
        }
    }

    async fn setup_with_order(id: &str) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin().await.unwrap();
        OrderRepository::insert(&mut tx, &pending_order(id)).await.unwrap();
        tx.commit().await.unwrap();
        db
    }

    #[test]
    fn test_order_number_format() {
        let at = DateTime::parse_from_rfc3339("2026-03-09T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let number = generate_order_number(at);

        assert!(number.starts_with("ORD-20260309-"));
        let suffix = &number["ORD-20260309-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = setup_with_order("o-1").await;

        let order = db.orders().get_by_id(ORG, "o-1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 23_100);
        assert!(db.orders().get_by_id("other-org", "o-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transition_reports_previous_status() {
        let db = setup_with_order("o-1").await;
        let mut tx = db.begin().await.unwrap();

        let (order, previous) = OrderRepository::transition(
            &mut tx,
            ORG,
            "o-1",
            &Transition::new(&[OrderStatus::Pending], OrderStatus::Completed, Utc::now())
                .payment_status(OrderPaymentStatus::Paid)
                .payment_method(PaymentMethod::Cash),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(previous, OrderStatus::Pending);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.payment_status, OrderPaymentStatus::Paid);
        assert_eq!(order.payment_method, Some(PaymentMethod::Cash));
        assert!(order.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_transition_from_wrong_status_matches_nothing() {
        let db = setup_with_order("o-1").await;
        let mut tx = db.begin().await.unwrap();

        let result = OrderRepository::transition(
            &mut tx,
            ORG,
            "o-1",
            &Transition::new(
                &[OrderStatus::Completed, OrderStatus::Delivered],
                OrderStatus::Refunded,
                Utc::now(),
            ),
        )
        .await
        .unwrap();
        assert!(result.is_none());

        let order = OrderRepository::find(&mut tx, ORG, "o-1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_refund_leaves_unpaid_order_unpaid() {
        let db = setup_with_order("o-1").await;
        let mut tx = db.begin().await.unwrap();

        let (order, previous) = OrderRepository::transition(
            &mut tx,
            ORG,
            "o-1",
            &Transition::new(
                &OrderStatus::REFUNDABLE_STATUSES,
                OrderStatus::Refunded,
                Utc::now(),
            )
            .payment_status(OrderPaymentStatus::Refunded),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(previous, OrderStatus::Pending);
        assert_eq!(order.status, OrderStatus::Refunded);
        assert_eq!(order.payment_status, OrderPaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_second_transition_loses() {
        let db = setup_with_order("o-1").await;
        let mut tx = db.begin().await.unwrap();
        let to_completed =
            Transition::new(&[OrderStatus::Pending], OrderStatus::Completed, Utc::now());

        let first = OrderRepository::transition(&mut tx, ORG, "o-1", &to_completed)
            .await
            .unwrap();
        let second = OrderRepository::transition(&mut tx, ORG, "o-1", &to_completed)
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_notes_accumulate() {
        let db = setup_with_order("o-1").await;
        let mut tx = db.begin().await.unwrap();

        let (order, _) = OrderRepository::transition(
            &mut tx,
            ORG,
            "o-1",
            &Transition::new(&[OrderStatus::Pending], OrderStatus::Confirmed, Utc::now())
                .append_note("Called customer"),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(order.notes.as_deref(), Some("Called customer"));

        let (order, _) = OrderRepository::transition(
            &mut tx,
            ORG,
            "o-1",
            &Transition::new(&[OrderStatus::Confirmed], OrderStatus::Refunded, Utc::now())
                .append_note("Refunded: damaged"),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(
            order.notes.as_deref(),
            Some("Called customer | Refunded: damaged")
        );
        assert!(order.refunded_at.is_some());
    }

    #[tokio::test]
    async fn test_empty_from_list_matches_nothing() {
        let db = setup_with_order("o-1").await;
        let mut tx = db.begin().await.unwrap();

        let result = OrderRepository::transition(
            &mut tx,
            ORG,
            "o-1",
            &Transition::new(&[], OrderStatus::Completed, Utc::now()),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_details_include_history() {
        let db = setup_with_order("o-1").await;

        let mut tx = db.begin().await.unwrap();
        OrderRepository::append_history(
            &mut tx,
            "o-1",
            None,
            OrderStatus::Pending,
            None,
            "cashier-1",
            Utc::now(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let details = db.orders().details(ORG, "o-1").await.unwrap().unwrap();
        assert_eq!(details.order.id, "o-1");
        assert!(details.items.is_empty());
        assert!(details.payments.is_empty());
        assert_eq!(details.history.len(), 1);
        assert_eq!(details.history[0].from_status, None);
        assert_eq!(details.history[0].to_status, OrderStatus::Pending);
    }

    async fn insert_at(
        db: &Database,
        id: &str,
        at: DateTime<Utc>,
        edit: impl FnOnce(&mut Order),
    ) {
        let mut order = pending_order(id);
        order.created_at = at;
        order.updated_at = at;
        edit(&mut order);
        let mut tx = db.begin().await.unwrap();
        OrderRepository::insert(&mut tx, &order).await.unwrap();
        tx.commit().await.unwrap();
    }

    fn ids(page: &OrderPage) -> Vec<&str> {
        page.orders.iter().map(|o| o.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let base = DateTime::parse_from_rfc3339("2026-03-09T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        insert_at(&db, "o-1", base, |_| {}).await;
        insert_at(&db, "o-2", base + chrono::Duration::hours(1), |o| {
            o.customer_id = Some("cust-7".to_string());
        })
        .await;
        insert_at(&db, "o-3", base + chrono::Duration::hours(2), |o| {
            o.status = OrderStatus::Completed;
            o.payment_status = OrderPaymentStatus::Paid;
            o.customer_id = Some("cust-7".to_string());
        })
        .await;
        insert_at(&db, "o-4", base + chrono::Duration::hours(3), |o| {
            o.organization_id = "other-org".to_string();
        })
        .await;

        let repo = db.orders();

        let all = repo.list(ORG, &OrderFilter::default(), 0, 50).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(ids(&all), vec!["o-3", "o-2", "o-1"]);

        let page = repo.list(ORG, &OrderFilter::default(), 1, 1).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(ids(&page), vec!["o-2"]);

        let beyond = repo.list(ORG, &OrderFilter::default(), 10, 5).await.unwrap();
        assert_eq!(beyond.total, 3);
        assert!(beyond.orders.is_empty());

        let completed = OrderFilter::default().status(OrderStatus::Completed);
        let page = repo.list(ORG, &completed, 0, 50).await.unwrap();
        assert_eq!(ids(&page), vec!["o-3"]);

        let customer = OrderFilter::default().customer("cust-7");
        let page = repo.list(ORG, &customer, 0, 50).await.unwrap();
        assert_eq!(page.total, 2);

        let window = OrderFilter::default().between(base, base + chrono::Duration::hours(1));
        let page = repo.list(ORG, &window, 0, 50).await.unwrap();
        assert_eq!(ids(&page), vec!["o-2", "o-1"]);

        let by_id = OrderFilter::default().search("o-2");
        let page = repo.list(ORG, &by_id, 0, 50).await.unwrap();
        assert_eq!(ids(&page), vec!["o-2"]);
    }

    #[tokio::test]
    async fn test_list_search_matches_order_number() {
        let db = setup_with_order("o-1").await;
        let order = db.orders().get_by_id(ORG, "o-1").await.unwrap().unwrap();
        let suffix = order.order_number["ORD-YYYYMMDD-".len()..].to_lowercase();

        let found = db
            .orders()
            .list(ORG, &OrderFilter::default().search(suffix), 0, 50)
            .await
            .unwrap();
        assert_eq!(found.total, 1);

        let wildcard = db
            .orders()
            .list(ORG, &OrderFilter::default().search("%"), 0, 50)
            .await
            .unwrap();
        assert_eq!(wildcard.total, 0);
    }

    #[tokio::test]
    async fn test_list_window_orders_fractional_timestamps() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let whole = DateTime::parse_from_rfc3339("2026-03-09T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let fraction = whole + chrono::Duration::microseconds(500);

        insert_at(&db, "o-whole", whole, |_| {}).await;
        insert_at(&db, "o-fraction", fraction, |_| {}).await;

        let upto_whole =
            OrderFilter::default().between(whole - chrono::Duration::hours(1), whole);
        let page = db.orders().list(ORG, &upto_whole, 0, 50).await.unwrap();
        assert_eq!(ids(&page), vec!["o-whole"]);

        let from_fraction = OrderFilter::default().between(fraction, fraction);
        let page = db.orders().list(ORG, &from_fraction, 0, 50).await.unwrap();
        assert_eq!(ids(&page), vec!["o-fraction"]);
    }
}

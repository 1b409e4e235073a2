//! # Cash Register Repository
//!
//! Cashier shifts.
//!
//! ## Shift Lifecycle
//! ```text
//! open(user)                       close(user, counted cash)
//!    │                                 │
//!    ▼                                 ▼
//! INSERT status='open'             UPDATE ... SET status='closed'
//!    │  idx_cash_registers_one_open    │  WHERE user_id = ? AND status='open'
//!    │  (second open → UNIQUE error)   │
//!    ▼                                 ▼
//! ┌──────┐                         shift_totals([opened_at, closed_at))
//! │ open │ ───────────────────────►    │
//! └──────┘                             ▼
//!                                  record_totals → closed row holds the Z-report
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use pospro_core::register::ShiftTotals;
use pospro_core::{CashRegister, Money, OrderStatus};

/// Repository for cash registers.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// The open shift of a user, if any.
    pub async fn current(
        &self,
        organization_id: &str,
        user_id: &str,
    ) -> DbResult<Option<CashRegister>> {
        let register = sqlx::query_as::<_, CashRegister>(
            r#"
            SELECT * FROM cash_registers
            WHERE organization_id = ?1 AND user_id = ?2 AND status = 'open'
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(register)
    }

    /// Gets a register by id within an organization.
    pub async fn get_by_id(
        &self,
        organization_id: &str,
        id: &str,
    ) -> DbResult<Option<CashRegister>> {
        let register = sqlx::query_as::<_, CashRegister>(
            "SELECT * FROM cash_registers WHERE id = ?1 AND organization_id = ?2",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(register)
    }

    /// Inserts an open register.
    ///
    /// ## Errors
    /// * `UniqueViolation` on `cash_registers.user_id` - the user already
    ///   has an open shift
    pub async fn open(conn: &mut SqliteConnection, register: &CashRegister) -> DbResult<()> {
        debug!(
            register_id = %register.id,
            user_id = %register.user_id,
            opening_cents = register.opening_cents,
            "Opening register"
        );

        sqlx::query(
            r#"
            INSERT INTO cash_registers (
                id, organization_id, branch_id, user_id, opening_cents, closing_cents,
                status, cash_sales_cents, card_sales_cents, total_sales_cents,
                total_orders, opened_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&register.id)
        .bind(&register.organization_id)
        .bind(&register.branch_id)
        .bind(&register.user_id)
        .bind(register.opening_cents)
        .bind(register.closing_cents)
        .bind(register.status)
        .bind(register.cash_sales_cents)
        .bind(register.card_sales_cents)
        .bind(register.total_sales_cents)
        .bind(register.total_orders)
        .bind(register.opened_at)
        .bind(register.closed_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Closes the user's open register.
    ///
    /// ## Returns
    /// * `Ok(Some(register))` - the closed row
    /// * `Ok(None)` - the user had no open register
    pub async fn close(
        conn: &mut SqliteConnection,
        organization_id: &str,
        user_id: &str,
        closing_cents: i64,
        at: DateTime<Utc>,
    ) -> DbResult<Option<CashRegister>> {
        let register = sqlx::query_as::<_, CashRegister>(
            r#"
            UPDATE cash_registers SET
                status = 'closed',
                closing_cents = ?1,
                closed_at = ?2
            WHERE user_id = ?3
              AND organization_id = ?4
              AND status = 'open'
            RETURNING *
            "#,
        )
        .bind(closing_cents)
        .bind(at)
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?;

        debug!(
            user_id = %user_id,
            closed = register.is_some(),
            "Close register"
        );

        Ok(register)
    }

    /// Sales rung up by `user_id` in `[from, to)`.
    ///
    /// Orders count when their status is a sale status. Cash and card
    /// figures come from completed, positive payments on those orders.
    pub async fn shift_totals(
        conn: &mut SqliteConnection,
        organization_id: &str,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<ShiftTotals> {
        let sale_statuses = sale_status_list();

        let order_sql = format!(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0)
            FROM orders
            WHERE organization_id = ?1
              AND cashier_id = ?2
              AND created_at >= ?3
              AND created_at < ?4
              AND status IN ({sale_statuses})
            "#
        );

        let (total_orders, total_sales): (i64, i64) = sqlx::query_as(&order_sql)
            .bind(organization_id)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_one(&mut *conn)
            .await?;

        let payment_sql = format!(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN p.method = 'cash' THEN p.amount_cents ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN p.method IN ('credit_card', 'debit_card')
                                  THEN p.amount_cents ELSE 0 END), 0)
            FROM payments p
            JOIN orders o ON o.id = p.order_id
            WHERE o.organization_id = ?1
              AND o.cashier_id = ?2
              AND o.created_at >= ?3
              AND o.created_at < ?4
              AND o.status IN ({sale_statuses})
              AND p.status = 'completed'
              AND p.amount_cents > 0
            "#
        );

        let (cash_sales, card_sales): (i64, i64) = sqlx::query_as(&payment_sql)
            .bind(organization_id)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_one(&mut *conn)
            .await?;

        Ok(ShiftTotals {
            total_orders,
            total_sales: Money::from_cents(total_sales),
            cash_sales: Money::from_cents(cash_sales),
            card_sales: Money::from_cents(card_sales),
        })
    }

    /// Stores the Z-report figures on a closed register and stamps the
    /// close instant the figures were computed up to.
    pub async fn record_totals(
        conn: &mut SqliteConnection,
        register_id: &str,
        totals: &ShiftTotals,
        closed_at: DateTime<Utc>,
    ) -> DbResult<CashRegister> {
        let register = sqlx::query_as::<_, CashRegister>(
            r#"
            UPDATE cash_registers SET
                cash_sales_cents = ?1,
                card_sales_cents = ?2,
                total_sales_cents = ?3,
                total_orders = ?4,
                closed_at = ?5
            WHERE id = ?6
            RETURNING *
            "#,
        )
        .bind(totals.cash_sales.cents())
        .bind(totals.card_sales.cents())
        .bind(totals.total_sales.cents())
        .bind(totals.total_orders)
        .bind(closed_at)
        .bind(register_id)
        .fetch_one(&mut *conn)
        .await?;

        debug!(
            register_id = %register_id,
            total_orders = totals.total_orders,
            total_sales_cents = totals.total_sales.cents(),
            "Register totals recorded"
        );

        Ok(register)
    }
}

fn sale_status_list() -> String {
    OrderStatus::SALE_STATUSES
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::order::{generate_order_number, OrderRepository};
    use crate::repository::payment::{NewPayment, PaymentRepository};
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use pospro_core::{Order, OrderPaymentStatus, PaymentMethod, RegisterStatus};

    const ORG: &str = "org-1";
    const USER: &str = "cashier-1";

    fn open_register(id: &str, opened_at: DateTime<Utc>) -> CashRegister {
        CashRegister {
            id: id.to_string(),
            organization_id: ORG.to_string(),
            branch_id: "branch-1".to_string(),
            user_id: USER.to_string(),
            opening_cents: 50_000,
            closing_cents: None,
            status: RegisterStatus::Open,
            cash_sales_cents: 0,
            card_sales_cents: 0,
            total_sales_cents: 0,
            total_orders: 0,
            opened_at,
            closed_at: None,
        }
    }

    async fn paid_order(
        conn: &mut SqliteConnection,
        id: &str,
        status: OrderStatus,
        total_cents: i64,
        method: PaymentMethod,
        created_at: DateTime<Utc>,
    ) {
        let order = Order {
            id: id.to_string(),
            organization_id: ORG.to_string(),
            branch_id: "branch-1".to_string(),
            customer_id: None,
            cashier_id: USER.to_string(),
            order_number: generate_order_number(created_at),
            channel: "pos".to_string(),
            subtotal_cents: total_cents,
            tax_cents: 0,
            discount_cents: 0,
            shipping_cents: 0,
            total_cents,
            status,
            payment_status: OrderPaymentStatus::Paid,
            payment_method: Some(method),
            notes: None,
            created_at,
            updated_at: created_at,
            completed_at: Some(created_at),
            cancelled_at: None,
            refunded_at: None,
        };
        OrderRepository::insert(conn, &order).await.unwrap();
        PaymentRepository::record(
            conn,
            &NewPayment {
                order_id: id.to_string(),
                organization_id: ORG.to_string(),
                method,
                amount_cents: total_cents,
                reference: None,
                created_by: USER.to_string(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_one_open_register_per_user() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin().await.unwrap();

        RegisterRepository::open(&mut tx, &open_register("r-1", Utc::now()))
            .await
            .unwrap();
        let err = RegisterRepository::open(&mut tx, &open_register("r-2", Utc::now()))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("cash_registers.user_id"));
        tx.commit().await.unwrap();

        let current = db.registers().current(ORG, USER).await.unwrap().unwrap();
        assert_eq!(current.id, "r-1");
    }

    #[tokio::test]
    async fn test_close_then_reopen() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin().await.unwrap();

        RegisterRepository::open(&mut tx, &open_register("r-1", Utc::now()))
            .await
            .unwrap();
        let closed = RegisterRepository::close(&mut tx, ORG, USER, 50_000, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.status, RegisterStatus::Closed);
        assert_eq!(closed.closing_cents, Some(50_000));
        assert!(closed.closed_at.is_some());

        let again = RegisterRepository::close(&mut tx, ORG, USER, 0, Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());

        RegisterRepository::open(&mut tx, &open_register("r-2", Utc::now()))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(db.registers().get_by_id(ORG, "r-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_shift_totals_window_and_statuses() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let opened_at = Utc::now() - Duration::hours(8);
        let closed_at = Utc::now();

        let after = |minutes: i64| opened_at + Duration::minutes(minutes);

        let orders = [
            ("o-1", OrderStatus::Completed, 500, PaymentMethod::Cash, after(5)),
            ("o-2", OrderStatus::Completed, 1_200, PaymentMethod::Cash, after(60)),
            ("o-3", OrderStatus::Delivered, 800, PaymentMethod::CreditCard, after(120)),
            ("o-4", OrderStatus::Completed, 300, PaymentMethod::Wallet, after(180)),
            // Excluded: refunded, before the window, at the close instant
            ("o-5", OrderStatus::Refunded, 9_000, PaymentMethod::Cash, after(240)),
            ("o-6", OrderStatus::Completed, 7_000, PaymentMethod::Cash, after(-1)),
            ("o-7", OrderStatus::Completed, 6_000, PaymentMethod::Cash, closed_at),
        ];

        let mut tx = db.begin().await.unwrap();
        for (id, status, total, method, created_at) in orders {
            paid_order(&mut tx, id, status, total, method, created_at).await;
        }

        let totals = RegisterRepository::shift_totals(&mut tx, ORG, USER, opened_at, closed_at)
            .await
            .unwrap();

        assert_eq!(totals.total_orders, 4);
        assert_eq!(totals.total_sales.cents(), 2_800);
        assert_eq!(totals.cash_sales.cents(), 1_700);
        assert_eq!(totals.card_sales.cents(), 800);
    }

    #[tokio::test]
    async fn test_record_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut tx = db.begin().await.unwrap();
        RegisterRepository::open(&mut tx, &open_register("r-1", Utc::now()))
            .await
            .unwrap();

        let totals = ShiftTotals {
            total_orders: 3,
            total_sales: Money::from_cents(2_500),
            cash_sales: Money::from_cents(1_700),
            card_sales: Money::from_cents(800),
        };
        let closed_at = Utc::now();
        let register = RegisterRepository::record_totals(&mut tx, "r-1", &totals, closed_at)
            .await
            .unwrap();

        assert_eq!(register.total_orders, 3);
        assert_eq!(register.total_sales_cents, 2_500);
        assert_eq!(register.cash_sales_cents, 1_700);
        assert_eq!(register.card_sales_cents, 800);
        assert_eq!(register.closed_at, Some(closed_at));

        let missing = RegisterRepository::record_totals(&mut tx, "missing", &totals, closed_at)
            .await
            .unwrap_err();
        assert!(matches!(missing, DbError::NotFound { .. }));
    }
}

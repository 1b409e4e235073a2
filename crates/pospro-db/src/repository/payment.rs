//! # Payment Repository
//!
//! Append-only payment records.
//!
//! ```text
//!  order o-1
//!  ├── pay-1   cash         +23100  completed
//!  └── pay-2   cash         -23100  refunded   reverses pay-1   "damaged"
//! ```
//!
//! A reversal is a new row with a negative amount pointing at the payment it
//! reverses. The original row is never modified, and the partial unique
//! index `idx_payments_single_reversal` allows one reversal per payment.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pospro_core::{Payment, PaymentMethod, PaymentStatus};

/// Input for [`PaymentRepository::record`].
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: String,
    pub organization_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub reference: Option<String>,
    pub created_by: String,
}

/// Repository for payments.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// All payments and reversals of an order, oldest first.
    pub async fn for_order(&self, order_id: &str) -> DbResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        Self::list(&mut conn, order_id).await
    }

    /// Same as [`for_order`](Self::for_order) on a caller-held connection.
    pub async fn list(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE order_id = ?1 ORDER BY created_at, rowid",
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(payments)
    }

    /// Completed, positive payments of an order that have not been reversed.
    pub async fn reversible(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.* FROM payments p
            WHERE p.order_id = ?1
              AND p.status = 'completed'
              AND p.amount_cents > 0
              AND p.reverses_payment_id IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM payments r WHERE r.reverses_payment_id = p.id
              )
            ORDER BY p.created_at, p.rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(payments)
    }

    /// Records a completed payment.
    ///
    /// ## Errors
    /// * `InvalidData` - amount is not positive
    pub async fn record(conn: &mut SqliteConnection, new: &NewPayment) -> DbResult<Payment> {
        if new.amount_cents <= 0 {
            return Err(DbError::InvalidData(format!(
                "payment amount must be positive, got {}",
                new.amount_cents
            )));
        }

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            order_id: new.order_id.clone(),
            organization_id: new.organization_id.clone(),
            method: new.method,
            amount_cents: new.amount_cents,
            status: PaymentStatus::Completed,
            reverses_payment_id: None,
            reference: new.reference.clone(),
            reason: None,
            created_by: new.created_by.clone(),
            created_at: Utc::now(),
        };

        Self::insert(conn, &payment).await?;

        debug!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            method = payment.method.as_str(),
            amount_cents = payment.amount_cents,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Records a reversal of `amount_cents` against an existing payment.
    ///
    /// ## Errors
    /// * `NotFound` - no such payment in the organization
    /// * `InvalidData` - the target is itself a reversal, or the amount is
    ///   not within `1..=original`
    /// * `UniqueViolation` - the payment was already reversed
    pub async fn reverse(
        conn: &mut SqliteConnection,
        organization_id: &str,
        payment_id: &str,
        amount_cents: i64,
        reason: &str,
        created_by: &str,
    ) -> DbResult<Payment> {
        let original = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE id = ?1 AND organization_id = ?2",
        )
        .bind(payment_id)
        .bind(organization_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Payment", payment_id))?;

        if original.is_reversal() {
            return Err(DbError::InvalidData(format!(
                "payment {payment_id} is itself a reversal"
            )));
        }
        if amount_cents <= 0 || amount_cents > original.amount_cents {
            return Err(DbError::InvalidData(format!(
                "reversal of {amount_cents} outside 1..={}",
                original.amount_cents
            )));
        }

        let reversal = Payment {
            id: Uuid::new_v4().to_string(),
            order_id: original.order_id.clone(),
            organization_id: original.organization_id.clone(),
            method: original.method,
            amount_cents: -amount_cents,
            status: PaymentStatus::Refunded,
            reverses_payment_id: Some(original.id.clone()),
            reference: original.reference.clone(),
            reason: Some(reason.to_string()),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };

        Self::insert(conn, &reversal).await.map_err(|e| match e {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: original.id.clone(),
            },
            other => other,
        })?;

        debug!(
            payment_id = %reversal.id,
            reverses = %original.id,
            amount_cents = reversal.amount_cents,
            "Payment reversed"
        );

        Ok(reversal)
    }

    async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, organization_id, method, amount_cents, status,
                reverses_payment_id, reference, reason, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(&payment.organization_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(payment.status)
        .bind(&payment.reverses_payment_id)
        .bind(&payment.reference)
        .bind(&payment.reason)
        .bind(&payment.created_by)
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

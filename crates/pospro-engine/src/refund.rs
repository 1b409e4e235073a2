//! # Refunds
//!
//! Reverses a sale: stock goes back, payments are reversed, and the order
//! ends in `refunded`.
//!
//! ```text
//!   UPDATE orders ... WHERE status IN (refundable)   ← claims the order
//!        │          (pending included; cancelled and failed are not)
//!        │ 0 rows → OrderNotFound | AlreadyRefunded | InvalidOrderStatus
//!        ▼
//!   restore tracked stock (snapshot on each item)
//!        │
//!        ▼
//!   reverse every completed payment (negative row, linked to original)
//!        │          (none for a pending order, which stays unpaid)
//!        │
//!        ▼
//!   history: previous → refunded
//! ```
//!
//! The status update is the first statement, so two concurrent refunds of
//! the same order serialize on the write lock and the second one finds the
//! order already `refunded`.

use chrono::Utc;
use tracing::info;

use pospro_core::requests::{OrderDetails, Principal, RefundRequest};
use pospro_core::{OrderPaymentStatus, OrderStatus};
use pospro_db::{Database, OrderRepository, PaymentRepository, Transition};

use crate::checkout::{load_or_missing, reject_transition, restore_tracked_stock};
use crate::error::EngineResult;

/// Refunds an order in full.
pub async fn refund_order(
    db: &Database,
    principal: &Principal,
    request: &RefundRequest,
) -> EngineResult<OrderDetails> {
    principal.validate()?;
    let reason = request.validate()?;

    let organization_id = principal.organization_id.as_str();
    let now = Utc::now();
    let mut tx = db.begin().await?;

    let transition = Transition::new(
        &OrderStatus::REFUNDABLE_STATUSES,
        OrderStatus::Refunded,
        now,
    )
    .payment_status(OrderPaymentStatus::Refunded)
    .append_note(format!("Refunded: {reason}"));

    let Some((order, previous)) =
        OrderRepository::transition(&mut tx, organization_id, &request.order_id, &transition)
            .await?
    else {
        return Err(reject_transition(
            &mut tx,
            organization_id,
            &request.order_id,
            OrderStatus::Refunded,
        )
        .await);
    };

    let restored = restore_tracked_stock(&mut tx, organization_id, &order.id).await?;

    let mut reversed_cents = 0;
    for payment in PaymentRepository::reversible(&mut tx, &order.id).await? {
        let reversal = PaymentRepository::reverse(
            &mut tx,
            organization_id,
            &payment.id,
            payment.amount_cents,
            &reason,
            &principal.user_id,
        )
        .await?;
        reversed_cents -= reversal.amount_cents;
    }

    OrderRepository::append_history(
        &mut tx,
        &order.id,
        Some(previous),
        OrderStatus::Refunded,
        Some(&reason),
        &principal.user_id,
        now,
    )
    .await?;

    let details = load_or_missing(&mut tx, organization_id, &order.id).await?;
    tx.commit().await?;

    info!(
        order_id = %order.id,
        from = %previous,
        restored_lines = restored,
        reversed_cents = reversed_cents,
        "Order refunded"
    );

    Ok(details)
}

//! # Checkout and Order Lifecycle
//!
//! Creating orders and moving them through their statuses.
//!
//! ## Checkout Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate principal + request (no I/O)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │       │                                                                 │
//! │       ├── reserve_and_decrement(item 1)  ← first statement is a write   │
//! │       ├── reserve_and_decrement(item 2)                                 │
//! │       ├── ...              any refusal → drop tx → ROLLBACK, nothing    │
//! │       │                                 happened                        │
//! │       ▼                                                                 │
//! │  price_order(lines, discount, shipping)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT order, items, history, payment (if paid now)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All items succeed or none do. Prices, names and the tracked flag are
//! snapshotted onto the items so later catalog edits never change history.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pospro_core::pricing::{price_order, DiscountPolicy, PricingLine};
use pospro_core::requests::{
    AdvanceOrderRequest, CancelRequest, CheckoutRequest, OrderDetails, OrderFilter, OrderPage,
    PageRequest, Principal, SettleOrderRequest,
};
use pospro_core::validation::{validate_id, validate_notes, validate_page_size, validate_search};
use pospro_core::{
    CoreError, Money, Order, OrderItem, OrderPaymentStatus, OrderStatus, PaymentMethod, Product,
    ValidationError,
};
use pospro_db::{
    generate_order_number, Database, NewPayment, OrderRepository, PaymentRepository,
    StockLedger, Transition,
};

use crate::config::CheckoutSettings;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Checkout
// =============================================================================

/// Turns a cart into an order.
///
/// With a payment method the order is `completed`/`paid` and a payment row
/// is written. Without one it waits as `pending`/`unpaid` with its stock
/// already reserved.
pub async fn create_order(
    db: &Database,
    settings: &CheckoutSettings,
    principal: &Principal,
    request: &CheckoutRequest,
) -> EngineResult<OrderDetails> {
    principal.validate()?;
    request.validate(&settings.limits())?;
    let notes = validate_notes(request.notes.as_deref())?;
    let payment_reference = validate_notes(request.payment_reference.as_deref())?;

    let policy = if settings.allow_discount_clamp {
        request.discount_policy()
    } else {
        DiscountPolicy::Reject
    };

    let organization_id = principal.organization_id.as_str();
    let mut tx = db.begin().await?;

    let mut reservations = Vec::with_capacity(request.items.len());
    for item in &request.items {
        let reservation = StockLedger::reserve_and_decrement(
            &mut tx,
            organization_id,
            &item.product_id,
            item.quantity,
        )
        .await
        .map_err(|err| {
            warn!(
                product_id = %item.product_id,
                quantity = item.quantity,
                error = %err,
                "Checkout rejected"
            );
            EngineError::from(err)
        })?;
        reservations.push(reservation);
    }

    // An explicit line price wins over the catalog price; VAT always comes
    // from the product.
    let lines: Vec<PricingLine> = request
        .items
        .iter()
        .zip(&reservations)
        .map(|(item, reservation)| {
            let unit_price = item
                .unit_price_cents
                .map(Money::from_cents)
                .unwrap_or_else(|| reservation.product.effective_price());
            PricingLine::new(unit_price, item.quantity, reservation.product.vat_rate())
        })
        .collect();

    let priced = price_order(
        &lines,
        Money::from_cents(request.discount_cents),
        Money::from_cents(request.shipping_cents),
        policy,
    )?;

    // Taken while holding the write lock, so a concurrent register close
    // either sees this order or precedes it.
    let now = Utc::now();
    let paid_with = request.payment_method;
    let (status, payment_status) = match paid_with {
        Some(_) => (OrderStatus::Completed, OrderPaymentStatus::Paid),
        None => (OrderStatus::Pending, OrderPaymentStatus::Unpaid),
    };

    let order = Order {
        id: Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        branch_id: request.branch_id.trim().to_string(),
        customer_id: request.customer_id.clone(),
        cashier_id: principal.user_id.clone(),
        order_number: generate_order_number(now),
        channel: request.channel.trim().to_string(),
        subtotal_cents: priced.subtotal.cents(),
        tax_cents: priced.tax.cents(),
        discount_cents: priced.discount.cents(),
        shipping_cents: priced.shipping.cents(),
        total_cents: priced.total.cents(),
        status,
        payment_status,
        payment_method: paid_with,
        notes,
        created_at: now,
        updated_at: now,
        completed_at: paid_with.map(|_| now),
        cancelled_at: None,
        refunded_at: None,
    };

    OrderRepository::insert(&mut tx, &order).await?;

    let snapshots = reservations.iter().zip(&lines).zip(&priced.lines);
    for ((reservation, input), line) in snapshots {
        let order_item = OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            product_id: reservation.product.id.clone(),
            product_name: reservation.product.name.clone(),
            sku: reservation.product.sku.clone(),
            quantity: input.quantity,
            unit_price_cents: input.unit_price.cents(),
            tax_rate_bps: reservation.product.vat_rate_bps,
            line_total_cents: line.line_total.cents(),
            tax_cents: line.tax.cents(),
            total_price_cents: line.total_price().cents(),
            track_inventory: reservation.tracked,
            created_at: now,
        };
        OrderRepository::insert_item(&mut tx, &order_item).await?;
    }

    OrderRepository::append_history(
        &mut tx,
        &order.id,
        None,
        status,
        None,
        &principal.user_id,
        now,
    )
    .await?;

    if let Some(method) = paid_with {
        record_full_payment(&mut tx, &order, method, payment_reference, &principal.user_id)
            .await?;
    }

    let details = load_or_missing(&mut tx, organization_id, &order.id).await?;
    tx.commit().await?;

    info!(
        order_id = %order.id,
        order_number = %order.order_number,
        status = %status,
        items = request.items.len(),
        total_cents = order.total_cents,
        "Order created"
    );

    Ok(details)
}

// =============================================================================
// Settle
// =============================================================================

/// Records payment for a `pending` order and completes it.
pub async fn settle_order(
    db: &Database,
    principal: &Principal,
    request: &SettleOrderRequest,
) -> EngineResult<OrderDetails> {
    principal.validate()?;
    request.validate()?;
    let reference = validate_notes(request.reference.as_deref())?;

    let organization_id = principal.organization_id.as_str();
    let now = Utc::now();
    let mut tx = db.begin().await?;

    let transition = Transition::new(&[OrderStatus::Pending], OrderStatus::Completed, now)
        .payment_status(OrderPaymentStatus::Paid)
        .payment_method(request.method);

    let Some((order, previous)) =
        OrderRepository::transition(&mut tx, organization_id, &request.order_id, &transition)
            .await?
    else {
        return Err(reject_transition(
            &mut tx,
            organization_id,
            &request.order_id,
            OrderStatus::Completed,
        )
        .await);
    };

    record_full_payment(&mut tx, &order, request.method, reference, &principal.user_id).await?;

    OrderRepository::append_history(
        &mut tx,
        &order.id,
        Some(previous),
        OrderStatus::Completed,
        None,
        &principal.user_id,
        now,
    )
    .await?;

    let details = load_or_missing(&mut tx, organization_id, &order.id).await?;
    tx.commit().await?;

    info!(
        order_id = %order.id,
        method = request.method.as_str(),
        total_cents = order.total_cents,
        "Order settled"
    );

    Ok(details)
}

// =============================================================================
// Fulfilment
// =============================================================================

/// Moves an order along the fulfilment path
/// (`confirmed → processing → shipped → delivered`, `returned`).
///
/// Targets that move money or stock are refused here; they have their own
/// operations.
pub async fn advance_order(
    db: &Database,
    principal: &Principal,
    request: &AdvanceOrderRequest,
) -> EngineResult<OrderDetails> {
    principal.validate()?;
    request.validate()?;
    let notes = validate_notes(request.notes.as_deref())?;

    let organization_id = principal.organization_id.as_str();
    let target = request.to_status;
    let now = Utc::now();
    let mut tx = db.begin().await?;

    let sources: Vec<OrderStatus> = if target.requires_dedicated_operation() {
        Vec::new()
    } else {
        OrderStatus::ALL
            .into_iter()
            .filter(|status| status.can_transition_to(target))
            .collect()
    };

    let transition = Transition::new(&sources, target, now);
    let Some((order, previous)) =
        OrderRepository::transition(&mut tx, organization_id, &request.order_id, &transition)
            .await?
    else {
        return Err(
            reject_transition(&mut tx, organization_id, &request.order_id, target).await,
        );
    };

    OrderRepository::append_history(
        &mut tx,
        &order.id,
        Some(previous),
        target,
        notes.as_deref(),
        &principal.user_id,
        now,
    )
    .await?;

    let details = load_or_missing(&mut tx, organization_id, &order.id).await?;
    tx.commit().await?;

    info!(order_id = %order.id, from = %previous, to = %target, "Order advanced");
    Ok(details)
}

// =============================================================================
// Cancel
// =============================================================================

/// Cancels a `pending` order (or marks it `failed`) and puts its tracked
/// stock back.
pub async fn cancel_order(
    db: &Database,
    principal: &Principal,
    request: &CancelRequest,
) -> EngineResult<OrderDetails> {
    principal.validate()?;
    let reason = request.validate()?;

    let organization_id = principal.organization_id.as_str();
    let target = request.target_status();
    let label = match target {
        OrderStatus::Failed => "Failed",
        _ => "Cancelled",
    };
    let now = Utc::now();
    let mut tx = db.begin().await?;

    let transition = Transition::new(&[OrderStatus::Pending], target, now)
        .append_note(format!("{label}: {reason}"));

    let Some((order, previous)) =
        OrderRepository::transition(&mut tx, organization_id, &request.order_id, &transition)
            .await?
    else {
        return Err(
            reject_transition(&mut tx, organization_id, &request.order_id, target).await,
        );
    };

    let restored = restore_tracked_stock(&mut tx, organization_id, &order.id).await?;

    OrderRepository::append_history(
        &mut tx,
        &order.id,
        Some(previous),
        target,
        Some(&reason),
        &principal.user_id,
        now,
    )
    .await?;

    let details = load_or_missing(&mut tx, organization_id, &order.id).await?;
    tx.commit().await?;

    info!(
        order_id = %order.id,
        status = %target,
        restored_lines = restored,
        "Order cancelled"
    );

    Ok(details)
}

// =============================================================================
// Read
// =============================================================================

/// Order with items, payments and status history.
pub async fn get_order(
    db: &Database,
    principal: &Principal,
    order_id: &str,
) -> EngineResult<OrderDetails> {
    principal.validate()?;
    validate_id("order_id", order_id)?;

    db.orders()
        .details(&principal.organization_id, order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
}

/// The principal's organization's orders matching `filter`, newest first.
pub async fn list_orders(
    db: &Database,
    principal: &Principal,
    filter: &OrderFilter,
    page: PageRequest,
) -> EngineResult<OrderPage> {
    principal.validate()?;
    page.validate()?;
    let filter = filter.validate()?;

    let orders = db
        .orders()
        .list(&principal.organization_id, &filter, page.skip, page.limit)
        .await?;

    debug!(
        organization_id = %principal.organization_id,
        total = orders.total,
        returned = orders.orders.len(),
        "Orders listed"
    );
    Ok(orders)
}

/// Active products whose name, SKU or barcode contains `term`.
pub async fn search_products(
    db: &Database,
    principal: &Principal,
    term: &str,
    limit: u32,
) -> EngineResult<Vec<Product>> {
    principal.validate()?;
    validate_page_size(limit)?;
    let term = validate_search(Some(term))?.ok_or_else(|| ValidationError::Required {
        field: "search".to_string(),
    })?;

    Ok(db
        .products()
        .search(&principal.organization_id, &term, limit)
        .await?)
}

// =============================================================================
// Shared steps
// =============================================================================

/// Explains why a conditional transition matched nothing.
pub(crate) async fn reject_transition(
    conn: &mut SqliteConnection,
    organization_id: &str,
    order_id: &str,
    attempted: OrderStatus,
) -> EngineError {
    let err: EngineError = match OrderRepository::find(conn, organization_id, order_id).await {
        Err(err) => return err.into(),
        Ok(None) => CoreError::OrderNotFound(order_id.to_string()).into(),
        Ok(Some(order))
            if attempted == OrderStatus::Refunded && order.status == OrderStatus::Refunded =>
        {
            CoreError::AlreadyRefunded(order_id.to_string()).into()
        }
        Ok(Some(order)) => CoreError::InvalidOrderStatus {
            order_id: order_id.to_string(),
            current_status: order.status,
            attempted,
        }
        .into(),
    };

    warn!(order_id = %order_id, attempted = %attempted, error = %err, "Transition rejected");
    err
}

/// Adds every tracked line of an order back to stock. Returns the number
/// of lines restored.
pub(crate) async fn restore_tracked_stock(
    conn: &mut SqliteConnection,
    organization_id: &str,
    order_id: &str,
) -> EngineResult<usize> {
    let items = OrderRepository::items(conn, order_id).await?;
    let mut restored = 0;

    for item in items.iter().filter(|item| item.track_inventory) {
        if StockLedger::restore(conn, organization_id, &item.product_id, item.quantity)
            .await?
            .is_some()
        {
            restored += 1;
        }
    }

    Ok(restored)
}

/// Records the whole order total as one payment. Zero totals write nothing.
async fn record_full_payment(
    conn: &mut SqliteConnection,
    order: &Order,
    method: PaymentMethod,
    reference: Option<String>,
    created_by: &str,
) -> EngineResult<()> {
    if order.total_cents <= 0 {
        return Ok(());
    }

    PaymentRepository::record(
        conn,
        &NewPayment {
            order_id: order.id.clone(),
            organization_id: order.organization_id.clone(),
            method,
            amount_cents: order.total_cents,
            reference,
            created_by: created_by.to_string(),
        },
    )
    .await?;

    Ok(())
}

pub(crate) async fn load_or_missing(
    conn: &mut SqliteConnection,
    organization_id: &str,
    order_id: &str,
) -> EngineResult<OrderDetails> {
    OrderRepository::load_details(conn, organization_id, order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cashier, seed, setup, ORG};
    use pospro_core::requests::{CheckoutItem, Role};
    use pospro_core::ErrorKind;
    use pospro_db::NewProduct;

    fn settings() -> CheckoutSettings {
        CheckoutSettings::default()
    }

    #[tokio::test]
    async fn test_checkout_prices_and_decrements() {
        let db = setup().await;
        let laptop = seed(
            &db,
            NewProduct::new(ORG, "LAPTOP", "Laptop", 10_000)
                .vat_bps(1800)
                .stock(5),
        )
        .await;

        let mut request = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&laptop.id, 2)])
            .paid_with(PaymentMethod::Cash);
        request.discount_cents = 1_000;
        request.shipping_cents = 500;

        let details = create_order(&db, &settings(), &cashier(), &request).await.unwrap();
        let order = &details.order;

        assert_eq!(order.subtotal_cents, 20_000);
        assert_eq!(order.tax_cents, 3_600);
        assert_eq!(order.total_cents, 23_100);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.payment_status, OrderPaymentStatus::Paid);
        assert!(order.completed_at.is_some());
        assert!(order.order_number.starts_with("ORD-"));

        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].unit_price_cents, 10_000);
        assert_eq!(details.items[0].tax_cents, 3_600);
        assert!(details.items[0].track_inventory);

        assert_eq!(details.payments.len(), 1);
        assert_eq!(details.payments[0].amount_cents, 23_100);
        assert_eq!(details.history.len(), 1);
        assert_eq!(details.history[0].to_status, OrderStatus::Completed);

        assert_eq!(db.products().stock_of(ORG, &laptop.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_checkout_is_all_or_nothing() {
        let db = setup().await;
        let a = seed(&db, NewProduct::new(ORG, "A", "Apple", 100).stock(10)).await;
        let b = seed(&db, NewProduct::new(ORG, "B", "Banana", 100).stock(10)).await;

        let request = CheckoutRequest::new(
            "branch-1",
            vec![
                CheckoutItem::new(&a.id, 2),
                CheckoutItem::new(&b.id, 3),
                CheckoutItem::new("missing-product", 1),
            ],
        );

        let err = create_order(&db, &settings(), &cashier(), &request).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::ProductNotFound(_))));

        assert_eq!(db.products().stock_of(ORG, &a.id).await.unwrap(), 10);
        assert_eq!(db.products().stock_of(ORG, &b.id).await.unwrap(), 10);
        let orders = db
            .orders()
            .list(ORG, &OrderFilter::default(), 0, 10)
            .await
            .unwrap();
        assert_eq!(orders.total, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_reports_available() {
        let db = setup().await;
        let p = seed(&db, NewProduct::new(ORG, "COKE", "Coke", 299).stock(3)).await;

        let request = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&p.id, 5)]);
        let err = create_order(&db, &settings(), &cashier(), &request).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock { available: 3, requested: 5, .. })
        ));
        assert_eq!(db.products().stock_of(ORG, &p.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_untracked_and_price_override() {
        let db = setup().await;
        let wrap = seed(&db, NewProduct::new(ORG, "WRAP", "Gift wrap", 150).untracked()).await;
        let tea = seed(
            &db,
            NewProduct::new(ORG, "TEA", "Tea", 400)
                .sale_price(350)
                .stock(10),
        )
        .await;

        let request = CheckoutRequest::new(
            "branch-1",
            vec![
                CheckoutItem::new(&wrap.id, 3),
                CheckoutItem::new(&tea.id, 2),
                CheckoutItem::new(&tea.id, 1).with_unit_price(100),
            ],
        );
        let details = create_order(&db, &settings(), &cashier(), &request).await.unwrap();

        assert_eq!(details.order.status, OrderStatus::Pending);
        assert_eq!(details.order.payment_status, OrderPaymentStatus::Unpaid);
        assert!(details.payments.is_empty());
        assert_eq!(details.order.subtotal_cents, 450 + 700 + 100);
        assert!(!details.items[0].track_inventory);
        assert_eq!(details.items[1].unit_price_cents, 350);
        assert_eq!(details.items[2].unit_price_cents, 100);

        assert_eq!(db.products().stock_of(ORG, &wrap.id).await.unwrap(), 0);
        assert_eq!(db.products().stock_of(ORG, &tea.id).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_discount_policy() {
        let db = setup().await;
        let p = seed(&db, NewProduct::new(ORG, "PEN", "Pen", 1_000).stock(10)).await;

        let mut request = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&p.id, 1)]);
        request.discount_cents = 5_000;
        request.clamp_discount = true;

        // Clamping is off unless the deployment allows it
        let err = create_order(&db, &settings(), &cashier(), &request).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::DiscountExceedsTotal { .. })));
        assert_eq!(db.products().stock_of(ORG, &p.id).await.unwrap(), 10);

        let clamping = CheckoutSettings {
            allow_discount_clamp: true,
            ..settings()
        };
        let details = create_order(&db, &clamping, &cashier(), &request).await.unwrap();
        assert_eq!(details.order.discount_cents, 1_000);
        assert_eq!(details.order.total_cents, 0);
    }

    #[tokio::test]
    async fn test_request_validation_runs_first() {
        let db = setup().await;
        let p = seed(&db, NewProduct::new(ORG, "PEN", "Pen", 100).stock(10)).await;

        let empty = CheckoutRequest::new("branch-1", vec![]);
        let err = create_order(&db, &settings(), &cashier(), &empty).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::EmptyCart)));

        let too_many = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&p.id, 1_000)]);
        let err = create_order(&db, &settings(), &cashier(), &too_many).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(db.products().stock_of(ORG, &p.id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_settle_pending_order() {
        let db = setup().await;
        let p = seed(&db, NewProduct::new(ORG, "PEN", "Pen", 250).stock(10)).await;
        let request = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&p.id, 2)]);
        let pending = create_order(&db, &settings(), &cashier(), &request).await.unwrap();

        let settle = SettleOrderRequest {
            order_id: pending.order.id.clone(),
            method: PaymentMethod::DebitCard,
            reference: Some("AUTH-123".into()),
        };
        let details = settle_order(&db, &cashier(), &settle).await.unwrap();

        assert_eq!(details.order.status, OrderStatus::Completed);
        assert_eq!(details.order.payment_method, Some(PaymentMethod::DebitCard));
        assert_eq!(details.payments.len(), 1);
        assert_eq!(details.payments[0].amount_cents, 500);
        assert_eq!(details.payments[0].reference.as_deref(), Some("AUTH-123"));
        assert_eq!(details.history.len(), 2);
        assert_eq!(details.history[1].from_status, Some(OrderStatus::Pending));

        let err = settle_order(&db, &cashier(), &settle).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidOrderStatus {
                current_status: OrderStatus::Completed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_advance_follows_transition_table() {
        let db = setup().await;
        let p = seed(&db, NewProduct::new(ORG, "BOX", "Box", 100).stock(10)).await;
        let request = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&p.id, 1)]);
        let order_id = create_order(&db, &settings(), &cashier(), &request)
            .await
            .unwrap()
            .order
            .id;

        let advance = |to| AdvanceOrderRequest {
            order_id: order_id.clone(),
            to_status: to,
            notes: None,
        };

        for to in [OrderStatus::Confirmed, OrderStatus::Processing, OrderStatus::Shipped] {
            let details = advance_order(&db, &cashier(), &advance(to)).await.unwrap();
            assert_eq!(details.order.status, to);
        }

        // Skipping ahead is refused
        let err = advance_order(&db, &cashier(), &advance(OrderStatus::Confirmed))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InvalidOrderStatus {
                current_status: OrderStatus::Shipped,
                attempted: OrderStatus::Confirmed,
                ..
            })
        ));

        // Stock-moving targets need their own operation
        let err = advance_order(&db, &cashier(), &advance(OrderStatus::Refunded))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::InvalidOrderStatus { .. })));

        let details = advance_order(&db, &cashier(), &advance(OrderStatus::Delivered))
            .await
            .unwrap();
        assert_eq!(details.history.len(), 5);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() {
        let db = setup().await;
        let p = seed(&db, NewProduct::new(ORG, "MUG", "Mug", 800).stock(4)).await;
        let request = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&p.id, 3)]);
        let pending = create_order(&db, &settings(), &cashier(), &request).await.unwrap();
        assert_eq!(db.products().stock_of(ORG, &p.id).await.unwrap(), 1);

        let mut cancel = CancelRequest::new(&pending.order.id, "Customer walked away");
        cancel.payment_failed = true;
        let details = cancel_order(&db, &cashier(), &cancel).await.unwrap();

        assert_eq!(details.order.status, OrderStatus::Failed);
        assert!(details.order.cancelled_at.is_some());
        assert_eq!(
            details.order.notes.as_deref(),
            Some("Failed: Customer walked away")
        );
        assert_eq!(db.products().stock_of(ORG, &p.id).await.unwrap(), 4);

        // A second cancel must not restore twice
        let err = cancel_order(&db, &cashier(), &cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::InvalidOrderStatus { .. })));
        assert_eq!(db.products().stock_of(ORG, &p.id).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_get_order_is_org_scoped() {
        let db = setup().await;
        let p = seed(&db, NewProduct::new(ORG, "MUG", "Mug", 800).stock(4)).await;
        let request = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&p.id, 1)]);
        let created = create_order(&db, &settings(), &cashier(), &request).await.unwrap();

        let fetched = get_order(&db, &cashier(), &created.order.id).await.unwrap();
        assert_eq!(fetched.order.id, created.order.id);

        let outsider = Principal::new("other-org", "cashier-9", Role::Cashier);
        let err = get_order(&db, &outsider, &created.order.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_orders_filters_within_organization() {
        let db = setup().await;
        let p = seed(&db, NewProduct::new(ORG, "PEN", "Pen", 100).stock(20)).await;

        let mut walk_in = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&p.id, 1)]);
        walk_in.payment_method = Some(PaymentMethod::Cash);
        let first = create_order(&db, &settings(), &cashier(), &walk_in).await.unwrap();

        let mut regular = CheckoutRequest::new("branch-1", vec![CheckoutItem::new(&p.id, 2)]);
        regular.customer_id = Some("cust-7".to_string());
        let second = create_order(&db, &settings(), &cashier(), &regular).await.unwrap();

        let all = list_orders(&db, &cashier(), &OrderFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.limit, pospro_core::DEFAULT_PAGE_SIZE);

        let pending = OrderFilter::default().status(OrderStatus::Pending);
        let page = list_orders(&db, &cashier(), &pending, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.orders[0].id, second.order.id);

        let customer = OrderFilter::default().customer("cust-7");
        let page = list_orders(&db, &cashier(), &customer, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.orders[0].id, second.order.id);

        let by_number = OrderFilter::default().search(format!(" {} ", first.order.order_number));
        let page = list_orders(&db, &cashier(), &by_number, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.orders[0].id, first.order.id);

        let everything = OrderFilter::default();
        let second_page = list_orders(&db, &cashier(), &everything, PageRequest::new(1, 1))
            .await
            .unwrap();
        assert_eq!(second_page.total, 2);
        assert_eq!(second_page.orders.len(), 1);

        let outsider = Principal::new("other-org", "cashier-9", Role::Cashier);
        let page = list_orders(&db, &outsider, &OrderFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_list_orders_validates_paging_and_filter() {
        let db = setup().await;

        let err = list_orders(&db, &cashier(), &OrderFilter::default(), PageRequest::new(0, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let now = Utc::now();
        let inverted = OrderFilter::default().between(now, now - chrono::Duration::days(1));
        let err = list_orders(&db, &cashier(), &inverted, PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_search_products() {
        let db = setup().await;
        seed(&db, NewProduct::new(ORG, "COKE-330", "Coca-Cola 330ml", 299)).await;
        seed(&db, NewProduct::new(ORG, "TEA", "Green Tea", 350)).await;

        let found = search_products(&db, &cashier(), "coca", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sku, "COKE-330");

        let err = search_products(&db, &cashier(), "   ", 10).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(ValidationError::Required { .. }))
        ));

        let err = search_products(&db, &cashier(), "tea", 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

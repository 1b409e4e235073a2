//! # Requests and Results
//!
//! Typed inputs for every engine operation, plus the `Principal` the
//! request layer hands in after authentication.
//!
//! ```text
//! Request layer                          pospro-engine
//! ─────────────                          ─────────────
//! verify token ──► Principal ──┐
//!                              ├──► Engine::checkout(&principal, req)
//! JSON body ──► CheckoutRequest┘         │
//!                                        ├── req.validate(&limits)   (shape)
//!                                        └── unit of work            (rules)
//! ```
//!
//! Every `validate` here is pure and runs before a connection is taken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::pricing::DiscountPolicy;
use crate::status::OrderStatus;
use crate::types::{Order, OrderItem, OrderStatusHistory, Payment, PaymentMethod};
use crate::validation::{
    validate_amount_cents, validate_cart_size, validate_channel, validate_id, validate_notes,
    validate_page_size, validate_quantity, validate_reason, validate_search,
};
use crate::{DEFAULT_CHANNEL, DEFAULT_PAGE_SIZE, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Principal
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Manager,
    Cashier,
}

/// Verified caller identity. Trusted as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Principal {
    pub organization_id: String,
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(
        organization_id: impl Into<String>,
        user_id: impl Into<String>,
        role: Role,
    ) -> Self {
        Principal {
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            role,
        }
    }

    /// Catches a request layer that forgot to fill the principal in.
    pub fn validate(&self) -> CoreResult<()> {
        validate_id("organization_id", &self.organization_id)?;
        validate_id("user_id", &self.user_id)?;
        Ok(())
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Per-deployment limits applied by `CheckoutRequest::validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutLimits {
    pub max_cart_items: usize,
    pub max_item_quantity: i64,
}

impl Default for CheckoutLimits {
    fn default() -> Self {
        CheckoutLimits {
            max_cart_items: MAX_CART_ITEMS,
            max_item_quantity: MAX_ITEM_QUANTITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutItem {
    pub product_id: String,
    pub quantity: i64,
    /// Overrides the catalog price for this line.
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
}

impl CheckoutItem {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CheckoutItem {
            product_id: product_id.into(),
            quantity,
            unit_price_cents: None,
        }
    }

    pub fn with_unit_price(mut self, cents: i64) -> Self {
        self.unit_price_cents = Some(cents);
        self
    }
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

/// A cart to turn into an order. The cashier is the calling principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub branch_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default = "default_channel")]
    pub channel: String,
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub shipping_cents: i64,
    /// Present: the order is paid at once. Absent: it waits as `pending`.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_reference: Option<String>,
    /// Cap an oversized discount instead of rejecting the cart.
    #[serde(default)]
    pub clamp_discount: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    pub fn new(branch_id: impl Into<String>, items: Vec<CheckoutItem>) -> Self {
        CheckoutRequest {
            branch_id: branch_id.into(),
            customer_id: None,
            channel: default_channel(),
            items,
            discount_cents: 0,
            shipping_cents: 0,
            payment_method: None,
            payment_reference: None,
            clamp_discount: false,
            notes: None,
        }
    }

    pub fn paid_with(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn discount_policy(&self) -> DiscountPolicy {
        if self.clamp_discount {
            DiscountPolicy::Clamp
        } else {
            DiscountPolicy::Reject
        }
    }

    pub fn validate(&self, limits: &CheckoutLimits) -> CoreResult<()> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        validate_cart_size(self.items.len(), limits.max_cart_items)?;
        validate_id("branch_id", &self.branch_id)?;
        if let Some(customer_id) = &self.customer_id {
            validate_id("customer_id", customer_id)?;
        }
        validate_channel(&self.channel)?;
        validate_amount_cents("discount_amount", self.discount_cents)?;
        validate_amount_cents("shipping_cost", self.shipping_cents)?;
        validate_notes(self.notes.as_deref())?;

        for (index, item) in self.items.iter().enumerate() {
            validate_id(&format!("items[{index}].product_id"), &item.product_id)?;
            validate_quantity(
                &format!("items[{index}].quantity"),
                item.quantity,
                limits.max_item_quantity,
            )?;
            if let Some(price) = item.unit_price_cents {
                validate_amount_cents(&format!("items[{index}].unit_price"), price)?;
            }
        }

        Ok(())
    }
}

// =============================================================================
// Order lifecycle
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RefundRequest {
    pub order_id: String,
    pub reason: String,
}

impl RefundRequest {
    pub fn new(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        RefundRequest {
            order_id: order_id.into(),
            reason: reason.into(),
        }
    }

    /// Returns the trimmed reason.
    pub fn validate(&self) -> CoreResult<String> {
        validate_id("order_id", &self.order_id)?;
        Ok(validate_reason(&self.reason)?)
    }
}

/// Cancels a `pending` order, or marks it `failed` when the payment did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CancelRequest {
    pub order_id: String,
    pub reason: String,
    #[serde(default)]
    pub payment_failed: bool,
}

impl CancelRequest {
    pub fn new(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CancelRequest {
            order_id: order_id.into(),
            reason: reason.into(),
            payment_failed: false,
        }
    }

    pub fn target_status(&self) -> OrderStatus {
        if self.payment_failed {
            OrderStatus::Failed
        } else {
            OrderStatus::Cancelled
        }
    }

    /// Returns the trimmed reason.
    pub fn validate(&self) -> CoreResult<String> {
        validate_id("order_id", &self.order_id)?;
        Ok(validate_reason(&self.reason)?)
    }
}

/// Records payment for a `pending` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettleOrderRequest {
    pub order_id: String,
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: Option<String>,
}

impl SettleOrderRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_id("order_id", &self.order_id)?;
        validate_notes(self.reference.as_deref())?;
        Ok(())
    }
}

/// Moves an order along the fulfilment path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdvanceOrderRequest {
    pub order_id: String,
    pub to_status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AdvanceOrderRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_id("order_id", &self.order_id)?;
        validate_notes(self.notes.as_deref())?;
        Ok(())
    }
}

/// An order with everything attached to it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub history: Vec<OrderStatusHistory>,
}

// =============================================================================
// Order listing
// =============================================================================

/// Narrows an order listing. Every field left `None` matches everything.
///
/// ```text
/// status       = 'completed'
/// customer_id  = 'cust-7'
/// created_at  >= from            (inclusive)
/// created_at  <= to              (inclusive)
/// id or order_number LIKE %search%
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub search: Option<String>,
}

impl OrderFilter {
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Returns the filter with its search term trimmed, or cleared when blank.
    pub fn validate(&self) -> CoreResult<OrderFilter> {
        if let Some(customer_id) = &self.customer_id {
            validate_id("customer_id", customer_id)?;
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ValidationError::InvalidFormat {
                    field: "end_date".to_string(),
                    reason: "must not be before start_date".to_string(),
                }
                .into());
            }
        }

        Ok(OrderFilter {
            search: validate_search(self.search.as_deref())?,
            customer_id: self.customer_id.as_deref().map(|id| id.trim().to_string()),
            ..self.clone()
        })
    }
}

/// Offset pagination for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PageRequest {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_page_size")]
    pub limit: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(skip: u32, limit: u32) -> Self {
        PageRequest { skip, limit }
    }

    pub fn validate(&self) -> CoreResult<()> {
        Ok(validate_page_size(self.limit)?)
    }
}

/// One page of orders, newest first, and the number of orders matching the
/// filter across all pages.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPage {
    pub total: i64,
    pub skip: u32,
    pub limit: u32,
    pub orders: Vec<Order>,
}

// =============================================================================
// Register
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OpenRegisterRequest {
    pub branch_id: String,
    pub opening_cents: i64,
}

impl OpenRegisterRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_id("branch_id", &self.branch_id)?;
        validate_amount_cents("opening_amount", self.opening_cents)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CloseRegisterRequest {
    pub closing_cents: i64,
}

impl CloseRegisterRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_amount_cents("closing_amount", self.closing_cents)?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> CheckoutRequest {
        CheckoutRequest::new(
            "branch-1",
            vec![
                CheckoutItem::new("p-1", 2),
                CheckoutItem::new("p-2", 1).with_unit_price(450),
            ],
        )
    }

    #[test]
    fn test_valid_cart() {
        assert!(cart().validate(&CheckoutLimits::default()).is_ok());
    }

    #[test]
    fn test_empty_cart() {
        let req = CheckoutRequest::new("branch-1", vec![]);
        assert!(matches!(
            req.validate(&CheckoutLimits::default()),
            Err(CoreError::EmptyCart)
        ));
    }

    #[test]
    fn test_quantity_limits() {
        let mut req = cart();
        req.items[0].quantity = 0;
        assert!(matches!(
            req.validate(&CheckoutLimits::default()),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        req.items[0].quantity = 5;
        let limits = CheckoutLimits {
            max_cart_items: 10,
            max_item_quantity: 4,
        };
        assert!(matches!(
            req.validate(&limits),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_cart_size_limit() {
        let limits = CheckoutLimits {
            max_cart_items: 1,
            max_item_quantity: 999,
        };
        assert!(cart().validate(&limits).is_err());
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut req = cart();
        req.discount_cents = -1;
        assert!(req.validate(&CheckoutLimits::default()).is_err());

        let mut req = cart();
        req.shipping_cents = -1;
        assert!(req.validate(&CheckoutLimits::default()).is_err());

        let mut req = cart();
        req.items[1].unit_price_cents = Some(-5);
        assert!(req.validate(&CheckoutLimits::default()).is_err());
    }

    #[test]
    fn test_checkout_request_defaults_from_json() {
        let json = r#"{"branch_id":"b-1","items":[{"product_id":"p-1","quantity":1}]}"#;
        let req: CheckoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.channel, "pos");
        assert_eq!(req.discount_cents, 0);
        assert!(req.payment_method.is_none());
        assert_eq!(req.discount_policy(), DiscountPolicy::Reject);
    }

    #[test]
    fn test_refund_reason() {
        assert_eq!(
            RefundRequest::new("o-1", " Damaged ").validate().unwrap(),
            "Damaged"
        );
        assert!(RefundRequest::new("o-1", "no").validate().is_err());
        assert!(RefundRequest::new("", "Damaged").validate().is_err());
    }

    #[test]
    fn test_cancel_target() {
        let mut req = CancelRequest::new("o-1", "Customer left");
        assert_eq!(req.target_status(), OrderStatus::Cancelled);
        req.payment_failed = true;
        assert_eq!(req.target_status(), OrderStatus::Failed);
    }

    #[test]
    fn test_register_amounts() {
        let open = OpenRegisterRequest {
            branch_id: "b-1".to_string(),
            opening_cents: 0,
        };
        assert!(open.validate().is_ok());

        let close = CloseRegisterRequest { closing_cents: -1 };
        assert!(close.validate().is_err());
    }

    #[test]
    fn test_principal() {
        assert!(Principal::new("org-1", "u-1", Role::Cashier).validate().is_ok());
        assert!(Principal::new("", "u-1", Role::Cashier).validate().is_err());
    }

    #[test]
    fn test_order_filter_normalizes_search() {
        let filter = OrderFilter::default()
            .customer(" cust-7 ")
            .search("  ORD-2026  ")
            .validate()
            .unwrap();
        assert_eq!(filter.customer_id.as_deref(), Some("cust-7"));
        assert_eq!(filter.search.as_deref(), Some("ORD-2026"));

        let blank = OrderFilter::default().search("   ").validate().unwrap();
        assert_eq!(blank.search, None);
    }

    #[test]
    fn test_order_filter_rejects_inverted_range() {
        let now = chrono::Utc::now();
        let filter = OrderFilter::default().between(now, now - chrono::Duration::hours(1));
        assert!(matches!(
            filter.validate(),
            Err(CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));

        assert!(OrderFilter::default().between(now, now).validate().is_ok());
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::default().validate().is_ok());
        assert!(PageRequest::new(200, 100).validate().is_ok());
        assert!(PageRequest::new(0, 0).validate().is_err());
        assert!(PageRequest::new(0, 101).validate().is_err());
    }
}

//! # Pricing Calculator
//!
//! Pure: line items + tax rates + order-level adjustments → totals.
//!
//! ## Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  per line:   line_total = unit_price × quantity                        │
//! │              line_tax   = round_half_up(line_total × rate)             │
//! │                                                                         │
//! │  per order:  subtotal = Σ line_total                                   │
//! │              tax      = Σ line_tax                                     │
//! │              total    = subtotal + tax − discount + shipping           │
//! │                                                                         │
//! │  discount > subtotal + tax + shipping                                  │
//! │      Reject → DiscountExceedsTotal                                     │
//! │      Clamp  → discount := subtotal + tax + shipping, total = 0         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax is rounded once per line, never on the order sum, so an order's tax
//! always equals the sum of its persisted line taxes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, TaxRate};

// =============================================================================
// Inputs
// =============================================================================

/// One line to price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingLine {
    pub unit_price: Money,
    pub quantity: i64,
    pub tax_rate: TaxRate,
}

impl PricingLine {
    pub const fn new(unit_price: Money, quantity: i64, tax_rate: TaxRate) -> Self {
        PricingLine {
            unit_price,
            quantity,
            tax_rate,
        }
    }
}

/// What to do with a discount larger than the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountPolicy {
    /// Fail with `DiscountExceedsTotal`.
    #[default]
    Reject,
    /// Cap the discount so the total is exactly zero.
    Clamp,
}

// =============================================================================
// Outputs
// =============================================================================

/// Priced line, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBreakdown {
    pub line_total: Money,
    pub tax: Money,
}

impl LineBreakdown {
    /// Line total including its tax component.
    #[inline]
    pub fn total_price(&self) -> Money {
        self.line_total + self.tax
    }
}

/// Priced order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub lines: Vec<LineBreakdown>,
    pub subtotal: Money,
    pub tax: Money,
    /// Discount actually applied (after clamping).
    pub discount: Money,
    pub shipping: Money,
    pub total: Money,
}

// =============================================================================
// Calculation
// =============================================================================

/// Prices an order.
///
/// ## Errors
/// - `EmptyCart` when `lines` is empty
/// - `Validation` for a non-positive quantity, a negative price, discount or
///   shipping, or arithmetic overflow
/// - `DiscountExceedsTotal` when the discount is too large and `policy` is
///   `Reject`
///
/// ## Example
/// ```rust
/// use pospro_core::money::{Money, TaxRate};
/// use pospro_core::pricing::{price_order, DiscountPolicy, PricingLine};
///
/// let lines = [PricingLine::new(Money::from_cents(1_000), 1, TaxRate::zero())];
/// let discount = Money::from_cents(5_000);
/// let priced = price_order(&lines, discount, Money::zero(), DiscountPolicy::Clamp).unwrap();
/// assert_eq!(priced.discount.cents(), 1_000);
/// assert!(priced.total.is_zero());
/// ```
pub fn price_order(
    lines: &[PricingLine],
    discount: Money,
    shipping: Money,
    policy: DiscountPolicy,
) -> CoreResult<PriceBreakdown> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    if discount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "discount".to_string(),
        }
        .into());
    }
    if shipping.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "shipping".to_string(),
        }
        .into());
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = Money::zero();
    let mut tax = Money::zero();

    for (index, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("items[{index}].quantity"),
            }
            .into());
        }
        if line.unit_price.is_negative() {
            return Err(ValidationError::MustBeNonNegative {
                field: format!("items[{index}].unit_price"),
            }
            .into());
        }

        let line_total = line
            .unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| overflow(format!("items[{index}]")))?;
        let line_tax = line_total.calculate_tax(line.tax_rate);

        subtotal = subtotal
            .checked_add(line_total)
            .ok_or_else(|| overflow("subtotal".to_string()))?;
        tax = tax
            .checked_add(line_tax)
            .ok_or_else(|| overflow("tax".to_string()))?;

        priced.push(LineBreakdown {
            line_total,
            tax: line_tax,
        });
    }

    let maximum = subtotal
        .checked_add(tax)
        .and_then(|m| m.checked_add(shipping))
        .ok_or_else(|| overflow("total".to_string()))?;

    let applied_discount = if discount > maximum {
        match policy {
            DiscountPolicy::Reject => {
                return Err(CoreError::DiscountExceedsTotal { discount, maximum })
            }
            DiscountPolicy::Clamp => maximum,
        }
    } else {
        discount
    };

    Ok(PriceBreakdown {
        lines: priced,
        subtotal,
        tax,
        discount: applied_discount,
        shipping,
        total: maximum - applied_discount,
    })
}

fn overflow(field: String) -> CoreError {
    ValidationError::OutOfRange {
        field,
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

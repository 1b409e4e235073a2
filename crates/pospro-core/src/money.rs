//! # Money Module
//!
//! `Money` (integer minor units) and `TaxRate` (basis points).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A register that must balance "to the cent" cannot compare floats.     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    231.00 is stored as 23100, tax 18% is stored as 1800 bps            │
//! │    Rounding happens exactly once per line, in one place                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pospro_core::money::{Money, TaxRate};
//!
//! let price = Money::from_cents(10_000); // 100.00
//! let line = price.multiply_quantity(2);
//! let tax = line.calculate_tax(TaxRate::from_bps(1800));
//! assert_eq!(tax.cents(), 3_600);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: payment reversals are stored as negative amounts
/// - **Single field tuple struct**: zero-cost over i64
/// - **Checked variants**: pricing uses `checked_*` so an absurd cart is an
///   error instead of a wrapped total
///
/// ## Where Money Flows
/// ```text
/// Product.base_price_cents ──► PricingLine.unit_price ──► line_total
///                                                            │
///                          subtotal + tax − discount + shipping ◄─┘
///                                       │
///                                       ▼
///                     Order.total_cents ──► Payment.amount_cents
///                                       │
///                                       ▼
///                     CashRegister.cash_sales_cents ──► ZReport
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use pospro_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit is negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Tax on this amount, rounded half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount × bps + 5000) / 10000`, computed in i128.
    /// The +5000 is the half-cent.
    ///
    /// ## Example
    /// ```rust
    /// use pospro_core::money::{Money, TaxRate};
    ///
    /// let line = Money::from_cents(1000);
    /// let tax = line.calculate_tax(TaxRate::from_bps(825));
    /// // 10.00 × 8.25% = 0.825 → 0.83
    /// assert_eq!(tax.cents(), 83);
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Line: 2 × 100.00 = 200.00
    ///      │
    ///      ▼
    /// calculate_tax(18%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line tax: 36.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies by a quantity. Panics on overflow in debug builds; use
    /// [`Money::checked_multiply_quantity`] for untrusted input.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, `None` on overflow.
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds, `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts, `None` on overflow.
    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, currency symbol left to the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18% VAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Whole-percent constructor: `from_percent(18)` is 1800 bps.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        TaxRate(pct * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Rate as a percentage, for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(231, 0).cents(), 23_100);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(23_100).to_string(), "231.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-5_000).to_string(), "-50.00");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 1000);
    }

    #[test]
    fn test_tax_eighteen_percent() {
        let line = Money::from_cents(20_000);
        assert_eq!(line.calculate_tax(TaxRate::from_percent(18)).cents(), 3_600);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.25 × 10% = 0.025 → 0.03
        assert_eq!(
            Money::from_cents(25).calculate_tax(TaxRate::from_bps(1000)).cents(),
            3
        );
        // 0.24 × 10% = 0.024 → 0.02
        assert_eq!(
            Money::from_cents(24).calculate_tax(TaxRate::from_bps(1000)).cents(),
            2
        );
    }

    #[test]
    fn test_zero_rate() {
        assert!(Money::from_cents(999)
            .calculate_tax(TaxRate::zero())
            .is_zero());
    }

    #[test]
    fn test_checked_overflow() {
        assert!(Money::from_cents(i64::MAX)
            .checked_multiply_quantity(2)
            .is_none());
        assert!(Money::from_cents(i64::MAX)
            .checked_add(Money::from_cents(1))
            .is_none());
        assert_eq!(
            Money::from_cents(299).checked_multiply_quantity(3),
            Some(Money::from_cents(897))
        );
    }

    #[test]
    fn test_tax_rate_percent() {
        let rate = TaxRate::from_percent(18);
        assert_eq!(rate.bps(), 1800);
        assert!((rate.percentage() - 18.0).abs() < 0.001);
    }
}

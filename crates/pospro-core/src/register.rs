//! # Register Reconciliation
//!
//! Z-report math for closing a cashier's shift.
//!
//! ```text
//!  opening float ──┐
//!                  ├──► expected_cash ──┐
//!  cash_sales ─────┘                    ├──► difference ──► balanced | variance
//!  counted cash (closing) ──────────────┘
//! ```
//!
//! Card and other non-cash sales are reported but never enter the drawer
//! balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

/// Milliseconds per hour, for `shift_duration_hours`.
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Sales aggregated over a shift window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftTotals {
    pub total_orders: i64,
    pub total_sales: Money,
    pub cash_sales: Money,
    pub card_sales: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    /// Counted cash equals expected cash to the cent.
    Balanced,
    /// Drawer is over (positive difference) or short (negative).
    Variance,
}

/// End-of-shift summary returned by `close_register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ZReport {
    pub register_id: String,
    pub user_id: String,
    pub branch_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
    /// Display only.
    pub shift_duration_hours: f64,
    pub total_orders: i64,
    pub total_sales: Money,
    pub cash_sales: Money,
    pub card_sales: Money,
    pub opening_amount: Money,
    pub expected_cash: Money,
    pub actual_cash: Money,
    /// `actual_cash - expected_cash`
    pub difference: Money,
    pub status: BalanceStatus,
}

/// Identity and window of the shift being closed.
#[derive(Debug, Clone)]
pub struct ShiftWindow {
    pub register_id: String,
    pub user_id: String,
    pub branch_id: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

/// Builds the Z-report for a closed shift.
///
/// ## Errors
/// * `Validation(OutOfRange)` - expected cash or the difference does not fit
///   in `i64` cents
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use pospro_core::money::Money;
/// use pospro_core::register::{reconcile, BalanceStatus, ShiftTotals, ShiftWindow};
///
/// let opened_at = Utc::now();
/// let window = ShiftWindow {
///     register_id: "r-1".into(),
///     user_id: "u-1".into(),
///     branch_id: "b-1".into(),
///     opened_at,
///     closed_at: opened_at + Duration::hours(8),
/// };
/// let totals = ShiftTotals {
///     total_orders: 12,
///     total_sales: Money::from_cents(200_000),
///     cash_sales: Money::from_cents(120_000),
///     card_sales: Money::from_cents(80_000),
/// };
///
/// let report = reconcile(window, totals, Money::from_cents(50_000), Money::from_cents(170_000))
///     .unwrap();
/// assert_eq!(report.expected_cash.cents(), 170_000);
/// assert_eq!(report.status, BalanceStatus::Balanced);
/// ```
pub fn reconcile(
    window: ShiftWindow,
    totals: ShiftTotals,
    opening: Money,
    closing: Money,
) -> CoreResult<ZReport> {
    let expected_cash = opening
        .checked_add(totals.cash_sales)
        .ok_or_else(|| out_of_range("expected_cash"))?;
    let difference = closing
        .checked_sub(expected_cash)
        .ok_or_else(|| out_of_range("difference"))?;
    let status = if difference.is_zero() {
        BalanceStatus::Balanced
    } else {
        BalanceStatus::Variance
    };

    let duration_ms = (window.closed_at - window.opened_at)
        .num_milliseconds()
        .max(0);

    Ok(ZReport {
        register_id: window.register_id,
        user_id: window.user_id,
        branch_id: window.branch_id,
        opened_at: window.opened_at,
        closed_at: window.closed_at,
        shift_duration_hours: duration_ms as f64 / MS_PER_HOUR,
        total_orders: totals.total_orders,
        total_sales: totals.total_sales,
        cash_sales: totals.cash_sales,
        card_sales: totals.card_sales,
        opening_amount: opening,
        expected_cash,
        actual_cash: closing,
        difference,
        status,
    })
}

fn out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: i64::MIN,
        max: i64::MAX,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

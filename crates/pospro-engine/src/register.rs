//! # Cash Register Shifts
//!
//! Opening a shift and closing it with a Z-report.
//!
//! ## Close Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    UPDATE cash_registers SET status='closed' ... RETURNING *            │
//! │         │ 0 rows → NoOpenRegister                                       │
//! │         ▼                                                               │
//! │    now ← clock, write lock already held                                 │
//! │    shift_totals(user, [opened_at, now))                                 │
//! │         ▼                                                               │
//! │    record_totals(register)                                              │
//! │    reconcile(opening, totals, counted) → ZReport                        │
//! │         │ overflow → Validation, ROLLBACK, shift stays open             │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The close holds the write lock from its first statement, so every sale
//! committed before it is counted and no sale can slip into the window
//! while the totals are read.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use pospro_core::register::{reconcile, BalanceStatus, ShiftWindow, ZReport};
use pospro_core::requests::{CloseRegisterRequest, OpenRegisterRequest, Principal};
use pospro_core::{CashRegister, CoreError, Money, RegisterStatus};
use pospro_db::{Database, RegisterRepository};

use crate::error::EngineResult;

/// Opens a shift for the calling user.
pub async fn open_register(
    db: &Database,
    principal: &Principal,
    request: &OpenRegisterRequest,
) -> EngineResult<CashRegister> {
    principal.validate()?;
    request.validate()?;

    let register = CashRegister {
        id: Uuid::new_v4().to_string(),
        organization_id: principal.organization_id.clone(),
        branch_id: request.branch_id.trim().to_string(),
        user_id: principal.user_id.clone(),
        opening_cents: request.opening_cents,
        closing_cents: None,
        status: RegisterStatus::Open,
        cash_sales_cents: 0,
        card_sales_cents: 0,
        total_sales_cents: 0,
        total_orders: 0,
        opened_at: Utc::now(),
        closed_at: None,
    };

    let mut tx = db.begin().await?;
    match RegisterRepository::open(&mut tx, &register).await {
        Ok(()) => {}
        Err(err) if err.is_unique_violation_on("cash_registers.user_id") => {
            warn!(user_id = %principal.user_id, "Register already open");
            return Err(CoreError::RegisterAlreadyOpen {
                user_id: principal.user_id.clone(),
            }
            .into());
        }
        Err(err) => return Err(err.into()),
    }
    tx.commit().await?;

    info!(
        register_id = %register.id,
        user_id = %register.user_id,
        opening = %Money::from_cents(register.opening_cents),
        "Register opened"
    );

    Ok(register)
}

/// Closes the caller's shift and produces its Z-report.
pub async fn close_register(
    db: &Database,
    principal: &Principal,
    request: &CloseRegisterRequest,
) -> EngineResult<ZReport> {
    principal.validate()?;
    request.validate()?;

    let organization_id = principal.organization_id.as_str();
    let user_id = principal.user_id.as_str();
    let mut tx = db.begin().await?;

    let Some(closed) = RegisterRepository::close(
        &mut tx,
        organization_id,
        user_id,
        request.closing_cents,
        Utc::now(),
    )
    .await?
    else {
        warn!(user_id = %user_id, "Close requested without an open register");
        return Err(CoreError::NoOpenRegister {
            user_id: user_id.to_string(),
        }
        .into());
    };

    // Taken with the write lock held: sales committed earlier are stamped
    // before it, sales committed later after it.
    let now = Utc::now();
    let totals =
        RegisterRepository::shift_totals(&mut tx, organization_id, user_id, closed.opened_at, now)
            .await?;
    let register = RegisterRepository::record_totals(&mut tx, &closed.id, &totals, now).await?;

    // Reconciled before commit so an unrepresentable report leaves the
    // shift open.
    let window = ShiftWindow {
        register_id: register.id.clone(),
        user_id: register.user_id.clone(),
        branch_id: register.branch_id.clone(),
        opened_at: register.opened_at,
        closed_at: now,
    };
    let report = reconcile(
        window,
        totals,
        Money::from_cents(register.opening_cents),
        Money::from_cents(request.closing_cents),
    )?;
    tx.commit().await?;

    match report.status {
        BalanceStatus::Balanced => info!(
            register_id = %report.register_id,
            total_orders = report.total_orders,
            total_sales = %report.total_sales,
            "Register closed, balanced"
        ),
        BalanceStatus::Variance => warn!(
            register_id = %report.register_id,
            expected = %report.expected_cash,
            actual = %report.actual_cash,
            difference = %report.difference,
            "Register closed with cash variance"
        ),
    }

    Ok(report)
}

/// The caller's open shift, if any.
pub async fn current_register(
    db: &Database,
    principal: &Principal,
) -> EngineResult<Option<CashRegister>> {
    principal.validate()?;
    Ok(db
        .registers()
        .current(&principal.organization_id, &principal.user_id)
        .await?)
}

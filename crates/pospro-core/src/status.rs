//! # Order Status
//!
//! The order state machine.
//!
//! ```text
//!                     ┌──────────┐
//!          ┌─────────►│completed │────────────────────────────┐
//!          │  (POS,   └──────────┘                            │
//!          │   paid)                                          ▼
//!     ┌────┴────┐   ┌──────────┐   ┌──────────┐   ┌───────┐  ┌────────┐
//!     │ pending │──►│confirmed │──►│processing│──►│shipped│─►│refunded│
//!     └────┬────┘   └──────────┘   └──────────┘   └───┬───┘  └────────┘
//!          │                                          ▼        ▲  ▲
//!          │                                    ┌─────────┐    │  │
//!          │                                    │delivered│────┘  │
//!          │                                    └────┬────┘       │
//!          │                                         ▼            │
//!          │                                    ┌────────┐        │
//!          │                                    │returned│────────┘
//!          │                                    └────────┘
//!          ├──► cancelled (terminal, stock restored)
//!          └──► failed    (terminal, stock restored)
//! ```
//!
//! `pending`, `confirmed`, `processing` and `shipped` may also be refunded
//! directly. Refunding a `pending` order only gives its stock back.
//! Transitions into `completed`, `cancelled`, `failed` and `refunded` move
//! money or stock, so they are only reachable through their dedicated
//! engine operations (settle, cancel, refund).

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created without payment, awaiting settlement.
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    /// Paid at the till.
    Completed,
    Cancelled,
    Returned,
    Refunded,
    /// Payment failed after the order was created.
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 10] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
        OrderStatus::Refunded,
        OrderStatus::Failed,
    ];

    /// Statuses whose orders count towards a shift's Z-report.
    pub const SALE_STATUSES: [OrderStatus; 5] = [
        OrderStatus::Completed,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    /// Statuses from which a full refund is accepted.
    ///
    /// `pending` orders already hold their stock, so a refund gives it back.
    /// `cancelled` and `failed` orders have returned their stock already.
    pub const REFUNDABLE_STATUSES: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Completed,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Returned,
    ];

    /// Storage representation (matches the sqlx/serde encoding).
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Failed => "failed",
        }
    }

    /// Whether the state machine allows `self → next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        if next == Refunded {
            return self.is_refundable();
        }

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Completed)
                | (Pending, Cancelled)
                | (Pending, Failed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Shipped, Returned)
                | (Delivered, Returned)
        )
    }

    /// Whether a full refund is accepted from this status.
    pub fn is_refundable(&self) -> bool {
        Self::REFUNDABLE_STATUSES.contains(self)
    }

    /// Whether orders in this status count as a sale in the Z-report.
    pub fn counts_as_sale(&self) -> bool {
        Self::SALE_STATUSES.contains(self)
    }

    /// No transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Refunded | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    /// Entering this status moves stock or money and needs its own operation.
    pub fn requires_dedicated_operation(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::Cancelled
                | OrderStatus::Failed
                | OrderStatus::Refunded
        )
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

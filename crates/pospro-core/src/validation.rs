//! # Validation Module
//!
//! Field-level input checks, run before any storage is touched.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer (outside this workspace)                       │
//! │  └── Deserialization into typed requests                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE via `requests::*::validate`                      │
//! │  └── Shapes and ranges: quantity > 0, amount ≥ 0, reason length        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine units of work                                         │
//! │  └── Business rules: stock, order status, open register                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite                                                       │
//! │  └── CHECK, UNIQUE and foreign key constraints                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{
    MAX_AMOUNT_CENTS, MAX_PAGE_SIZE, MAX_REASON_LENGTH, MAX_SEARCH_LENGTH, MIN_REASON_LENGTH,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest identifier accepted from a caller.
pub const MAX_ID_LENGTH: usize = 64;

/// Longest free-text note accepted on an order.
pub const MAX_NOTES_LENGTH: usize = 1000;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an opaque identifier (product, order, branch, user...).
///
/// ## Example
/// ```rust
/// use pospro_core::validation::validate_id;
///
/// assert!(validate_id("branch_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("branch_id", "  ").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LENGTH,
        });
    }

    if id.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, numbers, hyphens, underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a refund or cancellation reason and returns it trimmed.
///
/// ## User Workflow
/// ```text
/// Manager enters reason: "  ok "
///      │
///      ▼
/// validate_reason ← THIS FUNCTION
///      │
///      ├── trimmed "ok" has 2 chars < 3 → TooShort
///      │
///      └── "Damaged packaging" → Ok("Damaged packaging")
/// ```
pub fn validate_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    let len = reason.chars().count();
    if len < MIN_REASON_LENGTH {
        return Err(ValidationError::TooShort {
            field: "reason".to_string(),
            min: MIN_REASON_LENGTH,
        });
    }

    if len > MAX_REASON_LENGTH {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LENGTH,
        });
    }

    Ok(reason.to_string())
}

/// Validates optional order notes, normalising blank to `None`.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    match notes.map(str::trim) {
        None | Some("") => Ok(None),
        Some(n) if n.chars().count() > MAX_NOTES_LENGTH => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        }),
        Some(n) => Ok(Some(n.to_string())),
    }
}

/// Validates a sales channel tag (`pos`, `web`, ...).
pub fn validate_channel(channel: &str) -> ValidationResult<()> {
    let channel = channel.trim();

    if channel.is_empty() {
        return Err(ValidationError::Required {
            field: "channel".to_string(),
        });
    }

    if channel.len() > 32 || !channel.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: "channel".to_string(),
            reason: "must be up to 32 letters, digits or underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a free-text search term.
///
/// ## Returns
/// The trimmed term, or `None` when it is blank.
pub fn validate_search(search: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if search.len() > MAX_SEARCH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LENGTH,
        });
    }

    Ok(Some(search.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `max`
pub fn validate_quantity(field: &str, qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates an amount in cents that may be zero (prices, floats, discounts).
///
/// ## Example
/// ```rust
/// use pospro_core::validation::validate_amount_cents;
/// use pospro_core::MAX_AMOUNT_CENTS;
///
/// assert!(validate_amount_cents("opening_amount", 0).is_ok());
/// assert!(validate_amount_cents("opening_amount", -100).is_err());
/// assert!(validate_amount_cents("opening_amount", MAX_AMOUNT_CENTS + 1).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "vat_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a cart.
pub fn validate_cart_size(items: usize, max: usize) -> ValidationResult<()> {
    if items > max {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: max as i64,
        });
    }

    Ok(())
}

/// Validates the page size of a list operation.
pub fn validate_page_size(limit: u32) -> ValidationResult<()> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

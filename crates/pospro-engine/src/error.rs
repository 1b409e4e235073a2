//! # Engine Error Types
//!
//! What callers of [`Engine`](crate::Engine) see.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EngineError                     kind()            is_retryable()       │
//! │  ───────────                     ──────            ──────────────       │
//! │  Core(InsufficientStock)         Conflict          no                   │
//! │  Core(OrderNotFound)             NotFound          no                   │
//! │  Core(Validation)                Validation        no                   │
//! │  Db(InvalidData)                 Validation        no                   │
//! │  Db(NotFound)                    NotFound          no                   │
//! │  Db(Busy | PoolExhausted ...)    Infrastructure    yes                  │
//! │  Db(QueryFailed ...)             Infrastructure    no                   │
//! │  Config(..)                      Infrastructure    no                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only retryable errors are re-run by [`with_retry`](crate::retry::with_retry),
//! and always as a whole unit.

use thiserror::Error;

use pospro_core::{CoreError, ErrorKind};
use pospro_db::{DbError, StockError};

use crate::config::ConfigError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule or input rejection.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Classifies this error for the request layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(err) => err.kind(),
            EngineError::Db(DbError::InvalidData(_)) => ErrorKind::Validation,
            EngineError::Db(DbError::NotFound { .. }) => ErrorKind::NotFound,
            EngineError::Db(_) | EngineError::Config(_) => ErrorKind::Infrastructure,
        }
    }

    /// Whether re-running the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Db(err) if err.is_transient())
    }

    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            EngineError::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StockError> for EngineError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::ProductNotFound { product_id } => {
                CoreError::ProductNotFound(product_id).into()
            }
            StockError::ProductInactive { product_id, name } => {
                CoreError::ProductInactive { product_id, name }.into()
            }
            StockError::InsufficientStock {
                product_id,
                sku,
                name,
                available,
                requested,
            } => CoreError::InsufficientStock {
                product_id,
                sku,
                name,
                available,
                requested,
            }
            .into(),
            StockError::Db(err) => err.into(),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Db(err.into())
    }
}

impl From<pospro_core::ValidationError> for EngineError {
    fn from(err: pospro_core::ValidationError) -> Self {
        EngineError::Core(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_errors_become_domain_errors() {
        let err: EngineError = StockError::InsufficientStock {
            product_id: "p-1".into(),
            sku: "COKE-330".into(),
            name: "Coca-Cola".into(),
            available: 3,
            requested: 5,
        }
        .into();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!err.is_retryable());
        assert!(matches!(
            err.as_core(),
            Some(CoreError::InsufficientStock { available: 3, .. })
        ));

        let err: EngineError = StockError::ProductNotFound {
            product_id: "p-2".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_busy_is_retryable_infrastructure() {
        let err: EngineError = StockError::Db(DbError::Busy("database is locked".into())).into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(err.is_retryable());

        let err: EngineError = DbError::QueryFailed("syntax error".into()).into();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_data_is_validation() {
        let err: EngineError = DbError::InvalidData("bad".into()).into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

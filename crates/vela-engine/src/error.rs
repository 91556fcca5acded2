//! # Engine Error Types
//!
//! One error type for the orchestration layer, layered over the domain
//! and database errors.
//!
//! ## Two Failure Classes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Domain (CoreError)      → the request was wrong: bad payment,          │
//! │                            missing product, not enough stock.           │
//! │                            Surfaced to the caller with detail.          │
//! │                                                                         │
//! │  Storage (DbError)       → our problem, not the caller's.               │
//! │                            Fatal for the triggering operation,          │
//! │                            surfaced as a generic failure.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use vela_core::{CoreError, ValidationError};
use vela_db::DbError;

/// Errors produced by the engine layer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Storage failure.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Domain(CoreError::Validation(err))
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, configuration). Persistence concerns belong to the host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A conflict occurred (e.g. reconciling an already reconciled line).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Organisation-level configuration is missing; surfaced to the user as is.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A synthesized entry set does not balance and must not be persisted.
    #[error("unbalanced entries: debit {debit} != credit {credit}")]
    Imbalance { debit: Decimal, credit: Decimal },

    /// Currency or unit-of-measure conversion failed.
    #[error("conversion failed: {0}")]
    Conversion(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// True for errors that must be shown to the user verbatim.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Validation(_))
    }
}

//! Error types for LabelForge core

use thiserror::Error;

use crate::variable::{VarId, VarKind};

/// Main error type for store and model operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A domain was declared with no values
    #[error("Invalid domain for {name}: {reason}")]
    InvalidDomain { name: String, reason: String },

    /// A variable id that the store never handed out
    #[error("Unknown variable id {0}")]
    UnknownVariable(VarId),

    /// An operation was applied to a variable of the wrong kind
    #[error("Variable {var} is {actual}, expected {expected}")]
    KindMismatch {
        var: VarId,
        expected: VarKind,
        actual: VarKind,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Raised when propagation wipes out a domain.
///
/// This is ordinary control flow for search: the caller undoes the current
/// level and tries something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("inconsistent store")]
pub struct Inconsistency;

//! Errors raised while turning a solve item into an executable search.
//!
//! Propagation failures never show up here: they are ordinary control flow
//! inside the engine.

use labelforge_core::{CoreError, VarKind};
use thiserror::Error;

/// Fatal errors of a solve run. No partial result accompanies any of them.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("not recognized search type \"{0}\"")]
    UnsupportedSearchType(String),

    #[error("not recognized exploration type \"{0}\"")]
    UnsupportedExploration(String),

    #[error("not recognized {role} heuristic \"{name}\"")]
    UnsupportedHeuristic { role: &'static str, name: String },

    #[error("not recognized solve kind \"{0}\"")]
    UnsupportedSolveKind(String),

    #[error("wrong cost expression: {0}")]
    MalformedCost(String),

    #[error("malformed search annotation: {0}")]
    MalformedAnnotation(String),

    #[error("unknown variable or array \"{0}\"")]
    UnknownVariable(String),

    #[error("variable \"{name}\" is {actual} but {directive} expects {expected}")]
    VariableKindMismatch {
        name: String,
        directive: &'static str,
        expected: VarKind,
        actual: VarKind,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for search construction and solving.
pub type Result<T> = std::result::Result<T, SolveError>;

//! LabelForge Core - variables, domains and the propagation store
//!
//! This crate provides the constraint store that search drives:
//! - Integer, boolean and set variables with trailed domains
//! - A small set of propagating constraints
//! - Backtracking levels (`push_level` / `pop_level`)
//!
//! Search never inspects propagators; it only imposes constraints, narrows a
//! domain, asks for consistency and undoes a level.

pub mod constraint;
pub mod domain;
pub mod error;
pub mod store;
pub mod variable;

pub use constraint::{AllDifferent, Constraint, LessThan, Negation, NotEqual, SumEquals};
pub use domain::{midpoint, Domain, Domains, IntDomain, Interval, SetDomain};
pub use error::{CoreError, Inconsistency};
pub use store::Store;
pub use variable::{Value, VarId, VarKind, Variable};

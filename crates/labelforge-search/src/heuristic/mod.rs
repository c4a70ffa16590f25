//! Branching heuristics: variable/value orders and exploration decorators.

pub mod decorator;
pub mod selector;

pub use decorator::{admit, CreditState, Decorator, PathState};
pub use selector::{
    Candidates, Choice, IndomainMax, IndomainMiddle, IndomainMin, IndomainRandom, SetIndomain,
    ValueOrder, VariableOrder,
};

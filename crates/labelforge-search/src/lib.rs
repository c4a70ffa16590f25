//! LabelForge Search
//!
//! This crate turns a solve item into an executable backtracking search:
//! - Directive model and annotation parsing (`int_search`, `bool_search`,
//!   `set_search`, `seq_search`)
//! - Compilation into variable/value orders
//! - Tree building with completion nodes and branch-and-bound wiring
//! - Limited discrepancy and credit exploration
//! - Depth-first labeling with solution limits and timeouts
//! - Solution listener, statistics and the result protocol

pub mod annotation;
pub mod clock;
pub mod compiler;
pub mod context;
pub mod directive;
pub mod engine;
pub mod error;
pub mod heuristic;
pub mod listener;
pub mod output;
pub mod solve;
pub mod statistics;
pub mod table;
pub mod tree;

pub use annotation::{AnnArg, Annotation};
pub use clock::{Clock, ManualClock, SteppingClock, WallClock};
pub use compiler::{compile, CompiledSearch};
pub use context::{Objective, SearchContext};
pub use directive::{
    CostExpr, DirectiveKind, Exploration, Goal, SearchDirective, SearchSpec, SolveGoal, SolveItem,
    ValSelect, VarSearch, VarSelect,
};
pub use engine::{DepthFirstSearch, SearchResult};
pub use error::{Result, SolveError};
pub use heuristic::{
    Candidates, Choice, CreditState, Decorator, PathState, ValueOrder, VariableOrder,
};
pub use listener::{Solution, SolutionListener, SolutionReporter};
pub use output::{
    ProtocolWriter, SEARCH_COMPLETE, SOLUTION_SEPARATOR, TIME_OUT, UNKNOWN, UNSATISFIABLE,
};
pub use solve::{SearchStatus, SolveOutcome, Solver};
pub use statistics::{SearchStatistics, SolveReport};
pub use table::{OutputItem, VarTable};
pub use tree::{
    BuildOutcome, NodeId, NodeRole, NodeState, SearchCounters, SearchNode, SearchTree,
    TreeBuilder,
};

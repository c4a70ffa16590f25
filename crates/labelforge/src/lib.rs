//! LabelForge - search orchestration for constraint models
//!
//! Takes a model's store, its name table and a solve item, and runs the
//! described backtracking search, printing results in the line protocol.
//!
//! # Example
//!
//! ```rust
//! use labelforge::prelude::*;
//!
//! let mut store = Store::new();
//! let x = store.new_int("x", 1, 3).unwrap();
//! let table = VarTable::from_store(&store);
//! let item = SolveItem::new(SolveGoal::Maximize(CostExpr::Ident("x".into())));
//!
//! let mut out = Vec::new();
//! let outcome = labelforge::run(&mut store, &table, &item, SolveOptions::new(), &mut out).unwrap();
//! assert_eq!(outcome.status, SearchStatus::Exhausted);
//! assert_eq!(outcome.best.and_then(|s| s.cost), Some(3));
//! # let _ = x;
//! ```

pub use labelforge_config::{ConfigError, SolveOptions};
pub use labelforge_core as core;
pub use labelforge_search as search;

mod solver;
pub use solver::{load_options, run, run_streaming};

pub mod prelude {
    pub use labelforge_config::SolveOptions;
    pub use labelforge_core::{Store, Value, VarId, VarKind};
    pub use labelforge_search::{
        AnnArg, Annotation, CostExpr, SearchStatus, Solution, SolveError, SolveGoal, SolveItem,
        SolveOutcome, VarTable,
    };
}

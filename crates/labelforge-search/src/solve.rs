//! Solve driver: builds the tree, runs the engine and writes the result
//! protocol.

use std::io::Write;
use std::sync::Arc;

use labelforge_config::SolveOptions;
use labelforge_core::Store;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::clock::{Clock, WallClock};
use crate::context::SearchContext;
use crate::directive::{Goal, SearchSpec, SolveItem};
use crate::engine::DepthFirstSearch;
use crate::error::Result;
use crate::listener::{Solution, SolutionListener};
use crate::output::{ProtocolWriter, SEARCH_COMPLETE, TIME_OUT, UNKNOWN, UNSATISFIABLE};
use crate::statistics::{SearchStatistics, SolveReport};
use crate::table::VarTable;
use crate::tree::{BuildOutcome, TreeBuilder};

/// How a solve run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// The model had nothing to branch on.
    Trivial,
    /// The first solution was found and search stopped there.
    Satisfied,
    /// Complete search exhausted the tree after reporting every solution.
    /// For an optimization goal the last solution is optimal.
    Exhausted,
    /// The solution limit stopped the search.
    LimitReached,
    /// Heuristic search found solutions but could not establish completeness.
    Incomplete,
    /// Complete search found no solution.
    Unsatisfiable,
    /// Heuristic search found no solution.
    Unknown,
    /// The deadline expired first.
    TimedOut,
}

/// Everything a solve run produced.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SearchStatus,
    pub found: bool,
    pub report: SolveReport,
    /// The last accepted solution, the best one when optimizing.
    pub best: Option<Solution>,
    /// Every accepted solution, when retention was requested.
    pub solutions: Vec<Solution>,
}

impl SolveOutcome {
    pub fn statistics(&self) -> &SearchStatistics {
        &self.report.statistics
    }
}

/// One solve invocation over a store.
///
/// # Example
///
/// ```
/// use labelforge_config::SolveOptions;
/// use labelforge_core::Store;
/// use labelforge_search::{SearchSpec, SearchStatus, Solver, VarTable};
///
/// let mut store = Store::new();
/// let x = store.new_int("x", 0, 10).unwrap();
/// let table = VarTable::from_store(&store);
///
/// let mut out = Vec::new();
/// let outcome = Solver::new(&mut store, &table, SolveOptions::new())
///     .solve(&SearchSpec::maximize(x, None), &mut out)
///     .unwrap();
///
/// assert_eq!(outcome.status, SearchStatus::Exhausted);
/// assert_eq!(outcome.best.unwrap().cost, Some(10));
/// assert!(String::from_utf8(out).unwrap().ends_with("x = 10;\n----------\n==========\n"));
/// ```
pub struct Solver<'s> {
    store: &'s mut Store,
    table: &'s VarTable,
    options: SolveOptions,
    clock: Arc<dyn Clock>,
    sender: Option<mpsc::UnboundedSender<Solution>>,
    retain: bool,
}

impl<'s> Solver<'s> {
    pub fn new(store: &'s mut Store, table: &'s VarTable, options: SolveOptions) -> Self {
        Self {
            store,
            table,
            options,
            clock: Arc::new(WallClock::new()),
            sender: None,
            retain: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Streams every accepted solution over `sender`.
    pub fn with_sender(mut self, sender: mpsc::UnboundedSender<Solution>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Keeps every accepted solution in the outcome.
    pub fn retaining(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// Resolves a parsed solve item and solves it.
    pub fn solve_item<W: Write>(self, item: &SolveItem, out: W) -> Result<SolveOutcome> {
        let spec = SearchSpec::from_solve_item(item, self.table, self.store)?;
        self.solve(&spec, out)
    }

    /// Solves `spec`, writing solutions and status lines to `out`.
    ///
    /// # Errors
    ///
    /// Configuration errors abort before any search; output errors abort
    /// the run.
    pub fn solve<W: Write>(self, spec: &SearchSpec, out: W) -> Result<SolveOutcome> {
        let Solver {
            store,
            table,
            options,
            clock,
            sender,
            retain,
        } = self;

        let model_variables = store.size();
        let model_constraints = store.num_constraints();
        let search_all = options.all_solutions || spec.goal.is_optimization();
        info!(
            event = "solve_start",
            variables = model_variables,
            constraints = model_constraints,
            goal = ?spec.goal,
            all_solutions = search_all,
        );

        let builder = TreeBuilder::new(table);
        let mut writer = ProtocolWriter::new(out, table);
        if options.verbose {
            writer.model_header(store, &goal_line(spec, store))?;
            writer.default_search(store, &builder.completion_variables(spec, store)?)?;
        }

        let mut listener = if search_all {
            SolutionListener::all(options.solution_limit())
        } else {
            SolutionListener::first()
        }
        .retaining(retain);
        if let Some(cost) = spec.cost {
            listener = listener.with_cost(cost);
        }
        if let Some(sender) = sender {
            listener = listener.with_sender(sender);
        }

        let started = clock.elapsed();
        let mut ctx = SearchContext::new()
            .with_clock(Arc::clone(&clock))
            .with_time_limit(options.time_limit())
            .with_listener(listener.with_reporter(&mut writer));
        if let Some(seed) = options.random_seed {
            ctx = ctx.with_seed(seed);
        }

        let built = builder.build(spec, store, &mut ctx)?;
        let (status, statistics) = match built {
            BuildOutcome::Trivial => (SearchStatus::Trivial, SearchStatistics::trivial()),
            BuildOutcome::Tree(mut tree) => {
                let result = DepthFirstSearch::new(&mut tree, store, &mut ctx).run();
                let complete = tree.is_complete();
                let limit_reached = ctx.listener().limit_reached();
                let status = match (result.found, result.timed_out) {
                    (_, true) => SearchStatus::TimedOut,
                    (true, false) if !search_all => SearchStatus::Satisfied,
                    (true, false) if limit_reached => SearchStatus::LimitReached,
                    (true, false) if complete => SearchStatus::Exhausted,
                    (true, false) => SearchStatus::Incomplete,
                    (false, false) if complete => SearchStatus::Unsatisfiable,
                    (false, false) => SearchStatus::Unknown,
                };
                (status, SearchStatistics::aggregate(&tree))
            }
        };
        let search_time = clock.elapsed().saturating_sub(started);

        let mut listener = ctx.into_listener();
        if let Some(e) = listener.take_error() {
            return Err(e.into());
        }
        let found = listener.count() > 0;
        let (best, solutions) = listener.into_parts();

        match status {
            SearchStatus::Exhausted => writer.line(SEARCH_COMPLETE)?,
            SearchStatus::Unsatisfiable => writer.line(UNSATISFIABLE)?,
            SearchStatus::Unknown => writer.line(UNKNOWN)?,
            SearchStatus::TimedOut => {
                if !found {
                    writer.line(UNKNOWN)?;
                }
                writer.line(TIME_OUT)?;
            }
            SearchStatus::Trivial
            | SearchStatus::Satisfied
            | SearchStatus::LimitReached
            | SearchStatus::Incomplete => {}
        }

        let report = SolveReport {
            model_variables,
            model_constraints,
            search_time,
            statistics,
        };
        if options.statistics {
            writer.report(&report)?;
        }
        writer.flush()?;

        info!(
            event = "solve_end",
            status = ?status,
            solutions = statistics.solutions,
            nodes = statistics.nodes,
            time_ms = search_time.as_millis() as u64,
        );
        debug!(event = "best", cost = ?best.as_ref().and_then(|s| s.cost));

        Ok(SolveOutcome {
            status,
            found,
            report,
            best,
            solutions,
        })
    }
}

fn goal_line(spec: &SearchSpec, store: &Store) -> String {
    let cost = spec
        .cost
        .and_then(|c| store.variable(c).ok())
        .map(|v| v.name.as_str())
        .unwrap_or("?");
    match spec.goal {
        Goal::Satisfy => "satisfy".to_string(),
        Goal::Minimize => format!("minimize({}) ", cost),
        Goal::Maximize => format!("maximize({}) ", cost),
    }
}

#[cfg(test)]
#[path = "solve_tests.rs"]
mod tests;

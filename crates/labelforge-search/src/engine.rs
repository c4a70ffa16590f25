//! Depth-first labeling over a search tree.
//!
//! Each decision opens a store level, commits one candidate, re-applies the
//! branch-and-bound cut and propagates. Failure undoes the level and moves to
//! the next candidate. When a node has no unassigned variable left, labeling
//! continues in its child; at the last node the assignment is a solution.

use labelforge_core::Store;
use tracing::{debug, trace};

use crate::context::SearchContext;
use crate::heuristic::{admit, Choice, PathState};
use crate::tree::{NodeId, NodeState, SearchTree};

/// Why a labeling frame returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Keep trying candidates.
    Continue,
    /// The listener asked to stop.
    Stop,
    TimedOut,
}

/// Summary of one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchResult {
    /// At least one solution was accepted.
    pub found: bool,
    /// The deadline expired before the tree was exhausted.
    pub timed_out: bool,
    /// The listener stopped the search.
    pub stopped: bool,
}

/// Runs a built tree against a store.
///
/// # Example
///
/// ```
/// use labelforge_core::{NotEqual, Store};
/// use labelforge_search::{
///     BuildOutcome, DepthFirstSearch, SearchContext, SearchSpec, SolutionListener, TreeBuilder,
///     VarTable,
/// };
///
/// let mut store = Store::new();
/// let x = store.new_int("x", 1, 2).unwrap();
/// let y = store.new_int("y", 1, 2).unwrap();
/// store.impose(NotEqual::new(x, y)).unwrap();
/// let table = VarTable::from_store(&store);
///
/// let mut ctx = SearchContext::new().with_listener(SolutionListener::all(None));
/// let BuildOutcome::Tree(mut tree) = TreeBuilder::new(&table)
///     .build(&SearchSpec::satisfy(None), &mut store, &mut ctx)
///     .unwrap()
/// else {
///     unreachable!()
/// };
///
/// let result = DepthFirstSearch::new(&mut tree, &mut store, &mut ctx).run();
/// assert!(result.found);
/// assert_eq!(ctx.listener().count(), 2);
/// ```
pub struct DepthFirstSearch<'r, 'a> {
    tree: &'r mut SearchTree,
    store: &'r mut Store,
    ctx: &'r mut SearchContext<'a>,
}

impl<'r, 'a> DepthFirstSearch<'r, 'a> {
    pub fn new(
        tree: &'r mut SearchTree,
        store: &'r mut Store,
        ctx: &'r mut SearchContext<'a>,
    ) -> Self {
        Self { tree, store, ctx }
    }

    /// Searches until exhaustion, a listener stop or the deadline.
    ///
    /// The store is returned to the level it had on entry.
    pub fn run(mut self) -> SearchResult {
        let Some(root) = self.tree.root() else {
            return SearchResult::default();
        };

        let deadline = self.ctx.time_limit().map(|limit| self.ctx.elapsed() + limit);
        for id in self.tree.pre_order() {
            let node = self.tree.node_mut(id);
            node.deadline = deadline;
            node.state = NodeState::Ready;
        }

        let before = self.ctx.listener().count();
        debug!(event = "search_start", nodes = self.tree.len(), deadline = ?deadline);

        self.store.push_level();
        let flow = if self.store.consistency() {
            self.label_node(root)
        } else {
            debug!(event = "root_inconsistent");
            self.tree.node_mut(root).state = NodeState::Exhausted;
            Flow::Continue
        };
        self.store.pop_level();

        let result = SearchResult {
            found: self.ctx.listener().count() > before,
            timed_out: flow == Flow::TimedOut,
            stopped: flow == Flow::Stop,
        };
        debug!(
            event = "search_end",
            found = result.found,
            timed_out = result.timed_out,
            stopped = result.stopped,
        );
        result
    }

    /// Labels node `id` and its descendants. Decorators belong to their
    /// node, so every node starts with no discrepancies and fresh credit.
    fn label_node(&mut self, id: NodeId) -> Flow {
        self.tree.node_mut(id).state = NodeState::Labeling;
        let flow = self.label(id, 0, PathState::default());
        self.tree.node_mut(id).state = match flow {
            Flow::TimedOut => NodeState::TimedOut,
            Flow::Continue | Flow::Stop => NodeState::Exhausted,
        };
        flow
    }

    /// Labels the remaining variables of node `id`, `depth` decisions deep.
    fn label(&mut self, id: NodeId, depth: u64, path: PathState) -> Flow {
        let next = {
            let search = &self.tree.node(id).search;
            search.var_order.select(self.store, &search.variables)
        };
        let Some(var) = next else {
            return match self.tree.node(id).children().first().copied() {
                Some(child) => self.label_node(child),
                None => self.solution_at_leaf(id),
            };
        };

        let node = self.tree.node_mut(id);
        node.counters.max_depth = node.counters.max_depth.max(depth + 1);
        let candidates = node.search.val_order.candidates(self.store, var);
        let decorators = node.decorators().to_vec();
        let count = candidates.len();
        let solutions_before = self.ctx.listener().count();

        for (index, choice) in candidates.enumerate() {
            if self.expired(id) {
                self.ctx.mark_timed_out();
                return Flow::TimedOut;
            }
            // Admission never grows with the index, so later candidates
            // are pruned too.
            let Some(below) = admit(&decorators, path, index as u64, count) else {
                trace!(event = "pruned", node = id.0, index);
                break;
            };

            if !self.decide(id, choice) {
                continue;
            }
            let flow = self.label(id, depth + 1, below);
            self.store.pop_level();
            if flow != Flow::Continue {
                return flow;
            }
        }

        if self.ctx.listener().count() == solutions_before {
            let node = self.tree.node_mut(id);
            node.counters.backtracks += 1;
            node.state = NodeState::Backtracking;
        }
        Flow::Continue
    }

    /// Opens a level and commits `choice`. On success the level stays open.
    fn decide(&mut self, id: NodeId, choice: Choice) -> bool {
        let bound = self.tree.node(id).bound_var();
        let incumbent = self.ctx.incumbent();
        let counters = &mut self.tree.node_mut(id).counters;
        counters.decisions += 1;

        self.store.push_level();
        let committed = choice.commit(self.store).is_ok()
            && match (bound, incumbent) {
                (Some(bound), Some(best)) => best
                    .checked_sub(1)
                    .is_some_and(|max| self.store.restrict_max(bound, max).is_ok()),
                _ => true,
            };
        let consistent = committed && self.store.consistency();

        let counters = &mut self.tree.node_mut(id).counters;
        counters.nodes += 1;
        trace!(event = "decision", node = id.0, choice = %choice, consistent);
        if !consistent {
            counters.wrong_decisions += 1;
            self.store.pop_level();
        }
        consistent
    }

    fn solution_at_leaf(&mut self, id: NodeId) -> Flow {
        self.tree.node_mut(id).state = NodeState::SolutionAtLeaf;
        let keep_going = self.ctx.listener_mut().on_solution(self.store);
        let node = self.tree.node_mut(id);
        node.counters.solutions = self.ctx.listener().count();

        if node.is_optimizing() {
            if let Some(bound) = node.bound_var() {
                let value = self
                    .store
                    .int_domain(bound)
                    .ok()
                    .and_then(|d| d.value().or(d.min()));
                if let Some(value) = value {
                    debug!(event = "incumbent", node = id.0, bound = value);
                    self.ctx.set_incumbent(value);
                }
            }
        }

        if keep_going {
            Flow::Continue
        } else {
            Flow::Stop
        }
    }

    fn expired(&self, id: NodeId) -> bool {
        self.tree
            .node(id)
            .deadline()
            .is_some_and(|deadline| self.ctx.elapsed() >= deadline)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

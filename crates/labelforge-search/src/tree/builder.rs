//! Composes compiled directives into a search tree.

use std::collections::HashSet;

use labelforge_core::{Negation, Store, VarId, VarKind};
use tracing::{debug, info};

use super::{NodeId, NodeRole, SearchNode, SearchTree};
use crate::compiler::{compile, CompiledSearch};
use crate::context::{Objective, SearchContext};
use crate::directive::{DirectiveKind, Goal, SearchSpec, VarSearch};
use crate::error::{Result, SolveError};
use crate::table::VarTable;

/// Result of building a tree.
#[derive(Debug)]
pub enum BuildOutcome {
    Tree(SearchTree),
    /// Nothing to branch on. The single solution has already been handed
    /// to the listener.
    Trivial,
}

/// Builds the node chain of a [`SearchSpec`]:
///
/// 1. one node per non-empty leaf directive, `seq` children chained in order;
/// 2. completion nodes for unclaimed declared int, bool and set variables;
/// 3. branch-and-bound wiring on every node, with the last node optimizing.
pub struct TreeBuilder<'t> {
    table: &'t VarTable,
}

impl<'t> TreeBuilder<'t> {
    pub fn new(table: &'t VarTable) -> Self {
        Self { table }
    }

    /// Builds the tree, posting the negation constraint when maximizing.
    ///
    /// # Errors
    ///
    /// Any compile error aborts the build; no partial tree is returned.
    pub fn build(
        &self,
        spec: &SearchSpec,
        store: &mut Store,
        ctx: &mut SearchContext<'_>,
    ) -> Result<BuildOutcome> {
        let mut stages: Vec<(CompiledSearch, NodeRole)> = Vec::new();

        if let Some(directive) = &spec.directive {
            for (kind, search) in directive.leaves() {
                if let Some(compiled) = compile(kind, search, store, ctx)? {
                    stages.push((compiled, NodeRole::Explicit));
                }
            }
        }

        for (kind, vars) in self.completion_variables(spec, store)? {
            debug!(
                event = "completion",
                kind = %kind,
                variables = vars.len(),
            );
            if let Some(compiled) = compile(kind, &VarSearch::new(vars), store, ctx)? {
                stages.push((compiled, NodeRole::Completion));
            }
        }

        if stages.is_empty() {
            info!(event = "trivial_model");
            ctx.listener_mut().on_solution(store);
            return Ok(BuildOutcome::Trivial);
        }

        let bound = self.wire_cost(spec, store, ctx)?;

        let mut tree = SearchTree::new();
        let last = stages.len() - 1;
        let mut parent: Option<NodeId> = None;
        for (i, (compiled, role)) in stages.into_iter().enumerate() {
            let mut node = SearchNode::new(compiled, role);
            if let Some(bound) = bound {
                node.set_bound(bound, i == last);
            }
            parent = Some(tree.push(node, parent));
        }

        info!(
            event = "tree_built",
            nodes = tree.len(),
            variables = tree.variables().len(),
            complete = tree.is_complete(),
        );
        debug!(event = "tree", layout = %tree.describe(store));
        Ok(BuildOutcome::Tree(tree))
    }

    /// Declared decision variables no directive of `spec` claims, split
    /// into int, bool and set sets in declaration order.
    pub fn completion_variables(
        &self,
        spec: &SearchSpec,
        store: &Store,
    ) -> Result<[(DirectiveKind, Vec<VarId>); 3]> {
        let claimed: HashSet<VarId> = spec
            .directive
            .as_ref()
            .map(|d| d.claimed_variables().into_iter().collect())
            .unwrap_or_default();

        let mut ints = Vec::new();
        let mut bools = Vec::new();
        let mut sets = Vec::new();
        for &var in self.table.decision_variables() {
            if claimed.contains(&var) {
                continue;
            }
            match store.variable(var)?.kind {
                VarKind::Int => ints.push(var),
                VarKind::Bool => bools.push(var),
                VarKind::Set => sets.push(var),
            }
        }
        Ok([
            (DirectiveKind::Int, ints),
            (DirectiveKind::Bool, bools),
            (DirectiveKind::Set, sets),
        ])
    }

    /// Returns the variable search minimizes.
    fn wire_cost(
        &self,
        spec: &SearchSpec,
        store: &mut Store,
        ctx: &mut SearchContext<'_>,
    ) -> Result<Option<VarId>> {
        if spec.goal == Goal::Satisfy {
            return Ok(None);
        }
        let cost = spec
            .cost
            .ok_or_else(|| SolveError::MalformedCost("optimization goal without cost".into()))?;

        let bound = match spec.goal {
            Goal::Maximize => {
                let domain = store.int_domain(cost)?;
                let (min, max) = domain
                    .min()
                    .zip(domain.max())
                    .ok_or_else(|| SolveError::MalformedCost("empty cost domain".into()))?;
                let name = format!("-{}", store.variable(cost)?.name);
                let (Some(lo), Some(hi)) = (max.checked_neg(), min.checked_neg()) else {
                    return Err(SolveError::MalformedCost(format!(
                        "{} cannot be negated",
                        store.variable(cost)?.name
                    )));
                };
                let negated = store.new_int(name, lo, hi)?;
                store.impose(Negation::new(negated, cost))?;
                negated
            }
            _ => cost,
        };

        ctx.set_objective(Objective {
            cost,
            bound,
            incumbent: None,
        });
        Ok(Some(bound))
    }
}

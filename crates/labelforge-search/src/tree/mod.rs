//! The search tree: an arena of nodes addressed by [`NodeId`].
//!
//! Each node labels the variables of one compiled directive. A node's only
//! child starts once every variable of the node is assigned; the last node
//! of the chain reports solutions.

mod builder;

pub use builder::{BuildOutcome, TreeBuilder};

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use labelforge_core::{Store, VarId};

use crate::compiler::CompiledSearch;
use crate::heuristic::Decorator;

/// Index of a node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Where a node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Built from a search annotation.
    Explicit,
    /// Injected to cover declared variables no annotation claims.
    Completion,
}

/// Execution state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Ready,
    Labeling,
    SolutionAtLeaf,
    Backtracking,
    Exhausted,
    TimedOut,
}

/// Per-node search counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchCounters {
    /// Propagation calls after a decision.
    pub nodes: u64,
    pub decisions: u64,
    /// Decisions that failed propagation.
    pub wrong_decisions: u64,
    /// Variables whose candidates were exhausted without a solution.
    pub backtracks: u64,
    pub max_depth: u64,
    /// Solution count as last written by this node.
    pub solutions: u64,
}

/// One stage of the search.
#[derive(Debug)]
pub struct SearchNode {
    pub(crate) search: CompiledSearch,
    role: NodeRole,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    decorators: Vec<Decorator>,
    optimize: bool,
    bound_var: Option<VarId>,
    pub(crate) deadline: Option<Duration>,
    pub(crate) counters: SearchCounters,
    pub(crate) state: NodeState,
}

impl SearchNode {
    pub fn new(search: CompiledSearch, role: NodeRole) -> Self {
        let decorators = Decorator::for_exploration(search.exploration)
            .into_iter()
            .collect();
        Self {
            search,
            role,
            parent: None,
            children: Vec::new(),
            decorators,
            optimize: false,
            bound_var: None,
            deadline: None,
            counters: SearchCounters::default(),
            state: NodeState::Ready,
        }
    }

    pub fn search(&self) -> &CompiledSearch {
        &self.search
    }

    pub fn variables(&self) -> &[VarId] {
        &self.search.variables
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn decorators(&self) -> &[Decorator] {
        &self.decorators
    }

    /// Whether accepted solutions tighten the bound at this node.
    pub fn is_optimizing(&self) -> bool {
        self.optimize
    }

    pub fn bound_var(&self) -> Option<VarId> {
        self.bound_var
    }

    /// Deadline on the context clock, set when search starts.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn counters(&self) -> &SearchCounters {
        &self.counters
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub(crate) fn set_bound(&mut self, bound: VarId, optimize: bool) {
        self.bound_var = Some(bound);
        self.optimize = optimize;
    }
}

/// Arena of search nodes.
#[derive(Debug, Default)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl SearchTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds `node` as the last child of `parent`.
    pub(crate) fn push(&mut self, mut node: SearchNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        self.nodes.push(node);
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SearchNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Nodes in pre-order from the root.
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        std::iter::successors(self.node(id).parent, |&p| self.node(p).parent).collect()
    }

    /// Union of every node's variables.
    pub fn variables(&self) -> BTreeSet<VarId> {
        self.nodes
            .iter()
            .flat_map(|n| n.search.variables.iter().copied())
            .collect()
    }

    /// True when no node carries an exploration decorator.
    pub fn is_complete(&self) -> bool {
        self.nodes.iter().all(|n| n.decorators.is_empty())
    }

    /// Completion nodes in pre-order.
    pub fn completion_nodes(&self) -> impl Iterator<Item = &SearchNode> {
        self.pre_order()
            .into_iter()
            .map(move |id| self.node(id))
            .filter(|n| n.role == NodeRole::Completion)
    }

    /// One line per node in pre-order, indented by depth.
    pub fn describe(&self, store: &Store) -> String {
        let mut out = String::new();
        for id in self.pre_order() {
            let node = self.node(id);
            let depth = self.ancestors(id).len();
            out.push_str(&"  ".repeat(depth));
            out.push_str(&format!("{}. {}", id.0 + 1, node.search.describe(store)));
            if node.role == NodeRole::Completion {
                out.push_str(" [completion]");
            }
            if node.optimize {
                out.push_str(" [optimize]");
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Ready => "ready",
            NodeState::Labeling => "labeling",
            NodeState::SolutionAtLeaf => "solution",
            NodeState::Backtracking => "backtracking",
            NodeState::Exhausted => "exhausted",
            NodeState::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

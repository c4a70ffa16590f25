//! Search statistics aggregated over the nodes of a tree.

use std::fmt;
use std::time::Duration;

use crate::tree::SearchTree;

/// Consolidated counters of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStatistics {
    pub nodes: u64,
    pub decisions: u64,
    pub wrong_decisions: u64,
    pub backtracks: u64,
    pub max_depth: u64,
    pub solutions: u64,
}

impl SearchStatistics {
    /// Sums the counters of every node in pre-order. `max_depth` is the
    /// deepest node and `solutions` the count last written in that order.
    pub fn aggregate(tree: &SearchTree) -> Self {
        let mut stats = Self::default();
        for id in tree.pre_order() {
            let c = tree.node(id).counters();
            stats.nodes += c.nodes;
            stats.decisions += c.decisions;
            stats.wrong_decisions += c.wrong_decisions;
            stats.backtracks += c.backtracks;
            stats.max_depth = stats.max_depth.max(c.max_depth);
            if c.solutions > 0 {
                stats.solutions = c.solutions;
            }
        }
        stats
    }

    /// Statistics of a model with nothing to branch on.
    pub fn trivial() -> Self {
        Self {
            solutions: 1,
            ..Self::default()
        }
    }
}

/// The `%%` statistics block printed after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveReport {
    pub model_variables: usize,
    pub model_constraints: usize,
    pub search_time: Duration,
    pub statistics: SearchStatistics,
}

impl fmt::Display for SolveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.statistics;
        writeln!(f)?;
        writeln!(f, "%% Model variables : {}", self.model_variables)?;
        writeln!(f, "%% Model constraints : {}", self.model_constraints)?;
        writeln!(f)?;
        writeln!(f, "%% Search CPU time : {}ms", self.search_time.as_millis())?;
        writeln!(f, "%% Search nodes : {}", s.nodes)?;
        writeln!(f, "%% Search decisions : {}", s.decisions)?;
        writeln!(f, "%% Wrong search decisions : {}", s.wrong_decisions)?;
        writeln!(f, "%% Search backtracks : {}", s.backtracks)?;
        writeln!(f, "%% Max search depth : {}", s.max_depth)?;
        write!(f, "%% Number solutions : {}", s.solutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format() {
        let report = SolveReport {
            model_variables: 3,
            model_constraints: 1,
            search_time: Duration::from_micros(12_345),
            statistics: SearchStatistics {
                nodes: 9,
                decisions: 9,
                wrong_decisions: 2,
                backtracks: 1,
                max_depth: 3,
                solutions: 4,
            },
        };
        let expected = "\n%% Model variables : 3\n%% Model constraints : 1\n\n\
                        %% Search CPU time : 12ms\n%% Search nodes : 9\n\
                        %% Search decisions : 9\n%% Wrong search decisions : 2\n\
                        %% Search backtracks : 1\n%% Max search depth : 3\n\
                        %% Number solutions : 4";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_trivial() {
        let stats = SearchStatistics::trivial();
        assert_eq!(stats.solutions, 1);
        assert_eq!(stats.nodes + stats.decisions + stats.backtracks + stats.max_depth, 0);
    }

    #[test]
    fn test_empty_tree_aggregates_to_zero() {
        assert_eq!(SearchStatistics::aggregate(&SearchTree::default()), SearchStatistics::default());
    }
}

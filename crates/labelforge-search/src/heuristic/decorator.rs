//! Heuristic exploration decorators.
//!
//! A decorator only decides which candidate branches of a decision are
//! visited. It never changes how the engine labels, propagates or reports.
//! State travels down the current path in a [`PathState`] value, so
//! backtracking restores it for free. Each search node starts from
//! `PathState::default()`.

use crate::directive::Exploration;

/// Exploration restriction attached to a search node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decorator {
    /// Limited discrepancy search: at most `limit` non-first choices per path.
    Lds { limit: u32 },
    /// Credit search: `credit` is split among sibling branches; a branch
    /// left with a single unit of credit, or at depth `bbs`, is explored
    /// exhaustively.
    Credit { credit: u64, bbs: u32 },
}

impl Decorator {
    /// Decorator implementing a directive's exploration mode.
    pub fn for_exploration(exploration: Exploration) -> Option<Self> {
        match exploration {
            Exploration::Complete => None,
            Exploration::Lds(limit) => Some(Decorator::Lds { limit }),
            Exploration::Credit { credit, bbs } => Some(Decorator::Credit { credit, bbs }),
        }
    }
}

/// Credit left on the current path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreditState {
    /// No credit decision taken yet.
    #[default]
    Fresh,
    Active { credit: u64, depth: u32 },
    /// Credit used up: everything below is explored.
    Exhaustive,
}

/// Decorator bookkeeping for the path from the root to the current decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathState {
    pub discrepancies: u32,
    pub credit: CreditState,
}

/// Checks candidate `index` of `count` against every decorator, in order.
///
/// Returns the path state below the candidate, or `None` when some decorator
/// prunes it.
pub fn admit(decorators: &[Decorator], path: PathState, index: u64, count: u64) -> Option<PathState> {
    decorators
        .iter()
        .try_fold(path, |path, decorator| decorator.admit(path, index, count))
}

impl Decorator {
    fn admit(&self, path: PathState, index: u64, count: u64) -> Option<PathState> {
        match *self {
            Decorator::Lds { limit } => {
                // The default candidate is always taken.
                let discrepancies = path.discrepancies + u32::from(index > 0);
                (index == 0 || discrepancies <= limit).then_some(PathState {
                    discrepancies,
                    ..path
                })
            }
            Decorator::Credit { credit, bbs } => {
                let (available, depth) = match path.credit {
                    CreditState::Exhaustive => return Some(path),
                    CreditState::Fresh => (credit, 0),
                    CreditState::Active { credit, depth } => (credit, depth),
                };
                if depth >= bbs {
                    return Some(PathState {
                        credit: CreditState::Exhaustive,
                        ..path
                    });
                }

                let count = count.max(1);
                let share = available / count + u64::from(index < available % count);
                let credit = match share {
                    0 => return None,
                    1 => CreditState::Exhaustive,
                    share => CreditState::Active {
                        credit: share,
                        depth: depth + 1,
                    },
                };
                Some(PathState { credit, ..path })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lds_budget() {
        let lds = [Decorator::Lds { limit: 1 }];
        let root = PathState::default();

        let first = admit(&lds, root, 0, 3).unwrap();
        assert_eq!(first.discrepancies, 0);

        let second = admit(&lds, root, 1, 3).unwrap();
        assert_eq!(second.discrepancies, 1);
        assert_eq!(admit(&lds, second, 0, 3), Some(second));
        assert_eq!(admit(&lds, second, 2, 3), None);
    }

    #[test]
    fn test_lds_zero_is_greedy() {
        let lds = [Decorator::Lds { limit: 0 }];
        let root = PathState::default();
        assert!(admit(&lds, root, 0, 5).is_some());
        assert!((1..5).all(|i| admit(&lds, root, i, 5).is_none()));

        let spent = PathState {
            discrepancies: 3,
            ..root
        };
        assert_eq!(admit(&lds, spent, 0, 5), Some(spent));
    }

    #[test]
    fn test_credit_split() {
        let credit = [Decorator::Credit { credit: 5, bbs: 10 }];
        let root = PathState::default();

        let shares: Vec<_> = (0..3).map(|i| admit(&credit, root, i, 3).map(|p| p.credit)).collect();
        assert_eq!(
            shares,
            vec![
                Some(CreditState::Active { credit: 2, depth: 1 }),
                Some(CreditState::Active { credit: 2, depth: 1 }),
                Some(CreditState::Exhaustive),
            ]
        );

        let low = PathState {
            credit: CreditState::Active { credit: 2, depth: 1 },
            ..root
        };
        assert_eq!(admit(&credit, low, 1, 4).map(|p| p.credit), Some(CreditState::Exhaustive));
        assert_eq!(admit(&credit, low, 2, 4), None);
    }

    #[test]
    fn test_credit_depth_limit() {
        let credit = [Decorator::Credit { credit: 1, bbs: 0 }];
        let root = PathState::default();
        assert!((0..4).all(|i| admit(&credit, root, i, 4).map(|p| p.credit) == Some(CreditState::Exhaustive)));

        let exhaustive = PathState {
            credit: CreditState::Exhaustive,
            ..root
        };
        assert_eq!(admit(&credit, exhaustive, 3, 4), Some(exhaustive));
    }

    #[test]
    fn test_decorators_compose_in_order() {
        let both = [Decorator::Lds { limit: 0 }, Decorator::Credit { credit: 8, bbs: 4 }];
        let root = PathState::default();
        assert_eq!(admit(&both, root, 1, 2), None);
        let first = admit(&both, root, 0, 2).unwrap();
        assert_eq!(first.credit, CreditState::Active { credit: 4, depth: 1 });
    }
}

//! Variable and value ordering strategies.
//!
//! A [`VariableOrder`] picks the next unassigned variable of a node; a
//! [`ValueOrder`] lists the candidate [`Choice`]s for it, best first.

use std::fmt::{self, Debug};

use labelforge_core::{midpoint, Domain, Inconsistency, Interval, Store, VarId};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::directive::VarSelect;

/// One branching decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// `var = value`.
    Assign { var: VarId, value: i64 },
    /// `elem ∈ var`.
    Include { var: VarId, elem: i64 },
    /// `elem ∉ var`.
    Exclude { var: VarId, elem: i64 },
}

impl Choice {
    pub fn var(&self) -> VarId {
        match *self {
            Choice::Assign { var, .. } | Choice::Include { var, .. } | Choice::Exclude { var, .. } => var,
        }
    }

    /// Applies the decision to the store at its current level.
    pub fn commit(&self, store: &mut Store) -> Result<bool, Inconsistency> {
        match *self {
            Choice::Assign { var, value } => store.assign(var, value),
            Choice::Include { var, elem } => store.include(var, elem),
            Choice::Exclude { var, elem } => store.exclude(var, elem),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Assign { var, value } => write!(f, "{} = {}", var, value),
            Choice::Include { var, elem } => write!(f, "{} in {}", elem, var),
            Choice::Exclude { var, elem } => write!(f, "{} notin {}", elem, var),
        }
    }
}

/// Candidate decisions for one variable, in the order they are tried.
pub struct Candidates {
    len: u64,
    iter: Box<dyn Iterator<Item = Choice> + Send>,
}

impl Candidates {
    pub fn new(len: u64, iter: impl Iterator<Item = Choice> + Send + 'static) -> Self {
        Self {
            len,
            iter: Box::new(iter),
        }
    }

    pub fn empty() -> Self {
        Self::new(0, std::iter::empty())
    }

    fn from_vec(choices: Vec<Choice>) -> Self {
        Self::new(choices.len() as u64, choices.into_iter())
    }

    /// Total number of candidates, including those already yielded.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Iterator for Candidates {
    type Item = Choice;

    fn next(&mut self) -> Option<Choice> {
        self.iter.next()
    }
}

impl Debug for Candidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidates").field("len", &self.len).finish()
    }
}

/// Picks the next variable to branch on.
pub trait VariableOrder: Debug + Send {
    /// The chosen unassigned variable of `vars`, or `None` when all are ground.
    fn select(&self, store: &Store, vars: &[VarId]) -> Option<VarId>;
}

/// Orders the candidate decisions of a variable.
pub trait ValueOrder: Debug + Send {
    fn candidates(&mut self, store: &Store, var: VarId) -> Candidates;
}

fn size(store: &Store, var: VarId) -> u64 {
    store.domain(var).map(Domain::size).unwrap_or(u64::MAX)
}

fn lowest(store: &Store, var: VarId) -> i64 {
    match store.domain(var) {
        Ok(Domain::Int(d)) => d.min(),
        Ok(Domain::Set(d)) => d.undecided().next(),
        Err(_) => None,
    }
    .unwrap_or(i64::MAX)
}

fn highest(store: &Store, var: VarId) -> i64 {
    match store.domain(var) {
        Ok(Domain::Int(d)) => d.max(),
        Ok(Domain::Set(d)) => d.undecided().next_back(),
        Err(_) => None,
    }
    .unwrap_or(i64::MIN)
}

/// First element with the strictly best key; ties keep input order.
fn first_best<K: Ord>(
    vars: impl Iterator<Item = VarId>,
    key: impl Fn(VarId) -> K,
    better: impl Fn(&K, &K) -> bool,
) -> Option<VarId> {
    let mut best: Option<(VarId, K)> = None;
    for var in vars {
        let k = key(var);
        if best.as_ref().map_or(true, |(_, bk)| better(&k, bk)) {
            best = Some((var, k));
        }
    }
    best.map(|(var, _)| var)
}

impl VariableOrder for VarSelect {
    fn select(&self, store: &Store, vars: &[VarId]) -> Option<VarId> {
        let mut free = vars.iter().copied().filter(|&v| !store.is_singleton(v));
        match self {
            VarSelect::InputOrder => free.next(),
            VarSelect::FirstFail => first_best(free, |v| size(store, v), |a, b| a < b),
            VarSelect::AntiFirstFail => first_best(free, |v| size(store, v), |a, b| a > b),
            VarSelect::Smallest => first_best(free, |v| lowest(store, v), |a, b| a < b),
            VarSelect::Largest => first_best(free, |v| highest(store, v), |a, b| a > b),
        }
    }
}

fn int_intervals(store: &Store, var: VarId) -> Option<(u64, Vec<Interval>)> {
    let domain = store.domain(var).ok()?.as_int()?;
    Some((domain.size(), domain.intervals().to_vec()))
}

/// Smallest value first.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndomainMin;

impl ValueOrder for IndomainMin {
    fn candidates(&mut self, store: &Store, var: VarId) -> Candidates {
        let Some((len, intervals)) = int_intervals(store, var) else {
            return Candidates::empty();
        };
        Candidates::new(
            len,
            intervals
                .into_iter()
                .flat_map(|i| i.min..=i.max)
                .map(move |value| Choice::Assign { var, value }),
        )
    }
}

/// Largest value first.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndomainMax;

impl ValueOrder for IndomainMax {
    fn candidates(&mut self, store: &Store, var: VarId) -> Candidates {
        let Some((len, intervals)) = int_intervals(store, var) else {
            return Candidates::empty();
        };
        Candidates::new(
            len,
            intervals
                .into_iter()
                .rev()
                .flat_map(|i| (i.min..=i.max).rev())
                .map(move |value| Choice::Assign { var, value }),
        )
    }
}

/// Value closest to the middle of the bounds first, then outwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndomainMiddle;

impl ValueOrder for IndomainMiddle {
    fn candidates(&mut self, store: &Store, var: VarId) -> Candidates {
        let Ok(domain) = store.int_domain(var) else {
            return Candidates::empty();
        };
        let (Some(min), Some(max)) = (domain.min(), domain.max()) else {
            return Candidates::empty();
        };
        let mid = midpoint(min, max);
        let mut values: Vec<i64> = domain.values().collect();
        values.sort_by_key(|v| (v.abs_diff(mid), *v));
        Candidates::from_vec(
            values
                .into_iter()
                .map(|value| Choice::Assign { var, value })
                .collect(),
        )
    }
}

/// Uniformly shuffled values from a seeded generator.
#[derive(Debug, Clone)]
pub struct IndomainRandom {
    rng: ChaCha8Rng,
}

impl IndomainRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl ValueOrder for IndomainRandom {
    fn candidates(&mut self, store: &Store, var: VarId) -> Candidates {
        let Ok(domain) = store.int_domain(var) else {
            return Candidates::empty();
        };
        let mut values: Vec<i64> = domain.values().collect();
        values.shuffle(&mut self.rng);
        Candidates::from_vec(
            values
                .into_iter()
                .map(|value| Choice::Assign { var, value })
                .collect(),
        )
    }
}

/// Branches on one undecided set element: include it, then exclude it.
///
/// `largest_first` picks the largest undecided element instead of the
/// smallest.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetIndomain {
    pub largest_first: bool,
}

impl ValueOrder for SetIndomain {
    fn candidates(&mut self, store: &Store, var: VarId) -> Candidates {
        let Some(domain) = store.domain(var).ok().and_then(Domain::as_set) else {
            return Candidates::empty();
        };
        let elem = if self.largest_first {
            domain.undecided().next_back()
        } else {
            domain.undecided().next()
        };
        match elem {
            Some(elem) => Candidates::from_vec(vec![
                Choice::Include { var, elem },
                Choice::Exclude { var, elem },
            ]),
            None => Candidates::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigned(c: Candidates) -> Vec<i64> {
        c.map(|choice| match choice {
            Choice::Assign { value, .. } => value,
            other => panic!("unexpected {}", other),
        })
        .collect()
    }

    #[test]
    fn test_var_orders() {
        let mut store = Store::new();
        let a = store.new_int("a", 0, 9).unwrap();
        let b = store.new_int("b", 3, 4).unwrap();
        let c = store.new_int("c", 5, 6).unwrap();
        let d = store.new_int("d", 7, 7).unwrap();
        let vars = [d, a, b, c];

        assert_eq!(VarSelect::InputOrder.select(&store, &vars), Some(a));
        assert_eq!(VarSelect::FirstFail.select(&store, &vars), Some(b));
        assert_eq!(VarSelect::AntiFirstFail.select(&store, &vars), Some(a));
        assert_eq!(VarSelect::Smallest.select(&store, &vars), Some(a));
        assert_eq!(VarSelect::Largest.select(&store, &[b, c]), Some(c));
        assert_eq!(VarSelect::InputOrder.select(&store, &[d]), None);
    }

    #[test]
    fn test_int_value_orders() {
        let mut store = Store::new();
        let x = store.new_int_values("x", [1, 2, 3, 7, 8]).unwrap();

        assert_eq!(assigned(IndomainMin.candidates(&store, x)), vec![1, 2, 3, 7, 8]);
        assert_eq!(assigned(IndomainMax.candidates(&store, x)), vec![8, 7, 3, 2, 1]);
        assert_eq!(assigned(IndomainMiddle.candidates(&store, x)), vec![3, 2, 1, 7, 8]);
        assert_eq!(IndomainMin.candidates(&store, x).len(), 5);
    }

    #[test]
    fn test_random_order_is_seeded() {
        let mut store = Store::new();
        let x = store.new_int("x", 0, 20).unwrap();

        let first = assigned(IndomainRandom::new(7).candidates(&store, x));
        let again = assigned(IndomainRandom::new(7).candidates(&store, x));
        assert_eq!(first, again);

        let mut sorted = first.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_set_value_order() {
        let mut store = Store::new();
        let s = store.new_set("s", [2], [1, 2, 3]).unwrap();

        let choices: Vec<_> = SetIndomain::default().candidates(&store, s).collect();
        assert_eq!(
            choices,
            vec![Choice::Include { var: s, elem: 1 }, Choice::Exclude { var: s, elem: 1 }]
        );

        let mut max = SetIndomain { largest_first: true };
        let first = max.candidates(&store, s).next();
        assert_eq!(first, Some(Choice::Include { var: s, elem: 3 }));
    }

    #[test]
    fn test_commit() {
        let mut store = Store::new();
        let x = store.new_int("x", 0, 3).unwrap();
        let s = store.new_set("s", [], [1]).unwrap();

        store.push_level();
        assert!(Choice::Assign { var: x, value: 2 }.commit(&mut store).unwrap());
        assert!(Choice::Exclude { var: s, elem: 1 }.commit(&mut store).unwrap());
        assert!(Choice::Include { var: s, elem: 1 }.commit(&mut store).is_err());
        store.pop_level();
        assert_eq!(store.int_domain(x).unwrap().size(), 4);
    }
}

//! Solution listener: snapshots accepted solutions, applies the stop
//! conditions and hands each solution to the reporting channels.

use std::fmt;
use std::io;

use labelforge_core::{Store, Value, VarId};
use tokio::sync::mpsc;
use tracing::debug;

/// Snapshot of one accepted solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// 1-based discovery index.
    pub number: u64,
    /// Every ground variable of the store, in declaration order.
    pub values: Vec<(VarId, Value)>,
    /// Value of the cost variable when optimizing.
    pub cost: Option<i64>,
}

impl Solution {
    pub fn capture(store: &Store, number: u64, cost: Option<i64>) -> Self {
        let values = store
            .variables()
            .filter_map(|(id, _)| store.value(id).map(|value| (id, value)))
            .collect();
        Self {
            number,
            values,
            cost,
        }
    }

    pub fn value(&self, var: VarId) -> Option<&Value> {
        self.values
            .iter()
            .find(|(id, _)| *id == var)
            .map(|(_, value)| value)
    }

    /// Integer view of a variable's value.
    pub fn int(&self, var: VarId) -> Option<i64> {
        self.value(var).and_then(Value::as_int)
    }
}

/// Receives each accepted solution while the store still holds it.
pub trait SolutionReporter {
    fn report(&mut self, store: &Store, solution: &Solution) -> io::Result<()>;
}

/// Decides after every solution whether search goes on.
///
/// # Example
///
/// ```
/// use labelforge_core::Store;
/// use labelforge_search::SolutionListener;
///
/// let mut store = Store::new();
/// store.new_int("x", 4, 4).unwrap();
///
/// let mut listener = SolutionListener::all(Some(2));
/// assert!(listener.on_solution(&store));
/// assert!(!listener.on_solution(&store));
/// assert!(listener.limit_reached());
/// ```
pub struct SolutionListener<'a> {
    limit: Option<u64>,
    count: u64,
    limit_reached: bool,
    cost: Option<VarId>,
    retain: bool,
    solutions: Vec<Solution>,
    last: Option<Solution>,
    reporter: Option<&'a mut dyn SolutionReporter>,
    sender: Option<mpsc::UnboundedSender<Solution>>,
    error: Option<io::Error>,
}

impl<'a> SolutionListener<'a> {
    fn with_limit(limit: Option<u64>) -> Self {
        Self {
            limit,
            count: 0,
            limit_reached: false,
            cost: None,
            retain: false,
            solutions: Vec::new(),
            last: None,
            reporter: None,
            sender: None,
            error: None,
        }
    }

    /// Stops at the first solution.
    pub fn first() -> Self {
        Self::with_limit(Some(1))
    }

    /// Keeps searching until exhaustion or until `limit` solutions.
    pub fn all(limit: Option<u64>) -> Self {
        Self::with_limit(limit)
    }

    /// Records the value of `cost` with every solution.
    pub fn with_cost(mut self, cost: VarId) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Keeps every solution, not only the last one.
    pub fn retaining(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    pub fn with_reporter(mut self, reporter: &'a mut dyn SolutionReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Streams a copy of every solution over `sender`.
    pub fn with_sender(mut self, sender: mpsc::UnboundedSender<Solution>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Accepts the store's current assignment as a solution.
    ///
    /// Returns `false` when search must stop: the solution limit was just
    /// reached or the reporter failed.
    pub fn on_solution(&mut self, store: &Store) -> bool {
        self.count += 1;
        let cost = self
            .cost
            .and_then(|c| store.value(c))
            .and_then(|v| v.as_int());
        let solution = Solution::capture(store, self.count, cost);
        debug!(event = "solution", number = self.count, cost = ?cost);

        if let Some(reporter) = self.reporter.as_deref_mut() {
            if let Err(e) = reporter.report(store, &solution) {
                self.error = Some(e);
            }
        }
        if let Some(sender) = &self.sender {
            // A closed receiver only means nobody is listening anymore.
            let _ = sender.send(solution.clone());
        }
        if self.retain {
            self.solutions.push(solution.clone());
        }
        self.last = Some(solution);

        self.limit_reached = self.limit.is_some_and(|n| self.count >= n);
        !self.limit_reached && self.error.is_none()
    }

    /// Number of accepted solutions.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    /// Cost of the most recent solution, the incumbent when optimizing.
    pub fn best_cost(&self) -> Option<i64> {
        self.last.as_ref().and_then(|s| s.cost)
    }

    pub fn last(&self) -> Option<&Solution> {
        self.last.as_ref()
    }

    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    /// Takes the first reporting error, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub(crate) fn into_parts(self) -> (Option<Solution>, Vec<Solution>) {
        (self.last, self.solutions)
    }
}

impl fmt::Debug for SolutionListener<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionListener")
            .field("limit", &self.limit)
            .field("count", &self.count)
            .field("limit_reached", &self.limit_reached)
            .field("cost", &self.cost)
            .field("has_reporter", &self.reporter.is_some())
            .field("has_sender", &self.sender.is_some())
            .finish()
    }
}

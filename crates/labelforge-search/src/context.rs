//! Explicit state threaded through tree building and search.

use std::sync::Arc;
use std::time::Duration;

use labelforge_core::VarId;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::clock::{Clock, WallClock};
use crate::listener::SolutionListener;

/// Branch-and-bound state shared by every node of an optimization search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Objective {
    /// The variable the goal names.
    pub cost: VarId,
    /// The variable search minimizes: `cost` itself, or its negation when
    /// maximizing.
    pub bound: VarId,
    /// Bound value of the last accepted solution.
    pub incumbent: Option<i64>,
}

/// Clock, time limit, seeds, objective and listener of one solve run.
#[derive(Debug)]
pub struct SearchContext<'a> {
    clock: Arc<dyn Clock>,
    time_limit: Option<Duration>,
    seeds: ChaCha8Rng,
    objective: Option<Objective>,
    listener: SolutionListener<'a>,
    timed_out: bool,
}

impl Default for SearchContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SearchContext<'a> {
    /// Wall clock, no time limit, entropy-seeded, stop at the first solution.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(WallClock::new()),
            time_limit: None,
            seeds: ChaCha8Rng::from_os_rng(),
            objective: None,
            listener: SolutionListener::first(),
            timed_out: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    /// Seeds the generator that seeds every randomized value order.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seeds = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_listener(mut self, listener: SolutionListener<'a>) -> Self {
        self.listener = listener;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn next_seed(&mut self) -> u64 {
        self.seeds.next_u64()
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    pub(crate) fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    pub(crate) fn set_incumbent(&mut self, value: i64) {
        if let Some(objective) = self.objective.as_mut() {
            objective.incumbent = Some(value);
        }
    }

    pub fn incumbent(&self) -> Option<i64> {
        self.objective.and_then(|o| o.incumbent)
    }

    pub fn listener(&self) -> &SolutionListener<'a> {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut SolutionListener<'a> {
        &mut self.listener
    }

    pub fn into_listener(self) -> SolutionListener<'a> {
        self.listener
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub(crate) fn mark_timed_out(&mut self) {
        self.timed_out = true;
    }
}

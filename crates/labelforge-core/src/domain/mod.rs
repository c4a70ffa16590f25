//! Variable domains and the trailed domain table.
//!
//! [`Domains`] records the previous domain of a variable the first time it
//! changes at a given level, so [`Domains::pop_level`] restores the exact
//! state the level was opened with.

mod int;
mod set;


use std::fmt;

pub use int::{midpoint, IntDomain, Interval};
pub use set::SetDomain;

use crate::error::Inconsistency;
use crate::variable::VarId;

/// Domain of a single variable. Booleans are integer domains within `0..1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Domain {
    Int(IntDomain),
    Set(SetDomain),
}

impl Domain {
    pub fn size(&self) -> u64 {
        match self {
            Domain::Int(d) => d.size(),
            Domain::Set(d) => d.size(),
        }
    }

    pub fn is_singleton(&self) -> bool {
        match self {
            Domain::Int(d) => d.is_singleton(),
            Domain::Set(d) => d.is_singleton(),
        }
    }

    pub fn as_int(&self) -> Option<&IntDomain> {
        match self {
            Domain::Int(d) => Some(d),
            Domain::Set(_) => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetDomain> {
        match self {
            Domain::Set(d) => Some(d),
            Domain::Int(_) => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Int(d) => d.fmt(f),
            Domain::Set(d) => d.fmt(f),
        }
    }
}

const NEVER_SAVED: usize = usize::MAX;

#[derive(Debug)]
struct TrailEntry {
    var: VarId,
    domain: Domain,
    saved_at: usize,
}

/// Domain table with a backtracking trail.
///
/// Every narrowing operation reports whether it changed anything and fails
/// with [`Inconsistency`] when the domain would become empty.
#[derive(Debug)]
pub struct Domains {
    domains: Vec<Domain>,
    saved_at: Vec<usize>,
    trail: Vec<Vec<TrailEntry>>,
}

impl Domains {
    pub(crate) fn new() -> Self {
        Self {
            domains: Vec::new(),
            saved_at: Vec::new(),
            trail: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, domain: Domain) -> VarId {
        self.domains.push(domain);
        self.saved_at.push(NEVER_SAVED);
        VarId(self.domains.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Current backtracking level (0 = root).
    pub fn level(&self) -> usize {
        self.trail.len()
    }

    pub(crate) fn push_level(&mut self) {
        self.trail.push(Vec::new());
    }

    pub(crate) fn pop_level(&mut self) {
        let Some(entries) = self.trail.pop() else {
            return;
        };
        for entry in entries.into_iter().rev() {
            let idx = entry.var.index();
            self.domains[idx] = entry.domain;
            self.saved_at[idx] = entry.saved_at;
        }
    }

    pub fn get(&self, var: VarId) -> Option<&Domain> {
        self.domains.get(var.index())
    }

    /// Integer domain of `var`; a set variable is treated as inconsistent use.
    pub fn int(&self, var: VarId) -> Result<&IntDomain, Inconsistency> {
        self.get(var).and_then(Domain::as_int).ok_or(Inconsistency)
    }

    pub fn set(&self, var: VarId) -> Result<&SetDomain, Inconsistency> {
        self.get(var).and_then(Domain::as_set).ok_or(Inconsistency)
    }

    fn save(&mut self, var: VarId) {
        let level = self.level();
        let idx = var.index();
        if level == 0 || self.saved_at[idx] == level {
            return;
        }
        let entry = TrailEntry {
            var,
            domain: self.domains[idx].clone(),
            saved_at: self.saved_at[idx],
        };
        self.saved_at[idx] = level;
        if let Some(frame) = self.trail.last_mut() {
            frame.push(entry);
        }
    }

    fn int_mut(&mut self, var: VarId) -> Result<&mut IntDomain, Inconsistency> {
        match self.domains.get_mut(var.index()) {
            Some(Domain::Int(d)) => Ok(d),
            _ => Err(Inconsistency),
        }
    }

    fn set_mut(&mut self, var: VarId) -> Result<&mut SetDomain, Inconsistency> {
        match self.domains.get_mut(var.index()) {
            Some(Domain::Set(d)) => Ok(d),
            _ => Err(Inconsistency),
        }
    }

    /// Intersects `var` with `min..=max`.
    pub fn restrict(&mut self, var: VarId, min: i64, max: i64) -> Result<bool, Inconsistency> {
        let current = self.int(var)?;
        let (Some(lo), Some(hi)) = (current.min(), current.max()) else {
            return Err(Inconsistency);
        };
        if lo >= min && hi <= max {
            return Ok(false);
        }
        if hi < min || lo > max {
            return Err(Inconsistency);
        }

        self.save(var);
        let d = self.int_mut(var)?;
        let changed = d.restrict(min, max);
        if d.is_empty() {
            return Err(Inconsistency);
        }
        Ok(changed)
    }

    /// Removes `value` from `var`.
    pub fn remove(&mut self, var: VarId, value: i64) -> Result<bool, Inconsistency> {
        let current = self.int(var)?;
        if !current.contains(value) {
            return Ok(false);
        }
        if current.is_singleton() {
            return Err(Inconsistency);
        }

        self.save(var);
        Ok(self.int_mut(var)?.remove(value))
    }

    /// Puts `elem` into the lower bound of set variable `var`.
    pub fn include(&mut self, var: VarId, elem: i64) -> Result<bool, Inconsistency> {
        let current = self.set(var)?;
        if current.glb().contains(&elem) {
            return Ok(false);
        }
        if !current.lub().contains(&elem) {
            return Err(Inconsistency);
        }

        self.save(var);
        self.set_mut(var)?.include(elem).ok_or(Inconsistency)
    }

    /// Removes `elem` from the upper bound of set variable `var`.
    pub fn exclude(&mut self, var: VarId, elem: i64) -> Result<bool, Inconsistency> {
        let current = self.set(var)?;
        if !current.lub().contains(&elem) {
            return Ok(false);
        }
        if current.glb().contains(&elem) {
            return Err(Inconsistency);
        }

        self.save(var);
        self.set_mut(var)?.exclude(elem).ok_or(Inconsistency)
    }
}

//! Propagating constraints.
//!
//! Each constraint narrows the domains in its scope and reports whether it
//! changed anything. The store calls them until a fixpoint is reached.

use std::fmt::Debug;

use crate::domain::{Domains, IntDomain};
use crate::error::Inconsistency;
use crate::variable::VarId;

/// A propagator over integer or set variables.
pub trait Constraint: Debug + Send {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Variables this constraint reads or narrows.
    fn scope(&self) -> Vec<VarId>;

    /// Narrows domains. `Ok(true)` if anything changed.
    fn propagate(&self, domains: &mut Domains) -> Result<bool, Inconsistency>;
}

fn bounds(d: &IntDomain) -> Result<(i64, i64), Inconsistency> {
    match (d.min(), d.max()) {
        (Some(min), Some(max)) => Ok((min, max)),
        _ => Err(Inconsistency),
    }
}

/// Bounds of `-v` for `v` in `lo..=hi`. `-i64::MIN` is clipped to `i64::MAX`.
fn negated(lo: i64, hi: i64) -> Result<(i64, i64), Inconsistency> {
    let min = hi.checked_neg().ok_or(Inconsistency)?;
    Ok((min, lo.checked_neg().unwrap_or(i64::MAX)))
}

fn clamp(v: i128) -> i64 {
    v.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// `x + y = 0`, i.e. `x` is the negation of `y`.
#[derive(Debug, Clone)]
pub struct Negation {
    pub x: VarId,
    pub y: VarId,
}

impl Negation {
    pub fn new(x: VarId, y: VarId) -> Self {
        Self { x, y }
    }
}

impl Constraint for Negation {
    fn name(&self) -> &'static str {
        "negation"
    }

    fn scope(&self) -> Vec<VarId> {
        vec![self.x, self.y]
    }

    fn propagate(&self, domains: &mut Domains) -> Result<bool, Inconsistency> {
        let (ymin, ymax) = bounds(domains.int(self.y)?)?;
        let (lo, hi) = negated(ymin, ymax)?;
        let mut changed = domains.restrict(self.x, lo, hi)?;
        let (xmin, xmax) = bounds(domains.int(self.x)?)?;
        let (lo, hi) = negated(xmin, xmax)?;
        changed |= domains.restrict(self.y, lo, hi)?;

        if let Some(v) = domains.int(self.y)?.value() {
            let v = v.checked_neg().ok_or(Inconsistency)?;
            changed |= domains.restrict(self.x, v, v)?;
        }
        Ok(changed)
    }
}

/// `x != y`.
#[derive(Debug, Clone)]
pub struct NotEqual {
    pub x: VarId,
    pub y: VarId,
}

impl NotEqual {
    pub fn new(x: VarId, y: VarId) -> Self {
        Self { x, y }
    }
}

impl Constraint for NotEqual {
    fn name(&self) -> &'static str {
        "not_equal"
    }

    fn scope(&self) -> Vec<VarId> {
        vec![self.x, self.y]
    }

    fn propagate(&self, domains: &mut Domains) -> Result<bool, Inconsistency> {
        let mut changed = false;
        if let Some(v) = domains.int(self.x)?.value() {
            changed |= domains.remove(self.y, v)?;
        }
        if let Some(v) = domains.int(self.y)?.value() {
            changed |= domains.remove(self.x, v)?;
        }
        Ok(changed)
    }
}

/// Pairwise distinct values, propagated by forward checking.
#[derive(Debug, Clone)]
pub struct AllDifferent {
    pub vars: Vec<VarId>,
}

impl AllDifferent {
    pub fn new(vars: Vec<VarId>) -> Self {
        Self { vars }
    }
}

impl Constraint for AllDifferent {
    fn name(&self) -> &'static str {
        "all_different"
    }

    fn scope(&self) -> Vec<VarId> {
        self.vars.clone()
    }

    fn propagate(&self, domains: &mut Domains) -> Result<bool, Inconsistency> {
        let mut changed = false;
        for (i, &x) in self.vars.iter().enumerate() {
            let Some(v) = domains.int(x)?.value() else {
                continue;
            };
            for (j, &y) in self.vars.iter().enumerate() {
                if i != j {
                    changed |= domains.remove(y, v)?;
                }
            }
        }
        Ok(changed)
    }
}

/// `x < y`.
#[derive(Debug, Clone)]
pub struct LessThan {
    pub x: VarId,
    pub y: VarId,
}

impl LessThan {
    pub fn new(x: VarId, y: VarId) -> Self {
        Self { x, y }
    }
}

impl Constraint for LessThan {
    fn name(&self) -> &'static str {
        "less_than"
    }

    fn scope(&self) -> Vec<VarId> {
        vec![self.x, self.y]
    }

    fn propagate(&self, domains: &mut Domains) -> Result<bool, Inconsistency> {
        let (_, ymax) = bounds(domains.int(self.y)?)?;
        let below = ymax.checked_sub(1).ok_or(Inconsistency)?;
        let mut changed = domains.restrict(self.x, i64::MIN, below)?;
        let (xmin, _) = bounds(domains.int(self.x)?)?;
        let above = xmin.checked_add(1).ok_or(Inconsistency)?;
        changed |= domains.restrict(self.y, above, i64::MAX)?;
        Ok(changed)
    }
}

/// `terms[0] + ... + terms[n-1] = total`, bounds consistent.
#[derive(Debug, Clone)]
pub struct SumEquals {
    pub terms: Vec<VarId>,
    pub total: VarId,
}

impl SumEquals {
    pub fn new(terms: Vec<VarId>, total: VarId) -> Self {
        Self { terms, total }
    }
}

impl Constraint for SumEquals {
    fn name(&self) -> &'static str {
        "sum_equals"
    }

    fn scope(&self) -> Vec<VarId> {
        let mut scope = self.terms.clone();
        scope.push(self.total);
        scope
    }

    fn propagate(&self, domains: &mut Domains) -> Result<bool, Inconsistency> {
        // Sums are taken in i128 so wide domains cannot overflow.
        let mut term_bounds = Vec::with_capacity(self.terms.len());
        for &t in &self.terms {
            let (lo, hi) = bounds(domains.int(t)?)?;
            term_bounds.push((i128::from(lo), i128::from(hi)));
        }
        let sum_min: i128 = term_bounds.iter().map(|b| b.0).sum();
        let sum_max: i128 = term_bounds.iter().map(|b| b.1).sum();

        let mut changed = domains.restrict(self.total, clamp(sum_min), clamp(sum_max))?;
        let (tmin, tmax) = bounds(domains.int(self.total)?)?;
        let (tmin, tmax) = (i128::from(tmin), i128::from(tmax));

        for (&t, &(lo, hi)) in self.terms.iter().zip(&term_bounds) {
            let others_min = sum_min - lo;
            let others_max = sum_max - hi;
            changed |= domains.restrict(t, clamp(tmin - others_max), clamp(tmax - others_min))?;
        }
        Ok(changed)
    }
}

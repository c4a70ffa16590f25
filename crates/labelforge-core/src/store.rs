//! The propagation store: variables, trailed domains and imposed constraints.

use std::collections::BTreeSet;

use crate::constraint::Constraint;
use crate::domain::{Domain, Domains, IntDomain, SetDomain};
use crate::error::{CoreError, Inconsistency, Result};
use crate::variable::{Value, VarId, VarKind, Variable};

#[derive(Debug)]
struct Imposed {
    level: usize,
    constraint: Box<dyn Constraint>,
}

/// Constraint store with backtracking levels.
///
/// Search opens a level with [`push_level`](Store::push_level), narrows
/// domains, calls [`consistency`](Store::consistency), and undoes everything
/// with [`pop_level`](Store::pop_level). Constraints imposed at a level are
/// retracted together with it.
///
/// # Example
///
/// ```
/// use labelforge_core::{NotEqual, Store};
///
/// let mut store = Store::new();
/// let x = store.new_int("x", 1, 2).unwrap();
/// let y = store.new_int("y", 1, 2).unwrap();
/// store.impose(NotEqual::new(x, y)).unwrap();
///
/// store.push_level();
/// store.assign(x, 1).unwrap();
/// assert!(store.consistency());
/// assert_eq!(store.domain(y).unwrap().to_string(), "2");
/// store.pop_level();
/// assert_eq!(store.domain(y).unwrap().size(), 2);
/// ```
#[derive(Debug)]
pub struct Store {
    variables: Vec<Variable>,
    domains: Domains,
    constraints: Vec<Imposed>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            domains: Domains::new(),
            constraints: Vec::new(),
        }
    }

    fn declare(&mut self, name: String, kind: VarKind, domain: Domain) -> VarId {
        self.variables.push(Variable { name, kind });
        self.domains.push(domain)
    }

    /// Declares an integer variable over `min..=max`.
    pub fn new_int(&mut self, name: impl Into<String>, min: i64, max: i64) -> Result<VarId> {
        let name = name.into();
        if min > max {
            return Err(CoreError::InvalidDomain {
                name,
                reason: format!("{}..{} is empty", min, max),
            });
        }
        Ok(self.declare(name, VarKind::Int, Domain::Int(IntDomain::interval(min, max))))
    }

    /// Declares an integer variable over an explicit value list.
    pub fn new_int_values(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = i64>,
    ) -> Result<VarId> {
        let name = name.into();
        let domain = IntDomain::from_values(values);
        if domain.is_empty() {
            return Err(CoreError::InvalidDomain {
                name,
                reason: "no values".to_string(),
            });
        }
        Ok(self.declare(name, VarKind::Int, Domain::Int(domain)))
    }

    /// Declares a boolean variable (`0` = false, `1` = true).
    pub fn new_bool(&mut self, name: impl Into<String>) -> VarId {
        self.declare(name.into(), VarKind::Bool, Domain::Int(IntDomain::interval(0, 1)))
    }

    /// Declares a set variable with `glb ⊆ s ⊆ lub`.
    pub fn new_set(
        &mut self,
        name: impl Into<String>,
        glb: impl IntoIterator<Item = i64>,
        lub: impl IntoIterator<Item = i64>,
    ) -> Result<VarId> {
        let name = name.into();
        let Some(domain) = SetDomain::new(glb, lub) else {
            return Err(CoreError::InvalidDomain {
                name,
                reason: "glb is not a subset of lub".to_string(),
            });
        };
        Ok(self.declare(name, VarKind::Set, Domain::Set(domain)))
    }

    /// Number of declared variables.
    pub fn size(&self) -> usize {
        self.variables.len()
    }

    /// Number of currently imposed constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variable(&self, var: VarId) -> Result<&Variable> {
        self.variables
            .get(var.index())
            .ok_or(CoreError::UnknownVariable(var))
    }

    pub fn variables(&self) -> impl Iterator<Item = (VarId, &Variable)> {
        self.variables.iter().enumerate().map(|(i, v)| (VarId(i), v))
    }

    pub fn domain(&self, var: VarId) -> Result<&Domain> {
        self.domains.get(var).ok_or(CoreError::UnknownVariable(var))
    }

    /// Integer domain of an int or bool variable.
    pub fn int_domain(&self, var: VarId) -> Result<&IntDomain> {
        let kind = self.variable(var)?.kind;
        self.domain(var)?
            .as_int()
            .ok_or(CoreError::KindMismatch {
                var,
                expected: VarKind::Int,
                actual: kind,
            })
    }

    pub fn is_singleton(&self, var: VarId) -> bool {
        self.domains.get(var).is_some_and(Domain::is_singleton)
    }

    /// Value of a ground variable, `None` while it still has choices.
    pub fn value(&self, var: VarId) -> Option<Value> {
        let kind = self.variables.get(var.index())?.kind;
        match (kind, self.domains.get(var)?) {
            (VarKind::Int, Domain::Int(d)) => d.value().map(Value::Int),
            (VarKind::Bool, Domain::Int(d)) => d.value().map(|v| Value::Bool(v != 0)),
            (VarKind::Set, Domain::Set(d)) if d.is_singleton() => {
                Some(Value::Set(d.glb().iter().copied().collect::<BTreeSet<_>>()))
            }
            _ => None,
        }
    }

    /// Adds a constraint at the current level.
    pub fn impose(&mut self, constraint: impl Constraint + 'static) -> Result<()> {
        for var in constraint.scope() {
            self.variable(var)?;
        }
        self.constraints.push(Imposed {
            level: self.domains.level(),
            constraint: Box::new(constraint),
        });
        Ok(())
    }

    /// Propagates all constraints to a fixpoint. `false` on a wipe-out.
    pub fn consistency(&mut self) -> bool {
        loop {
            let mut changed = false;
            for imposed in &self.constraints {
                match imposed.constraint.propagate(&mut self.domains) {
                    Ok(c) => changed |= c,
                    Err(Inconsistency) => return false,
                }
            }
            if !changed {
                return true;
            }
        }
    }

    pub fn level(&self) -> usize {
        self.domains.level()
    }

    pub fn push_level(&mut self) {
        self.domains.push_level();
    }

    /// Undoes every domain change and constraint of the current level.
    pub fn pop_level(&mut self) {
        self.domains.pop_level();
        let level = self.domains.level();
        self.constraints.retain(|c| c.level <= level);
    }

    pub fn assign(&mut self, var: VarId, value: i64) -> std::result::Result<bool, Inconsistency> {
        self.domains.restrict(var, value, value)
    }

    pub fn remove_value(
        &mut self,
        var: VarId,
        value: i64,
    ) -> std::result::Result<bool, Inconsistency> {
        self.domains.remove(var, value)
    }

    /// Tightens the upper bound of an integer variable.
    pub fn restrict_max(
        &mut self,
        var: VarId,
        max: i64,
    ) -> std::result::Result<bool, Inconsistency> {
        self.domains.restrict(var, i64::MIN, max)
    }

    pub fn include(&mut self, var: VarId, elem: i64) -> std::result::Result<bool, Inconsistency> {
        self.domains.include(var, elem)
    }

    pub fn exclude(&mut self, var: VarId, elem: i64) -> std::result::Result<bool, Inconsistency> {
        self.domains.exclude(var, elem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{AllDifferent, LessThan, Negation, SumEquals};

    #[test]
    fn test_invalid_domains_rejected() {
        let mut store = Store::new();
        assert!(matches!(
            store.new_int("x", 3, 1),
            Err(CoreError::InvalidDomain { .. })
        ));
        assert!(store.new_int_values("y", []).is_err());
        assert!(store.new_set("s", [5], [1, 2]).is_err());
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_impose_unknown_variable() {
        let mut store = Store::new();
        let x = store.new_int("x", 0, 1).unwrap();
        let err = store.impose(Negation::new(x, VarId(9))).unwrap_err();
        assert_eq!(err, CoreError::UnknownVariable(VarId(9)));
        assert_eq!(store.num_constraints(), 0);
    }

    #[test]
    fn test_negation_bounds() {
        let mut store = Store::new();
        let cost = store.new_int("cost", 0, 10).unwrap();
        let neg = store.new_int("-cost", -10, 0).unwrap();
        store.impose(Negation::new(neg, cost)).unwrap();

        store.push_level();
        store.restrict_max(neg, -4).unwrap();
        assert!(store.consistency());
        assert_eq!(store.int_domain(cost).unwrap().min(), Some(4));

        store.assign(cost, 7).unwrap();
        assert!(store.consistency());
        assert_eq!(store.value(neg), Some(Value::Int(-7)));
        store.pop_level();

        assert_eq!(store.int_domain(cost).unwrap().to_string(), "0..10");
    }

    #[test]
    fn test_extreme_bounds_do_not_overflow() {
        let mut store = Store::new();
        let x = store.new_int("x", i64::MIN, i64::MAX).unwrap();
        let neg = store.new_int("-x", i64::MIN, i64::MAX).unwrap();
        store.impose(Negation::new(neg, x)).unwrap();
        assert!(store.consistency());
        assert_eq!(store.int_domain(x).unwrap().min(), Some(i64::MIN + 1));
        assert_eq!(store.int_domain(neg).unwrap().max(), Some(i64::MAX));

        let a = store.new_int("a", i64::MAX - 1, i64::MAX).unwrap();
        let b = store.new_int("b", i64::MAX - 1, i64::MAX).unwrap();
        let total = store.new_int("total", i64::MIN, i64::MAX).unwrap();
        store.impose(SumEquals::new(vec![a, b], total)).unwrap();
        assert!(!store.consistency());
    }

    #[test]
    fn test_less_than_minimum_fails() {
        let mut store = Store::new();
        let x = store.new_int("x", i64::MIN, 0).unwrap();
        let y = store.new_int("y", i64::MIN, i64::MIN).unwrap();
        store.impose(LessThan::new(x, y)).unwrap();
        assert!(!store.consistency());
    }

    #[test]
    fn test_sum_propagation_detects_failure() {
        let mut store = Store::new();
        let a = store.new_int("a", 0, 3).unwrap();
        let b = store.new_int("b", 0, 3).unwrap();
        let total = store.new_int("total", 7, 9).unwrap();
        store.impose(SumEquals::new(vec![a, b], total)).unwrap();
        assert!(!store.consistency());
    }

    #[test]
    fn test_constraints_retracted_with_level() {
        let mut store = Store::new();
        let x = store.new_int("x", 1, 3).unwrap();
        let y = store.new_int("y", 1, 3).unwrap();

        store.push_level();
        store.impose(AllDifferent::new(vec![x, y])).unwrap();
        store.assign(x, 2).unwrap();
        assert!(store.consistency());
        assert!(!store.int_domain(y).unwrap().contains(2));
        store.pop_level();

        assert_eq!(store.num_constraints(), 0);
        store.push_level();
        store.assign(x, 2).unwrap();
        store.assign(y, 2).unwrap();
        assert!(store.consistency());
        store.pop_level();
    }

    #[test]
    fn test_value_by_kind() {
        let mut store = Store::new();
        let b = store.new_bool("b");
        let s = store.new_set("s", [1], [1]).unwrap();
        assert_eq!(store.value(b), None);
        store.assign(b, 1).unwrap();
        assert_eq!(store.value(b), Some(Value::Bool(true)));
        assert_eq!(store.value(s), Some(Value::Set([1].into_iter().collect())));
        assert!(store.int_domain(s).is_err());
    }
}

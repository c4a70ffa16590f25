//! Name lookup for variables and arrays, plus the declared default-search and
//! output variables of a model.

use std::collections::{HashMap, HashSet};

use labelforge_core::{Store, VarId};

/// An item of the model's output section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputItem {
    /// A single output variable, printed as `name = value;`.
    Var(VarId),
    /// An output array, printed as `name = array1d(1..n, [..]);`.
    Array { name: String, vars: Vec<VarId> },
}

/// Dictionary of a parsed model.
///
/// Declaration order is preserved for decision and output variables; it is
/// the tie-breaker of every default ordering.
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    variables: HashMap<String, VarId>,
    arrays: HashMap<String, Vec<VarId>>,
    decisions: Vec<VarId>,
    decision_set: HashSet<VarId>,
    outputs: Vec<OutputItem>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every store variable under its own name, as a decision
    /// variable and as an output.
    pub fn from_store(store: &Store) -> Self {
        let mut table = Self::new();
        for (id, var) in store.variables() {
            table = table
                .with_var(var.name.clone(), id)
                .with_decision(id)
                .with_output(id);
        }
        table
    }

    pub fn with_var(mut self, name: impl Into<String>, var: VarId) -> Self {
        self.variables.insert(name.into(), var);
        self
    }

    pub fn with_array(mut self, name: impl Into<String>, vars: Vec<VarId>) -> Self {
        self.arrays.insert(name.into(), vars);
        self
    }

    /// Marks a variable as a declared decision variable. Duplicates are ignored.
    pub fn with_decision(mut self, var: VarId) -> Self {
        if self.decision_set.insert(var) {
            self.decisions.push(var);
        }
        self
    }

    pub fn with_decisions(self, vars: impl IntoIterator<Item = VarId>) -> Self {
        vars.into_iter().fold(self, Self::with_decision)
    }

    pub fn with_output(mut self, var: VarId) -> Self {
        self.outputs.push(OutputItem::Var(var));
        self
    }

    pub fn with_output_array(mut self, name: impl Into<String>, vars: Vec<VarId>) -> Self {
        self.outputs.push(OutputItem::Array {
            name: name.into(),
            vars,
        });
        self
    }

    pub fn variable(&self, name: &str) -> Option<VarId> {
        self.variables.get(name).copied()
    }

    pub fn array(&self, name: &str) -> Option<&[VarId]> {
        self.arrays.get(name).map(Vec::as_slice)
    }

    /// Resolves a name to its variables: an array first, then a scalar.
    pub fn resolve(&self, name: &str) -> Option<Vec<VarId>> {
        self.array(name)
            .map(<[VarId]>::to_vec)
            .or_else(|| self.variable(name).map(|v| vec![v]))
    }

    /// Declared decision variables, in declaration order.
    pub fn decision_variables(&self) -> &[VarId] {
        &self.decisions
    }

    pub fn is_decision(&self, var: VarId) -> bool {
        self.decision_set.contains(&var)
    }

    pub fn outputs(&self) -> &[OutputItem] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store() {
        let mut store = Store::new();
        let x = store.new_int("x", 0, 3).unwrap();
        let b = store.new_bool("b");
        let table = VarTable::from_store(&store);

        assert_eq!(table.variable("x"), Some(x));
        assert_eq!(table.variable("b"), Some(b));
        assert_eq!(table.decision_variables(), &[x, b]);
        assert_eq!(table.outputs().len(), 2);
    }

    #[test]
    fn test_resolve_prefers_arrays() {
        let table = VarTable::new()
            .with_var("q", VarId(0))
            .with_array("q", vec![VarId(1), VarId(2)])
            .with_var("z", VarId(3));

        assert_eq!(table.resolve("q"), Some(vec![VarId(1), VarId(2)]));
        assert_eq!(table.resolve("z"), Some(vec![VarId(3)]));
        assert_eq!(table.resolve("missing"), None);
    }

    #[test]
    fn test_duplicate_decisions_ignored() {
        let table = VarTable::new().with_decisions([VarId(2), VarId(0), VarId(2)]);
        assert_eq!(table.decision_variables(), &[VarId(2), VarId(0)]);
        assert!(table.is_decision(VarId(0)));
        assert!(!table.is_decision(VarId(1)));
    }
}

//! Resolves a directive into concrete variable and value orders.

use labelforge_core::{Domain, Store, VarId, VarKind};
use tracing::trace;

use crate::context::SearchContext;
use crate::directive::{DirectiveKind, Exploration, ValSelect, VarSearch, VarSelect};
use crate::error::{Result, SolveError};
use crate::heuristic::{
    IndomainMax, IndomainMiddle, IndomainMin, IndomainRandom, SetIndomain, ValueOrder,
    VariableOrder,
};

/// A directive bound to its strategies, ready to be labeled.
#[derive(Debug)]
pub struct CompiledSearch {
    pub kind: DirectiveKind,
    pub variables: Vec<VarId>,
    pub var_select: VarSelect,
    pub val_select: ValSelect,
    pub exploration: Exploration,
    pub(crate) var_order: Box<dyn VariableOrder>,
    pub(crate) val_order: Box<dyn ValueOrder>,
}

impl CompiledSearch {
    /// Short form such as `int_search([x, y], input_order, indomain_min, complete)`.
    pub fn describe(&self, store: &Store) -> String {
        let names: Vec<&str> = self
            .variables
            .iter()
            .map(|&v| store.variable(v).map(|var| var.name.as_str()).unwrap_or("?"))
            .collect();
        format!(
            "{}([{}], {}, {}, {})",
            self.kind,
            names.join(", "),
            self.var_select.name(),
            self.val_select.name(),
            self.exploration
        )
    }
}

fn accepts(directive: DirectiveKind, kind: VarKind) -> Option<bool> {
    match directive {
        DirectiveKind::Int => Some(matches!(kind, VarKind::Int | VarKind::Bool)),
        DirectiveKind::Bool => Some(kind == VarKind::Bool),
        DirectiveKind::Set => Some(kind == VarKind::Set),
        DirectiveKind::Seq => None,
    }
}

fn expected_kind(directive: DirectiveKind) -> VarKind {
    match directive {
        DirectiveKind::Bool => VarKind::Bool,
        DirectiveKind::Set => VarKind::Set,
        _ => VarKind::Int,
    }
}

/// Compiles one leaf directive.
///
/// Returns `Ok(None)` for an empty variable set. Without an explicit
/// variable selection the variables are sorted by ascending domain size,
/// declaration order breaking ties, and labeled in that order.
///
/// # Errors
///
/// `UnsupportedSearchType` for a `seq` directive, `VariableKindMismatch` for
/// a variable of the wrong kind, `UnsupportedHeuristic` for a value order the
/// variable kind cannot use.
pub fn compile(
    kind: DirectiveKind,
    search: &VarSearch,
    store: &Store,
    ctx: &mut SearchContext<'_>,
) -> Result<Option<CompiledSearch>> {
    for &var in &search.variables {
        let variable = store.variable(var)?;
        match accepts(kind, variable.kind) {
            None => return Err(SolveError::UnsupportedSearchType(kind.name().to_string())),
            Some(false) => {
                return Err(SolveError::VariableKindMismatch {
                    name: variable.name.clone(),
                    directive: kind.name(),
                    expected: expected_kind(kind),
                    actual: variable.kind,
                })
            }
            Some(true) => {}
        }
    }
    if kind == DirectiveKind::Seq {
        return Err(SolveError::UnsupportedSearchType(kind.name().to_string()));
    }
    if search.variables.is_empty() {
        trace!(event = "directive_dropped", kind = %kind);
        return Ok(None);
    }

    let mut variables = search.variables.clone();
    let var_select = match search.var_select {
        Some(select) => select,
        None => {
            variables.sort_by_key(|&v| store.domain(v).map(Domain::size).unwrap_or(u64::MAX));
            VarSelect::InputOrder
        }
    };

    let val_select = search.val_select.unwrap_or(ValSelect::Min);
    let val_order: Box<dyn ValueOrder> = match (kind, val_select) {
        (DirectiveKind::Set, ValSelect::Min) => Box::new(SetIndomain::default()),
        (DirectiveKind::Set, ValSelect::Max) => Box::new(SetIndomain {
            largest_first: true,
        }),
        (DirectiveKind::Set, other) => {
            return Err(SolveError::UnsupportedHeuristic {
                role: "value selection",
                name: other.name().to_string(),
            })
        }
        (_, ValSelect::Min) => Box::new(IndomainMin),
        (_, ValSelect::Max) => Box::new(IndomainMax),
        (_, ValSelect::Middle) => Box::new(IndomainMiddle),
        (_, ValSelect::Random) => Box::new(IndomainRandom::new(ctx.next_seed())),
    };

    Ok(Some(CompiledSearch {
        kind,
        variables,
        var_select,
        val_select,
        exploration: search.exploration,
        var_order: Box::new(var_select),
        val_order,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SearchContext;

    #[test]
    fn test_empty_directive_dropped() {
        let store = Store::new();
        let mut ctx = SearchContext::new();
        let compiled = compile(DirectiveKind::Int, &VarSearch::new(vec![]), &store, &mut ctx).unwrap();
        assert!(compiled.is_none());
    }

    #[test]
    fn test_default_order_sorts_by_domain_size() {
        let mut store = Store::new();
        let a = store.new_int("a", 0, 9).unwrap();
        let b = store.new_int("b", 0, 1).unwrap();
        let c = store.new_int("c", 5, 9).unwrap();
        let d = store.new_int("d", 3, 4).unwrap();
        let mut ctx = SearchContext::new();

        let compiled = compile(DirectiveKind::Int, &VarSearch::new(vec![a, b, c, d]), &store, &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(compiled.variables, vec![b, d, c, a]);
        assert_eq!(compiled.var_select, VarSelect::InputOrder);
        assert_eq!(compiled.val_select, ValSelect::Min);
        assert_eq!(
            compiled.describe(&store),
            "int_search([b, d, c, a], input_order, indomain_min, complete)"
        );
    }

    #[test]
    fn test_explicit_order_keeps_variables() {
        let mut store = Store::new();
        let a = store.new_int("a", 0, 9).unwrap();
        let b = store.new_int("b", 0, 1).unwrap();
        let mut ctx = SearchContext::new();

        let search = VarSearch::new(vec![a, b]).with_var_select(VarSelect::FirstFail);
        let compiled = compile(DirectiveKind::Int, &search, &store, &mut ctx).unwrap().unwrap();
        assert_eq!(compiled.variables, vec![a, b]);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut store = Store::new();
        let x = store.new_int("x", 0, 3).unwrap();
        let b = store.new_bool("b");
        let mut ctx = SearchContext::new();

        let err = compile(DirectiveKind::Bool, &VarSearch::new(vec![b, x]), &store, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            SolveError::VariableKindMismatch { ref name, expected: VarKind::Bool, actual: VarKind::Int, .. } if name == "x"
        ));

        assert!(compile(DirectiveKind::Int, &VarSearch::new(vec![x, b]), &store, &mut ctx).is_ok());
    }

    #[test]
    fn test_set_rejects_middle_value_order() {
        let mut store = Store::new();
        let s = store.new_set("s", [], [1, 2]).unwrap();
        let mut ctx = SearchContext::new();

        let search = VarSearch::new(vec![s]).with_val_select(ValSelect::Middle);
        assert!(matches!(
            compile(DirectiveKind::Set, &search, &store, &mut ctx),
            Err(SolveError::UnsupportedHeuristic { .. })
        ));
    }

    #[test]
    fn test_seq_is_not_a_leaf() {
        let store = Store::new();
        let mut ctx = SearchContext::new();
        assert!(matches!(
            compile(DirectiveKind::Seq, &VarSearch::new(vec![]), &store, &mut ctx),
            Err(SolveError::UnsupportedSearchType(_))
        ));
    }
}

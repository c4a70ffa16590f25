//! Search directive model.
//!
//! A [`SearchDirective`] is the immutable description of one search
//! annotation; a [`SearchSpec`] bundles the solve goal, the resolved cost
//! variable and the optional directive for one solve invocation.

use std::fmt;

use labelforge_core::{Store, VarId, VarKind};

use crate::annotation::{AnnArg, Annotation};
use crate::error::{Result, SolveError};
use crate::table::VarTable;

/// Variable ordering heuristic of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarSelect {
    /// Variables in the order they are listed.
    InputOrder,
    /// Smallest domain first.
    FirstFail,
    /// Largest domain first.
    AntiFirstFail,
    /// Smallest minimum value first.
    Smallest,
    /// Largest maximum value first.
    Largest,
}

impl VarSelect {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "input_order" => Some(VarSelect::InputOrder),
            "first_fail" => Some(VarSelect::FirstFail),
            "anti_first_fail" => Some(VarSelect::AntiFirstFail),
            "smallest" => Some(VarSelect::Smallest),
            "largest" => Some(VarSelect::Largest),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VarSelect::InputOrder => "input_order",
            VarSelect::FirstFail => "first_fail",
            VarSelect::AntiFirstFail => "anti_first_fail",
            VarSelect::Smallest => "smallest",
            VarSelect::Largest => "largest",
        }
    }
}

/// Value ordering heuristic of a directive.
///
/// For set variables `Min` and `Max` pick the smallest or largest undecided
/// element and try including it before excluding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValSelect {
    Min,
    Max,
    Middle,
    Random,
}

impl ValSelect {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "indomain_min" | "indomain" => Some(ValSelect::Min),
            "indomain_max" => Some(ValSelect::Max),
            "indomain_middle" | "indomain_median" => Some(ValSelect::Middle),
            "indomain_random" => Some(ValSelect::Random),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValSelect::Min => "indomain_min",
            ValSelect::Max => "indomain_max",
            ValSelect::Middle => "indomain_middle",
            ValSelect::Random => "indomain_random",
        }
    }
}

/// How the candidate branches of a directive are explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Exploration {
    #[default]
    Complete,
    /// Limited discrepancy search with the given discrepancy budget.
    Lds(u32),
    /// Credit search: `credit` units spread over siblings, exhaustive below
    /// depth `bbs`.
    Credit { credit: u64, bbs: u32 },
}

impl Exploration {
    pub fn is_complete(self) -> bool {
        matches!(self, Exploration::Complete)
    }
}

impl fmt::Display for Exploration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exploration::Complete => write!(f, "complete"),
            Exploration::Lds(k) => write!(f, "lds({})", k),
            Exploration::Credit { credit, bbs } => write!(f, "credit({}, bbs({}))", credit, bbs),
        }
    }
}

/// Variables plus heuristics of one `int_search`/`bool_search`/`set_search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSearch {
    pub variables: Vec<VarId>,
    /// `None` sorts by ascending domain size at compile time.
    pub var_select: Option<VarSelect>,
    /// `None` means smallest value (or element) first.
    pub val_select: Option<ValSelect>,
    pub exploration: Exploration,
}

impl VarSearch {
    /// A search with default heuristics and complete exploration.
    pub fn new(variables: Vec<VarId>) -> Self {
        Self {
            variables,
            var_select: None,
            val_select: None,
            exploration: Exploration::Complete,
        }
    }

    pub fn with_var_select(mut self, select: VarSelect) -> Self {
        self.var_select = Some(select);
        self
    }

    pub fn with_val_select(mut self, select: ValSelect) -> Self {
        self.val_select = Some(select);
        self
    }

    pub fn with_exploration(mut self, exploration: Exploration) -> Self {
        self.exploration = exploration;
        self
    }
}

/// Tag of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Int,
    Bool,
    Set,
    Seq,
}

impl DirectiveKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "int_search" => Some(DirectiveKind::Int),
            "bool_search" => Some(DirectiveKind::Bool),
            "set_search" => Some(DirectiveKind::Set),
            "seq_search" => Some(DirectiveKind::Seq),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DirectiveKind::Int => "int_search",
            DirectiveKind::Bool => "bool_search",
            DirectiveKind::Set => "set_search",
            DirectiveKind::Seq => "seq_search",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One search annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchDirective {
    Int(VarSearch),
    Bool(VarSearch),
    Set(VarSearch),
    /// Children run one after another; each starts once the previous one
    /// has assigned all of its variables.
    Seq(Vec<SearchDirective>),
}

impl SearchDirective {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            SearchDirective::Int(_) => DirectiveKind::Int,
            SearchDirective::Bool(_) => DirectiveKind::Bool,
            SearchDirective::Set(_) => DirectiveKind::Set,
            SearchDirective::Seq(_) => DirectiveKind::Seq,
        }
    }

    /// Builds a directive from a parsed annotation.
    ///
    /// # Errors
    ///
    /// Unknown tags, heuristics or exploration modes, unknown variable
    /// names and malformed argument lists.
    pub fn from_annotation(ann: &Annotation, table: &VarTable) -> Result<Self> {
        let kind = DirectiveKind::parse(&ann.name)
            .ok_or_else(|| SolveError::UnsupportedSearchType(ann.name.clone()))?;

        if kind == DirectiveKind::Seq {
            let Some(AnnArg::Array(items)) = ann.args.first() else {
                return Err(SolveError::MalformedAnnotation(format!(
                    "{} expects an array of search annotations",
                    ann
                )));
            };
            let children = items
                .iter()
                .map(|item| match item {
                    AnnArg::Call(child) => Self::from_annotation(child, table),
                    other => Err(SolveError::MalformedAnnotation(format!(
                        "{} is not a search annotation",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(SearchDirective::Seq(children));
        }

        let search = parse_var_search(kind, ann, table)?;
        Ok(match kind {
            DirectiveKind::Int => SearchDirective::Int(search),
            DirectiveKind::Bool => SearchDirective::Bool(search),
            _ => SearchDirective::Set(search),
        })
    }

    /// Builds the directive of a solve item. Several annotations form an
    /// implicit sequence; none yields `None`.
    pub fn from_annotations(anns: &[Annotation], table: &VarTable) -> Result<Option<Self>> {
        match anns {
            [] => Ok(None),
            [single] => Self::from_annotation(single, table).map(Some),
            several => several
                .iter()
                .map(|ann| Self::from_annotation(ann, table))
                .collect::<Result<Vec<_>>>()
                .map(|children| Some(SearchDirective::Seq(children))),
        }
    }

    /// All variables named by this directive, in order, duplicates kept.
    pub fn claimed_variables(&self) -> Vec<VarId> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<VarId>) {
        match self {
            SearchDirective::Int(s) | SearchDirective::Bool(s) | SearchDirective::Set(s) => {
                out.extend_from_slice(&s.variables)
            }
            SearchDirective::Seq(children) => {
                for child in children {
                    child.collect_variables(out);
                }
            }
        }
    }

    /// Leaf directives in execution order, `seq` nodes flattened.
    pub fn leaves(&self) -> Vec<(DirectiveKind, &VarSearch)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(DirectiveKind, &'a VarSearch)>) {
        match self {
            SearchDirective::Int(s) => out.push((DirectiveKind::Int, s)),
            SearchDirective::Bool(s) => out.push((DirectiveKind::Bool, s)),
            SearchDirective::Set(s) => out.push((DirectiveKind::Set, s)),
            SearchDirective::Seq(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// True when no leaf uses a heuristic exploration.
    pub fn is_complete(&self) -> bool {
        self.leaves().iter().all(|(_, s)| s.exploration.is_complete())
    }
}

fn parse_var_search(kind: DirectiveKind, ann: &Annotation, table: &VarTable) -> Result<VarSearch> {
    if ann.args.len() < 3 {
        return Err(SolveError::MalformedAnnotation(format!(
            "{} expects variables, variable selection and value selection",
            ann
        )));
    }

    let variables = parse_variables(&ann.args[0], table)?;

    let var_name = ann.args[1].as_name().unwrap_or_default();
    let var_select = VarSelect::parse(var_name).ok_or_else(|| SolveError::UnsupportedHeuristic {
        role: "variable selection",
        name: ann.args[1].to_string(),
    })?;

    let val_name = ann.args[2].as_name().unwrap_or_default();
    let val_select = ValSelect::parse(val_name)
        .filter(|v| kind != DirectiveKind::Set || matches!(v, ValSelect::Min | ValSelect::Max))
        .ok_or_else(|| SolveError::UnsupportedHeuristic {
            role: "value selection",
            name: ann.args[2].to_string(),
        })?;

    let exploration = match ann.args.get(3) {
        None => Exploration::Complete,
        Some(arg) => parse_exploration(arg)?,
    };

    Ok(VarSearch {
        variables,
        var_select: Some(var_select),
        val_select: Some(val_select),
        exploration,
    })
}

fn parse_variables(arg: &AnnArg, table: &VarTable) -> Result<Vec<VarId>> {
    match arg {
        AnnArg::Ident(name) => table
            .resolve(name)
            .ok_or_else(|| SolveError::UnknownVariable(name.clone())),
        AnnArg::Array(items) => {
            let mut vars = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    AnnArg::Ident(name) => vars.push(
                        table
                            .variable(name)
                            .ok_or_else(|| SolveError::UnknownVariable(name.clone()))?,
                    ),
                    // Constants in a variable array have nothing to label.
                    AnnArg::Int(_) => {}
                    other => {
                        return Err(SolveError::MalformedAnnotation(format!(
                            "{} is not a variable",
                            other
                        )))
                    }
                }
            }
            Ok(vars)
        }
        other => Err(SolveError::MalformedAnnotation(format!(
            "{} is not a variable list",
            other
        ))),
    }
}

fn int_arg(ann: &Annotation, index: usize) -> Option<i64> {
    match ann.args.get(index) {
        Some(AnnArg::Int(v)) => Some(*v),
        _ => None,
    }
}

fn parse_exploration(arg: &AnnArg) -> Result<Exploration> {
    let unsupported = || SolveError::UnsupportedExploration(arg.to_string());
    match arg {
        AnnArg::Ident(name) if name == "complete" => Ok(Exploration::Complete),
        AnnArg::Call(ann) => match ann.name.as_str() {
            "complete" if ann.args.is_empty() => Ok(Exploration::Complete),
            "lds" => int_arg(ann, 0)
                .and_then(|k| u32::try_from(k).ok())
                .map(Exploration::Lds)
                .ok_or_else(unsupported),
            "credit" => {
                let credit = int_arg(ann, 0).and_then(|c| u64::try_from(c).ok());
                let bbs = match ann.args.get(1) {
                    Some(AnnArg::Call(b)) if b.name == "bbs" => {
                        int_arg(b, 0).and_then(|n| u32::try_from(n).ok())
                    }
                    _ => None,
                };
                match (credit, bbs) {
                    (Some(credit), Some(bbs)) => Ok(Exploration::Credit { credit, bbs }),
                    _ => Err(unsupported()),
                }
            }
            _ => Err(unsupported()),
        },
        _ => Err(unsupported()),
    }
}

/// Cost expression of an optimization goal, as written in the solve item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostExpr {
    Ident(String),
    /// `name[index]`, 1-based.
    ArrayAccess(String, i64),
}

impl fmt::Display for CostExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostExpr::Ident(name) => write!(f, "{}", name),
            CostExpr::ArrayAccess(name, index) => write!(f, "{}[{}]", name, index),
        }
    }
}

impl CostExpr {
    /// Resolves the expression to an integer variable.
    pub fn resolve(&self, table: &VarTable, store: &Store) -> Result<VarId> {
        let var = match self {
            CostExpr::Ident(name) => table.variable(name),
            CostExpr::ArrayAccess(name, index) => table.array(name).and_then(|vars| {
                usize::try_from(*index - 1)
                    .ok()
                    .and_then(|i| vars.get(i).copied())
            }),
        }
        .ok_or_else(|| SolveError::MalformedCost(self.to_string()))?;

        match store.variable(var)?.kind {
            VarKind::Int | VarKind::Bool => Ok(var),
            VarKind::Set => Err(SolveError::MalformedCost(format!(
                "{} is a set variable",
                self
            ))),
        }
    }
}

/// The goal of a solve item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveGoal {
    Satisfy,
    Minimize(CostExpr),
    Maximize(CostExpr),
}

impl SolveGoal {
    /// Builds a goal from the solve-kind keyword.
    ///
    /// # Errors
    ///
    /// `UnsupportedSolveKind` for an unknown keyword, `MalformedCost` when an
    /// optimization goal lacks its cost expression.
    pub fn from_kind(kind: &str, cost: Option<CostExpr>) -> Result<Self> {
        let need_cost = |cost: Option<CostExpr>| {
            cost.ok_or_else(|| SolveError::MalformedCost(format!("{} without cost", kind)))
        };
        match kind {
            "satisfy" => Ok(SolveGoal::Satisfy),
            "minimize" => Ok(SolveGoal::Minimize(need_cost(cost)?)),
            "maximize" => Ok(SolveGoal::Maximize(need_cost(cost)?)),
            other => Err(SolveError::UnsupportedSolveKind(other.to_string())),
        }
    }
}

impl fmt::Display for SolveGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveGoal::Satisfy => write!(f, "satisfy"),
            SolveGoal::Minimize(cost) => write!(f, "minimize({})", cost),
            SolveGoal::Maximize(cost) => write!(f, "maximize({})", cost),
        }
    }
}

/// A parsed `solve` item: goal plus its search annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveItem {
    pub goal: SolveGoal,
    pub annotations: Vec<Annotation>,
}

impl SolveItem {
    pub fn new(goal: SolveGoal) -> Self {
        Self {
            goal,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, ann: Annotation) -> Self {
        self.annotations.push(ann);
        self
    }
}

/// Optimization direction of a resolved spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Goal {
    Satisfy,
    Minimize,
    Maximize,
}

impl Goal {
    pub fn is_optimization(self) -> bool {
        !matches!(self, Goal::Satisfy)
    }
}

/// Everything the tree builder needs for one solve invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub goal: Goal,
    /// Set exactly when `goal` is an optimization.
    pub cost: Option<VarId>,
    pub directive: Option<SearchDirective>,
}

impl SearchSpec {
    pub fn satisfy(directive: Option<SearchDirective>) -> Self {
        Self {
            goal: Goal::Satisfy,
            cost: None,
            directive,
        }
    }

    pub fn minimize(cost: VarId, directive: Option<SearchDirective>) -> Self {
        Self {
            goal: Goal::Minimize,
            cost: Some(cost),
            directive,
        }
    }

    pub fn maximize(cost: VarId, directive: Option<SearchDirective>) -> Self {
        Self {
            goal: Goal::Maximize,
            cost: Some(cost),
            directive,
        }
    }

    /// Resolves a parsed solve item against the model dictionary.
    pub fn from_solve_item(item: &SolveItem, table: &VarTable, store: &Store) -> Result<Self> {
        let directive = SearchDirective::from_annotations(&item.annotations, table)?;
        Ok(match &item.goal {
            SolveGoal::Satisfy => Self::satisfy(directive),
            SolveGoal::Minimize(cost) => Self::minimize(cost.resolve(table, store)?, directive),
            SolveGoal::Maximize(cost) => Self::maximize(cost.resolve(table, store)?, directive),
        })
    }
}

#[cfg(test)]
#[path = "directive_tests.rs"]
mod tests;

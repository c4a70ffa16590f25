//! End-to-end tests of the solve driver and its output protocol.

use std::io;
use std::time::Duration;

use labelforge_core::VarId;
use labelforge_test::{pair, queens, sum_model, unsat_triangle, QueensModel};

use super::*;
use crate::annotation::{AnnArg, Annotation};
use crate::clock::{ManualClock, SteppingClock};
use crate::directive::{
    CostExpr, Exploration, SearchDirective, SolveGoal, ValSelect, VarSearch, VarSelect,
};
use crate::error::SolveError;

fn solve(
    store: &mut Store,
    table: &VarTable,
    options: SolveOptions,
    spec: &SearchSpec,
) -> (SolveOutcome, String) {
    let mut out = Vec::new();
    let outcome = Solver::new(store, table, options)
        .with_clock(Arc::new(ManualClock::new()))
        .retaining(true)
        .solve(spec, &mut out)
        .unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

fn input_order(vars: Vec<VarId>) -> VarSearch {
    VarSearch::new(vars)
        .with_var_select(VarSelect::InputOrder)
        .with_val_select(ValSelect::Min)
}

#[test]
fn test_first_solution_only() {
    let mut model = pair();
    let table = VarTable::from_store(&model.store);

    let (outcome, out) = solve(&mut model.store, &table, SolveOptions::new(), &SearchSpec::satisfy(None));
    assert_eq!(outcome.status, SearchStatus::Satisfied);
    assert!(outcome.found);
    assert_eq!(out, "x = 1;\ny = 1;\n----------\n");
}

#[test]
fn test_all_solutions_end_with_search_complete() {
    let mut model = pair();
    let table = VarTable::from_store(&model.store);
    let options = SolveOptions::new().with_all_solutions(true);

    let (outcome, out) = solve(&mut model.store, &table, options, &SearchSpec::satisfy(None));
    assert_eq!(outcome.status, SearchStatus::Exhausted);
    assert_eq!(outcome.solutions.len(), 4);
    assert_eq!(
        out,
        "x = 1;\ny = 1;\n----------\n\
         x = 1;\ny = 2;\n----------\n\
         x = 2;\ny = 1;\n----------\n\
         x = 2;\ny = 2;\n----------\n\
         ==========\n"
    );
}

#[test]
fn test_solution_limit_suppresses_search_complete() {
    let mut model = pair();
    let table = VarTable::from_store(&model.store);
    let options = SolveOptions::new()
        .with_all_solutions(true)
        .with_solution_limit(2);

    let (outcome, out) = solve(&mut model.store, &table, options, &SearchSpec::satisfy(None));
    assert_eq!(outcome.status, SearchStatus::LimitReached);
    assert_eq!(out, "x = 1;\ny = 1;\n----------\nx = 1;\ny = 2;\n----------\n");
}

#[test]
fn test_unsatisfiable() {
    let (mut store, _) = unsat_triangle();
    let table = VarTable::from_store(&store);

    let (outcome, out) = solve(&mut store, &table, SolveOptions::new(), &SearchSpec::satisfy(None));
    assert_eq!(outcome.status, SearchStatus::Unsatisfiable);
    assert!(!outcome.found);
    assert_eq!(out, "=====UNSATISFIABLE=====\n");
}

#[test]
fn test_heuristic_search_without_solution_is_unknown() {
    let QueensModel { mut store, queens } = queens(4);
    let table = VarTable::new().with_decisions(queens.iter().copied());
    let spec = SearchSpec::satisfy(Some(SearchDirective::Int(
        input_order(queens).with_exploration(Exploration::Lds(0)),
    )));

    let (outcome, out) = solve(&mut store, &table, SolveOptions::new(), &spec);
    assert_eq!(outcome.status, SearchStatus::Unknown);
    assert_eq!(out, "=====UNKNOWN=====\n");
}

#[test]
fn test_heuristic_search_with_solutions_is_incomplete() {
    let mut model = pair();
    let table = VarTable::from_store(&model.store);
    let spec = SearchSpec::satisfy(Some(SearchDirective::Int(
        input_order(vec![model.x, model.y]).with_exploration(Exploration::Lds(0)),
    )));
    let options = SolveOptions::new().with_all_solutions(true);

    let (outcome, out) = solve(&mut model.store, &table, options, &spec);
    assert_eq!(outcome.status, SearchStatus::Incomplete);
    assert_eq!(out, "x = 1;\ny = 1;\n----------\n");
}

#[test]
fn test_timeout_without_solution() {
    let QueensModel { mut store, queens } = queens(6);
    let table = VarTable::new().with_decisions(queens.iter().copied());
    let spec = SearchSpec::satisfy(Some(SearchDirective::Int(input_order(queens))));

    let mut out = Vec::new();
    let outcome = Solver::new(&mut store, &table, SolveOptions::new().with_timeout_ms(5))
        .with_clock(Arc::new(SteppingClock::new(Duration::from_millis(1))))
        .solve(&spec, &mut out)
        .unwrap();

    assert_eq!(outcome.status, SearchStatus::TimedOut);
    assert!(!outcome.found);
    assert_eq!(outcome.statistics().decisions, 4);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "=====UNKNOWN=====\n%% =====TIME-OUT=====\n"
    );
}

#[test]
fn test_timeout_after_solution() {
    let mut model = pair();
    let table = VarTable::from_store(&model.store);
    let options = SolveOptions::new()
        .with_all_solutions(true)
        .with_timeout_ms(3);

    let mut out = Vec::new();
    let outcome = Solver::new(&mut model.store, &table, options)
        .with_clock(Arc::new(SteppingClock::new(Duration::from_millis(1))))
        .solve(&SearchSpec::satisfy(None), &mut out)
        .unwrap();

    assert_eq!(outcome.status, SearchStatus::TimedOut);
    assert!(outcome.found);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "x = 1;\ny = 1;\n----------\n%% =====TIME-OUT=====\n"
    );
}

#[test]
fn test_trivial_model_prints_statistics() {
    let mut store = Store::new();
    let x = store.new_int("x", 3, 3).unwrap();
    let table = VarTable::new().with_var("x", x).with_output(x);
    let options = SolveOptions::new().with_statistics(true);

    let (outcome, out) = solve(&mut store, &table, options, &SearchSpec::satisfy(None));
    assert_eq!(outcome.status, SearchStatus::Trivial);
    assert_eq!(
        out,
        "x = 3;\n----------\n\n\
         %% Model variables : 1\n%% Model constraints : 0\n\n\
         %% Search CPU time : 0ms\n%% Search nodes : 0\n\
         %% Search decisions : 0\n%% Wrong search decisions : 0\n\
         %% Search backtracks : 0\n%% Max search depth : 0\n\
         %% Number solutions : 1\n"
    );
}

#[test]
fn test_statistics_after_first_solution() {
    let mut model = pair();
    let table = VarTable::from_store(&model.store);
    let options = SolveOptions::new().with_statistics(true);

    let (outcome, out) = solve(&mut model.store, &table, options, &SearchSpec::satisfy(None));
    assert_eq!(outcome.report.model_variables, 2);
    assert_eq!(
        out,
        "x = 1;\ny = 1;\n----------\n\n\
         %% Model variables : 2\n%% Model constraints : 0\n\n\
         %% Search CPU time : 0ms\n%% Search nodes : 2\n\
         %% Search decisions : 2\n%% Wrong search decisions : 0\n\
         %% Search backtracks : 0\n%% Max search depth : 2\n\
         %% Number solutions : 1\n"
    );
}

#[test]
fn test_verbose_header_lists_default_search() {
    let mut store = Store::new();
    store.new_int("x", 1, 2).unwrap();
    store.new_bool("b");
    let table = VarTable::from_store(&store);
    let options = SolveOptions::new().with_verbose(true);

    let (_, out) = solve(&mut store, &table, options, &SearchSpec::satisfy(None));
    assert_eq!(
        out,
        "%% Model constraints defined.\n\
         %% Variables = 2, Bool variables = 1, Constraints = 0\n\
         %% satisfy\n\
         %% default int search variables = [x = 1..2]\n\
         %% default boolean search variables = [b = false..true]\n\
         %% default set search variables = []\n\
         x = 1;\nb = false;\n----------\n"
    );
}

#[test]
fn test_output_array() {
    let mut model = pair();
    let vars = vec![model.x, model.y];
    let table = VarTable::new()
        .with_array("q", vars.clone())
        .with_decisions(vars.iter().copied())
        .with_output_array("q", vars);

    let (_, out) = solve(&mut model.store, &table, SolveOptions::new(), &SearchSpec::satisfy(None));
    assert_eq!(out, "q = array1d(1..2, [1, 1]);\n----------\n");
}

#[test]
fn test_minimize_from_solve_item() {
    let mut model = sum_model();
    let table = VarTable::from_store(&model.store);
    let item = SolveItem::new(SolveGoal::Minimize(CostExpr::Ident("total".to_string())))
        .with_annotation(Annotation::new(
            "int_search",
            vec![
                AnnArg::idents(["a", "b"]),
                AnnArg::ident("input_order"),
                AnnArg::ident("indomain_max"),
                AnnArg::ident("complete"),
            ],
        ));

    let mut out = Vec::new();
    let outcome = Solver::new(&mut model.store, &table, SolveOptions::new())
        .retaining(true)
        .solve_item(&item, &mut out)
        .unwrap();

    assert_eq!(outcome.status, SearchStatus::Exhausted);
    let costs: Vec<i64> = outcome.solutions.iter().filter_map(|s| s.cost).collect();
    assert_eq!(costs, vec![6, 5, 4, 3, 2]);
    assert_eq!(outcome.best.and_then(|s| s.cost), Some(2));

    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.matches("----------").count(), 5);
    assert!(out.ends_with("a = 2;\nb = 0;\ntotal = 2;\n----------\n==========\n"));
}

#[test]
fn test_malformed_cost_aborts_before_output() {
    let mut model = pair();
    let table = VarTable::from_store(&model.store);
    let item = SolveItem::new(SolveGoal::Minimize(CostExpr::Ident("nope".to_string())));

    let mut out = Vec::new();
    let err = Solver::new(&mut model.store, &table, SolveOptions::new())
        .solve_item(&item, &mut out)
        .unwrap_err();
    assert!(matches!(err, SolveError::MalformedCost(_)));
    assert!(out.is_empty());
}

#[test]
fn test_solutions_stream_over_channel() {
    let mut model = pair();
    let table = VarTable::from_store(&model.store);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = Solver::new(&mut model.store, &table, SolveOptions::new().with_all_solutions(true))
        .with_sender(tx)
        .solve(&SearchSpec::satisfy(None), io::sink())
        .unwrap();
    assert!(outcome.solutions.is_empty());

    let mut numbers = Vec::new();
    while let Ok(solution) = rx.try_recv() {
        numbers.push(solution.number);
    }
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_output_error_is_reported() {
    let mut model = pair();
    let table = VarTable::from_store(&model.store);

    let err = Solver::new(&mut model.store, &table, SolveOptions::new())
        .solve(&SearchSpec::satisfy(None), ClosedPipe)
        .unwrap_err();
    assert!(matches!(err, SolveError::Io(_)));
}

#[test]
fn test_goal_line() {
    let model = pair();
    assert_eq!(goal_line(&SearchSpec::satisfy(None), &model.store), "satisfy");
    assert_eq!(
        goal_line(&SearchSpec::maximize(model.y, None), &model.store),
        "maximize(y) "
    );
    assert_eq!(
        goal_line(&SearchSpec::minimize(model.x, None), &model.store),
        "minimize(x) "
    );
}

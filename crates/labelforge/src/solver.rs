//! Entry points that hide the solver wiring.

use std::io::Write;
use std::path::Path;

use labelforge_config::SolveOptions;
use labelforge_core::Store;
use labelforge_search::{Result, Solution, SolveItem, SolveOutcome, Solver, VarTable};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Loads solve options from `path`, falling back to defaults when the file
/// is missing or malformed.
pub fn load_options(path: impl AsRef<Path>) -> SolveOptions {
    let path = path.as_ref();
    SolveOptions::load(path).unwrap_or_else(|e| {
        debug!(event = "options_default", path = %path.display(), reason = %e);
        SolveOptions::default()
    })
}

/// Solves `item` over `store`, writing the result protocol to `out`.
///
/// Verbose runs install the console logger when the `console` feature is
/// enabled. Errors are logged before being returned.
pub fn run<W: Write>(
    store: &mut Store,
    table: &VarTable,
    item: &SolveItem,
    options: SolveOptions,
    out: W,
) -> Result<SolveOutcome> {
    init_console(&options);
    Solver::new(store, table, options)
        .solve_item(item, out)
        .inspect_err(|e| error!("{}", e))
}

/// Like [`run`], but also streams every accepted solution.
///
/// The receiver holds every solution of the run once this returns.
pub fn run_streaming<W: Write>(
    store: &mut Store,
    table: &VarTable,
    item: &SolveItem,
    options: SolveOptions,
    out: W,
) -> (Result<SolveOutcome>, mpsc::UnboundedReceiver<Solution>) {
    init_console(&options);
    let (tx, rx) = mpsc::unbounded_channel();
    let outcome = Solver::new(store, table, options)
        .with_sender(tx)
        .solve_item(item, out)
        .inspect_err(|e| error!("{}", e));
    (outcome, rx)
}

#[cfg(feature = "console")]
fn init_console(options: &SolveOptions) {
    if options.verbose {
        labelforge_console::init();
    }
}

#[cfg(not(feature = "console"))]
fn init_console(_options: &SolveOptions) {}

#[cfg(test)]
mod tests {
    use super::*;
    use labelforge_search::{
        AnnArg, Annotation, CostExpr, SearchStatus, SolveError, SolveGoal,
    };
    use labelforge_test::{queens, sum_model, QueensModel};

    #[test]
    fn test_run_queens_all_solutions() {
        let QueensModel { mut store, queens } = queens(5);
        let table = VarTable::new()
            .with_array("q", queens.clone())
            .with_decisions(queens.iter().copied())
            .with_output_array("q", queens);
        let item = SolveItem::new(SolveGoal::Satisfy).with_annotation(Annotation::new(
            "int_search",
            vec![
                AnnArg::ident("q"),
                AnnArg::ident("first_fail"),
                AnnArg::ident("indomain_min"),
                AnnArg::ident("complete"),
            ],
        ));

        let mut out = Vec::new();
        let outcome = run(
            &mut store,
            &table,
            &item,
            SolveOptions::new().with_all_solutions(true),
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.statistics().solutions, 10);
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("q = array1d(1..5, [").count(), 10);
        assert!(out.ends_with("----------\n==========\n"));
    }

    #[test]
    fn test_run_streaming_maximize() {
        let mut model = sum_model();
        let table = VarTable::from_store(&model.store);
        let item = SolveItem::new(SolveGoal::Maximize(CostExpr::Ident("total".to_string())));

        let (outcome, mut rx) = run_streaming(
            &mut model.store,
            &table,
            &item,
            SolveOptions::new(),
            std::io::sink(),
        );
        let outcome = outcome.unwrap();
        assert_eq!(outcome.best.and_then(|s| s.cost), Some(6));

        let mut costs = Vec::new();
        while let Ok(solution) = rx.try_recv() {
            costs.push(solution.cost.unwrap());
        }
        assert_eq!(costs.last(), Some(&6));
        assert!(costs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_run_reports_unsupported_search() {
        let QueensModel { mut store, queens } = queens(4);
        let table = VarTable::new()
            .with_array("q", queens.clone())
            .with_decisions(queens);
        let item = SolveItem::new(SolveGoal::Satisfy).with_annotation(Annotation::new(
            "float_search",
            vec![AnnArg::ident("q")],
        ));

        let mut out = Vec::new();
        let err = run(&mut store, &table, &item, SolveOptions::new(), &mut out).unwrap_err();
        assert!(matches!(err, SolveError::UnsupportedSearchType(name) if name == "float_search"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_load_options_falls_back_to_default() {
        let options = load_options("does-not-exist.toml");
        assert_eq!(options, SolveOptions::default());
    }
}

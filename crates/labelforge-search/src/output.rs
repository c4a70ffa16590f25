//! Line-oriented result protocol.

use std::io::{self, Write};

use labelforge_core::{Store, VarId, VarKind};

use crate::directive::DirectiveKind;
use crate::listener::{Solution, SolutionReporter};
use crate::statistics::SolveReport;
use crate::table::{OutputItem, VarTable};

/// Printed after each solution's values.
pub const SOLUTION_SEPARATOR: &str = "----------";
/// The search space was exhausted after all requested solutions.
pub const SEARCH_COMPLETE: &str = "==========";
/// Complete search found no solution.
pub const UNSATISFIABLE: &str = "=====UNSATISFIABLE=====";
/// Incomplete search found no solution.
pub const UNKNOWN: &str = "=====UNKNOWN=====";
/// The deadline expired first.
pub const TIME_OUT: &str = "%% =====TIME-OUT=====";

/// Renders a variable the way the output section shows it: the value when
/// ground, the domain otherwise.
pub fn render_var(store: &Store, var: VarId) -> String {
    let kind = store.variable(var).map(|v| v.kind).ok();
    match (kind, store.value(var)) {
        (_, Some(value)) => value.to_string(),
        (Some(VarKind::Bool), None) => "false..true".to_string(),
        (_, None) => store
            .domain(var)
            .map(|d| d.to_string())
            .unwrap_or_else(|_| "?".to_string()),
    }
}

/// Writes protocol lines to `out`, resolving output names through `table`.
#[derive(Debug)]
pub struct ProtocolWriter<'t, W: Write> {
    out: W,
    table: &'t VarTable,
}

impl<'t, W: Write> ProtocolWriter<'t, W> {
    pub fn new(out: W, table: &'t VarTable) -> Self {
        Self { out, table }
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    /// Output variables, then output arrays, then the separator.
    pub fn assignment(&mut self, store: &Store) -> io::Result<()> {
        for item in self.table.outputs() {
            if let OutputItem::Var(var) = item {
                let name = store.variable(*var).map(|v| v.name.as_str()).unwrap_or("?");
                writeln!(self.out, "{} = {};", name, render_var(store, *var))?;
            }
        }
        for item in self.table.outputs() {
            if let OutputItem::Array { name, vars } = item {
                let values: Vec<String> = vars.iter().map(|&v| render_var(store, v)).collect();
                writeln!(
                    self.out,
                    "{} = array1d(1..{}, [{}]);",
                    name,
                    vars.len(),
                    values.join(", ")
                )?;
            }
        }
        self.line(SOLUTION_SEPARATOR)
    }

    pub fn report(&mut self, report: &SolveReport) -> io::Result<()> {
        writeln!(self.out, "{}", report)
    }

    /// Verbose model summary.
    pub fn model_header(&mut self, store: &Store, goal: &str) -> io::Result<()> {
        let bools = store
            .variables()
            .filter(|(_, v)| v.kind == VarKind::Bool)
            .count();
        writeln!(self.out, "%% Model constraints defined.")?;
        writeln!(
            self.out,
            "%% Variables = {}, Bool variables = {}, Constraints = {}",
            store.size(),
            bools,
            store.num_constraints()
        )?;
        writeln!(self.out, "%% {}", goal)
    }

    /// Verbose listing of the variables left to the default searches.
    pub fn default_search(
        &mut self,
        store: &Store,
        completion: &[(DirectiveKind, Vec<VarId>)],
    ) -> io::Result<()> {
        for (kind, label) in [
            (DirectiveKind::Int, "int"),
            (DirectiveKind::Bool, "boolean"),
            (DirectiveKind::Set, "set"),
        ] {
            let vars: Vec<String> = completion
                .iter()
                .filter(|(k, _)| *k == kind)
                .flat_map(|(_, vars)| vars.iter().copied())
                .map(|v| {
                    let name = store.variable(v).map(|var| var.name.as_str()).unwrap_or("?");
                    format!("{} = {}", name, render_var(store, v))
                })
                .collect();
            writeln!(
                self.out,
                "%% default {} search variables = [{}]",
                label,
                vars.join(", ")
            )?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SolutionReporter for ProtocolWriter<'_, W> {
    fn report(&mut self, store: &Store, _solution: &Solution) -> io::Result<()> {
        self.assignment(store)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(writer: ProtocolWriter<'_, Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_assignment_rendering() {
        let mut store = Store::new();
        let x = store.new_int("x", 1, 3).unwrap();
        let b = store.new_bool("b");
        let f = store.new_bool("f");
        let s = store.new_set("s", [1], [1, 4]).unwrap();
        let q = vec![
            store.new_int("q1", 2, 2).unwrap(),
            store.new_int("q2", 5, 5).unwrap(),
        ];
        store.assign(x, 2).unwrap();
        store.assign(b, 1).unwrap();
        store.include(s, 4).unwrap();

        let table = VarTable::new()
            .with_output(x)
            .with_output_array("q", q)
            .with_output(b)
            .with_output(f)
            .with_output(s);
        let mut writer = ProtocolWriter::new(Vec::new(), &table);
        writer.assignment(&store).unwrap();

        assert_eq!(
            text(writer),
            "x = 2;\nb = true;\nf = false..true;\ns = {1, 4};\nq = array1d(1..2, [2, 5]);\n----------\n"
        );
    }

    #[test]
    fn test_unassigned_int_shows_domain() {
        let mut store = Store::new();
        let x = store.new_int_values("x", [1, 2, 5]).unwrap();
        assert_eq!(render_var(&store, x), "{1..2, 5}");
    }

    #[test]
    fn test_model_header() {
        let mut store = Store::new();
        store.new_int("x", 0, 1).unwrap();
        store.new_bool("b");
        let table = VarTable::new();
        let mut writer = ProtocolWriter::new(Vec::new(), &table);
        writer.model_header(&store, "minimize(x) ").unwrap();
        assert_eq!(
            text(writer),
            "%% Model constraints defined.\n%% Variables = 2, Bool variables = 1, Constraints = 0\n%% minimize(x) \n"
        );
    }
}

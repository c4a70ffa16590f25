//! Colored console output for search runs.
//!
//! Provides a `tracing` layer that formats `labelforge_search` events. The
//! result protocol owns stdout, so everything here goes to stderr.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (solve start/end, tree built)
//! - **DEBUG**: Every accepted solution and incumbent
//! - **TRACE**: Individual decisions and pruned branches

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static SOLVE_START_NANOS: AtomicU64 = AtomicU64::new(0);

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "labelforge_search=info";

/// Initializes console logging.
///
/// Safe to call multiple times - only the first call has effect. `RUST_LOG`
/// overrides [`DEFAULT_FILTER`].
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(SearchConsoleLayer)
            .try_init();
    });
}

fn mark_solve_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    SOLVE_START_NANOS.store(nanos, Ordering::Relaxed);
}

fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = SOLVE_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(
        stderr,
        "{} {}",
        "LabelForge".bright_cyan().bold(),
        format!("v{} - depth-first labeling", VERSION).bright_white()
    );
    let _ = stderr.flush();
}

/// A tracing layer that formats search events with colors.
pub struct SearchConsoleLayer;

impl<S: Subscriber> Layer<S> for SearchConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();

        if !target.starts_with("labelforge_search")
            && target != "labelforge"
            && !target.starts_with("labelforge::")
        {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stderr(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    message: Option<String>,
    goal: Option<String>,
    status: Option<String>,
    cost: Option<String>,
    choice: Option<String>,
    variables: Option<u64>,
    constraints: Option<u64>,
    nodes: Option<u64>,
    solutions: Option<u64>,
    number: Option<u64>,
    time_ms: Option<u64>,
    bound: Option<i64>,
    all_solutions: Option<bool>,
    complete: Option<bool>,
    consistent: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        let s = s.trim_matches('"').to_string();
        match field.name() {
            "event" => self.event = Some(s),
            "message" => self.message = Some(s),
            "goal" => self.goal = Some(s),
            "status" => self.status = Some(s),
            "cost" => self.cost = Some(s),
            "choice" => self.choice = Some(s),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "variables" => self.variables = Some(value),
            "constraints" => self.constraints = Some(value),
            "nodes" => self.nodes = Some(value),
            "solutions" => self.solutions = Some(value),
            "number" => self.number = Some(value),
            "time_ms" => self.time_ms = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        match field.name() {
            "bound" => self.bound = Some(value),
            _ => self.record_u64(field, value as u64),
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            "all_solutions" => self.all_solutions = Some(value),
            "complete" => self.complete = Some(value),
            "consistent" => self.consistent = Some(value),
            _ => {}
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "message" => self.message = Some(value.to_string()),
            "goal" => self.goal = Some(value.to_string()),
            "status" => self.status = Some(value.to_string()),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    match v.event.as_deref().unwrap_or("") {
        "solve_start" => format_solve_start(v),
        "tree_built" => format_tree_built(v),
        "trivial_model" => format!(
            "{} {} Nothing to label",
            format_elapsed(),
            "◆".bright_blue()
        ),
        "solution" => format_solution(v),
        "incumbent" => format!(
            "{} {} Bound tightened below {}",
            format_elapsed(),
            "↓".bright_blue(),
            v.bound.unwrap_or(0).to_string().bright_yellow()
        ),
        "decision" => format_decision(v, level),
        "solve_end" => format_solve_end(v),
        _ if level == Level::ERROR => format!(
            "{} {} {}",
            format_elapsed(),
            "✗".bright_red().bold(),
            v.message.as_deref().unwrap_or("error").bright_red()
        ),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn count(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

fn format_solve_start(v: &EventVisitor) -> String {
    mark_solve_start();
    let mut output = format!(
        "{} {} Solving │ {} variables │ {} constraints │ {}",
        format_elapsed(),
        "▶".bright_green().bold(),
        count(v.variables.unwrap_or(0)).bright_yellow(),
        count(v.constraints.unwrap_or(0)).bright_yellow(),
        v.goal.as_deref().unwrap_or("Satisfy").white().bold()
    );
    if v.all_solutions == Some(true) {
        output.push_str(&format!(" │ {}", "all solutions".bright_magenta()));
    }
    output
}

fn format_tree_built(v: &EventVisitor) -> String {
    let exploration = if v.complete.unwrap_or(true) {
        "complete".bright_green().to_string()
    } else {
        "heuristic".yellow().to_string()
    };
    format!(
        "{} {} Search tree │ {} nodes │ {} variables │ {}",
        format_elapsed(),
        "◆".bright_blue(),
        count(v.nodes.unwrap_or(0)).white(),
        count(v.variables.unwrap_or(0)).white(),
        exploration
    )
}

fn format_solution(v: &EventVisitor) -> String {
    let mut output = format!(
        "{} {} Solution {:>8}",
        format_elapsed(),
        "⚡".bright_cyan(),
        count(v.number.unwrap_or(0)).white()
    );
    if let Some(cost) = v.cost.as_deref().and_then(unwrap_some) {
        output.push_str(&format!(" │ cost {}", cost.bright_magenta().bold()));
    }
    output
}

fn format_decision(v: &EventVisitor, level: Level) -> String {
    if level != Level::TRACE {
        return String::new();
    }
    let icon = if v.consistent.unwrap_or(false) {
        "✓".bright_green().to_string()
    } else {
        "✗".bright_red().to_string()
    };
    format!(
        "{} {} {}",
        format_elapsed(),
        icon,
        v.choice.as_deref().unwrap_or("?").bright_black()
    )
}

fn format_solve_end(v: &EventVisitor) -> String {
    let status = v.status.as_deref().unwrap_or("Unknown");
    let status = match status {
        "Satisfied" | "Exhausted" | "Trivial" => status.bright_green().bold().to_string(),
        "Unsatisfiable" => status.bright_red().bold().to_string(),
        _ => status.yellow().bold().to_string(),
    };
    format!(
        "{} {} Search ended │ {} │ {} solutions │ {} nodes │ {}",
        format_elapsed(),
        "■".bright_cyan().bold(),
        status,
        count(v.solutions.unwrap_or(0)).bright_yellow(),
        count(v.nodes.unwrap_or(0)).white(),
        format_duration_ms(v.time_ms.unwrap_or(0)).yellow()
    )
}

// "Some(5)" -> "5"; "None" -> nothing.
fn unwrap_some(s: &str) -> Option<&str> {
    s.strip_prefix("Some(")?.strip_suffix(')')
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_format() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_unwrap_some() {
        assert_eq!(unwrap_some("Some(-4)"), Some("-4"));
        assert_eq!(unwrap_some("None"), None);
    }

    #[test]
    fn test_solve_end_line() {
        let v = EventVisitor {
            event: Some("solve_end".to_string()),
            status: Some("Exhausted".to_string()),
            solutions: Some(12_345),
            nodes: Some(7),
            time_ms: Some(42),
            ..EventVisitor::default()
        };
        let line = format_event(&v, Level::INFO);
        assert!(line.contains("Search ended"));
        assert!(line.contains("Exhausted"));
        assert!(line.contains("12,345"));
        assert!(line.contains("42ms"));
    }

    #[test]
    fn test_solution_line_shows_cost() {
        let v = EventVisitor {
            event: Some("solution".to_string()),
            number: Some(3),
            cost: Some("Some(17)".to_string()),
            ..EventVisitor::default()
        };
        let line = format_event(&v, Level::DEBUG);
        assert!(line.contains("Solution"));
        assert!(line.contains("17"));

        let satisfy = EventVisitor {
            cost: Some("None".to_string()),
            ..v
        };
        assert!(!format_event(&satisfy, Level::DEBUG).contains("cost"));
    }

    #[test]
    fn test_decisions_only_at_trace() {
        let v = EventVisitor {
            event: Some("decision".to_string()),
            choice: Some("x = 1".to_string()),
            consistent: Some(true),
            ..EventVisitor::default()
        };
        assert!(format_event(&v, Level::DEBUG).is_empty());
        assert!(format_event(&v, Level::TRACE).contains("x = 1"));
    }

    #[test]
    fn test_unknown_event_is_silent() {
        let v = EventVisitor {
            event: Some("search_start".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_event(&v, Level::INFO).is_empty());
    }
}

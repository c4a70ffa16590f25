//! Solve options for LabelForge.
//!
//! The flag surface a solve run consumes: all solutions, statistics,
//! solution-count limit, timeout and verbosity. Flags usually arrive already
//! parsed from a command line, but can also be loaded from TOML or YAML.
//!
//! # Examples
//!
//! ```
//! use labelforge_config::SolveOptions;
//! use std::time::Duration;
//!
//! let options = SolveOptions::from_toml_str(r#"
//!     all_solutions = true
//!     solution_limit = 5
//!     timeout_ms = 1500
//! "#).unwrap();
//!
//! assert_eq!(options.solution_limit(), Some(5));
//! assert_eq!(options.time_limit(), Some(Duration::from_millis(1500)));
//! ```
//!
//! Use defaults when the file is missing:
//!
//! ```
//! use labelforge_config::SolveOptions;
//!
//! let options = SolveOptions::load("solve.toml").unwrap_or_default();
//! assert!(!options.all_solutions);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Options for one solve invocation.
///
/// Non-positive `solution_limit` and `timeout_ms` mean "unbounded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SolveOptions {
    /// Report every solution instead of stopping at the first.
    pub all_solutions: bool,

    /// Print the `%%` statistics block after the run.
    pub statistics: bool,

    /// Stop after this many solutions (≤ 0 = unbounded).
    pub solution_limit: i64,

    /// Wall-clock budget in milliseconds (≤ 0 = none).
    pub timeout_ms: i64,

    /// Verbose model and search logging.
    pub verbose: bool,

    /// Seed for randomized value orders.
    pub random_seed: Option<u64>,
}

impl SolveOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn with_all_solutions(mut self, all: bool) -> Self {
        self.all_solutions = all;
        self
    }

    pub fn with_statistics(mut self, statistics: bool) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_solution_limit(mut self, limit: i64) -> Self {
        self.solution_limit = limit;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Solution-count limit, if one is configured.
    pub fn solution_limit(&self) -> Option<u64> {
        u64::try_from(self.solution_limit).ok().filter(|&n| n > 0)
    }

    /// Timeout as a Duration, if one is configured.
    ///
    /// # Examples
    ///
    /// ```
    /// use labelforge_config::SolveOptions;
    ///
    /// assert_eq!(SolveOptions::new().with_timeout_ms(-1).time_limit(), None);
    /// ```
    pub fn time_limit(&self) -> Option<Duration> {
        u64::try_from(self.timeout_ms)
            .ok()
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }
}

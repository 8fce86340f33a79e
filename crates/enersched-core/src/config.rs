//! Solver configuration and result types.
//!
//! Every solver consumes a [`SolverConfig`] and produces a [`SolverResult`].
//! Per-solver options travel in a [`SpecializedConfig`], a nested
//! `solver-key -> option-key -> string` store; booleans and integers are
//! string-encoded ("0"/"1", decimal) so the whole store round-trips through
//! JSON untouched.

use crate::{ObjectiveKind, StartTimes};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

// ============================================================================
// Status & result
// ============================================================================

/// Outcome class of a solver run. The numeric codes are stable and appear in
/// result files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverStatus {
    /// No feasible schedule was found (heuristics may still have missed one)
    NoSolution,
    /// A feasible schedule that is provably optimal
    Optimal,
    /// Proof that no robust schedule exists
    Infeasible,
    /// A feasible schedule without an optimality proof
    Feasible,
}

impl SolverStatus {
    pub fn code(self) -> u8 {
        match self {
            SolverStatus::NoSolution => 0,
            SolverStatus::Optimal => 1,
            SolverStatus::Infeasible => 2,
            SolverStatus::Feasible => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SolverStatus::NoSolution),
            1 => Some(SolverStatus::Optimal),
            2 => Some(SolverStatus::Infeasible),
            3 => Some(SolverStatus::Feasible),
            _ => None,
        }
    }

    /// Whether the result carries usable start times.
    pub fn has_solution(self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Feasible)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStatus::NoSolution => write!(f, "no solution"),
            SolverStatus::Optimal => write!(f, "optimal"),
            SolverStatus::Infeasible => write!(f, "infeasible"),
            SolverStatus::Feasible => write!(f, "feasible"),
        }
    }
}

/// Outcome of a solver run: status, schedule, objective, runtime and
/// free-form diagnostics.
#[derive(Clone, Debug)]
pub struct SolverResult {
    pub status: SolverStatus,
    pub start_times: StartTimes,
    pub objective_value: f64,
    pub runtime: Duration,
    pub optional: BTreeMap<String, String>,
}

impl SolverResult {
    /// Fresh NO_SOLUTION result with the given incumbent objective value
    /// (typically the objective's worst value, or a warm start's value).
    pub fn no_solution(num_operations: usize, objective_value: f64) -> Self {
        Self {
            status: SolverStatus::NoSolution,
            start_times: StartTimes::zeroed(num_operations),
            objective_value,
            runtime: Duration::ZERO,
            optional: BTreeMap::new(),
        }
    }

    /// Replace the carried solution.
    pub fn set_solution(&mut self, status: SolverStatus, start_times: &StartTimes, objective_value: f64) {
        self.status = status;
        self.start_times = start_times.clone();
        self.objective_value = objective_value;
    }

    pub fn set_optional(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.optional.insert(key.into(), value.into());
    }
}

// ============================================================================
// Specialized configuration
// ============================================================================

/// Nested per-solver option store, `solver-key -> option-key -> string`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecializedConfig {
    options: BTreeMap<String, BTreeMap<String, String>>,
}

impl SpecializedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_str(&mut self, solver_key: &str, key: &str, value: impl Into<String>) {
        self.options
            .entry(solver_key.to_owned())
            .or_default()
            .insert(key.to_owned(), value.into());
    }

    pub fn set_bool(&mut self, solver_key: &str, key: &str, value: bool) {
        self.set_str(solver_key, key, if value { "1" } else { "0" });
    }

    pub fn set_int(&mut self, solver_key: &str, key: &str, value: i64) {
        self.set_str(solver_key, key, value.to_string());
    }

    pub fn get_str(&self, solver_key: &str, key: &str) -> Option<&str> {
        self.options
            .get(solver_key)
            .and_then(|options| options.get(key))
            .map(String::as_str)
    }

    /// Any value other than "0" reads as true.
    pub fn get_bool(&self, solver_key: &str, key: &str) -> Option<bool> {
        self.get_str(solver_key, key).map(|value| value != "0")
    }

    pub fn get_int(&self, solver_key: &str, key: &str) -> Option<i64> {
        self.get_str(solver_key, key)
            .and_then(|value| value.parse().ok())
    }

    pub fn str_or<'a>(&'a self, solver_key: &str, key: &str, default: &'a str) -> &'a str {
        self.get_str(solver_key, key).unwrap_or(default)
    }

    pub fn bool_or(&self, solver_key: &str, key: &str, default: bool) -> bool {
        self.get_bool(solver_key, key).unwrap_or(default)
    }

    pub fn int_or(&self, solver_key: &str, key: &str, default: i64) -> i64 {
        self.get_int(solver_key, key).unwrap_or(default)
    }

    pub fn solver_options(&self, solver_key: &str) -> Option<&BTreeMap<String, String>> {
        self.options.get(solver_key)
    }
}

// ============================================================================
// Solver configuration
// ============================================================================

/// Everything a solver run needs besides the instance itself.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Wall-clock budget for the run
    pub time_limit: Duration,
    pub objective: ObjectiveKind,
    /// Whether `init_start_times` should seed the search
    pub use_init_start_times: bool,
    pub init_start_times: StartTimes,
    pub specialized: SpecializedConfig,
}

impl SolverConfig {
    pub fn new(time_limit: Duration, objective: ObjectiveKind) -> Self {
        Self {
            time_limit,
            objective,
            use_init_start_times: false,
            init_start_times: StartTimes::default(),
            specialized: SpecializedConfig::new(),
        }
    }

    pub fn with_specialized(mut self, specialized: SpecializedConfig) -> Self {
        self.specialized = specialized;
        self
    }

    pub fn with_warm_start(mut self, start_times: StartTimes) -> Self {
        self.use_init_start_times = true;
        self.init_start_times = start_times;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_codes_are_stable() {
        for status in [
            SolverStatus::NoSolution,
            SolverStatus::Optimal,
            SolverStatus::Infeasible,
            SolverStatus::Feasible,
        ] {
            assert_eq!(SolverStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(SolverStatus::NoSolution.code(), 0);
        assert_eq!(SolverStatus::Optimal.code(), 1);
        assert_eq!(SolverStatus::Infeasible.code(), 2);
        assert_eq!(SolverStatus::Feasible.code(), 3);
        assert_eq!(SolverStatus::from_code(4), None);
    }

    #[test]
    fn specialized_config_typed_getters() {
        let mut scfg = SpecializedConfig::new();
        scfg.set_str("TabuSearch", "rule", "due_dates");
        scfg.set_bool("TabuSearch", "ascending", false);
        scfg.set_int("TabuSearch", "numIterations", 250);

        assert_eq!(scfg.get_str("TabuSearch", "rule"), Some("due_dates"));
        assert_eq!(scfg.get_bool("TabuSearch", "ascending"), Some(false));
        assert_eq!(scfg.get_int("TabuSearch", "numIterations"), Some(250));

        // Defaults when the solver or key is absent.
        assert_eq!(scfg.int_or("TabuSearch", "numRestarts", 5), 5);
        assert_eq!(scfg.str_or("GreedyHeuristics", "rule", "tardiness"), "tardiness");
        assert!(scfg.bool_or("GreedyHeuristics", "ascending", true));
    }

    #[test]
    fn bool_encoding_matches_store_format() {
        let mut scfg = SpecializedConfig::new();
        scfg.set_bool("S", "flag", true);
        assert_eq!(scfg.get_str("S", "flag"), Some("1"));
        scfg.set_bool("S", "flag", false);
        assert_eq!(scfg.get_str("S", "flag"), Some("0"));
    }
}

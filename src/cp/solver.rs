//! Solver interface and solution types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::model::{BoolVar, CpModel, IntVar};

/// Outcome classification of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// A solution was found and proven optimal.
    Optimal,
    /// A solution was found, but the time budget ran out before optimality
    /// was proven.
    Feasible,
    /// The model was proven to have no solution.
    Infeasible,
    /// The time budget ran out before any solution was found.
    Unknown,
    /// The model could not be handed to the backend (bad domains, numerical
    /// failure).
    ModelInvalid,
}

impl SolverStatus {
    /// Whether a value assignment accompanies this status.
    pub fn has_solution(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }

    pub fn is_optimal(self) -> bool {
        self == Self::Optimal
    }
}

/// Parameters for a single solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock budget. `None` runs the search to completion.
    pub time_limit: Option<Duration>,
}

impl SolverConfig {
    /// Creates a configuration without a time budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Sets the budget in (fractional) seconds; `None` removes it.
    pub fn with_time_limit_secs(mut self, secs: Option<f64>) -> Self {
        self.time_limit = secs
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64);
        self
    }
}

/// Result of a solve call.
#[derive(Debug, Clone)]
pub struct CpSolution {
    pub status: SolverStatus,
    /// Objective value of the returned assignment.
    pub objective: Option<i64>,
    /// One value per model variable, in creation order. Empty without a solution.
    pub values: Vec<i64>,
    /// Search nodes explored.
    pub nodes: u64,
    pub elapsed: Duration,
}

impl CpSolution {
    /// A solution carrying no assignment.
    pub fn without_values(status: SolverStatus, nodes: u64, elapsed: Duration) -> Self {
        Self {
            status,
            objective: None,
            values: Vec::new(),
            nodes,
            elapsed,
        }
    }

    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution()
    }

    /// Value assigned to an integer variable.
    pub fn value(&self, var: impl Into<IntVar>) -> Option<i64> {
        self.values.get(var.into().index()).copied()
    }

    /// Value assigned to a boolean variable.
    pub fn bool_value(&self, lit: BoolVar) -> Option<bool> {
        self.value(lit).map(|v| v != 0)
    }
}

/// A backend able to solve a [`CpModel`].
///
/// Implementations must treat each call independently: no state may leak
/// from one solve to the next, so separate threads can solve separate models
/// concurrently.
pub trait CpSolver {
    /// Minimizes the model objective within `config.time_limit`.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_has_solution() {
        assert!(SolverStatus::Optimal.has_solution());
        assert!(SolverStatus::Feasible.has_solution());
        assert!(!SolverStatus::Infeasible.has_solution());
        assert!(!SolverStatus::Unknown.has_solution());
        assert!(!SolverStatus::ModelInvalid.has_solution());
    }

    #[test]
    fn test_time_limit_secs() {
        let config = SolverConfig::new().with_time_limit_secs(Some(1.5));
        assert_eq!(config.time_limit, Some(Duration::from_millis(1500)));

        let config = SolverConfig::new().with_time_limit_secs(Some(f64::NAN));
        assert_eq!(config.time_limit, None);

        let config = SolverConfig::new().with_time_limit_secs(None);
        assert_eq!(config.time_limit, None);
    }

    #[test]
    fn test_value_lookup() {
        let mut model = CpModel::new("t");
        let x = model.new_int_var(0, 9, "x");
        let b = model.new_bool_var("b");
        let solution = CpSolution {
            status: SolverStatus::Optimal,
            objective: Some(0),
            values: vec![7, 1],
            nodes: 1,
            elapsed: Duration::ZERO,
        };
        assert_eq!(solution.value(x), Some(7));
        assert_eq!(solution.bool_value(b), Some(true));

        let empty = CpSolution::without_values(SolverStatus::Infeasible, 0, Duration::ZERO);
        assert_eq!(empty.value(x), None);
        assert!(!empty.is_solution_found());
    }
}

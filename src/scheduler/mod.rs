//! Shop scheduling pipeline.
//!
//! Builds the constraint model, optionally seeds it with a greedy
//! schedule, solves it and extracts the timetable.
//!
//! # Algorithm
//!
//! `ShopScheduler` runs build → hint → solve → extract. The formulation
//! lives in [`builder`](ShopModelBuilder), the read-back in
//! [`extract_solution`]. `GreedyScheduler` is a cap-aware, cost-aware list
//! heuristic; it is not optimal, but gives the exact solver an incumbent to
//! prune with.
//!
//! # KPI
//!
//! `ShopKpi` computes makespan, overtime, idle, cost and utilization.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4, 7
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod builder;
mod extract;
mod greedy;
mod kpi;

pub use builder::{
    add_schedule_hint, build_model, ShopModelBuilder, VariableIndex, DEFAULT_COST_SCALE,
};
pub use extract::{extract_solution, SolveOutcome};
pub use greedy::GreedyScheduler;
pub use kpi::ShopKpi;

use tracing::{debug, info, warn};

use crate::config::SolveConfig;
use crate::cp::{CpSolver, MilpSolver};
use crate::error::Result;
use crate::models::ShopProblem;

/// End-to-end shop scheduler over a pluggable solver backend.
///
/// Each call to [`solve`](Self::solve) builds its own model, so one
/// scheduler can serve concurrent solves when the backend is `Sync`.
///
/// # Example
///
/// ```
/// use shop_schedule::models::{Car, ShopProblem, Station};
/// use shop_schedule::scheduler::ShopScheduler;
///
/// let problem = ShopProblem::new()
///     .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
///     .with_car(Car::new(1).with_job(1, 500))
///     .with_eligible(1, 1);
///
/// let outcome = ShopScheduler::new().solve(&problem).unwrap();
/// assert_eq!(outcome.station_stats[&1].overtime, 20);
/// assert!((outcome.total_cost - 40.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct ShopScheduler<S = MilpSolver> {
    solver: S,
    config: SolveConfig,
}

impl ShopScheduler<MilpSolver> {
    /// Creates a scheduler with the bundled MILP backend and default config.
    pub fn new() -> Self {
        Self::with_solver(MilpSolver::new())
    }
}

impl Default for ShopScheduler<MilpSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CpSolver> ShopScheduler<S> {
    /// Creates a scheduler over a custom backend.
    pub fn with_solver(solver: S) -> Self {
        Self {
            solver,
            config: SolveConfig::default(),
        }
    }

    /// Sets the solve configuration.
    pub fn with_config(mut self, config: SolveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SolveConfig {
        &self.config
    }

    /// Solves a problem.
    ///
    /// # Errors
    /// [`Config`](crate::ScheduleError::Config) for an invalid configuration,
    /// [`NoFeasibleSolution`](crate::ScheduleError::NoFeasibleSolution) when the
    /// solver finds no assignment (infeasible, out of time, or rejected model).
    pub fn solve(&self, problem: &ShopProblem) -> Result<SolveOutcome> {
        self.config.validate()?;

        let unassignable = problem.unassignable_jobs();
        if !unassignable.is_empty() {
            warn!(?unassignable, "jobs without an eligible station; model is infeasible");
        }

        let (mut model, index) = build_model(problem, self.config.cost_scale);
        info!(
            cars = problem.cars.len(),
            stations = problem.stations.len(),
            jobs = index.durations.len(),
            variables = model.variable_count(),
            constraints = model.constraint_count(),
            "model built"
        );

        if self.config.greedy_hint {
            match GreedyScheduler::new().schedule(problem) {
                Some(schedule) => {
                    let accepted = add_schedule_hint(&mut model, &index, problem, &schedule);
                    debug!(accepted, makespan = schedule.makespan(), "greedy hint");
                }
                None => debug!("greedy hint unavailable"),
            }
        }

        let solution = self.solver.solve(&model, &self.config.solver_config());
        info!(
            status = ?solution.status,
            objective = solution.objective,
            nodes = solution.nodes,
            elapsed_ms = solution.elapsed.as_millis() as u64,
            "solve finished"
        );

        let outcome = extract_solution(&solution, &index)?;
        info!(
            total_cost = outcome.total_cost,
            rows = outcome.schedule.len(),
            "schedule extracted"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{CpModel, CpSolution, SolverConfig, SolverStatus};
    use crate::error::ScheduleError;
    use crate::models::{Car, Station};
    use std::time::Duration;

    fn config() -> SolveConfig {
        SolveConfig::default().with_time_limit_secs(Some(20.0))
    }

    #[test]
    fn test_single_long_job() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
            .with_car(Car::new(1).with_job(1, 500))
            .with_eligible(1, 1);

        let outcome = ShopScheduler::new().with_config(config()).solve(&problem).unwrap();
        assert_eq!(outcome.status, SolverStatus::Optimal);
        let row = outcome.schedule.jobs[0];
        assert_eq!((row.start, row.finish), (0, 500));
        assert_eq!(outcome.station_stats[&1].overtime, 20);
        assert_eq!(outcome.station_stats[&1].idle, 0);
        assert!((outcome.total_cost - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_cars_serialize() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480).with_weights(3.0, 1.0))
            .with_car(Car::new(1).with_job(1, 300))
            .with_car(Car::new(2).with_job(1, 300))
            .with_eligible(1, 1);

        let outcome = ShopScheduler::new().with_config(config()).solve(&problem).unwrap();
        let stats = outcome.station_stats[&1];
        assert_eq!(stats.overtime, 120);
        assert_eq!(stats.idle, 0);
        assert!((stats.cost - 360.0).abs() < 1e-9);
        let rows = &outcome.schedule.jobs;
        assert!(!rows[0].overlaps(&rows[1]));
    }

    #[test]
    fn test_without_hint() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
            .with_car(Car::new(1).with_job(1, 500))
            .with_eligible(1, 1);

        let outcome = ShopScheduler::new()
            .with_config(config().with_greedy_hint(false))
            .solve(&problem)
            .unwrap();
        assert!((outcome.total_cost - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_cap_too_small_is_infeasible() {
        let problem = ShopProblem::new()
            .with_station(
                Station::new(1, 480)
                    .with_weights(2.0, 1.0)
                    .with_overtime_cap(10),
            )
            .with_car(Car::new(1).with_job(1, 500))
            .with_eligible(1, 1);

        let err = ShopScheduler::new().with_config(config()).solve(&problem).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::NoFeasibleSolution {
                status: SolverStatus::Infeasible
            }
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let problem = ShopProblem::new();
        let err = ShopScheduler::new()
            .with_config(SolveConfig::default().with_cost_scale(0))
            .solve(&problem)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Config { .. }));
    }

    struct GiveUp;

    impl CpSolver for GiveUp {
        fn solve(&self, _model: &CpModel, _config: &SolverConfig) -> CpSolution {
            CpSolution::without_values(SolverStatus::Unknown, 0, Duration::ZERO)
        }
    }

    #[test]
    fn test_custom_backend_without_solution() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480))
            .with_car(Car::new(1).with_job(1, 30))
            .with_eligible(1, 1);

        let err = ShopScheduler::with_solver(GiveUp).solve(&problem).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::NoFeasibleSolution {
                status: SolverStatus::Unknown
            }
        ));
    }
}

//! Solution extraction.
//!
//! Reads a solver assignment back into schedule rows and per-station
//! statistics. Costs are reported in unscaled currency units:
//! `cost[r] = (T'[r]·ov[r] + I'[r]·idle[r]) / scale`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::builder::VariableIndex;
use crate::cp::{CpSolution, IntVar, SolverStatus};
use crate::error::{Result, ScheduleError};
use crate::models::{Schedule, ScheduledJob, StationId, StationStats};

/// A solved (or best-effort) schedule with its cost breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveOutcome {
    /// `Optimal` or `Feasible`.
    pub status: SolverStatus,
    /// One row per true presence literal, sorted by station, start, car, job.
    pub schedule: Schedule,
    pub station_stats: BTreeMap<StationId, StationStats>,
    /// Sum of station costs.
    pub total_cost: f64,
}

impl SolveOutcome {
    /// Whether optimality was proven.
    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    pub fn total_overtime(&self) -> i64 {
        self.station_stats.values().map(|s| s.overtime).sum()
    }

    pub fn total_idle(&self) -> i64 {
        self.station_stats.values().map(|s| s.idle).sum()
    }
}

/// Builds the schedule and station statistics from a solver result.
///
/// # Errors
/// [`ScheduleError::NoFeasibleSolution`] when the status carries no
/// assignment; [`ScheduleError::Solver`] when the assignment lacks a value
/// the index refers to.
pub fn extract_solution(solution: &CpSolution, index: &VariableIndex) -> Result<SolveOutcome> {
    if !solution.is_solution_found() {
        return Err(ScheduleError::NoFeasibleSolution {
            status: solution.status,
        });
    }
    let value = |var: IntVar| {
        solution
            .value(var)
            .ok_or_else(|| ScheduleError::Solver(format!("no value for variable #{}", var.index())))
    };

    let mut schedule = Schedule::new();
    for (&(car, job, station), &lit) in &index.presence {
        if value(lit.as_int())? == 0 {
            continue;
        }
        let (start, finish) = match (index.start.get(&(car, job)), index.finish.get(&(car, job))) {
            (Some(&s), Some(&f)) => (value(s)?, value(f)?),
            _ => {
                return Err(ScheduleError::Solver(format!(
                    "car {car} job {job} has no time variables"
                )))
            }
        };
        schedule.add_job(ScheduledJob::new(station, car, job, start, finish));
    }
    schedule.sort();

    let scale = index.cost_scale.max(1);
    let mut station_stats = BTreeMap::new();
    let mut total_scaled = 0;
    for (&station, &ov_var) in &index.overtime {
        let overtime = value(ov_var)?;
        let idle = match index.idle.get(&station) {
            Some(&var) => value(var)?,
            None => 0,
        };
        let t = index.tardiness_scaled.get(&station).copied().unwrap_or(0);
        let i = index.idle_scaled.get(&station).copied().unwrap_or(0);
        let scaled = t * overtime + i * idle;
        total_scaled += scaled;
        station_stats.insert(
            station,
            StationStats {
                overtime,
                idle,
                cost: scaled as f64 / scale as f64,
            },
        );
    }

    Ok(SolveOutcome {
        status: solution.status,
        schedule,
        station_stats,
        total_cost: total_scaled as f64 / scale as f64,
    })
}

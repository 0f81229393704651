//! JSON request/response facade.
//!
//! Turns a payload into a user-facing response: a full schedule with its
//! cost breakdown, or an error message with no partial data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SolveConfig;
use crate::cp::SolverStatus;
use crate::error::{Result, ScheduleError};
use crate::input::ScheduleData;
use crate::models::{ScheduledJob, StationId, StationStats};
use crate::report::ScheduleReport;
use crate::scheduler::{ShopKpi, ShopScheduler};

/// Shown when the solver returns no assignment.
pub const NO_FEASIBLE_SOLUTION: &str = "No feasible solution found for the given data. \
     Try reducing durations, adding shift length, overtime caps or eligibilities.";

/// Shown alongside a schedule whose optimality was not proven.
pub const NEAR_OPTIMAL_WARNING: &str = "Returned solution is (near-)optimal: the solver time \
     budget ran out before optimality was proven. Try reducing the problem size (fewer repairs \
     or shorter durations), increasing station hours, or raising the time limit.";

/// Response to a solve request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SolveResponse {
    Solved(Box<SolvedResponse>),
    Failed(FailedResponse),
}

/// A schedule with statistics and report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedResponse {
    pub status: SolverStatus,
    pub total_cost: f64,
    /// Sorted by station, start, car, job.
    pub schedule: Vec<ScheduledJob>,
    pub stats: BTreeMap<StationId, StationStats>,
    pub kpi: ShopKpi,
    pub report: ScheduleReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// A failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedResponse {
    pub error: String,
    /// Individual problems, for invalid input.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    /// Solver status, when the solver ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SolverStatus>,
}

impl SolveResponse {
    fn failed(error: impl Into<String>) -> Self {
        Self::Failed(FailedResponse {
            error: error.into(),
            details: Vec::new(),
            status: None,
        })
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved(_))
    }

    /// Whether the solver ran and returned no assignment.
    pub fn is_no_solution(&self) -> bool {
        matches!(self, Self::Failed(f) if f.status.is_some())
    }
}

/// Validates, solves and reports one payload.
pub fn run_job(data: ScheduleData, config: &SolveConfig) -> SolveResponse {
    let problem = match data.into_problem() {
        Ok(problem) => problem,
        Err(err) => return error_response(err),
    };

    let outcome = match ShopScheduler::new()
        .with_config(config.clone())
        .solve(&problem)
    {
        Ok(outcome) => outcome,
        Err(err) => return error_response(err),
    };

    let warning = (outcome.status == SolverStatus::Feasible).then(|| {
        warn!("time budget exhausted; returning best schedule found");
        NEAR_OPTIMAL_WARNING.to_string()
    });
    info!(status = ?outcome.status, total_cost = outcome.total_cost, "job finished");

    SolveResponse::Solved(Box::new(SolvedResponse {
        status: outcome.status,
        total_cost: outcome.total_cost,
        kpi: ShopKpi::calculate(&outcome, &problem),
        report: ScheduleReport::build(&outcome, &problem, &config.report),
        stats: outcome.station_stats,
        schedule: outcome.schedule.jobs,
        warning,
    }))
}

/// Parses a JSON payload, runs it and serializes the response.
///
/// # Errors
/// Only for malformed JSON or a failure to serialize; solver and validation
/// failures are reported inside the response.
pub fn solve_json(payload: &str, config: &SolveConfig) -> Result<String> {
    let data = ScheduleData::from_json_str(payload)?;
    Ok(serde_json::to_string(&run_job(data, config))?)
}

fn error_response(err: ScheduleError) -> SolveResponse {
    match err {
        ScheduleError::Validation(errors) => {
            warn!(count = errors.len(), "payload rejected");
            SolveResponse::Failed(FailedResponse {
                error: "Invalid input data.".to_string(),
                details: errors.into_iter().map(|e| e.message).collect(),
                status: None,
            })
        }
        ScheduleError::NoFeasibleSolution { status } => {
            info!(?status, "no feasible solution");
            SolveResponse::Failed(FailedResponse {
                error: NO_FEASIBLE_SOLUTION.to_string(),
                details: Vec::new(),
                status: Some(status),
            })
        }
        other => {
            warn!(error = %other, "solve failed");
            SolveResponse::failed(other.to_string())
        }
    }
}

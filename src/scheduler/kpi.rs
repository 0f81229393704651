//! Schedule quality metrics (KPIs).
//!
//! Computes shop-level indicators from a solved schedule and its problem.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest finish time |
//! | Total Overtime | Sum of station overtime |
//! | Total Idle | Sum of station idle |
//! | Total Cost | Sum of station costs |
//! | Utilization | busy / (shift + overtime) per station |
//! | Avg Utilization | Mean station utilization |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SolveOutcome;
use crate::models::{ShopProblem, StationId};

/// Shop performance indicators. Times are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopKpi {
    /// Latest finish time.
    pub makespan: i64,
    pub total_overtime: i64,
    pub total_idle: i64,
    pub total_cost: f64,
    /// Average station utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Busy minutes over the shift-plus-overtime window, per station.
    pub utilization_by_station: BTreeMap<StationId, f64>,
}

impl ShopKpi {
    /// Computes KPIs from a solve outcome and its problem.
    ///
    /// A station whose window (shift + overtime) is empty has utilization 0.
    pub fn calculate(outcome: &SolveOutcome, problem: &ShopProblem) -> Self {
        let schedule = &outcome.schedule;

        let utilization_by_station: BTreeMap<StationId, f64> = problem
            .stations
            .values()
            .map(|station| {
                let overtime = outcome
                    .station_stats
                    .get(&station.id)
                    .map_or(0, |s| s.overtime);
                let window = station.shift_minutes + overtime;
                let busy = schedule.busy_minutes(station.id);
                let utilization = if window > 0 {
                    busy as f64 / window as f64
                } else {
                    0.0
                };
                (station.id, utilization)
            })
            .collect();

        let avg_utilization = if utilization_by_station.is_empty() {
            0.0
        } else {
            utilization_by_station.values().sum::<f64>() / utilization_by_station.len() as f64
        };

        Self {
            makespan: schedule.makespan(),
            total_overtime: outcome.total_overtime(),
            total_idle: outcome.total_idle(),
            total_cost: outcome.total_cost,
            avg_utilization,
            utilization_by_station,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_overtime: i64, min_utilization: f64) -> bool {
        self.total_overtime <= max_overtime && self.avg_utilization >= min_utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::SolverStatus;
    use crate::models::{Car, Schedule, ScheduledJob, Station, StationStats};

    fn sample() -> (SolveOutcome, ShopProblem) {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
            .with_station(Station::new(2, 400).with_weights(1.0, 1.0))
            .with_car(Car::new(1).with_job(1, 300))
            .with_car(Car::new(2).with_job(1, 300))
            .with_eligible(1, 1);

        let mut schedule = Schedule::new();
        schedule.add_job(ScheduledJob::new(1, 1, 1, 0, 300));
        schedule.add_job(ScheduledJob::new(1, 2, 1, 300, 600));
        let station_stats = BTreeMap::from([
            (1, StationStats { overtime: 120, idle: 0, cost: 240.0 }),
            (2, StationStats { overtime: 0, idle: 400, cost: 400.0 }),
        ]);
        let outcome = SolveOutcome {
            status: SolverStatus::Optimal,
            schedule,
            station_stats,
            total_cost: 640.0,
        };
        (outcome, problem)
    }

    #[test]
    fn test_kpi_totals() {
        let (outcome, problem) = sample();
        let kpi = ShopKpi::calculate(&outcome, &problem);
        assert_eq!(kpi.makespan, 600);
        assert_eq!(kpi.total_overtime, 120);
        assert_eq!(kpi.total_idle, 400);
        assert!((kpi.total_cost - 640.0).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_utilization() {
        let (outcome, problem) = sample();
        let kpi = ShopKpi::calculate(&outcome, &problem);
        // Station 1: 600 / (480 + 120); station 2: 0 / 400.
        assert!((kpi.utilization_by_station[&1] - 1.0).abs() < 1e-10);
        assert!(kpi.utilization_by_station[&2].abs() < 1e-10);
        assert!((kpi.avg_utilization - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_empty_window_has_zero_utilization() {
        let problem = ShopProblem::new().with_station(Station::new(1, 0));
        let outcome = SolveOutcome {
            status: SolverStatus::Optimal,
            schedule: Schedule::new(),
            station_stats: BTreeMap::from([(1, StationStats::default())]),
            total_cost: 0.0,
        };
        let kpi = ShopKpi::calculate(&outcome, &problem);
        assert_eq!(kpi.utilization_by_station[&1], 0.0);
        assert_eq!(kpi.makespan, 0);
    }

    #[test]
    fn test_meets_thresholds() {
        let (outcome, problem) = sample();
        let kpi = ShopKpi::calculate(&outcome, &problem);
        assert!(kpi.meets_thresholds(120, 0.5));
        assert!(!kpi.meets_thresholds(60, 0.5));
    }
}

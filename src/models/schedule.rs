//! Schedule (solution) model.
//!
//! A schedule is the list of chosen `(station, car, job, start, finish)`
//! rows, one per required job, plus per-station overtime/idle statistics
//! derived by the solver.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

use super::{CarId, JobTypeId, StationId};

/// A job placed on a station during `[start, finish)` (minutes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub station: StationId,
    pub car: CarId,
    pub job: JobTypeId,
    pub start: i64,
    pub finish: i64,
}

impl ScheduledJob {
    pub fn new(station: StationId, car: CarId, job: JobTypeId, start: i64, finish: i64) -> Self {
        Self {
            station,
            car,
            job,
            start,
            finish,
        }
    }

    #[inline]
    pub fn duration(&self) -> i64 {
        self.finish - self.start
    }

    /// Whether two closed-open intervals intersect.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.finish && other.start < self.finish
    }
}

/// Per-station overtime, idle and cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StationStats {
    /// Overtime in minutes.
    pub overtime: i64,
    /// Aggregate idle minutes in the shift-plus-overtime window.
    pub idle: i64,
    /// Monetary cost at unscaled weights.
    pub cost: f64,
}

/// A complete schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub jobs: Vec<ScheduledJob>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_job(&mut self, job: ScheduledJob) {
        self.jobs.push(job);
    }

    /// Sorts rows by station, start, car, job.
    pub fn sort(&mut self) {
        self.jobs
            .sort_by_key(|j| (j.station, j.start, j.car, j.job));
    }

    /// Latest finish across all rows (0 when empty).
    pub fn makespan(&self) -> i64 {
        self.jobs.iter().map(|j| j.finish).max().unwrap_or(0)
    }

    /// Rows on a station, sorted by start.
    pub fn jobs_for_station(&self, station: StationId) -> Vec<&ScheduledJob> {
        let mut rows: Vec<_> = self.jobs.iter().filter(|j| j.station == station).collect();
        rows.sort_by_key(|j| (j.start, j.finish));
        rows
    }

    /// The row of a given (car, job), if scheduled.
    pub fn job_for(&self, car: CarId, job: JobTypeId) -> Option<&ScheduledJob> {
        self.jobs.iter().find(|j| j.car == car && j.job == job)
    }

    /// Total processing minutes on a station.
    pub fn busy_minutes(&self, station: StationId) -> i64 {
        self.jobs
            .iter()
            .filter(|j| j.station == station)
            .map(ScheduledJob::duration)
            .sum()
    }

    /// Latest finish on a station (0 when the station has no rows).
    pub fn last_finish(&self, station: StationId) -> i64 {
        self.jobs
            .iter()
            .filter(|j| j.station == station)
            .map(|j| j.finish)
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

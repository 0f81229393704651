//! Car (work order) model.
//!
//! A car carries a duration per job type. Durations are car-specific;
//! a non-positive or missing duration means the job is not needed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CarId, JobTypeId};

/// A car awaiting repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    /// Unique car identifier.
    pub id: CarId,
    /// Job type → duration in minutes.
    pub durations: BTreeMap<JobTypeId, i64>,
}

impl Car {
    pub fn new(id: CarId) -> Self {
        Self {
            id,
            durations: BTreeMap::new(),
        }
    }

    /// Adds a job with its duration.
    pub fn with_job(mut self, job: JobTypeId, minutes: i64) -> Self {
        self.durations.insert(job, minutes);
        self
    }

    /// Duration of a job (0 when absent).
    #[inline]
    pub fn duration(&self, job: JobTypeId) -> i64 {
        self.durations.get(&job).copied().unwrap_or(0)
    }

    /// Jobs with positive duration, ascending by job type.
    pub fn required_jobs(&self) -> impl Iterator<Item = (JobTypeId, i64)> + '_ {
        self.durations
            .iter()
            .filter(|&(_, &d)| d > 0)
            .map(|(&j, &d)| (j, d))
    }

    /// Sum of positive durations, saturating at `i64::MAX`.
    pub fn total_work(&self) -> i64 {
        self.required_jobs()
            .fold(0, |acc: i64, (_, d)| acc.saturating_add(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_car_builder() {
        let car = Car::new(7).with_job(1, 120).with_job(2, 0).with_job(3, 45);
        assert_eq!(car.id, 7);
        assert_eq!(car.duration(1), 120);
        assert_eq!(car.duration(2), 0);
        assert_eq!(car.duration(9), 0);
    }

    #[test]
    fn test_required_jobs_skip_non_positive() {
        let car = Car::new(1).with_job(3, 45).with_job(1, 120).with_job(2, 0).with_job(4, -5);
        let jobs: Vec<_> = car.required_jobs().collect();
        assert_eq!(jobs, vec![(1, 120), (3, 45)]);
        assert_eq!(car.total_work(), 165);
    }

    #[test]
    fn test_total_work_saturates() {
        let car = Car::new(1).with_job(1, i64::MAX - 1).with_job(2, i64::MAX - 1);
        assert_eq!(car.total_work(), i64::MAX);
    }
}

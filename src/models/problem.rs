//! A complete scheduling instance.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Car, CarId, Eligibility, JobTypeId, Station, StationId};

/// Cars, stations and eligibility for one solve.
///
/// All collections are ordered by identifier, so iteration order (and with
/// it variable creation order in the model builder) is deterministic.
///
/// # Example
/// ```
/// use shop_schedule::models::{Car, ShopProblem, Station};
///
/// let problem = ShopProblem::new()
///     .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
///     .with_car(Car::new(1).with_job(1, 500))
///     .with_eligible(1, 1);
///
/// assert_eq!(problem.horizon(), 500);
/// assert_eq!(problem.job_types(), vec![1]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopProblem {
    pub stations: BTreeMap<StationId, Station>,
    pub cars: BTreeMap<CarId, Car>,
    pub eligibility: Eligibility,
}

impl ShopProblem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a station.
    pub fn with_station(mut self, station: Station) -> Self {
        self.stations.insert(station.id, station);
        self
    }

    /// Adds (or replaces) a car.
    pub fn with_car(mut self, car: Car) -> Self {
        self.cars.insert(car.id, car);
        self
    }

    /// Allows `station` to perform `job`.
    pub fn with_eligible(mut self, job: JobTypeId, station: StationId) -> Self {
        self.eligibility.allow(job, station);
        self
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    pub fn car(&self, id: CarId) -> Option<&Car> {
        self.cars.get(&id)
    }

    pub fn station_ids(&self) -> Vec<StationId> {
        self.stations.keys().copied().collect()
    }

    pub fn car_ids(&self) -> Vec<CarId> {
        self.cars.keys().copied().collect()
    }

    /// Sorted union of job types mentioned by any car.
    pub fn job_types(&self) -> Vec<JobTypeId> {
        self.cars
            .values()
            .flat_map(|car| car.durations.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Duration of a car's job (0 when the car or job is unknown).
    pub fn duration(&self, car: CarId, job: JobTypeId) -> i64 {
        self.cars.get(&car).map_or(0, |c| c.duration(job))
    }

    /// Every `(car, job, duration)` with positive duration, ordered by car then job.
    pub fn required_jobs(&self) -> Vec<(CarId, JobTypeId, i64)> {
        self.cars
            .values()
            .flat_map(|car| car.required_jobs().map(move |(job, d)| (car.id, job, d)))
            .collect()
    }

    /// Sum of all positive durations: an upper bound on any finish time.
    ///
    /// Saturates at `i64::MAX`; validated payloads stay far below it.
    pub fn horizon(&self) -> i64 {
        self.cars
            .values()
            .map(Car::total_work)
            .fold(0, i64::saturating_add)
    }

    /// Required jobs without any eligible station known to the problem.
    pub fn unassignable_jobs(&self) -> Vec<(CarId, JobTypeId)> {
        self.required_jobs()
            .into_iter()
            .filter(|&(_, job, _)| {
                !self
                    .eligibility
                    .stations_for(job)
                    .any(|s| self.stations.contains_key(&s))
            })
            .map(|(car, job, _)| (car, job))
            .collect()
    }
}

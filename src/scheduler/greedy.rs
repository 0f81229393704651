//! Cap-aware greedy scheduler.
//!
//! # Algorithm
//!
//! 1. Visit cars in ascending id, and each car's required jobs in ascending job type.
//! 2. For each job, evaluate every eligible station: the job can start at
//!    `max(station free, car free)`.
//! 3. Discard stations where the job would finish past `shift + cap`.
//! 4. Among the rest, pick the smallest increase of the station's
//!    overtime and idle cost, then the earliest start, then the lowest id,
//!    and advance both clocks to the job's finish.
//!
//! When every eligible station is capped and full, the job still goes to
//! the best of them; the schedule then breaks a cap and the exact solver
//! discards it as a hint.
//!
//! # Complexity
//! O(n · s) where n = required jobs, s = stations per job.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{CarId, Schedule, ScheduledJob, ShopProblem, Station, StationId};

/// Running state of one station.
#[derive(Debug, Clone, Copy, Default)]
struct StationClock {
    free: i64,
    busy: i64,
}

impl StationClock {
    fn cost(&self, station: &Station) -> f64 {
        let overtime = (self.free - station.shift_minutes).max(0);
        let idle = (station.shift_minutes + overtime - self.busy).max(0);
        station.cost(overtime, idle)
    }

    fn after(&self, finish: i64, duration: i64) -> Self {
        Self {
            free: finish,
            busy: self.busy + duration,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    station: StationId,
    start: i64,
    fits: bool,
    delta: f64,
}

impl Candidate {
    fn rank(&self, other: &Self) -> Ordering {
        other
            .fits
            .cmp(&self.fits)
            .then(self.delta.total_cmp(&other.delta))
            .then(self.start.cmp(&other.start))
            .then(self.station.cmp(&other.station))
    }
}

/// Greedy cost-aware scheduler.
///
/// # Example
///
/// ```
/// use shop_schedule::models::{Car, ShopProblem, Station};
/// use shop_schedule::scheduler::GreedyScheduler;
///
/// let problem = ShopProblem::new()
///     .with_station(Station::new(1, 480))
///     .with_car(Car::new(1).with_job(1, 300))
///     .with_car(Car::new(2).with_job(1, 300))
///     .with_eligible(1, 1);
///
/// let schedule = GreedyScheduler::new().schedule(&problem).unwrap();
/// assert_eq!(schedule.len(), 2);
/// assert_eq!(schedule.makespan(), 600);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyScheduler;

impl GreedyScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Schedules every required job.
    ///
    /// Returns `None` when some job has no eligible station in the problem.
    pub fn schedule(&self, problem: &ShopProblem) -> Option<Schedule> {
        let mut schedule = Schedule::new();
        let mut clocks: BTreeMap<StationId, StationClock> = problem
            .stations
            .keys()
            .map(|&r| (r, StationClock::default()))
            .collect();
        let mut car_free: BTreeMap<CarId, i64> = BTreeMap::new();

        for (car, job, duration) in problem.required_jobs() {
            let ready = car_free.get(&car).copied().unwrap_or(0);

            let best = problem
                .eligibility
                .stations_for(job)
                .filter_map(|r| {
                    let station = problem.station(r)?;
                    let clock = clocks.get(&r)?;
                    let start = clock.free.max(ready);
                    let finish = start + duration;
                    Some(Candidate {
                        station: r,
                        start,
                        fits: station.max_minutes().is_none_or(|max| finish <= max),
                        delta: clock.after(finish, duration).cost(station) - clock.cost(station),
                    })
                })
                .min_by(Candidate::rank);

            let Some(best) = best else {
                debug!(car, job, "greedy: no eligible station");
                return None;
            };
            if !best.fits {
                debug!(car, job, station = best.station, "greedy: overtime cap exceeded");
            }
            let finish = best.start + duration;
            schedule.add_job(ScheduledJob::new(best.station, car, job, best.start, finish));
            if let Some(clock) = clocks.get_mut(&best.station) {
                *clock = clock.after(finish, duration);
            }
            car_free.insert(car, finish);
        }

        Some(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Car, Station};

    #[test]
    fn test_serializes_on_single_station() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480))
            .with_car(Car::new(1).with_job(1, 300))
            .with_car(Car::new(2).with_job(1, 300))
            .with_eligible(1, 1);

        let schedule = GreedyScheduler::new().schedule(&problem).unwrap();
        assert_eq!(schedule.job_for(1, 1).map(|j| (j.start, j.finish)), Some((0, 300)));
        assert_eq!(schedule.job_for(2, 1).map(|j| (j.start, j.finish)), Some((300, 600)));
    }

    #[test]
    fn test_unweighted_picks_earliest_station_with_lowest_id_tie() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480))
            .with_station(Station::new(2, 480))
            .with_car(Car::new(1).with_job(1, 100))
            .with_car(Car::new(2).with_job(1, 50))
            .with_car(Car::new(3).with_job(1, 10))
            .with_eligible(1, 1)
            .with_eligible(1, 2);

        let schedule = GreedyScheduler::new().schedule(&problem).unwrap();
        assert_eq!(schedule.job_for(1, 1).map(|j| j.station), Some(1));
        assert_eq!(schedule.job_for(2, 1).map(|j| j.station), Some(2));
        // Station 2 frees up at 50, before station 1 at 100.
        assert_eq!(schedule.job_for(3, 1).map(|j| (j.station, j.start)), Some((2, 50)));
    }

    #[test]
    fn test_car_jobs_do_not_overlap() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480))
            .with_station(Station::new(2, 480))
            .with_car(Car::new(1).with_job(1, 100).with_job(2, 40))
            .with_eligible(1, 1)
            .with_eligible(2, 2);

        let schedule = GreedyScheduler::new().schedule(&problem).unwrap();
        let second = schedule.job_for(1, 2).unwrap();
        assert_eq!(second.station, 2);
        assert_eq!(second.start, 100);
    }

    #[test]
    fn test_skips_zero_durations() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480))
            .with_car(Car::new(1).with_job(1, 0).with_job(2, 30))
            .with_eligible(2, 1);

        let schedule = GreedyScheduler::new().schedule(&problem).unwrap();
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn test_no_eligible_station() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480))
            .with_car(Car::new(1).with_job(1, 30))
            .with_eligible(1, 9);

        assert!(GreedyScheduler::new().schedule(&problem).is_none());
    }

    #[test]
    fn test_skips_station_that_would_break_cap() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 300).with_overtime_cap(120))
            .with_station(Station::new(2, 240))
            .with_car(Car::new(1).with_job(1, 400))
            .with_car(Car::new(2).with_job(1, 100))
            .with_eligible(1, 1)
            .with_eligible(1, 2);

        let schedule = GreedyScheduler::new().schedule(&problem).unwrap();
        assert_eq!(schedule.job_for(1, 1).map(|j| j.station), Some(1));
        // Station 1 would end at 500 > 420; station 2 is uncapped.
        assert_eq!(schedule.job_for(2, 1).map(|j| (j.station, j.start)), Some((2, 0)));
    }

    #[test]
    fn test_prefers_cheaper_station() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 60).with_weights(5.0, 0.0))
            .with_station(Station::new(2, 480).with_weights(1.0, 1.0))
            .with_car(Car::new(1).with_job(1, 120))
            .with_eligible(1, 1)
            .with_eligible(1, 2);

        // Station 1 would add 60 overtime minutes; station 2 removes 120 idle ones.
        let schedule = GreedyScheduler::new().schedule(&problem).unwrap();
        assert_eq!(schedule.job_for(1, 1).map(|j| j.station), Some(2));
    }

    #[test]
    fn test_full_capped_stations_still_schedule() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 100).with_overtime_cap(0))
            .with_car(Car::new(1).with_job(1, 150))
            .with_eligible(1, 1);

        let schedule = GreedyScheduler::new().schedule(&problem).unwrap();
        assert_eq!(schedule.last_finish(1), 150);
    }
}

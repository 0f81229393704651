//! Shop scheduling formulation.
//!
//! Translates a [`ShopProblem`] into a [`CpModel`]:
//!
//! | Element | Per | Definition |
//! |---------|-----|------------|
//! | `a[c,j,r]` | eligible (car, job, station) | presence literal |
//! | `start[c,j]`, `finish[c,j]` | required (car, job) | `[0, H]`, shared by all stations |
//! | `interval[c,j,r]` | eligible triple | optional, size `d[c,j]`, present iff `a[c,j,r]` |
//! | `last[r]` | station | `[0, H]` |
//! | `ov[r]` | station | `[0, H]` |
//! | `idle[r]` | station | `[0, ST[r] + H]` |
//!
//! where `H` is the sum of all positive durations. Constraints:
//!
//! 1. `Σ_r a[c,j,r] = 1` for every required (car, job)
//! 2. no-overlap of the intervals on each station
//! 3. no-overlap of the intervals of each car with more than one interval
//! 4. `a[c,j,r] ⇒ last[r] ≥ finish[c,j]`
//! 5. `ov[r] ≥ last[r] - ST[r]`, and `ov[r] ≤ cap[r]` when capped
//! 6. `idle[r] ≥ ST[r] + ov[r] - Σ d[c,j]·a[c,j,r]`
//! 7. `last[r] ≥ Σ d[c,j]·a[c,j,r]` (implied by 2 and 4; tightens the
//!    LP relaxation so overloaded or capped stations are pruned early)
//!
//! Objective: `min Σ_r T'[r]·ov[r] + I'[r]·idle[r]` with
//! `T' = round(T·scale)` and `I' = round(I·scale)`.
//!
//! # Reference
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 7 (flexible job shop)
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling", Sec. 4

use std::collections::BTreeMap;

use tracing::debug;

use crate::cp::{BoolVar, CpModel, IntVar, IntervalVar, LinearConstraint, LinearExpr};
use crate::models::{CarId, JobTypeId, Schedule, ShopProblem, StationId};

/// Default multiplier turning fractional cost weights into integers.
pub const DEFAULT_COST_SCALE: i64 = 10;

/// Handles of every model variable, keyed by domain identifiers.
///
/// Produced by [`build_model`]; consumed by
/// [`extract_solution`](super::extract_solution).
#[derive(Debug, Clone, Default)]
pub struct VariableIndex {
    /// `(car, job, station)` → presence literal.
    pub presence: BTreeMap<(CarId, JobTypeId, StationId), BoolVar>,
    pub intervals: BTreeMap<(CarId, JobTypeId, StationId), IntervalVar>,
    pub start: BTreeMap<(CarId, JobTypeId), IntVar>,
    pub finish: BTreeMap<(CarId, JobTypeId), IntVar>,
    /// Positive durations of the required (car, job) pairs.
    pub durations: BTreeMap<(CarId, JobTypeId), i64>,
    pub last_finish: BTreeMap<StationId, IntVar>,
    pub overtime: BTreeMap<StationId, IntVar>,
    pub idle: BTreeMap<StationId, IntVar>,
    /// Scaled tardiness weight per station.
    pub tardiness_scaled: BTreeMap<StationId, i64>,
    /// Scaled idle weight per station.
    pub idle_scaled: BTreeMap<StationId, i64>,
    pub cost_scale: i64,
    pub horizon: i64,
}

impl VariableIndex {
    /// Stations (ascending) eligible and chosen-able for a required (car, job).
    pub fn candidate_stations(&self, car: CarId, job: JobTypeId) -> Vec<StationId> {
        self.presence
            .range((car, job, StationId::MIN)..=(car, job, StationId::MAX))
            .map(|(&(_, _, r), _)| r)
            .collect()
    }

    pub fn station_ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.overtime.keys().copied()
    }
}

/// Builds the shop model with the given cost scale.
///
/// Variable creation order follows ascending car, job and station
/// identifiers, so identical problems produce identical models.
pub fn build_model(problem: &ShopProblem, cost_scale: i64) -> (CpModel, VariableIndex) {
    ShopModelBuilder::new(problem)
        .with_cost_scale(cost_scale)
        .build()
}

/// Builder for the shop model.
///
/// # Example
/// ```
/// use shop_schedule::models::{Car, ShopProblem, Station};
/// use shop_schedule::scheduler::ShopModelBuilder;
///
/// let problem = ShopProblem::new()
///     .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
///     .with_car(Car::new(1).with_job(1, 500))
///     .with_eligible(1, 1);
///
/// let (model, index) = ShopModelBuilder::new(&problem).build();
/// assert_eq!(index.presence.len(), 1);
/// assert_eq!(index.horizon, 500);
/// assert_eq!(model.interval_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ShopModelBuilder<'a> {
    problem: &'a ShopProblem,
    cost_scale: i64,
}

impl<'a> ShopModelBuilder<'a> {
    pub fn new(problem: &'a ShopProblem) -> Self {
        Self {
            problem,
            cost_scale: DEFAULT_COST_SCALE,
        }
    }

    /// Sets the weight multiplier (values below 1 are treated as 1).
    pub fn with_cost_scale(mut self, cost_scale: i64) -> Self {
        self.cost_scale = cost_scale.max(1);
        self
    }

    pub fn build(&self) -> (CpModel, VariableIndex) {
        let problem = self.problem;
        let horizon = problem.horizon();
        let mut model = CpModel::new("shop-schedule");
        let mut index = VariableIndex {
            cost_scale: self.cost_scale,
            horizon,
            ..VariableIndex::default()
        };

        // Assignment variables.
        for (car, job, duration) in problem.required_jobs() {
            let start = model.new_int_var(0, horizon, format!("st_{car}_{job}"));
            let finish = model.new_int_var(0, horizon, format!("fi_{car}_{job}"));
            index.start.insert((car, job), start);
            index.finish.insert((car, job), finish);
            index.durations.insert((car, job), duration);

            for station in problem
                .eligibility
                .stations_for(job)
                .filter(|r| problem.stations.contains_key(r))
            {
                let lit = model.new_bool_var(format!("a_{car}_{job}_{station}"));
                let iv = model.new_optional_interval(
                    start,
                    duration,
                    finish,
                    lit,
                    format!("int_{car}_{job}_{station}"),
                );
                index.presence.insert((car, job, station), lit);
                index.intervals.insert((car, job, station), iv);
            }
        }

        // Station variables.
        for station in problem.stations.values() {
            let r = station.id;
            index
                .last_finish
                .insert(r, model.new_int_var(0, horizon, format!("finLast_{r}")));
            index
                .overtime
                .insert(r, model.new_int_var(0, horizon, format!("Ov_{r}")));
            index.idle.insert(
                r,
                model.new_int_var(0, station.shift_minutes + horizon, format!("Id_{r}")),
            );
        }

        // 1. Exactly one station per required job.
        for &(car, job) in index.durations.keys() {
            let literals: Vec<BoolVar> = index
                .candidate_stations(car, job)
                .into_iter()
                .map(|r| index.presence[&(car, job, r)])
                .collect();
            model.add_exactly_one(&literals);
        }

        // 2. Station exclusivity.
        for &r in problem.stations.keys() {
            let on_station: Vec<IntervalVar> = index
                .intervals
                .iter()
                .filter(|&(&(_, _, rr), _)| rr == r)
                .map(|(_, &iv)| iv)
                .collect();
            if on_station.len() > 1 {
                model.add_no_overlap(on_station);
            }
        }

        // 3. Car exclusivity.
        for &car in problem.cars.keys() {
            let of_car: Vec<IntervalVar> = index
                .intervals
                .iter()
                .filter(|&(&(c, _, _), _)| c == car)
                .map(|(_, &iv)| iv)
                .collect();
            if of_car.len() > 1 {
                model.add_no_overlap(of_car);
            }
        }

        // 4-6. Last finish, overtime, idle.
        let mut objective = LinearExpr::new();
        for station in problem.stations.values() {
            let r = station.id;
            let last = index.last_finish[&r];
            let ov = index.overtime[&r];
            let idle = index.idle[&r];

            let mut processing = LinearExpr::new();
            for (&(car, job, _), &lit) in index.presence.iter().filter(|&(&(_, _, rr), _)| rr == r)
            {
                let finish = index.finish[&(car, job)];
                model.add_enforced(
                    lit,
                    LinearConstraint::greater_eq(LinearExpr::new().term(last, 1).term(finish, -1), 0),
                );
                processing.add_term(lit, index.durations[&(car, job)]);
            }

            // ov - last >= -ST
            model.add_linear(LinearConstraint::greater_eq(
                LinearExpr::new().term(ov, 1).term(last, -1),
                -station.shift_minutes,
            ));
            if let Some(cap) = station.overtime_cap {
                model.add_linear(LinearConstraint::less_eq(ov, cap));
            }

            // idle - ov + Σ d·a >= ST
            let mut idle_row = LinearExpr::new().term(idle, 1).term(ov, -1);
            for &(var, coeff) in processing.terms() {
                idle_row.add_term(var, coeff);
            }
            model.add_linear(LinearConstraint::greater_eq(idle_row, station.shift_minutes));

            // last - Σ d·a >= 0
            if !processing.terms().is_empty() {
                let mut load_row = LinearExpr::new().term(last, 1);
                for &(var, coeff) in processing.terms() {
                    load_row.add_term(var, -coeff);
                }
                model.add_linear(LinearConstraint::greater_eq(load_row, 0));
            }

            let (t_scaled, i_scaled) = station.scaled_weights(self.cost_scale);
            index.tardiness_scaled.insert(r, t_scaled);
            index.idle_scaled.insert(r, i_scaled);
            objective.add_term(ov, t_scaled);
            objective.add_term(idle, i_scaled);
        }
        model.minimize(objective);

        debug!(
            variables = model.variable_count(),
            intervals = model.interval_count(),
            constraints = model.constraint_count(),
            horizon,
            "shop model built"
        );

        (model, index)
    }
}

/// Offers a complete schedule as a solver hint.
///
/// Every model variable receives a value: presence from the rows, start and
/// finish of each required job, and the station aggregates derived from
/// them. Returns `false` (and adds nothing) when the schedule does not cover
/// every required job with an eligible station.
pub fn add_schedule_hint(
    model: &mut CpModel,
    index: &VariableIndex,
    problem: &ShopProblem,
    schedule: &Schedule,
) -> bool {
    let mut chosen: BTreeMap<(CarId, JobTypeId), (StationId, i64, i64)> = BTreeMap::new();
    for row in &schedule.jobs {
        if !index.presence.contains_key(&(row.car, row.job, row.station)) {
            return false;
        }
        chosen.insert((row.car, row.job), (row.station, row.start, row.finish));
    }
    if index.durations.keys().any(|key| !chosen.contains_key(key)) {
        return false;
    }

    for (&(car, job, r), &lit) in &index.presence {
        let on_station = chosen
            .get(&(car, job))
            .is_some_and(|&(station, _, _)| station == r);
        model.add_hint(lit, i64::from(on_station));
    }
    for (key, &(_, start, finish)) in &chosen {
        if let (Some(&s), Some(&f)) = (index.start.get(key), index.finish.get(key)) {
            model.add_hint(s, start);
            model.add_hint(f, finish);
        }
    }
    for station in problem.stations.values() {
        let r = station.id;
        let last = schedule.last_finish(r);
        let overtime = (last - station.shift_minutes).max(0);
        let idle = (station.shift_minutes + overtime - schedule.busy_minutes(r)).max(0);
        model.add_hint(index.last_finish[&r], last);
        model.add_hint(index.overtime[&r], overtime);
        model.add_hint(index.idle[&r], idle);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{Comparison, Constraint};
    use crate::models::{Car, ScheduledJob, Station};

    fn single_station() -> ShopProblem {
        ShopProblem::new()
            .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
            .with_car(Car::new(1).with_job(1, 500))
            .with_eligible(1, 1)
    }

    fn two_stations() -> ShopProblem {
        ShopProblem::new()
            .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
            .with_station(Station::new(2, 300).with_weights(1.5, 0.5).with_overtime_cap(30))
            .with_car(Car::new(1).with_job(1, 100).with_job(2, 50).with_job(3, 0))
            .with_car(Car::new(2).with_job(1, 80))
            .with_eligible(1, 1)
            .with_eligible(1, 2)
            .with_eligible(2, 2)
            .with_eligible(3, 1)
    }

    #[test]
    fn test_variables_created_only_for_positive_durations() {
        let (model, index) = build_model(&two_stations(), 10);
        assert_eq!(index.durations.len(), 3);
        assert!(!index.start.contains_key(&(1, 3)));
        assert_eq!(index.presence.len(), 5);
        assert_eq!(index.intervals.len(), 5);
        assert_eq!(index.horizon, 230);
        // 3 × (start, finish) + 5 presence + 2 × (last, ov, idle)
        assert_eq!(model.variable_count(), 6 + 5 + 6);
    }

    #[test]
    fn test_domains() {
        let (model, index) = build_model(&two_stations(), 10);
        let idle = model.variable(index.idle[&2]);
        assert_eq!((idle.lb, idle.ub), (0, 300 + 230));
        let start = model.variable(index.start[&(2, 1)]);
        assert_eq!((start.lb, start.ub), (0, 230));
    }

    #[test]
    fn test_candidate_stations() {
        let (_, index) = build_model(&two_stations(), 10);
        assert_eq!(index.candidate_stations(1, 1), vec![1, 2]);
        assert_eq!(index.candidate_stations(1, 2), vec![2]);
        assert!(index.candidate_stations(1, 3).is_empty());
    }

    #[test]
    fn test_scaled_weights() {
        let (model, index) = build_model(&two_stations(), 10);
        assert_eq!(index.tardiness_scaled[&2], 15);
        assert_eq!(index.idle_scaled[&2], 5);
        assert_eq!(index.cost_scale, 10);
        assert_eq!(model.objective().terms().len(), 4);
    }

    #[test]
    fn test_no_overlap_groups() {
        let (model, _) = build_model(&two_stations(), 10);
        let groups: Vec<usize> = model
            .constraints()
            .iter()
            .filter_map(|c| match c {
                Constraint::NoOverlap(ivs) => Some(ivs.len()),
                _ => None,
            })
            .collect();
        // Stations 1 and 2, then cars 1 and 2.
        assert_eq!(groups, vec![2, 3, 3, 2]);
    }

    #[test]
    fn test_station_load_bounds_last_finish() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
            .with_car(Car::new(1).with_job(1, 300))
            .with_car(Car::new(2).with_job(1, 300))
            .with_eligible(1, 1);
        let (model, index) = build_model(&problem, 10);

        let last = index.last_finish[&1];
        let mut expected: Vec<(IntVar, i64)> = index
            .presence
            .values()
            .map(|lit| (lit.as_int(), -300))
            .chain([(last, 1)])
            .collect();
        expected.sort_unstable();

        let found = model.constraints().iter().any(|c| match c {
            Constraint::Linear(lc) => {
                lc.cmp == Comparison::Ge && lc.rhs == 0 && lc.expr.merged_terms() == expected
            }
            _ => false,
        });
        assert!(found);
    }

    #[test]
    fn test_single_interval_car_has_no_overlap_constraint() {
        let (model, _) = build_model(&single_station(), 10);
        assert!(!model
            .constraints()
            .iter()
            .any(|c| matches!(c, Constraint::NoOverlap(_))));
    }

    #[test]
    fn test_job_without_station_is_unsatisfiable() {
        let problem = ShopProblem::new()
            .with_station(Station::new(1, 480))
            .with_car(Car::new(1).with_job(5, 60));
        let (model, index) = build_model(&problem, 10);
        assert!(index.presence.is_empty());
        // The exactly-one row over no literals can never hold.
        let values = vec![0; model.variable_count()];
        assert!(!model.is_feasible(&values));
    }

    #[test]
    fn test_known_optimum_is_feasible() {
        let problem = single_station();
        let (model, index) = build_model(&problem, 10);
        let mut schedule = Schedule::new();
        schedule.add_job(ScheduledJob::new(1, 1, 1, 0, 500));
        let mut hinted = model.clone();
        assert!(add_schedule_hint(&mut hinted, &index, &problem, &schedule));

        let values = hinted.hint_assignment().unwrap();
        assert!(model.is_feasible(&values));
        assert_eq!(values[index.overtime[&1].index()], 20);
        assert_eq!(values[index.idle[&1].index()], 0);
        assert_eq!(model.evaluate_objective(&values), 400);
    }

    #[test]
    fn test_hint_rejected_for_ineligible_station() {
        let problem = single_station();
        let (mut model, index) = build_model(&problem, 10);
        let mut schedule = Schedule::new();
        schedule.add_job(ScheduledJob::new(2, 1, 1, 0, 500));
        assert!(!add_schedule_hint(&mut model, &index, &problem, &schedule));
        assert!(model.hints().is_empty());
    }

    #[test]
    fn test_hint_rejected_when_incomplete() {
        let problem = two_stations();
        let (mut model, index) = build_model(&problem, 10);
        let mut schedule = Schedule::new();
        schedule.add_job(ScheduledJob::new(1, 1, 1, 0, 100));
        assert!(!add_schedule_hint(&mut model, &index, &problem, &schedule));
    }

    #[test]
    fn test_deterministic_build() {
        let (a, _) = build_model(&two_stations(), 10);
        let (b, _) = build_model(&two_stations(), 10);
        assert_eq!(a.variables(), b.variables());
        assert_eq!(a.constraints(), b.constraints());
    }
}

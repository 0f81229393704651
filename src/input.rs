//! Input payload.
//!
//! The payload is a JSON object keyed by single-letter tables:
//!
//! | Key | Shape | Meaning |
//! |-----|-------|---------|
//! | `T` | station → float | cost per overtime minute |
//! | `I` | station → float | cost per idle minute |
//! | `ST` | station → int | shift length (minutes) |
//! | `OV_limit` | station → int, optional | overtime cap (minutes); missing = unbounded |
//! | `d` | car → job → int | duration (minutes); 0 or missing = not needed |
//! | `e` | job → station → 0/1 | eligibility |
//!
//! Object keys are decimal integers written as strings (`"1"`).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{Car, CarId, Eligibility, JobTypeId, ShopProblem, Station, StationId};
use crate::validation::validate_input;

/// Raw scheduling payload.
///
/// # Example
/// ```
/// use shop_schedule::input::ScheduleData;
///
/// let data = ScheduleData::from_json_str(r#"{
///     "T": {"1": 2.0}, "I": {"1": 1.0}, "ST": {"1": 480},
///     "d": {"1": {"1": 500}},
///     "e": {"1": {"1": 1}}
/// }"#).unwrap();
///
/// let problem = data.into_problem().unwrap();
/// assert_eq!(problem.horizon(), 500);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleData {
    #[serde(rename = "T")]
    pub tardiness_weights: BTreeMap<StationId, f64>,
    #[serde(rename = "I")]
    pub idle_weights: BTreeMap<StationId, f64>,
    #[serde(rename = "ST")]
    pub shift_lengths: BTreeMap<StationId, i64>,
    #[serde(rename = "OV_limit", default, skip_serializing_if = "Option::is_none")]
    pub overtime_limits: Option<BTreeMap<StationId, i64>>,
    #[serde(rename = "d")]
    pub durations: BTreeMap<CarId, BTreeMap<JobTypeId, i64>>,
    #[serde(rename = "e")]
    pub eligibility: BTreeMap<JobTypeId, BTreeMap<StationId, i64>>,
}

impl ScheduleData {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Overtime cap of a station, if any.
    pub fn overtime_limit(&self, station: StationId) -> Option<i64> {
        self.overtime_limits
            .as_ref()
            .and_then(|limits| limits.get(&station).copied())
    }

    /// Validates the payload and converts it into a [`ShopProblem`].
    ///
    /// Stations are the `ST` keys. A job whose eligible stations are all
    /// absent is kept: the model reports it as infeasible.
    pub fn into_problem(self) -> Result<ShopProblem> {
        validate_input(&self)?;

        let mut problem = ShopProblem::new();
        for (&id, &shift) in &self.shift_lengths {
            let mut station = Station::new(id, shift).with_weights(
                self.tardiness_weights.get(&id).copied().unwrap_or(0.0),
                self.idle_weights.get(&id).copied().unwrap_or(0.0),
            );
            if let Some(cap) = self.overtime_limit(id) {
                station = station.with_overtime_cap(cap);
            }
            problem = problem.with_station(station);
        }

        for (id, jobs) in self.durations {
            problem = problem.with_car(Car {
                id,
                durations: jobs,
            });
        }
        problem.eligibility = Eligibility::from_flags(&self.eligibility);

        debug!(
            stations = problem.stations.len(),
            cars = problem.cars.len(),
            job_types = problem.job_types().len(),
            "payload converted"
        );
        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScheduleError;

    const PAYLOAD: &str = r#"{
        "T": {"1": 2.0, "2": 3.5},
        "I": {"1": 1.0, "2": 0.5},
        "ST": {"1": 480, "2": 300},
        "OV_limit": {"2": 60},
        "d": {"1": {"1": 120, "2": 0}, "2": {"2": 45}},
        "e": {"1": {"1": 1, "2": 0}, "2": {"1": 1, "2": 1}}
    }"#;

    #[test]
    fn test_parse_payload() {
        let data = ScheduleData::from_json_str(PAYLOAD).unwrap();
        assert_eq!(data.shift_lengths[&2], 300);
        assert_eq!(data.overtime_limit(2), Some(60));
        assert_eq!(data.overtime_limit(1), None);
        assert_eq!(data.durations[&1][&1], 120);
        assert_eq!(data.eligibility[&2][&2], 1);
    }

    #[test]
    fn test_missing_or_null_overtime_limits() {
        let missing = r#"{"T": {}, "I": {}, "ST": {}, "d": {}, "e": {}}"#;
        let null = r#"{"T": {}, "I": {}, "ST": {}, "OV_limit": null, "d": {}, "e": {}}"#;
        assert!(ScheduleData::from_json_str(missing).unwrap().overtime_limits.is_none());
        assert!(ScheduleData::from_json_str(null).unwrap().overtime_limits.is_none());
    }

    #[test]
    fn test_into_problem() {
        let problem = ScheduleData::from_json_str(PAYLOAD)
            .unwrap()
            .into_problem()
            .unwrap();
        assert_eq!(problem.station_ids(), vec![1, 2]);
        assert_eq!(problem.car_ids(), vec![1, 2]);
        assert_eq!(problem.job_types(), vec![1, 2]);
        assert_eq!(problem.station(2).and_then(|s| s.overtime_cap), Some(60));
        assert!((problem.station(2).map_or(0.0, |s| s.tardiness_weight) - 3.5).abs() < 1e-10);
        assert_eq!(problem.eligibility.stations_for(1).collect::<Vec<_>>(), vec![1]);
        assert_eq!(problem.horizon(), 165);
    }

    #[test]
    fn test_non_integer_duration_rejected() {
        let json = r#"{"T": {}, "I": {}, "ST": {}, "d": {"1": {"1": 1.5}}, "e": {}}"#;
        let err = ScheduleData::from_json_str(json).unwrap_err();
        assert!(matches!(err, ScheduleError::Json(_)));
    }

    #[test]
    fn test_non_numeric_key_rejected() {
        let json = r#"{"T": {"a": 1.0}, "I": {}, "ST": {}, "d": {}, "e": {}}"#;
        assert!(ScheduleData::from_json_str(json).is_err());
    }

    #[test]
    fn test_invalid_payload_fails_validation() {
        let json = r#"{"T": {}, "I": {"1": 1.0}, "ST": {"1": 480}, "d": {}, "e": {}}"#;
        let err = ScheduleData::from_json_str(json)
            .unwrap()
            .into_problem()
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Validation(_)));
    }

    #[test]
    fn test_serialize_roundtrip_keeps_keys() {
        let data = ScheduleData::from_json_str(PAYLOAD).unwrap();
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["ST"]["1"], 480);
        assert_eq!(json["OV_limit"]["2"], 60);
    }
}

//! Job-type → station eligibility.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{JobTypeId, StationId};

/// Which stations may perform each job type.
///
/// Job types without an entry have no eligible station.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    allowed: BTreeMap<JobTypeId, BTreeSet<StationId>>,
}

impl Eligibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the relation from a flag matrix; a flag `!= 0` marks the pair eligible.
    pub fn from_flags(flags: &BTreeMap<JobTypeId, BTreeMap<StationId, i64>>) -> Self {
        let mut eligibility = Self::new();
        for (&job, row) in flags {
            for (&station, &flag) in row {
                if flag != 0 {
                    eligibility.allow(job, station);
                }
            }
        }
        eligibility
    }

    /// Marks `station` as able to perform `job`.
    pub fn allow(&mut self, job: JobTypeId, station: StationId) {
        self.allowed.entry(job).or_default().insert(station);
    }

    /// Eligible stations for a job, ascending.
    pub fn stations_for(&self, job: JobTypeId) -> impl Iterator<Item = StationId> + '_ {
        self.allowed.get(&job).into_iter().flatten().copied()
    }

    pub fn is_eligible(&self, job: JobTypeId, station: StationId) -> bool {
        self.allowed
            .get(&job)
            .is_some_and(|stations| stations.contains(&station))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        let mut flags = BTreeMap::new();
        flags.insert(1, BTreeMap::from([(1, 1), (2, 0), (3, 1)]));
        flags.insert(2, BTreeMap::from([(1, 0)]));

        let e = Eligibility::from_flags(&flags);
        assert_eq!(e.stations_for(1).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(e.stations_for(2).count(), 0);
        assert_eq!(e.stations_for(99).count(), 0);
        assert!(e.is_eligible(1, 3));
        assert!(!e.is_eligible(1, 2));
    }

    #[test]
    fn test_allow_keeps_stations_sorted() {
        let mut e = Eligibility::new();
        e.allow(1, 4);
        e.allow(1, 2);
        e.allow(1, 4);
        assert_eq!(e.stations_for(1).collect::<Vec<_>>(), vec![2, 4]);
    }
}

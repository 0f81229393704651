//! Station (work bay) model.
//!
//! A station processes one job at a time. It is staffed for a fixed shift;
//! work finishing after the shift is overtime, unused minutes inside the
//! shift-plus-overtime window are idle. Both are charged per minute.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use serde::{Deserialize, Serialize};

use super::StationId;

/// A work bay with shift length and cost weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Unique station identifier.
    pub id: StationId,
    /// Regular working time in minutes from the shared origin.
    pub shift_minutes: i64,
    /// Maximum overtime in minutes. `None` = unbounded.
    pub overtime_cap: Option<i64>,
    /// Cost per overtime minute.
    pub tardiness_weight: f64,
    /// Cost per idle minute.
    pub idle_weight: f64,
}

impl Station {
    /// Creates a station with zero weights and no overtime cap.
    pub fn new(id: StationId, shift_minutes: i64) -> Self {
        Self {
            id,
            shift_minutes,
            overtime_cap: None,
            tardiness_weight: 0.0,
            idle_weight: 0.0,
        }
    }

    /// Sets the overtime cap.
    pub fn with_overtime_cap(mut self, cap: i64) -> Self {
        self.overtime_cap = Some(cap);
        self
    }

    /// Sets the overtime (tardiness) and idle weights.
    pub fn with_weights(mut self, tardiness: f64, idle: f64) -> Self {
        self.tardiness_weight = tardiness;
        self.idle_weight = idle;
        self
    }

    /// Longest available window (`shift + cap`), if overtime is capped.
    pub fn max_minutes(&self) -> Option<i64> {
        self.overtime_cap.map(|cap| self.shift_minutes + cap)
    }

    /// Weights rounded to integers after multiplying by `scale`.
    ///
    /// Returns `(tardiness, idle)`.
    pub fn scaled_weights(&self, scale: i64) -> (i64, i64) {
        (
            scale_weight(self.tardiness_weight, scale),
            scale_weight(self.idle_weight, scale),
        )
    }

    /// Monetary cost of the given overtime and idle minutes at unscaled weights.
    pub fn cost(&self, overtime: i64, idle: i64) -> f64 {
        self.tardiness_weight * overtime as f64 + self.idle_weight * idle as f64
    }
}

/// `round(weight × scale)`, half away from zero.
fn scale_weight(weight: f64, scale: i64) -> i64 {
    (weight * scale as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_builder() {
        let s = Station::new(3, 480)
            .with_overtime_cap(60)
            .with_weights(2.0, 1.5);
        assert_eq!(s.id, 3);
        assert_eq!(s.shift_minutes, 480);
        assert_eq!(s.overtime_cap, Some(60));
        assert_eq!(s.max_minutes(), Some(540));
        assert!((s.idle_weight - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_uncapped_station_has_no_max() {
        assert_eq!(Station::new(1, 480).max_minutes(), None);
    }

    #[test]
    fn test_scaled_weights_round() {
        let s = Station::new(1, 0).with_weights(2.04, 0.25);
        assert_eq!(s.scaled_weights(10), (20, 3));
        assert_eq!(s.scaled_weights(100), (204, 25));
    }

    #[test]
    fn test_cost() {
        let s = Station::new(1, 480).with_weights(2.0, 1.0);
        assert!((s.cost(20, 0) - 40.0).abs() < 1e-10);
        assert!((s.cost(0, 30) - 30.0).abs() < 1e-10);
    }
}

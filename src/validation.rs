//! Input validation for shop scheduling payloads.
//!
//! Checks structural integrity of the payload before a model is built.
//! Detects:
//! - Stations without tardiness or idle weight
//! - Negative or non-finite weights
//! - Negative shift lengths and overtime caps
//! - Durations, shift lengths or caps above [`MAX_MINUTES`]
//! - Weight, cap or eligibility entries naming a station absent from `ST`
//! - Eligibility flags other than 0/1
//!
//! A job type without any eligible station is not rejected here; the
//! model reports it as infeasible.

use std::collections::BTreeSet;

use crate::input::ScheduleData;
use crate::models::StationId;

/// Largest accepted duration, shift length or overtime cap (about 1900 years).
///
/// Keeps horizon sums and solver bounds far from `i64` overflow.
pub const MAX_MINUTES: i64 = 1_000_000_000;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A station in `ST` has no tardiness or idle weight.
    MissingWeight,
    /// A weight is negative, NaN or infinite.
    InvalidWeight,
    /// A shift length is negative.
    NegativeShift,
    /// An overtime cap is negative.
    NegativeOvertimeCap,
    /// A duration, shift length or overtime cap exceeds [`MAX_MINUTES`].
    DurationOutOfRange,
    /// An entry references a station absent from `ST`.
    UnknownStation,
    /// An eligibility flag is not 0 or 1.
    InvalidEligibilityFlag,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a scheduling payload.
///
/// Checks:
/// 1. Every station has both weights, and they are finite and non-negative
/// 2. Shift lengths and overtime caps are non-negative; durations, shift
///    lengths and caps do not exceed [`MAX_MINUTES`]
/// 3. Weights, caps and eligibility only name stations listed in `ST`
/// 4. Eligibility flags are 0 or 1
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(data: &ScheduleData) -> ValidationResult {
    let mut errors = Vec::new();
    let stations: BTreeSet<StationId> = data.shift_lengths.keys().copied().collect();

    for (&station, &shift) in &data.shift_lengths {
        if shift < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeShift,
                format!("Station {station} has negative shift length {shift}"),
            ));
        }
        if shift > MAX_MINUTES {
            errors.push(out_of_range(format!("Station {station} shift length {shift}")));
        }
    }

    for (&car, jobs) in &data.durations {
        for (&job, &duration) in jobs {
            if duration > MAX_MINUTES {
                errors.push(out_of_range(format!("Car {car} job {job} duration {duration}")));
            }
        }
    }

    for (table, weights) in [
        ("tardiness", &data.tardiness_weights),
        ("idle", &data.idle_weights),
    ] {
        for &station in &stations {
            match weights.get(&station) {
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::MissingWeight,
                    format!("Station {station} has no {table} weight"),
                )),
                Some(&w) if !w.is_finite() || w < 0.0 => errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidWeight,
                    format!("Station {station} has invalid {table} weight {w}"),
                )),
                Some(_) => {}
            }
        }
        for station in weights.keys().filter(|s| !stations.contains(s)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownStation,
                format!("{table} weight given for unknown station {station}"),
            ));
        }
    }

    if let Some(limits) = &data.overtime_limits {
        for (&station, &cap) in limits {
            if !stations.contains(&station) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownStation,
                    format!("Overtime cap given for unknown station {station}"),
                ));
            }
            if cap < 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeOvertimeCap,
                    format!("Station {station} has negative overtime cap {cap}"),
                ));
            }
            if cap > MAX_MINUTES {
                errors.push(out_of_range(format!("Station {station} overtime cap {cap}")));
            }
        }
    }

    for (&job, row) in &data.eligibility {
        for (&station, &flag) in row {
            if flag != 0 && flag != 1 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidEligibilityFlag,
                    format!("Job {job} at station {station} has eligibility flag {flag}"),
                ));
            }
            if flag != 0 && !stations.contains(&station) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownStation,
                    format!("Job {job} is eligible at unknown station {station}"),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn out_of_range(subject: String) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::DurationOutOfRange,
        format!("{subject} exceeds {MAX_MINUTES} minutes"),
    )
}

//! Solve configuration.
//!
//! All fields have defaults, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! time_limit_secs = 15.0
//! cost_scale = 10
//! greedy_hint = true
//!
//! [report]
//! origin = "2025-01-01T08:00:00"
//! ```

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::cp::SolverConfig;
use crate::error::{Result, ScheduleError};

const DEFAULT_TIME_LIMIT_SECS: f64 = 15.0;
const DEFAULT_COST_SCALE: i64 = 10;

/// Parameters of a single solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Solver wall-clock budget in seconds. `None` = unbounded.
    pub time_limit_secs: Option<f64>,
    /// Multiplier turning fractional weights into integer objective coefficients.
    pub cost_scale: i64,
    /// Seed the solver with the greedy schedule.
    pub greedy_hint: bool,
    pub report: ReportConfig,
}

/// Parameters of the timeline report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Wall-clock time of minute 0.
    pub origin: NaiveDateTime,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: Some(DEFAULT_TIME_LIMIT_SECS),
            cost_scale: DEFAULT_COST_SCALE,
            greedy_hint: true,
            report: ReportConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

fn default_origin() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap_or_default()
}

impl SolveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates a TOML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cost_scale < 1 {
            return Err(ScheduleError::config(format!(
                "cost_scale must be at least 1, got {}",
                self.cost_scale
            )));
        }
        if let Some(secs) = self.time_limit_secs {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ScheduleError::config(format!(
                    "time_limit_secs must be a non-negative number, got {secs}"
                )));
            }
        }
        Ok(())
    }

    /// Sets the time budget in seconds (`None` = unbounded).
    pub fn with_time_limit_secs(mut self, secs: Option<f64>) -> Self {
        self.time_limit_secs = secs;
        self
    }

    pub fn with_cost_scale(mut self, scale: i64) -> Self {
        self.cost_scale = scale;
        self
    }

    pub fn with_greedy_hint(mut self, enabled: bool) -> Self {
        self.greedy_hint = enabled;
        self
    }

    pub fn with_origin(mut self, origin: NaiveDateTime) -> Self {
        self.report.origin = origin;
        self
    }

    /// Backend parameters derived from this configuration.
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::new().with_time_limit_secs(self.time_limit_secs)
    }
}

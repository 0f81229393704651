//! Repair-shop domain models.
//!
//! Provides the data types for a shop scheduling instance and its
//! solution.
//!
//! # Domain Mappings
//!
//! | shop-schedule | Job shop | Meaning |
//! |---------------|----------|---------|
//! | Car | Job | Work order with per-job-type durations |
//! | Job type | Operation | Repair category |
//! | Station | Machine | Bay with shift, overtime cap and cost weights |
//! | Eligibility | Machine eligibility | Stations allowed per job type |
//! | Schedule | Schedule | Chosen station and times per (car, job) |

mod car;
mod eligibility;
mod problem;
mod schedule;
mod station;

pub use car::Car;
pub use eligibility::Eligibility;
pub use problem::ShopProblem;
pub use schedule::{Schedule, ScheduledJob, StationStats};
pub use station::Station;

/// Car identifier.
pub type CarId = u32;
/// Job type identifier.
pub type JobTypeId = u32;
/// Station identifier.
pub type StationId = u32;

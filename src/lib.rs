//! Repair-shop station scheduling.
//!
//! Assigns repair jobs on cars to eligible stations within shift hours,
//! minimizing the weighted overtime and idle cost of every station.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Car`, `Station`, `Eligibility`,
//!   `ShopProblem`, `Schedule`, `ScheduledJob`, `StationStats`
//! - **`input`**: JSON payload (`T`, `I`, `ST`, `OV_limit`, `d`, `e`) and
//!   conversion into a `ShopProblem`
//! - **`validation`**: Payload integrity checks (weights, shifts, caps, station refs)
//! - **`cp`**: Constraint model, solver trait and the bundled MILP backend
//! - **`scheduler`**: Model builder, solution extractor, greedy warm start,
//!   KPIs and the `ShopScheduler` pipeline
//! - **`report`**: Idle gaps, timeline bars and station annotations
//! - **`service`**: JSON request/response facade
//! - **`config`**: `SolveConfig` (time budget, cost scale, hint, report origin)
//!
//! # Example
//!
//! ```
//! use shop_schedule::models::{Car, ShopProblem, Station};
//! use shop_schedule::scheduler::ShopScheduler;
//!
//! let problem = ShopProblem::new()
//!     .with_station(Station::new(1, 480).with_weights(2.0, 1.0))
//!     .with_car(Car::new(1).with_job(1, 300))
//!     .with_car(Car::new(2).with_job(1, 300))
//!     .with_eligible(1, 1);
//!
//! let outcome = ShopScheduler::new().solve(&problem).unwrap();
//! assert_eq!(outcome.station_stats[&1].overtime, 120);
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"

pub mod config;
pub mod cp;
pub mod error;
pub mod input;
pub mod models;
pub mod report;
pub mod scheduler;
pub mod service;
pub mod validation;

pub use error::{Result, ScheduleError};

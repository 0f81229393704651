//! Constraint model and solver seam.
//!
//! The scheduling formulation is written against [`CpModel`], a small
//! solver-independent model with integer variables, optional intervals,
//! enforced linear constraints and no-overlap. Any [`CpSolver`] can solve
//! it; [`MilpSolver`] is the bundled exact backend.
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

mod milp;
mod model;
mod solver;

pub use milp::MilpSolver;
pub use model::{
    BoolVar, Comparison, Constraint, CpModel, IntVar, Interval, IntervalVar, LinearConstraint,
    LinearExpr, VariableDef,
};
pub use solver::{CpSolution, CpSolver, SolverConfig, SolverStatus};

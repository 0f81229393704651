//! MILP backend for [`CpModel`] on top of `microlp`.
//!
//! # Linearization
//!
//! | Model element | Linear form |
//! |---------------|-------------|
//! | `lit ⇒ expr ≥ b` | `expr - M·lit ≥ b - M`, `M = b - min(expr)` |
//! | `lit ⇒ expr ≤ b` | `expr + M·lit ≤ b + M`, `M = max(expr) - b` |
//! | optional interval | `presence ⇒ end - start = size` |
//! | no-overlap pair `i, j` | ordering binary `y`, two big-M disjunction rows relaxed unless both present |
//!
//! Two intervals that share a start variable can never both be present
//! without overlapping, so they get `p_i + p_j ≤ 1` instead of an ordering
//! binary.
//!
//! # Search
//!
//! Depth-first LP-based branch-and-bound. Boolean variables are branched
//! before ordering binaries, which are branched before general integers.
//! Objective coefficients are integral, so a node is pruned as soon as its
//! relaxation bound cannot beat the incumbent by at least one unit. The time
//! budget is checked between nodes; a single LP re-solve is not interrupted.
//!
//! A rounding dive runs from the root relaxation, and again every
//! [`DIVE_INTERVAL`] nodes while no incumbent exists: it fixes the first
//! fractional column to its nearest integer, flips it once if that is
//! infeasible, and gives up on a second failure. Dives find a first schedule
//! quickly when the hint is missing or breaks a constraint.
//!
//! # Reference
//! - Manne (1960), "On the Job-Shop Scheduling Problem", Operations Research 8(2)
//! - Wolsey (1998), "Integer Programming", Ch. 7

use std::collections::BTreeMap;
use std::time::Instant;

use microlp::{ComparisonOp, OptimizationDirection, Problem, Solution, Variable};
use tracing::{debug, info, warn};

use super::model::{
    BoolVar, Comparison, Constraint, CpModel, IntervalVar, LinearConstraint, LinearExpr,
};
use super::solver::{CpSolution, CpSolver, SolverConfig, SolverStatus};

const INTEGRALITY_TOL: f64 = 1e-6;
const BOUND_TOL: f64 = 1e-6;
/// Nodes between rounding dives while no incumbent is known.
const DIVE_INTERVAL: u64 = 256;

/// Exact solver that linearizes the model and runs branch-and-bound.
///
/// Stateless: every call builds its own LP, so one instance may be shared
/// across threads.
///
/// # Example
/// ```
/// use shop_schedule::cp::{CpModel, CpSolver, LinearConstraint, LinearExpr, MilpSolver, SolverConfig, SolverStatus};
///
/// let mut model = CpModel::new("demo");
/// let x = model.new_int_var(0, 10, "x");
/// let y = model.new_int_var(0, 10, "y");
/// model.add_linear(LinearConstraint::greater_eq(LinearExpr::sum([x, y]), 7));
/// model.minimize(LinearExpr::new().term(x, 2).term(y, 3));
///
/// let solution = MilpSolver::new().solve(&model, &SolverConfig::new());
/// assert_eq!(solution.status, SolverStatus::Optimal);
/// assert_eq!(solution.objective, Some(14));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MilpSolver;

impl MilpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for MilpSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let started = Instant::now();
        let deadline = config.time_limit.map(|limit| started + limit);

        if model.variable_count() == 0 {
            let status = if model.is_feasible(&[]) {
                SolverStatus::Optimal
            } else {
                SolverStatus::Infeasible
            };
            let mut solution = CpSolution::without_values(status, 0, started.elapsed());
            if status.has_solution() {
                solution.objective = Some(model.evaluate_objective(&[]));
            }
            return solution;
        }

        let lp = match Linearization::build(model) {
            Ok(lp) => lp,
            Err(BuildError::Infeasible(reason)) => {
                debug!(model = model.name(), %reason, "trivially infeasible");
                return CpSolution::without_values(
                    SolverStatus::Infeasible,
                    0,
                    started.elapsed(),
                );
            }
            Err(BuildError::Invalid(reason)) => {
                warn!(model = model.name(), %reason, "model rejected");
                return CpSolution::without_values(
                    SolverStatus::ModelInvalid,
                    0,
                    started.elapsed(),
                );
            }
        };

        debug!(
            model = model.name(),
            columns = lp.columns.len(),
            rows = lp.rows,
            ordering_binaries = lp.columns.len() - model.variable_count(),
            "linearized model"
        );

        let mut search = Search {
            model,
            lp: &lp,
            deadline,
            incumbent: None,
            nodes: 0,
            dives: 0,
            timed_out: false,
            backend_error: None,
        };
        search.seed_from_hints();

        match lp.problem.solve() {
            Ok(root) => {
                search.dive(&root);
                search.run(root);
            }
            Err(microlp::Error::Infeasible) => {}
            Err(err) => {
                warn!(model = model.name(), error = %err, "root relaxation failed");
                search.backend_error = Some(err.to_string());
            }
        }

        let exhaustive = !search.timed_out && search.backend_error.is_none();
        let status = match (&search.incumbent, exhaustive) {
            (Some(_), true) => SolverStatus::Optimal,
            (Some(_), false) => SolverStatus::Feasible,
            (None, true) => SolverStatus::Infeasible,
            (None, false) if search.timed_out => SolverStatus::Unknown,
            (None, false) => SolverStatus::ModelInvalid,
        };

        let elapsed = started.elapsed();
        info!(
            model = model.name(),
            ?status,
            nodes = search.nodes,
            dives = search.dives,
            elapsed_ms = elapsed.as_millis() as u64,
            objective = search.incumbent.as_ref().map(|inc| inc.objective),
            "search finished"
        );

        match search.incumbent {
            Some(inc) => CpSolution {
                status,
                objective: Some(inc.objective),
                values: inc.values,
                nodes: search.nodes,
                elapsed,
            },
            None => CpSolution::without_values(status, search.nodes, elapsed),
        }
    }
}

enum BuildError {
    Infeasible(String),
    Invalid(String),
}

/// A sparse row over LP column indices.
type Row = BTreeMap<usize, f64>;

struct Linearization {
    problem: Problem,
    /// Model variables first (same index), then ordering binaries.
    columns: Vec<Variable>,
    bounds: Vec<(i64, i64)>,
    /// Columns in branching priority order.
    branch_order: Vec<usize>,
    objective_constant: i64,
    rows: usize,
}

impl Linearization {
    fn build(model: &CpModel) -> Result<Self, BuildError> {
        let mut objective: BTreeMap<usize, i64> = BTreeMap::new();
        for (var, coeff) in model.objective().merged_terms() {
            objective.insert(var.index(), coeff);
        }

        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let mut columns = Vec::with_capacity(model.variable_count());
        let mut bounds = Vec::with_capacity(model.variable_count());
        for (idx, def) in model.variables().iter().enumerate() {
            if def.lb > def.ub {
                return Err(BuildError::Invalid(format!(
                    "{} has empty domain [{}, {}]",
                    def.name, def.lb, def.ub
                )));
            }
            let coeff = objective.get(&idx).copied().unwrap_or(0);
            columns.push(problem.add_var(coeff as f64, (def.lb as f64, def.ub as f64)));
            bounds.push((def.lb, def.ub));
        }

        let mut lp = Self {
            problem,
            columns,
            bounds,
            branch_order: Vec::new(),
            objective_constant: model.objective().constant(),
            rows: 0,
        };

        for iv in model.intervals() {
            if iv.start.index() >= model.variable_count()
                || iv.end.index() >= model.variable_count()
                || iv.presence.index() >= model.variable_count()
            {
                return Err(BuildError::Invalid(format!(
                    "interval {} references unknown variables",
                    iv.name
                )));
            }
            let span = LinearConstraint::equal(
                LinearExpr::new().term(iv.end, 1).term(iv.start, -1),
                iv.size,
            );
            lp.add_enforced(iv.presence, &span)?;
        }

        let mut ordering = Vec::new();
        for constraint in model.constraints() {
            match constraint {
                Constraint::Linear(c) => lp.add_linear(c)?,
                Constraint::Enforced {
                    literal,
                    constraint,
                } => lp.add_enforced(*literal, constraint)?,
                Constraint::NoOverlap(ivs) => lp.add_no_overlap(model, ivs, &mut ordering)?,
            }
        }

        let (booleans, integers): (Vec<usize>, Vec<usize>) = (0..model.variable_count())
            .filter(|&idx| lp.bounds[idx].0 < lp.bounds[idx].1)
            .partition(|&idx| model.variables()[idx].is_boolean());
        lp.branch_order = booleans
            .into_iter()
            .chain(ordering)
            .chain(integers)
            .collect();

        Ok(lp)
    }

    fn min_activity(&self, row: &Row) -> f64 {
        row.iter()
            .map(|(&col, &coeff)| {
                let (lb, ub) = self.bounds[col];
                if coeff >= 0.0 {
                    coeff * lb as f64
                } else {
                    coeff * ub as f64
                }
            })
            .sum()
    }

    fn max_activity(&self, row: &Row) -> f64 {
        row.iter()
            .map(|(&col, &coeff)| {
                let (lb, ub) = self.bounds[col];
                if coeff >= 0.0 {
                    coeff * ub as f64
                } else {
                    coeff * lb as f64
                }
            })
            .sum()
    }

    /// Converts a model constraint into a row and the constant-adjusted rhs.
    fn to_row(&self, constraint: &LinearConstraint) -> Result<(Row, f64), BuildError> {
        let mut row = Row::new();
        for (var, coeff) in constraint.expr.merged_terms() {
            if var.index() >= self.bounds.len() {
                return Err(BuildError::Invalid(format!(
                    "constraint references unknown variable #{}",
                    var.index()
                )));
            }
            row.insert(var.index(), coeff as f64);
        }
        Ok((row, (constraint.rhs - constraint.expr.constant()) as f64))
    }

    fn push_row(&mut self, row: Row, op: ComparisonOp, rhs: f64) -> Result<(), BuildError> {
        let row: Row = row.into_iter().filter(|&(_, c)| c != 0.0).collect();
        if row.is_empty() {
            let holds = match op {
                ComparisonOp::Le => 0.0 <= rhs,
                ComparisonOp::Eq => rhs == 0.0,
                ComparisonOp::Ge => 0.0 >= rhs,
            };
            return if holds {
                Ok(())
            } else {
                Err(BuildError::Infeasible(format!(
                    "constant row violates rhs {rhs}"
                )))
            };
        }
        let columns = &self.columns;
        self.problem.add_constraint(
            row.iter()
                .map(|(&col, &coeff)| (columns[col], coeff))
                .collect::<Vec<_>>(),
            op,
            rhs,
        );
        self.rows += 1;
        Ok(())
    }

    fn add_linear(&mut self, constraint: &LinearConstraint) -> Result<(), BuildError> {
        let (row, rhs) = self.to_row(constraint)?;
        let op = match constraint.cmp {
            Comparison::Le => ComparisonOp::Le,
            Comparison::Eq => ComparisonOp::Eq,
            Comparison::Ge => ComparisonOp::Ge,
        };
        self.push_row(row, op, rhs)
    }

    fn add_enforced(
        &mut self,
        literal: BoolVar,
        constraint: &LinearConstraint,
    ) -> Result<(), BuildError> {
        let lit = literal.index();
        if lit >= self.bounds.len() {
            return Err(BuildError::Invalid(format!(
                "enforcement literal #{lit} is unknown"
            )));
        }
        let (row, rhs) = self.to_row(constraint)?;

        if matches!(constraint.cmp, Comparison::Ge | Comparison::Eq) {
            let big_m = rhs - self.min_activity(&row);
            if big_m > 0.0 {
                let mut relaxed = row.clone();
                *relaxed.entry(lit).or_insert(0.0) -= big_m;
                self.push_row(relaxed, ComparisonOp::Ge, rhs - big_m)?;
            }
        }
        if matches!(constraint.cmp, Comparison::Le | Comparison::Eq) {
            let big_m = self.max_activity(&row) - rhs;
            if big_m > 0.0 {
                let mut relaxed = row;
                *relaxed.entry(lit).or_insert(0.0) += big_m;
                self.push_row(relaxed, ComparisonOp::Le, rhs + big_m)?;
            }
        }
        Ok(())
    }

    fn add_no_overlap(
        &mut self,
        model: &CpModel,
        ivs: &[IntervalVar],
        ordering: &mut Vec<usize>,
    ) -> Result<(), BuildError> {
        for iv in ivs {
            if iv.index() >= model.interval_count() {
                return Err(BuildError::Invalid(format!(
                    "no-overlap references unknown interval #{}",
                    iv.index()
                )));
            }
        }

        for (pos, &first) in ivs.iter().enumerate() {
            for &second in &ivs[pos + 1..] {
                let a = model.interval(first);
                let b = model.interval(second);
                if a.size <= 0 || b.size <= 0 {
                    continue;
                }
                let (pa, pb) = (a.presence.index(), b.presence.index());

                if a.start == b.start {
                    let mut row = Row::new();
                    *row.entry(pa).or_insert(0.0) += 1.0;
                    *row.entry(pb).or_insert(0.0) += 1.0;
                    self.push_row(row, ComparisonOp::Le, 1.0)?;
                    continue;
                }

                let (a_start, a_end) = (a.start.index(), a.end.index());
                let (b_start, b_end) = (b.start.index(), b.end.index());
                let big_m = (self.bounds[a_end].1 - self.bounds[b_start].0)
                    .max(self.bounds[b_end].1 - self.bounds[a_start].0)
                    .max(1) as f64;

                let y = self.columns.len();
                self.columns.push(self.problem.add_var(0.0, (0.0, 1.0)));
                self.bounds.push((0, 1));
                ordering.push(y);

                // y = 1: a before b.
                let mut before = Row::new();
                *before.entry(a_end).or_insert(0.0) += 1.0;
                *before.entry(b_start).or_insert(0.0) -= 1.0;
                *before.entry(y).or_insert(0.0) += big_m;
                *before.entry(pa).or_insert(0.0) += big_m;
                *before.entry(pb).or_insert(0.0) += big_m;
                self.push_row(before, ComparisonOp::Le, 3.0 * big_m)?;

                // y = 0: b before a.
                let mut after = Row::new();
                *after.entry(b_end).or_insert(0.0) += 1.0;
                *after.entry(a_start).or_insert(0.0) -= 1.0;
                *after.entry(y).or_insert(0.0) -= big_m;
                *after.entry(pa).or_insert(0.0) += big_m;
                *after.entry(pb).or_insert(0.0) += big_m;
                self.push_row(after, ComparisonOp::Le, 2.0 * big_m)?;
            }
        }
        Ok(())
    }
}

struct Incumbent {
    objective: i64,
    values: Vec<i64>,
}

struct Search<'a> {
    model: &'a CpModel,
    lp: &'a Linearization,
    deadline: Option<Instant>,
    incumbent: Option<Incumbent>,
    nodes: u64,
    dives: u64,
    timed_out: bool,
    backend_error: Option<String>,
}

impl Search<'_> {
    fn seed_from_hints(&mut self) {
        let Some(values) = self.model.hint_assignment() else {
            return;
        };
        match self.model.first_violation(&values) {
            None => {
                let objective = self.model.evaluate_objective(&values);
                debug!(objective, "hint accepted as initial incumbent");
                self.incumbent = Some(Incumbent { objective, values });
            }
            Some(reason) => warn!(%reason, "hint rejected"),
        }
    }

    fn budget_exhausted(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn is_dominated(&self, relaxation: f64) -> bool {
        let bound = relaxation + self.lp.objective_constant as f64;
        self.incumbent
            .as_ref()
            .is_some_and(|inc| bound > inc.objective as f64 - 1.0 + BOUND_TOL)
    }

    fn run(&mut self, root: Solution) {
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if self.budget_exhausted() {
                self.timed_out = true;
                break;
            }
            self.nodes += 1;

            if self.is_dominated(node.objective()) {
                continue;
            }
            if self.incumbent.is_none() && self.nodes % DIVE_INTERVAL == 0 {
                self.dive(&node);
            }

            let Some((col, value)) = self.fractional_column(&node) else {
                self.offer(&node);
                continue;
            };

            let var = self.lp.columns[col];
            let down = (ComparisonOp::Le, value.floor());
            let up = (ComparisonOp::Ge, value.ceil());
            // The branch nearer the relaxed value is explored first, so it is pushed last.
            let (later, first) = if value - value.floor() <= 0.5 {
                (up, down)
            } else {
                (down, up)
            };
            for (op, bound) in [later, first] {
                match node.clone().add_constraint(&[(var, 1.0)], op, bound) {
                    Ok(child) => stack.push(child),
                    Err(microlp::Error::Infeasible) => {}
                    Err(err) => {
                        warn!(error = %err, "branch re-solve failed");
                        self.backend_error = Some(err.to_string());
                    }
                }
            }
        }
    }

    /// Rounds towards an integral leaf from `from`, offering it if reached.
    fn dive(&mut self, from: &Solution) {
        self.dives += 1;
        let mut node = from.clone();
        loop {
            if self.budget_exhausted() || self.is_dominated(node.objective()) {
                return;
            }
            let Some((col, value)) = self.fractional_column(&node) else {
                self.offer(&node);
                return;
            };

            let var = self.lp.columns[col];
            let down = (ComparisonOp::Le, value.floor());
            let up = (ComparisonOp::Ge, value.ceil());
            let (nearest, other) = if value - value.floor() <= 0.5 {
                (down, up)
            } else {
                (up, down)
            };
            node = match node.clone().add_constraint(&[(var, 1.0)], nearest.0, nearest.1) {
                Ok(child) => child,
                Err(microlp::Error::Infeasible) => {
                    match node.add_constraint(&[(var, 1.0)], other.0, other.1) {
                        Ok(child) => child,
                        Err(_) => {
                            debug!(dive = self.dives, "dive abandoned");
                            return;
                        }
                    }
                }
                Err(err) => {
                    debug!(error = %err, "dive re-solve failed");
                    return;
                }
            };
        }
    }

    fn fractional_column(&self, node: &Solution) -> Option<(usize, f64)> {
        self.lp.branch_order.iter().find_map(|&col| {
            let value = *node.var_value(self.lp.columns[col]);
            let frac = value - value.floor();
            (frac > INTEGRALITY_TOL && frac < 1.0 - INTEGRALITY_TOL).then_some((col, value))
        })
    }

    fn offer(&mut self, node: &Solution) {
        let values: Vec<i64> = (0..self.model.variable_count())
            .map(|idx| node.var_value(self.lp.columns[idx]).round() as i64)
            .collect();

        if let Some(reason) = self.model.first_violation(&values) {
            debug!(%reason, "integral relaxation failed exact check");
            return;
        }

        let objective = self.model.evaluate_objective(&values);
        if self
            .incumbent
            .as_ref()
            .is_none_or(|inc| objective < inc.objective)
        {
            debug!(objective, nodes = self.nodes, "new incumbent");
            self.incumbent = Some(Incumbent { objective, values });
        }
    }
}

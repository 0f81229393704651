//! Constraint model representation.
//!
//! A `CpModel` is a solver-independent description of a combinatorial
//! problem: bounded integer variables, boolean literals, optional interval
//! variables, linear constraints (optionally enforced by a literal),
//! no-overlap constraints and a linear objective to minimize.
//!
//! All coefficients are integers. Values are assigned as `i64`; a boolean
//! is an integer variable with domain `[0, 1]`.
//!
//! # Reference
//! Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling", Sec. 3

use std::collections::BTreeMap;

/// Handle to a bounded integer variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntVar(pub(crate) usize);

impl IntVar {
    /// Position of the variable in the model (creation order).
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a boolean variable (an integer variable over `[0, 1]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoolVar(pub(crate) IntVar);

impl BoolVar {
    /// The underlying 0/1 integer variable.
    #[inline]
    pub fn as_int(self) -> IntVar {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 .0
    }
}

impl From<BoolVar> for IntVar {
    fn from(lit: BoolVar) -> Self {
        lit.0
    }
}

/// Handle to an optional interval variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntervalVar(pub(crate) usize);

impl IntervalVar {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Declared domain of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDef {
    /// Debug name.
    pub name: String,
    /// Inclusive lower bound.
    pub lb: i64,
    /// Inclusive upper bound.
    pub ub: i64,
}

impl VariableDef {
    /// Whether the domain is `[0, 1]`.
    pub fn is_boolean(&self) -> bool {
        self.lb == 0 && self.ub == 1
    }
}

/// An optional interval `[start, end)` of fixed size.
///
/// When `presence` is true, `end == start + size` holds and the interval
/// takes part in every no-overlap constraint listing it. When `presence`
/// is false the interval is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub name: String,
    pub start: IntVar,
    pub size: i64,
    pub end: IntVar,
    pub presence: BoolVar,
}

/// A linear expression `Σ coeff·var + constant` with integer coefficients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(IntVar, i64)>,
    constant: i64,
}

impl LinearExpr {
    /// Creates the empty expression (value 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of variables with unit coefficients.
    pub fn sum<V: Into<IntVar>>(vars: impl IntoIterator<Item = V>) -> Self {
        Self::weighted_sum(vars.into_iter().map(|v| (v, 1)))
    }

    /// Sum of `coeff·var` terms.
    pub fn weighted_sum<V: Into<IntVar>>(terms: impl IntoIterator<Item = (V, i64)>) -> Self {
        let mut expr = Self::new();
        for (var, coeff) in terms {
            expr.add_term(var, coeff);
        }
        expr
    }

    /// Adds a term (builder form).
    pub fn term(mut self, var: impl Into<IntVar>, coeff: i64) -> Self {
        self.add_term(var, coeff);
        self
    }

    /// Adds a constant offset (builder form).
    pub fn plus(mut self, constant: i64) -> Self {
        self.constant += constant;
        self
    }

    /// Adds a term in place.
    pub fn add_term(&mut self, var: impl Into<IntVar>, coeff: i64) {
        self.terms.push((var.into(), coeff));
    }

    /// Raw terms, possibly with repeated variables.
    pub fn terms(&self) -> &[(IntVar, i64)] {
        &self.terms
    }

    /// Constant offset.
    pub fn constant(&self) -> i64 {
        self.constant
    }

    /// Terms with repeated variables merged and zero coefficients removed,
    /// in variable order.
    pub fn merged_terms(&self) -> Vec<(IntVar, i64)> {
        let mut merged: BTreeMap<IntVar, i64> = BTreeMap::new();
        for &(var, coeff) in &self.terms {
            *merged.entry(var).or_insert(0) += coeff;
        }
        merged.into_iter().filter(|&(_, c)| c != 0).collect()
    }

    /// Evaluates the expression under a full assignment.
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|&(var, coeff)| coeff * values[var.0])
            .sum::<i64>()
            + self.constant
    }
}

impl From<IntVar> for LinearExpr {
    fn from(var: IntVar) -> Self {
        Self::new().term(var, 1)
    }
}

impl From<BoolVar> for LinearExpr {
    fn from(lit: BoolVar) -> Self {
        Self::new().term(lit, 1)
    }
}

/// Relation between the two sides of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Le,
    Eq,
    Ge,
}

/// `expr (≤ | = | ≥) rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: i64,
}

impl LinearConstraint {
    pub fn less_eq(expr: impl Into<LinearExpr>, rhs: i64) -> Self {
        Self {
            expr: expr.into(),
            cmp: Comparison::Le,
            rhs,
        }
    }

    pub fn equal(expr: impl Into<LinearExpr>, rhs: i64) -> Self {
        Self {
            expr: expr.into(),
            cmp: Comparison::Eq,
            rhs,
        }
    }

    pub fn greater_eq(expr: impl Into<LinearExpr>, rhs: i64) -> Self {
        Self {
            expr: expr.into(),
            cmp: Comparison::Ge,
            rhs,
        }
    }

    /// Whether the constraint holds under a full assignment.
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.cmp {
            Comparison::Le => lhs <= self.rhs,
            Comparison::Eq => lhs == self.rhs,
            Comparison::Ge => lhs >= self.rhs,
        }
    }
}

/// A model constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Unconditional linear constraint.
    Linear(LinearConstraint),
    /// `literal ⇒ constraint`; nothing is required when the literal is false.
    Enforced {
        literal: BoolVar,
        constraint: LinearConstraint,
    },
    /// Present intervals in the list are pairwise disjoint.
    NoOverlap(Vec<IntervalVar>),
}

/// A solver-independent constraint model.
///
/// # Example
/// ```
/// use shop_schedule::cp::{CpModel, LinearConstraint, LinearExpr};
///
/// let mut model = CpModel::new("demo");
/// let x = model.new_int_var(0, 10, "x");
/// let b = model.new_bool_var("b");
/// model.add_enforced(b, LinearConstraint::greater_eq(x, 4));
/// model.add_linear(LinearConstraint::equal(b, 1));
/// model.minimize(LinearExpr::from(x));
///
/// assert!(model.is_feasible(&[4, 1]));
/// assert!(!model.is_feasible(&[3, 1]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    name: String,
    variables: Vec<VariableDef>,
    intervals: Vec<Interval>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
    hints: BTreeMap<IntVar, i64>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an integer variable over `[lb, ub]`.
    pub fn new_int_var(&mut self, lb: i64, ub: i64, name: impl Into<String>) -> IntVar {
        let var = IntVar(self.variables.len());
        self.variables.push(VariableDef {
            name: name.into(),
            lb,
            ub,
        });
        var
    }

    /// Creates a boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        BoolVar(self.new_int_var(0, 1, name))
    }

    /// Creates an optional interval of fixed `size` between `start` and `end`,
    /// active only when `presence` is true.
    pub fn new_optional_interval(
        &mut self,
        start: IntVar,
        size: i64,
        end: IntVar,
        presence: BoolVar,
        name: impl Into<String>,
    ) -> IntervalVar {
        let iv = IntervalVar(self.intervals.len());
        self.intervals.push(Interval {
            name: name.into(),
            start,
            size,
            end,
            presence,
        });
        iv
    }

    pub fn add_linear(&mut self, constraint: LinearConstraint) {
        self.constraints.push(Constraint::Linear(constraint));
    }

    /// Exactly one of `literals` is true. An empty list is unsatisfiable.
    pub fn add_exactly_one(&mut self, literals: &[BoolVar]) {
        self.add_linear(LinearConstraint::equal(
            LinearExpr::sum(literals.iter().copied()),
            1,
        ));
    }

    /// Adds `literal ⇒ constraint`.
    pub fn add_enforced(&mut self, literal: BoolVar, constraint: LinearConstraint) {
        self.constraints.push(Constraint::Enforced {
            literal,
            constraint,
        });
    }

    /// Present intervals among `intervals` must not overlap.
    pub fn add_no_overlap(&mut self, intervals: Vec<IntervalVar>) {
        self.constraints.push(Constraint::NoOverlap(intervals));
    }

    /// Sets the objective to minimize (replaces any previous one).
    pub fn minimize(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    /// Suggests a value for a variable. Solvers may ignore hints.
    pub fn add_hint(&mut self, var: impl Into<IntVar>, value: i64) {
        self.hints.insert(var.into(), value);
    }

    pub fn variable(&self, var: IntVar) -> &VariableDef {
        &self.variables[var.0]
    }

    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    pub fn interval(&self, iv: IntervalVar) -> &Interval {
        &self.intervals[iv.0]
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn hints(&self) -> &BTreeMap<IntVar, i64> {
        &self.hints
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// The hinted values as a full assignment, if every variable is hinted.
    pub fn hint_assignment(&self) -> Option<Vec<i64>> {
        if self.hints.len() != self.variables.len() {
            return None;
        }
        Some(self.hints.values().copied().collect())
    }

    /// Objective value under a full assignment.
    pub fn evaluate_objective(&self, values: &[i64]) -> i64 {
        self.objective.evaluate(values)
    }

    /// Whether a full assignment satisfies domains and every constraint.
    pub fn is_feasible(&self, values: &[i64]) -> bool {
        self.first_violation(values).is_none()
    }

    /// Describes the first violated domain or constraint, if any.
    pub fn first_violation(&self, values: &[i64]) -> Option<String> {
        if values.len() != self.variables.len() {
            return Some(format!(
                "assignment has {} values for {} variables",
                values.len(),
                self.variables.len()
            ));
        }

        for (def, &value) in self.variables.iter().zip(values) {
            if value < def.lb || value > def.ub {
                return Some(format!(
                    "{} = {} outside [{}, {}]",
                    def.name, value, def.lb, def.ub
                ));
            }
        }

        for iv in &self.intervals {
            if values[iv.presence.index()] == 1
                && values[iv.end.0] != values[iv.start.0] + iv.size
            {
                return Some(format!("interval {} has inconsistent end", iv.name));
            }
        }

        for (idx, constraint) in self.constraints.iter().enumerate() {
            let holds = match constraint {
                Constraint::Linear(c) => c.is_satisfied(values),
                Constraint::Enforced {
                    literal,
                    constraint,
                } => values[literal.index()] == 0 || constraint.is_satisfied(values),
                Constraint::NoOverlap(ivs) => self.is_disjoint(ivs, values),
            };
            if !holds {
                return Some(format!("constraint #{idx} violated: {constraint:?}"));
            }
        }

        None
    }

    fn is_disjoint(&self, ivs: &[IntervalVar], values: &[i64]) -> bool {
        let mut present: Vec<(i64, i64)> = ivs
            .iter()
            .map(|&iv| &self.intervals[iv.0])
            .filter(|iv| values[iv.presence.index()] == 1 && iv.size > 0)
            .map(|iv| (values[iv.start.0], values[iv.end.0]))
            .collect();
        present.sort_unstable();
        present.windows(2).all(|w| w[0].1 <= w[1].0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_expr_merge_and_evaluate() {
        let mut model = CpModel::new("t");
        let x = model.new_int_var(0, 10, "x");
        let y = model.new_int_var(0, 10, "y");

        let expr = LinearExpr::new().term(x, 2).term(y, 3).term(x, -2).plus(5);
        assert_eq!(expr.merged_terms(), vec![(y, 3)]);
        assert_eq!(expr.evaluate(&[7, 2]), 11);
    }

    #[test]
    fn test_exactly_one() {
        let mut model = CpModel::new("t");
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        model.add_exactly_one(&[a, b]);

        assert!(model.is_feasible(&[1, 0]));
        assert!(model.is_feasible(&[0, 1]));
        assert!(!model.is_feasible(&[1, 1]));
        assert!(!model.is_feasible(&[0, 0]));
    }

    #[test]
    fn test_empty_exactly_one_is_unsatisfiable() {
        let mut model = CpModel::new("t");
        model.add_exactly_one(&[]);
        assert!(!model.is_feasible(&[]));
    }

    #[test]
    fn test_enforced_constraint_only_when_literal_true() {
        let mut model = CpModel::new("t");
        let x = model.new_int_var(0, 10, "x");
        let b = model.new_bool_var("b");
        model.add_enforced(b, LinearConstraint::greater_eq(x, 5));

        assert!(model.is_feasible(&[0, 0]));
        assert!(!model.is_feasible(&[0, 1]));
        assert!(model.is_feasible(&[5, 1]));
    }

    #[test]
    fn test_no_overlap_ignores_absent_intervals() {
        let mut model = CpModel::new("t");
        let s1 = model.new_int_var(0, 20, "s1");
        let e1 = model.new_int_var(0, 20, "e1");
        let p1 = model.new_bool_var("p1");
        let s2 = model.new_int_var(0, 20, "s2");
        let e2 = model.new_int_var(0, 20, "e2");
        let p2 = model.new_bool_var("p2");
        let i1 = model.new_optional_interval(s1, 5, e1, p1, "i1");
        let i2 = model.new_optional_interval(s2, 5, e2, p2, "i2");
        model.add_no_overlap(vec![i1, i2]);

        // Overlapping but second absent.
        assert!(model.is_feasible(&[0, 5, 1, 2, 7, 0]));
        // Overlapping and both present.
        assert!(!model.is_feasible(&[0, 5, 1, 2, 7, 1]));
        // Touching is fine (closed-open).
        assert!(model.is_feasible(&[0, 5, 1, 5, 10, 1]));
    }

    #[test]
    fn test_interval_end_consistency() {
        let mut model = CpModel::new("t");
        let s = model.new_int_var(0, 20, "s");
        let e = model.new_int_var(0, 20, "e");
        let p = model.new_bool_var("p");
        model.new_optional_interval(s, 4, e, p, "i");

        assert!(model.is_feasible(&[1, 5, 1]));
        assert!(!model.is_feasible(&[1, 6, 1]));
        assert!(model.is_feasible(&[1, 6, 0]));
    }

    #[test]
    fn test_domain_violation() {
        let mut model = CpModel::new("t");
        model.new_int_var(2, 4, "x");
        assert!(model.first_violation(&[5]).is_some());
        assert!(model.first_violation(&[3]).is_none());
    }

    #[test]
    fn test_hint_assignment_requires_all_variables() {
        let mut model = CpModel::new("t");
        let x = model.new_int_var(0, 3, "x");
        let y = model.new_int_var(0, 3, "y");
        model.add_hint(y, 2);
        assert!(model.hint_assignment().is_none());
        model.add_hint(x, 1);
        assert_eq!(model.hint_assignment(), Some(vec![1, 2]));
    }
}

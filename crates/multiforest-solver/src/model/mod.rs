//! The LP model shared by every builder.
//!
//! A [`ModelContext`] owns all variables, rows and the objective function.
//! Builders receive it as `&mut ModelContext` and keep the returned
//! [`VarId`] / [`RowId`] handles, so rows can later be re-bounded or have
//! their coefficients refreshed without rebuilding anything. Row names are
//! unique, which lets a builder look up a row it created in an earlier call.
//!
//! Solving lowers the model into an [`LpBackend`]; the objective is always
//! maximized.

mod backend;
mod expr;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use multiforest_core::{MultiforestError, Result};
use tracing::{info, warn};

pub use backend::{LpBackend, LpSolution, MicroLpBackend, SolveStatus};
pub use expr::LinearExpr;

/// Handle of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a model row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(usize);

impl RowId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A bounded continuous variable.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    lower: f64,
    upper: f64,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }
}

/// `lower ≤ Σ c·x ≤ upper`.
#[derive(Debug, Clone)]
pub struct Row {
    name: String,
    terms: BTreeMap<VarId, f64>,
    lower: f64,
    upper: f64,
}

impl Row {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn terms(&self) -> &BTreeMap<VarId, f64> {
        &self.terms
    }

    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Both bounds infinite.
    pub fn is_free(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }
}

/// Owner of the LP model and of the last solution.
#[derive(Debug, Default)]
pub struct ModelContext {
    variables: Vec<Variable>,
    rows: Vec<Row>,
    row_names: HashMap<String, RowId>,
    objective: BTreeMap<VarId, f64>,
    last: Option<LpSolution>,
}

impl ModelContext {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    pub fn add_variable(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Variable {
            name: name.into(),
            lower,
            upper,
        });
        id
    }

    /// Adds a variable with infinite bounds.
    pub fn add_free_variable(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(name, f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.0]
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Looks a variable up by name with a linear scan.
    pub fn find_variable(&self, name: &str) -> Option<VarId> {
        self.variables
            .iter()
            .position(|v| v.name == name)
            .map(VarId)
    }

    pub fn set_variable_upper(&mut self, var: VarId, upper: f64) {
        self.variables[var.0].upper = upper;
    }

    // ------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------

    /// Adds `lower ≤ expr ≤ upper`. The expression's constant is moved into
    /// the bounds.
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` if a row with the same name exists.
    pub fn add_row(
        &mut self,
        name: impl Into<String>,
        expr: &LinearExpr,
        lower: f64,
        upper: f64,
    ) -> Result<RowId> {
        let name = name.into();
        if self.row_names.contains_key(&name) {
            return Err(MultiforestError::InvalidDefinition(format!(
                "row '{name}' already exists"
            )));
        }
        let id = RowId(self.rows.len());
        let constant = expr.constant();
        self.rows.push(Row {
            name: name.clone(),
            terms: expr.merged_terms(),
            lower: lower - constant,
            upper: upper - constant,
        });
        self.row_names.insert(name, id);
        Ok(id)
    }

    /// `expr = rhs`.
    pub fn add_equality(
        &mut self,
        name: impl Into<String>,
        expr: &LinearExpr,
        rhs: f64,
    ) -> Result<RowId> {
        self.add_row(name, expr, rhs, rhs)
    }

    /// `expr ≤ rhs`.
    pub fn add_less_equal(
        &mut self,
        name: impl Into<String>,
        expr: &LinearExpr,
        rhs: f64,
    ) -> Result<RowId> {
        self.add_row(name, expr, f64::NEG_INFINITY, rhs)
    }

    /// `expr ≥ rhs`.
    pub fn add_greater_equal(
        &mut self,
        name: impl Into<String>,
        expr: &LinearExpr,
        rhs: f64,
    ) -> Result<RowId> {
        self.add_row(name, expr, rhs, f64::INFINITY)
    }

    pub fn row(&self, row: RowId) -> &Row {
        &self.rows[row.0]
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn find_row(&self, name: &str) -> Option<RowId> {
        self.row_names.get(name).copied()
    }

    pub fn set_row_bounds(&mut self, row: RowId, lower: f64, upper: f64) {
        let r = &mut self.rows[row.0];
        r.lower = lower;
        r.upper = upper;
    }

    pub fn set_row_lower(&mut self, row: RowId, lower: f64) {
        self.rows[row.0].lower = lower;
    }

    pub fn set_row_upper(&mut self, row: RowId, upper: f64) {
        self.rows[row.0].upper = upper;
    }

    /// Makes the row inactive without removing it.
    pub fn relax_row(&mut self, row: RowId) {
        self.set_row_bounds(row, f64::NEG_INFINITY, f64::INFINITY);
    }

    /// Sets one coefficient; zero removes the term.
    pub fn set_row_coefficient(&mut self, row: RowId, var: VarId, coefficient: f64) {
        let terms = &mut self.rows[row.0].terms;
        if coefficient == 0.0 {
            terms.remove(&var);
        } else {
            terms.insert(var, coefficient);
        }
    }

    /// Replaces every term of a row.
    pub fn set_row_terms(&mut self, row: RowId, expr: &LinearExpr) {
        self.rows[row.0].terms = expr.merged_terms();
    }

    // ------------------------------------------------------------------
    // Objective
    // ------------------------------------------------------------------

    pub fn clear_objective(&mut self) {
        self.objective.clear();
    }

    pub fn set_objective_coefficient(&mut self, var: VarId, coefficient: f64) {
        if coefficient == 0.0 {
            self.objective.remove(&var);
        } else {
            self.objective.insert(var, coefficient);
        }
    }

    /// Adds to the current coefficient of `var`.
    pub fn add_objective_coefficient(&mut self, var: VarId, coefficient: f64) {
        let current = self.objective_coefficient(var);
        self.set_objective_coefficient(var, current + coefficient);
    }

    pub fn objective_coefficient(&self, var: VarId) -> f64 {
        self.objective.get(&var).copied().unwrap_or(0.0)
    }

    pub(crate) fn objective_coefficient_at(&self, index: usize) -> f64 {
        self.objective_coefficient(VarId(index))
    }

    // ------------------------------------------------------------------
    // Solving
    // ------------------------------------------------------------------

    /// Solves the model with `backend` and remembers the result.
    pub fn solve(&mut self, backend: &dyn LpBackend) -> SolveStatus {
        info!(
            event = "solve_start",
            backend = backend.name(),
            variables = self.variables.len(),
            rows = self.rows.len(),
        );
        let start = Instant::now();
        let solution = backend.solve(self);
        let duration_ms = start.elapsed().as_millis() as u64;
        let status = solution.status;
        if status.is_optimal() {
            info!(
                event = "solve_end",
                status = %status,
                objective = solution.objective,
                duration_ms,
            );
        } else {
            warn!(event = "solve_end", status = %status, duration_ms);
        }
        self.last = Some(solution);
        status
    }

    /// Status of the last solve.
    pub fn status(&self) -> SolveStatus {
        self.last
            .as_ref()
            .map_or(SolveStatus::NotSolved, |s| s.status)
    }

    /// Value of a variable in the last optimal solution.
    pub fn value(&self, var: VarId) -> Option<f64> {
        self.last
            .as_ref()
            .filter(|s| s.status.is_optimal())
            .and_then(|s| s.values.get(var.0).copied())
    }

    /// Objective value of the last optimal solution.
    pub fn objective_value(&self) -> Option<f64> {
        self.last
            .as_ref()
            .filter(|s| s.status.is_optimal())
            .map(|s| s.objective)
    }

    /// Value of an expression in the last optimal solution.
    pub fn evaluate(&self, expr: &LinearExpr) -> Option<f64> {
        let values = &self.last.as_ref().filter(|s| s.status.is_optimal())?.values;
        Some(expr.evaluate(|var| values.get(var.0).copied().unwrap_or(0.0)))
    }
}

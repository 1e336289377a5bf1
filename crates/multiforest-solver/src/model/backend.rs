//! LP backends.

use std::fmt;

use microlp::{ComparisonOp, OptimizationDirection, Problem};
use tracing::debug;

use super::{ModelContext, Row};

/// Termination status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The backend failed for another reason.
    Abnormal,
    /// No solve has happened yet.
    NotSolved,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        self == SolveStatus::Optimal
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Abnormal => "abnormal",
            SolveStatus::NotSolved => "not_solved",
        };
        f.write_str(s)
    }
}

/// Raw result of a backend solve, indexed like the model's variables.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub status: SolveStatus,
    /// One value per model variable; empty unless optimal.
    pub values: Vec<f64>,
    pub objective: f64,
}

impl LpSolution {
    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: f64::NAN,
        }
    }
}

/// A linear programming solver.
///
/// The model's objective is always maximized.
pub trait LpBackend {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &ModelContext) -> LpSolution;
}

/// Backend on the pure-Rust `microlp` simplex solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

/// Rows whose terms all vanished are checked against this slack instead of
/// being handed to the solver.
const EMPTY_ROW_TOLERANCE: f64 = 1e-9;

impl MicroLpBackend {
    pub fn new() -> Self {
        Self
    }

    fn empty_row_is_feasible(row: &Row) -> bool {
        row.lower() <= EMPTY_ROW_TOLERANCE && row.upper() >= -EMPTY_ROW_TOLERANCE
    }
}

impl LpBackend for MicroLpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, model: &ModelContext) -> LpSolution {
        let mut problem = Problem::new(OptimizationDirection::Maximize);
        let vars: Vec<microlp::Variable> = model
            .variables()
            .iter()
            .enumerate()
            .map(|(i, v)| problem.add_var(model.objective_coefficient_at(i), (v.lower(), v.upper())))
            .collect();

        let mut lowered = 0usize;
        for row in model.rows() {
            if row.terms().is_empty() {
                if Self::empty_row_is_feasible(row) {
                    continue;
                }
                debug!(event = "empty_row_infeasible", row = row.name());
                return LpSolution::failed(SolveStatus::Infeasible);
            }
            let expr = || {
                let mut expr = microlp::LinearExpr::empty();
                for (var, c) in row.terms() {
                    expr.add(vars[var.index()], *c);
                }
                expr
            };
            if row.lower() == row.upper() {
                problem.add_constraint(expr(), ComparisonOp::Eq, row.lower());
                lowered += 1;
                continue;
            }
            if row.lower().is_finite() {
                problem.add_constraint(expr(), ComparisonOp::Ge, row.lower());
                lowered += 1;
            }
            if row.upper().is_finite() {
                problem.add_constraint(expr(), ComparisonOp::Le, row.upper());
                lowered += 1;
            }
        }
        debug!(
            event = "lp_lowered",
            backend = self.name(),
            variables = vars.len(),
            constraints = lowered,
        );

        match problem.solve() {
            Ok(solution) => LpSolution {
                status: SolveStatus::Optimal,
                values: vars.iter().map(|v| solution[*v]).collect(),
                objective: solution.objective(),
            },
            Err(microlp::Error::Infeasible) => LpSolution::failed(SolveStatus::Infeasible),
            Err(microlp::Error::Unbounded) => LpSolution::failed(SolveStatus::Unbounded),
            #[allow(unreachable_patterns)]
            Err(other) => {
                debug!(event = "lp_error", error = ?other);
                LpSolution::failed(SolveStatus::Abnormal)
            }
        }
    }
}

//! Multiforest Solver Engine
//!
//! This crate builds and solves the multi-objective forest-planning LP:
//! - The shared LP model and the `microlp` backend
//! - Decision variables with per-stand exclusivity
//! - Objective aggregation over stands and periods
//! - Payoff tables and objective ranges
//! - Epsilon-constraint, reference-point and multifunctionality solves
//! - Policy constraints and demand targets
//! - The [`SolverManager`] lifecycle and solution export

mod aggregation;

pub mod allocator;
pub mod demand;
pub mod export;
pub mod manager;
pub mod model;
pub mod multifunctionality;
pub mod objectives;
pub mod payoff;
pub mod policy;
pub mod scalarize;

#[cfg(test)]
mod allocator_tests;
#[cfg(test)]
mod multifunctionality_tests;
#[cfg(test)]
mod scalarize_tests;
#[cfg(test)]
mod test_utils;

pub use allocator::{Decision, DecisionVariables};
pub use demand::{register_demand, DemandFlows};
pub use export::{
    load_ranges, read_allocations_csv, read_objective_values_csv, read_ranges_json, save_ranges,
    write_objective_values_csv, write_ranges_json, AllocationRow, SolutionExport,
};
pub use manager::{ManagerState, SolverManager};
pub use model::{
    LinearExpr, LpBackend, LpSolution, MicroLpBackend, ModelContext, Row, RowId, SolveStatus,
    VarId, Variable,
};
pub use multifunctionality::{Multifunctionality, MultifunctionalityOutcome};
pub use objectives::{ObjectiveRegistry, RegisteredObjective};
pub use payoff::compute_ranges;
pub use policy::PolicyConstraints;
pub use scalarize::{EpsilonConstraints, ReferencePoint, SolveOutcome};

//! Multiforest - Multi-objective Forest Planning in Rust
//!
//! Describe objectives over a panel of stand/regime simulations, compute
//! their ranges and pick a compromise plan with epsilon constraints, a
//! reference point or the multifunctionality index.
//!
//! # Example
//!
//! ```rust
//! use multiforest::prelude::*;
//!
//! let panel = PanelBuilder::new()
//!     .stand("s1", 1.0)
//!     .cell("s1", 2016, "A", &[("volume", 1.0), ("deadwood", 3.0)])
//!     .cell("s1", 2016, "B", &[("volume", 2.0), ("deadwood", 1.0)])
//!     .build()
//!     .unwrap();
//! let config = ProblemConfig::new()
//!     .with_objective(ObjectiveDefinition::new(
//!         "volume",
//!         "volume",
//!         Direction::Max,
//!         YearAggregation::Sum,
//!         StandAggregation::Sum,
//!     ))
//!     .with_group(ServiceGroup::new("wood", ["volume"]));
//!
//! let (manager, result) = run_multifunctionality(panel, &config).unwrap();
//! assert_eq!(manager.state(), ManagerState::Solved);
//! assert!(result.index.unwrap() > 0.99);
//! ```

pub use multiforest_config as config;
pub use multiforest_core as core;
pub use multiforest_solver as solver;

pub use multiforest_config::{ConfigError, ProblemConfig, RangeStrategy, SolverSettings};
pub use multiforest_core::{MultiforestError, Result};
pub use multiforest_solver::{ManagerState, SolutionExport, SolveOutcome, SolverManager};

mod runner;
pub use runner::{load_problem, run_multifunctionality};

#[cfg(feature = "console")]
pub mod console;

pub mod prelude {
    pub use super::{load_problem, run_multifunctionality};
    pub use multiforest_config::{ProblemConfig, RangeStrategy, SolverSettings};
    pub use multiforest_core::{
        ConstraintDefinition, ConstraintKind, DemandTargets, Direction, GroupAggregation,
        InMemoryPanel, MultiforestError, ObjectiveDefinition, ObjectiveRange, PanelBuilder,
        PanelStore, RangeTable, RegimeId, ServiceGroup, StandAggregation, StandId, Transfer,
        YearAggregation,
    };
    pub use multiforest_solver::{
        ManagerState, MultifunctionalityOutcome, SolutionExport, SolveOutcome, SolveStatus,
        SolverManager,
    };
}

//! Multiforest Core - Core types and traits for multi-objective forest planning
//!
//! This crate provides the vocabulary shared by the rest of the workspace:
//! - Identifiers for stands, regimes and planning periods
//! - The [`PanelStore`] trait and an in-memory panel
//! - Objective, constraint, group and demand definitions
//! - The objective range table used for normalization
//! - The [`MultiforestError`] error taxonomy

pub mod constraint;
pub mod demand;
pub mod error;
pub mod group;
pub mod ids;
pub mod objective;
pub mod panel;
pub mod range;

pub use constraint::{ConstraintDefinition, ConstraintKind};
pub use demand::{DemandTargets, Transfer, Usage};
pub use error::{MultiforestError, Result};
pub use group::{validate_groups, GroupAggregation, ServiceGroup};
pub use ids::{RegimeId, StandId, Year};
pub use objective::{
    Direction, ObjectiveDefinition, PolicyParameter, StandAggregation, YearAggregation,
};
#[cfg(feature = "serde")]
pub use objective::PolicyShape;
pub use panel::{InMemoryPanel, PanelBuilder, PanelStore, TotalBasis};
pub use range::{ObjectiveRange, RangeTable};

//! Policy constraint definitions.
//!
//! Constraints are built once against the decision variables and are then
//! switched on and off by re-bounding their rows, so toggling a policy never
//! rebuilds the model.

use crate::error::{MultiforestError, Result};
use crate::ids::RegimeId;
use crate::objective::StandAggregation;

/// Family of a policy constraint.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum ConstraintKind {
    /// Stands flagged by `attribute` may only use regimes in `allowed`.
    AllowedRegimes {
        allowed: Vec<RegimeId>,
        attribute: String,
    },
    /// The aggregated attribute may not fall by more than `amount` (a share)
    /// compared with its value `periods` periods earlier.
    SpeciesReduction {
        attribute: String,
        periods: usize,
        amount: f64,
        #[cfg_attr(feature = "serde", serde(default))]
        aggregation: StandAggregation,
    },
    /// The aggregated attribute may not grow by more than `amount` (a share)
    /// compared with its value `periods` periods earlier.
    SpeciesIncrease {
        attribute: String,
        periods: usize,
        amount: f64,
        #[cfg_attr(feature = "serde", serde(default))]
        aggregation: StandAggregation,
    },
    /// In every period the left quantity may not exceed the right one.
    LessThan {
        left: String,
        right: String,
        #[cfg_attr(feature = "serde", serde(default))]
        left_aggregation: StandAggregation,
        #[cfg_attr(feature = "serde", serde(default))]
        right_aggregation: StandAggregation,
    },
}

impl ConstraintKind {
    pub fn code(&self) -> &'static str {
        match self {
            ConstraintKind::AllowedRegimes { .. } => "allowed_regimes",
            ConstraintKind::SpeciesReduction { .. } => "species_reduction",
            ConstraintKind::SpeciesIncrease { .. } => "species_increase",
            ConstraintKind::LessThan { .. } => "less_than",
        }
    }
}

/// A named policy constraint.
///
/// # Example
///
/// ```
/// use multiforest_core::{ConstraintDefinition, ConstraintKind, RegimeId};
///
/// let only_ccf_on_peat = ConstraintDefinition::new(
///     "CCFonPeat",
///     ConstraintKind::AllowedRegimes {
///         allowed: vec![RegimeId::from("CCF_1"), RegimeId::from("SA")],
///         attribute: "PEAT".into(),
///     },
/// )
/// .with_description("Only CCF on peat lands");
///
/// assert!(!only_ccf_on_peat.enabled);
/// assert!(only_ccf_on_peat.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintDefinition {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    pub kind: ConstraintKind,
    /// State applied right after the constraint is built.
    #[cfg_attr(feature = "serde", serde(default))]
    pub enabled: bool,
}

impl ConstraintDefinition {
    pub fn new(name: impl Into<String>, kind: ConstraintKind) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            kind,
            enabled: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(MultiforestError::InvalidDefinition(
                "constraint name must not be empty".to_string(),
            ));
        }
        match &self.kind {
            ConstraintKind::SpeciesReduction {
                periods, amount, ..
            } => {
                if *periods == 0 || !(0.0..=1.0).contains(amount) {
                    return Err(MultiforestError::InvalidDefinition(format!(
                        "constraint '{}': reduction needs periods > 0 and an amount in [0, 1]",
                        self.name
                    )));
                }
            }
            ConstraintKind::SpeciesIncrease {
                periods, amount, ..
            } => {
                if *periods == 0 || !amount.is_finite() || *amount < 0.0 {
                    return Err(MultiforestError::InvalidDefinition(format!(
                        "constraint '{}': increase needs periods > 0 and a non-negative amount",
                        self.name
                    )));
                }
            }
            ConstraintKind::AllowedRegimes { attribute, .. } if attribute.is_empty() => {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "constraint '{}': allowed regimes need an indicator attribute",
                    self.name
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

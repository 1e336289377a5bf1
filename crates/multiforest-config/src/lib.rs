//! Configuration system for Multiforest.
//!
//! Describe a planning problem (objectives, policy constraints,
//! ecosystem-service groups, demand targets) and the solver settings in a
//! TOML or YAML file instead of code.
//!
//! # Examples
//!
//! Load a problem from a TOML string:
//!
//! ```
//! use multiforest_config::{ProblemConfig, RangeStrategy};
//!
//! let config = ProblemConfig::from_toml_str(r#"
//!     [settings]
//!     augmentation = 1e-5
//!     range_strategy = "payoff_table"
//!
//!     [[objectives]]
//!     name = "Sum_volume"
//!     attribute = "volume"
//!     direction = "max"
//!     year_aggregation = { type = "sum" }
//!     stand_aggregation = { type = "areaWeightedSum" }
//! "#).unwrap();
//!
//! assert_eq!(config.settings.range_strategy, RangeStrategy::PayoffTable);
//! assert_eq!(config.objectives.len(), 1);
//! ```
//!
//! Use default settings when the file is missing:
//!
//! ```
//! use multiforest_config::ProblemConfig;
//!
//! let config = ProblemConfig::load("problem.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use multiforest_core::{
    validate_groups, ConstraintDefinition, DemandTargets, Direction, MultiforestError,
    ObjectiveDefinition, PolicyShape, ServiceGroup, StandAggregation, YearAggregation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// An aggregation policy that does not resolve, keeping the core error
    /// kind.
    #[error("{0}")]
    Policy(MultiforestError),
}

/// How objective ranges are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStrategy {
    /// One augmented solve per objective in its own direction.
    PayoffTable,

    /// The payoff sweep followed by a sweep in the opposite direction, so
    /// every objective also reaches its worst attainable value.
    #[default]
    Extremes,
}

/// Numeric settings of the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverSettings {
    /// Weight of the tie-breaking augmentation term.
    #[serde(default = "default_augmentation")]
    pub augmentation: f64,

    /// Bound used by disabled policy constraints.
    #[serde(default = "default_sentinel")]
    pub sentinel: f64,

    #[serde(default)]
    pub range_strategy: RangeStrategy,

    /// Decision shares at or below this value are not exported.
    #[serde(default = "default_zero_tolerance")]
    pub zero_tolerance: f64,
}

fn default_augmentation() -> f64 {
    1e-6
}

fn default_sentinel() -> f64 {
    1e10
}

fn default_zero_tolerance() -> f64 {
    1e-9
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            augmentation: default_augmentation(),
            sentinel: default_sentinel(),
            range_strategy: RangeStrategy::default(),
            zero_tolerance: default_zero_tolerance(),
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.augmentation >= 0.0 && self.augmentation.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "augmentation must be a non-negative number, got {}",
                self.augmentation
            )));
        }
        if !(self.sentinel > 0.0 && self.sentinel.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "sentinel must be positive and finite, got {}",
                self.sentinel
            )));
        }
        if !(self.zero_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "zero_tolerance must be non-negative, got {}",
                self.zero_tolerance
            )));
        }
        Ok(())
    }
}

/// A complete planning problem.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", try_from = "ProblemFile")]
pub struct ProblemConfig {
    #[serde(default)]
    pub settings: SolverSettings,

    #[serde(default)]
    pub objectives: Vec<ObjectiveDefinition>,

    #[serde(default)]
    pub constraints: Vec<ConstraintDefinition>,

    /// Ecosystem-service groups for the multifunctionality index.
    #[serde(default)]
    pub groups: Vec<ServiceGroup>,

    /// Objective name → initial value, overriding the baseline total.
    #[serde(default)]
    pub initial_values: BTreeMap<String, f64>,

    #[serde(default)]
    pub demand: Option<DemandTargets>,
}

impl ProblemConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file, picking the format by extension
    /// (`.yaml` / `.yml` for YAML, anything else for TOML).
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, fails to parse or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: ProblemFile = toml::from_str(s)?;
        let config = Self::try_from(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let file: ProblemFile = serde_yaml::from_str(s)?;
        let config = Self::try_from(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks settings and every definition.
    ///
    /// Panel-dependent checks (attribute presence, demand vector lengths)
    /// happen when the problem is registered with a solver.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings.validate()?;
        for (i, objective) in self.objectives.iter().enumerate() {
            objective
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if self.objectives[..i].iter().any(|o| o.name == objective.name) {
                return Err(ConfigError::Invalid(format!(
                    "objective '{}' defined twice",
                    objective.name
                )));
            }
        }
        for constraint in &self.constraints {
            constraint
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if !self.groups.is_empty() {
            validate_groups(&self.groups).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        for name in self.initial_values.keys() {
            if !self.objectives.iter().any(|o| &o.name == name) {
                return Err(ConfigError::Invalid(format!(
                    "initial value given for unknown objective '{name}'"
                )));
            }
        }
        Ok(())
    }

    /// Objective definitions with the configured initial values applied.
    pub fn resolved_objectives(&self) -> Vec<ObjectiveDefinition> {
        self.objectives
            .iter()
            .cloned()
            .map(|objective| match self.initial_values.get(&objective.name) {
                Some(value) => objective.with_initial_value(*value),
                None => objective,
            })
            .collect()
    }

    /// Replaces the solver settings.
    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Adds an objective.
    pub fn with_objective(mut self, objective: ObjectiveDefinition) -> Self {
        self.objectives.push(objective);
        self
    }

    /// Adds a policy constraint.
    pub fn with_constraint(mut self, constraint: ConstraintDefinition) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Adds an ecosystem-service group.
    pub fn with_group(mut self, group: ServiceGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Overrides the initial value of an objective.
    pub fn with_initial_value(mut self, objective: impl Into<String>, value: f64) -> Self {
        self.initial_values.insert(objective.into(), value);
        self
    }

    /// Sets the demand targets.
    pub fn with_demand(mut self, demand: DemandTargets) -> Self {
        self.demand = Some(demand);
        self
    }
}

/// A problem as written on disk, with aggregation policies still in their
/// textual form.
#[derive(Debug, Deserialize)]
struct ProblemFile {
    #[serde(default)]
    settings: SolverSettings,
    #[serde(default)]
    objectives: Vec<ObjectiveEntry>,
    #[serde(default)]
    constraints: Vec<ConstraintDefinition>,
    #[serde(default)]
    groups: Vec<ServiceGroup>,
    #[serde(default)]
    initial_values: BTreeMap<String, f64>,
    #[serde(default)]
    demand: Option<DemandTargets>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveEntry {
    name: String,
    label: Option<String>,
    attribute: String,
    direction: Direction,
    year_aggregation: PolicyShape,
    stand_aggregation: PolicyShape,
    initial_value: Option<f64>,
}

impl TryFrom<ObjectiveEntry> for ObjectiveDefinition {
    type Error = ConfigError;

    fn try_from(entry: ObjectiveEntry) -> Result<Self, ConfigError> {
        let year_aggregation =
            YearAggregation::try_from(entry.year_aggregation).map_err(ConfigError::Policy)?;
        let stand_aggregation =
            StandAggregation::try_from(entry.stand_aggregation).map_err(ConfigError::Policy)?;
        Ok(Self {
            label: entry.label.unwrap_or_else(|| entry.name.clone()),
            name: entry.name,
            attribute: entry.attribute,
            direction: entry.direction,
            year_aggregation,
            stand_aggregation,
            initial_value: entry.initial_value,
        })
    }
}

impl TryFrom<ProblemFile> for ProblemConfig {
    type Error = ConfigError;

    fn try_from(file: ProblemFile) -> Result<Self, ConfigError> {
        Ok(Self {
            settings: file.settings,
            objectives: file
                .objectives
                .into_iter()
                .map(ObjectiveDefinition::try_from)
                .collect::<Result<_, _>>()?,
            constraints: file.constraints,
            groups: file.groups,
            initial_values: file.initial_values,
            demand: file.demand,
        })
    }
}

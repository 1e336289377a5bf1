//! Objective definitions and their aggregation policies.
//!
//! An objective turns one panel attribute into a single scalar in two steps:
//! a [`StandAggregation`] collapses all stands of one period into a number,
//! and a [`YearAggregation`] collapses the per-period series into the
//! objective value.

use std::fmt;
use std::str::FromStr;

use crate::error::{MultiforestError, Result};
use crate::ids::Year;

/// Optimize direction of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Max,
    Min,
}

impl Direction {
    /// +1 for `Max`, -1 for `Min`.
    ///
    /// Multiplying an objective by its sign turns every objective into one
    /// that is maximized.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Max => 1.0,
            Direction::Min => -1.0,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Direction::Max => "max",
            Direction::Min => "min",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Direction {
    type Err = MultiforestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "max" => Ok(Direction::Max),
            "min" => Ok(Direction::Min),
            other => Err(MultiforestError::InvalidDefinition(format!(
                "unknown direction '{other}', expected 'max' or 'min'"
            ))),
        }
    }
}

/// How the stands of one period are collapsed into one number.
///
/// Every variant is linear in the decision variables.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "camelCase", try_from = "PolicyShape")
)]
pub enum StandAggregation {
    /// Σ decision · value, rescaled by the sample ratio.
    #[default]
    Sum,
    /// Σ decision · value · area, rescaled by the sample ratio.
    AreaWeightedSum,
    /// Σ decision · value · area / total area.
    AreaWeightedAverage,
    /// Σ decision · value · secondary, rescaled by the sample ratio.
    SubsetSum { secondary: String },
}

impl StandAggregation {
    pub fn code(&self) -> &'static str {
        match self {
            StandAggregation::Sum => "sum",
            StandAggregation::AreaWeightedSum => "areaWeightedSum",
            StandAggregation::AreaWeightedAverage => "areaWeightedAverage",
            StandAggregation::SubsetSum { .. } => "subsetSum",
        }
    }

    /// Parses a policy code. `subsetSum` needs the secondary attribute.
    ///
    /// # Example
    ///
    /// ```
    /// use multiforest_core::StandAggregation;
    ///
    /// let policy = StandAggregation::from_code("areaWeightedSum", None).unwrap();
    /// assert_eq!(policy, StandAggregation::AreaWeightedSum);
    /// assert!(StandAggregation::from_code("median", None).is_err());
    /// ```
    pub fn from_code(code: &str, secondary: Option<&str>) -> Result<Self> {
        match code {
            "sum" => Ok(StandAggregation::Sum),
            "areaWeightedSum" => Ok(StandAggregation::AreaWeightedSum),
            "areaWeightedAverage" => Ok(StandAggregation::AreaWeightedAverage),
            "subsetSum" => match secondary {
                Some(secondary) => Ok(StandAggregation::SubsetSum {
                    secondary: secondary.to_string(),
                }),
                None => Err(MultiforestError::InvalidDefinition(
                    "subsetSum requires a secondary attribute".to_string(),
                )),
            },
            other => Err(MultiforestError::UndefinedAggregationPolicy(format!(
                "stand-wise '{other}'"
            ))),
        }
    }

    /// Whether the aggregate is divided by the sample ratio.
    ///
    /// Relative attributes and area-weighted averages are ratios already.
    pub fn rescales(&self, attribute_is_relative: bool) -> bool {
        match self {
            StandAggregation::AreaWeightedAverage => false,
            _ => !attribute_is_relative,
        }
    }
}

/// Extra parameter attached to a year-wise policy code.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyParameter {
    Periods(usize),
    Year(Year),
    Targets(Vec<f64>),
}

/// How the per-period series is collapsed into the objective value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "camelCase", try_from = "PolicyShape")
)]
pub enum YearAggregation {
    /// objective ≤ value(t) for every t.
    Min,
    /// objective ≥ value(t) for every t.
    Max,
    /// objective = mean of value(t).
    Average,
    /// objective = Σ value(t).
    Sum,
    /// objective = value(first period).
    FirstYear,
    /// objective = value(last period).
    LastYear,
    /// objective ≤ value(t) − value(t−1).
    MinYearlyIncrease,
    /// objective ≥ value(t) − value(t−1).
    MaxYearlyIncrease,
    /// objective ≥ value(t) − value(t−N) for t ≥ N.
    MaxDecreaseDuringNPeriods { periods: usize },
    /// objective ≤ value(t) − value(t−N) for t ≥ N.
    MinIncreaseDuringNPeriods { periods: usize },
    /// value(t) follows a line from the initial value up to the objective at
    /// the target year, and stays above the objective afterwards.
    TargetYearWithSlope { year: Year },
    /// value at the first period after the target year equals the objective.
    TargetYear { year: Year },
    /// objective ≤ (value(t) − target(t)) / target(t) for every t.
    PeriodicTargets { targets: Vec<f64> },
}

impl YearAggregation {
    pub fn code(&self) -> &'static str {
        match self {
            YearAggregation::Min => "min",
            YearAggregation::Max => "max",
            YearAggregation::Average => "average",
            YearAggregation::Sum => "sum",
            YearAggregation::FirstYear => "firstYear",
            YearAggregation::LastYear => "lastYear",
            YearAggregation::MinYearlyIncrease => "minYearlyIncrease",
            YearAggregation::MaxYearlyIncrease => "maxYearlyIncrease",
            YearAggregation::MaxDecreaseDuringNPeriods { .. } => "maxDecreaseDuringNPeriods",
            YearAggregation::MinIncreaseDuringNPeriods { .. } => "minIncreaseDuringNPeriods",
            YearAggregation::TargetYearWithSlope { .. } => "targetYearWithSlope",
            YearAggregation::TargetYear { .. } => "targetYear",
            YearAggregation::PeriodicTargets { .. } => "periodicTargets",
        }
    }

    /// Parses a policy code together with its extra parameter, if any.
    pub fn from_code(code: &str, parameter: Option<PolicyParameter>) -> Result<Self> {
        let missing = |what: &str| {
            MultiforestError::InvalidDefinition(format!("year-wise '{code}' requires {what}"))
        };
        let policy = match code {
            "min" => YearAggregation::Min,
            "max" => YearAggregation::Max,
            "average" => YearAggregation::Average,
            "sum" => YearAggregation::Sum,
            "firstYear" => YearAggregation::FirstYear,
            "lastYear" => YearAggregation::LastYear,
            "minYearlyIncrease" => YearAggregation::MinYearlyIncrease,
            "maxYearlyIncrease" => YearAggregation::MaxYearlyIncrease,
            "maxDecreaseDuringNPeriods" => match parameter {
                Some(PolicyParameter::Periods(periods)) => {
                    YearAggregation::MaxDecreaseDuringNPeriods { periods }
                }
                _ => return Err(missing("a period count")),
            },
            "minIncreaseDuringNPeriods" => match parameter {
                Some(PolicyParameter::Periods(periods)) => {
                    YearAggregation::MinIncreaseDuringNPeriods { periods }
                }
                _ => return Err(missing("a period count")),
            },
            "targetYearWithSlope" => match parameter {
                Some(PolicyParameter::Year(year)) => YearAggregation::TargetYearWithSlope { year },
                _ => return Err(missing("a target year")),
            },
            "targetYear" => match parameter {
                Some(PolicyParameter::Year(year)) => YearAggregation::TargetYear { year },
                _ => return Err(missing("a target year")),
            },
            "periodicTargets" => match parameter {
                Some(PolicyParameter::Targets(targets)) => {
                    YearAggregation::PeriodicTargets { targets }
                }
                _ => return Err(missing("a target per period")),
            },
            other => {
                return Err(MultiforestError::UndefinedAggregationPolicy(format!(
                    "year-wise '{other}'"
                )))
            }
        };
        Ok(policy)
    }

    /// Solve direction under which the policy's inequality rows converge to
    /// the intended value.
    ///
    /// Policies bounding the objective from above (`min`, minimum increases,
    /// targets) only make sense when the objective is maximized; policies
    /// bounding it from below (`max`, maximum increases and decreases) only
    /// when it is minimized. Equality policies accept either direction.
    pub fn required_direction(&self) -> Option<Direction> {
        match self {
            YearAggregation::Min
            | YearAggregation::MinYearlyIncrease
            | YearAggregation::MinIncreaseDuringNPeriods { .. }
            | YearAggregation::TargetYearWithSlope { .. }
            | YearAggregation::PeriodicTargets { .. } => Some(Direction::Max),
            YearAggregation::Max
            | YearAggregation::MaxYearlyIncrease
            | YearAggregation::MaxDecreaseDuringNPeriods { .. } => Some(Direction::Min),
            YearAggregation::Average
            | YearAggregation::Sum
            | YearAggregation::FirstYear
            | YearAggregation::LastYear
            | YearAggregation::TargetYear { .. } => None,
        }
    }
}

/// Serialized form of a policy: the code under `type` plus whichever
/// parameter field the code needs.
///
/// Both policy enums deserialize through this shape and their `from_code`
/// constructors, so an unknown code is an `UndefinedAggregationPolicy`.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct PolicyShape {
    #[serde(rename = "type")]
    pub code: String,
    pub secondary: Option<String>,
    pub periods: Option<usize>,
    pub year: Option<Year>,
    pub targets: Option<Vec<f64>>,
}

#[cfg(feature = "serde")]
impl TryFrom<PolicyShape> for StandAggregation {
    type Error = MultiforestError;

    fn try_from(shape: PolicyShape) -> Result<Self> {
        Self::from_code(&shape.code, shape.secondary.as_deref())
    }
}

#[cfg(feature = "serde")]
impl TryFrom<PolicyShape> for YearAggregation {
    type Error = MultiforestError;

    fn try_from(shape: PolicyShape) -> Result<Self> {
        let parameter = shape
            .periods
            .map(PolicyParameter::Periods)
            .or(shape.year.map(PolicyParameter::Year))
            .or(shape.targets.map(PolicyParameter::Targets));
        Self::from_code(&shape.code, parameter)
    }
}

/// A named objective.
///
/// # Example
///
/// ```
/// use multiforest_core::{Direction, ObjectiveDefinition, StandAggregation, YearAggregation};
///
/// let objective = ObjectiveDefinition::new(
///     "Sum_volume",
///     "volume",
///     Direction::Max,
///     YearAggregation::Sum,
///     StandAggregation::AreaWeightedSum,
/// )
/// .with_label("Harvested volume (m3)");
///
/// assert!(objective.validate().is_ok());
/// assert_eq!(objective.label, "Harvested volume (m3)");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveDefinition {
    /// Unique short name.
    pub name: String,
    /// Human readable label.
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    /// Panel attribute the objective is computed from.
    pub attribute: String,
    pub direction: Direction,
    pub year_aggregation: YearAggregation,
    pub stand_aggregation: StandAggregation,
    /// Overrides the baseline-derived initial value.
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial_value: Option<f64>,
}

impl ObjectiveDefinition {
    pub fn new(
        name: impl Into<String>,
        attribute: impl Into<String>,
        direction: Direction,
        year_aggregation: YearAggregation,
        stand_aggregation: StandAggregation,
    ) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            attribute: attribute.into(),
            direction,
            year_aggregation,
            stand_aggregation,
            initial_value: None,
        }
    }

    /// Builds a definition from textual policy codes.
    ///
    /// # Errors
    ///
    /// `UndefinedAggregationPolicy` for unknown codes.
    #[allow(clippy::too_many_arguments)]
    pub fn from_codes(
        name: impl Into<String>,
        label: impl Into<String>,
        attribute: impl Into<String>,
        direction: &str,
        year_code: &str,
        stand_code: &str,
        parameter: Option<PolicyParameter>,
        secondary: Option<&str>,
    ) -> Result<Self> {
        let definition = Self {
            name: name.into(),
            label: label.into(),
            attribute: attribute.into(),
            direction: direction.parse()?,
            year_aggregation: YearAggregation::from_code(year_code, parameter)?,
            stand_aggregation: StandAggregation::from_code(stand_code, secondary)?,
            initial_value: None,
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Checks the parameters and the direction/policy pairing.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(MultiforestError::InvalidDefinition(
                "objective name must not be empty".to_string(),
            ));
        }
        match &self.year_aggregation {
            YearAggregation::MaxDecreaseDuringNPeriods { periods }
            | YearAggregation::MinIncreaseDuringNPeriods { periods }
                if *periods == 0 =>
            {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "objective '{}': period count must be positive",
                    self.name
                )));
            }
            YearAggregation::PeriodicTargets { targets }
                if targets.iter().any(|t| *t == 0.0 || !t.is_finite()) =>
            {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "objective '{}': periodic targets must be finite and non-zero",
                    self.name
                )));
            }
            _ => {}
        }
        if let Some(expected) = self.year_aggregation.required_direction() {
            if expected != self.direction {
                return Err(MultiforestError::InconsistentDirection {
                    objective: self.name.clone(),
                    policy: self.year_aggregation.code().to_string(),
                    expected: expected.code().to_string(),
                });
            }
        }
        Ok(())
    }
}

//! Market demand targets met by routing source volumes through transfer rates.

use std::collections::BTreeMap;

use crate::error::{MultiforestError, Result};

/// Prefix of the objectives measuring how well a target is met.
pub const DEMAND_OBJECTIVE_PREFIX: &str = "DemandTarget:";

/// Prefix of the objectives measuring secondary usage of a source.
pub const SECONDARY_USAGE_PREFIX: &str = "SecondaryUsage:";

/// Whether a source is a primary or a fallback supplier of a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Usage {
    #[default]
    Primary,
    /// Secondary usage is tracked by its own minimized objective.
    Secondary,
}

/// Conversion of one source attribute into one demand target.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transfer {
    pub rate: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub usage: Usage,
}

impl Transfer {
    pub fn primary(rate: f64) -> Self {
        Self {
            rate,
            usage: Usage::Primary,
        }
    }

    pub fn secondary(rate: f64) -> Self {
        Self {
            rate,
            usage: Usage::Secondary,
        }
    }
}

/// A set of demand targets together with the transfers feeding them.
///
/// # Example
///
/// ```
/// use multiforest_core::{DemandTargets, Transfer};
///
/// let demand = DemandTargets::new()
///     .target("sawnwood", vec![100.0, 120.0])
///     .transfer("log_volume", "sawnwood", Transfer::primary(0.5))
///     .transfer("pulp_volume", "sawnwood", Transfer::secondary(0.2));
///
/// assert!(demand.validate(2).is_ok());
/// assert_eq!(demand.objective_names(), vec![
///     "DemandTarget:sawnwood".to_string(),
///     "SecondaryUsage:pulp_volume:sawnwood".to_string(),
/// ]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DemandTargets {
    /// Target name → demand per period.
    pub targets: BTreeMap<String, Vec<f64>>,
    /// Source attribute → target name → transfer.
    pub transfers: BTreeMap<String, BTreeMap<String, Transfer>>,
    /// Minimize the absolute gap instead of maximizing the met share.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exact_matching: bool,
}

impl DemandTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, name: impl Into<String>, demand: Vec<f64>) -> Self {
        self.targets.insert(name.into(), demand);
        self
    }

    pub fn transfer(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        transfer: Transfer,
    ) -> Self {
        self.transfers
            .entry(source.into())
            .or_default()
            .insert(target.into(), transfer);
        self
    }

    pub fn exact_matching(mut self, exact: bool) -> Self {
        self.exact_matching = exact;
        self
    }

    /// Sources feeding `target`, with their transfer.
    pub fn sources_of<'a>(&'a self, target: &'a str) -> impl Iterator<Item = (&'a str, Transfer)> + 'a {
        self.transfers.iter().filter_map(move |(source, targets)| {
            targets.get(target).map(|t| (source.as_str(), *t))
        })
    }

    pub fn demand_objective_name(target: &str) -> String {
        format!("{DEMAND_OBJECTIVE_PREFIX}{target}")
    }

    pub fn secondary_objective_name(source: &str, target: &str) -> String {
        format!("{SECONDARY_USAGE_PREFIX}{source}:{target}")
    }

    /// Names of every objective these targets introduce, demand objectives first.
    pub fn objective_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .targets
            .keys()
            .map(|t| Self::demand_objective_name(t))
            .collect();
        for (source, targets) in &self.transfers {
            for (target, transfer) in targets {
                if transfer.usage == Usage::Secondary {
                    names.push(Self::secondary_objective_name(source, target));
                }
            }
        }
        names
    }

    /// Checks the demand vectors against the number of planning periods.
    pub fn validate(&self, period_count: usize) -> Result<()> {
        if self.targets.is_empty() {
            return Err(MultiforestError::InvalidDefinition(
                "no demand targets given".to_string(),
            ));
        }
        for (name, demand) in &self.targets {
            if demand.len() != period_count {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "demand target '{name}' has {} values for {period_count} periods",
                    demand.len()
                )));
            }
            if demand.iter().any(|d| !d.is_finite()) {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "demand target '{name}' has a non-finite value"
                )));
            }
            if !self.exact_matching && demand.iter().any(|d| *d == 0.0) {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "demand target '{name}' has a zero demand; relative matching divides by it"
                )));
            }
            if self.sources_of(name).next().is_none() {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "demand target '{name}' has no source"
                )));
            }
        }
        for (source, targets) in &self.transfers {
            for (target, transfer) in targets {
                if !self.targets.contains_key(target) {
                    return Err(MultiforestError::MissingData(format!(
                        "transfer from '{source}' to unknown target '{target}'"
                    )));
                }
                if !transfer.rate.is_finite() || transfer.rate < 0.0 {
                    return Err(MultiforestError::InvalidDefinition(format!(
                        "transfer rate from '{source}' to '{target}' must be non-negative"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sawnwood() -> DemandTargets {
        DemandTargets::new()
            .target("sawnwood", vec![10.0, 20.0])
            .transfer("logs", "sawnwood", Transfer::primary(1.0))
    }

    #[test]
    fn test_length_mismatch() {
        let err = sawnwood().validate(3).unwrap_err();
        assert!(matches!(err, MultiforestError::InvalidDefinition(_)));
    }

    #[test]
    fn test_zero_demand_only_for_relative() {
        let demand = DemandTargets::new()
            .target("pulp", vec![0.0, 5.0])
            .transfer("logs", "pulp", Transfer::primary(1.0));
        assert!(demand.validate(2).is_err());
        assert!(demand.exact_matching(true).validate(2).is_ok());
    }

    #[test]
    fn test_unknown_target_in_transfer() {
        let demand = sawnwood().transfer("logs", "energy", Transfer::primary(1.0));
        assert!(matches!(
            demand.validate(2).unwrap_err(),
            MultiforestError::MissingData(_)
        ));
    }

    #[test]
    fn test_sources_of() {
        let demand = sawnwood().transfer("pulp", "sawnwood", Transfer::secondary(0.3));
        let sources: Vec<_> = demand.sources_of("sawnwood").map(|(s, _)| s).collect();
        assert_eq!(sources, vec!["logs", "pulp"]);
    }
}

//! Ecosystem-service groups used by the multifunctionality index.

use crate::error::{MultiforestError, Result};

/// How the normalized members of a group are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GroupAggregation {
    /// Arithmetic mean of the members.
    #[default]
    Average,
    /// Worst member.
    Minimum,
}

impl GroupAggregation {
    /// Parses the short codes `AVG` and `MIN` (case-insensitive).
    pub fn from_code(code: &str) -> Result<Self> {
        match code.to_ascii_uppercase().as_str() {
            "AVG" | "AVERAGE" => Ok(GroupAggregation::Average),
            "MIN" | "MINIMUM" => Ok(GroupAggregation::Minimum),
            _ => Err(MultiforestError::UndefinedAggregationPolicy(format!(
                "group '{code}'"
            ))),
        }
    }
}

/// A named bundle of objectives.
///
/// # Example
///
/// ```
/// use multiforest_core::{GroupAggregation, ServiceGroup};
///
/// let biodiversity = ServiceGroup::new("biodiversity", ["Sum_Deadwood_V", "Sum_N_where_D_gt_40"])
///     .with_aggregation(GroupAggregation::Minimum);
///
/// assert_eq!(biodiversity.objectives.len(), 2);
/// assert!(!biodiversity.is_singleton());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceGroup {
    pub name: String,
    pub objectives: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub aggregation: GroupAggregation,
}

impl ServiceGroup {
    pub fn new<I, S>(name: impl Into<String>, objectives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            objectives: objectives.into_iter().map(Into::into).collect(),
            aggregation: GroupAggregation::default(),
        }
    }

    pub fn with_aggregation(mut self, aggregation: GroupAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// A single-member group passes its member through unchanged.
    pub fn is_singleton(&self) -> bool {
        self.objectives.len() == 1
    }
}

/// Checks a group layout: non-empty, unique group names, no repeated member
/// within a group.
pub fn validate_groups(groups: &[ServiceGroup]) -> Result<()> {
    if groups.is_empty() {
        return Err(MultiforestError::InvalidDefinition(
            "at least one ecosystem-service group is required".to_string(),
        ));
    }
    for (i, group) in groups.iter().enumerate() {
        if group.objectives.is_empty() {
            return Err(MultiforestError::InvalidDefinition(format!(
                "group '{}' has no objectives",
                group.name
            )));
        }
        if groups[..i].iter().any(|g| g.name == group.name) {
            return Err(MultiforestError::InvalidDefinition(format!(
                "group '{}' defined twice",
                group.name
            )));
        }
        for (j, objective) in group.objectives.iter().enumerate() {
            if group.objectives[..j].contains(objective) {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "group '{}' lists '{}' twice",
                    group.name, objective
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(GroupAggregation::from_code("AVG").unwrap(), GroupAggregation::Average);
        assert_eq!(GroupAggregation::from_code("min").unwrap(), GroupAggregation::Minimum);
        assert!(GroupAggregation::from_code("MEDIAN").is_err());
    }

    #[test]
    fn test_validate_groups() {
        let ok = vec![
            ServiceGroup::new("wood", ["a", "b"]),
            ServiceGroup::new("water", ["c"]),
        ];
        assert!(validate_groups(&ok).is_ok());

        let empty = vec![ServiceGroup::new("wood", Vec::<String>::new())];
        assert!(validate_groups(&empty).is_err());

        let dup = vec![ServiceGroup::new("wood", ["a"]), ServiceGroup::new("wood", ["b"])];
        assert!(validate_groups(&dup).is_err());

        assert!(validate_groups(&[]).is_err());
    }
}

//! Objective ranges (the payoff table) used for normalization.

use std::collections::BTreeMap;

use crate::error::{MultiforestError, Result};
use crate::objective::Direction;

/// Observed (lower, upper) values of one objective.
///
/// # Example
///
/// ```
/// use multiforest_core::{Direction, ObjectiveRange};
///
/// let range = ObjectiveRange::new(60.0, 240.0);
/// assert_eq!(range.width("volume").unwrap(), 180.0);
/// assert_eq!(range.normalize("volume", 150.0, Direction::Max).unwrap(), 0.5);
/// assert_eq!(range.normalize("volume", 150.0, Direction::Min).unwrap(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "(f64, f64)", into = "(f64, f64)"))]
pub struct ObjectiveRange {
    pub lower: f64,
    pub upper: f64,
}

impl ObjectiveRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// A range that has seen a single value.
    pub fn point(value: f64) -> Self {
        Self {
            lower: value,
            upper: value,
        }
    }

    /// Widens the range to include `value`.
    pub fn observe(&mut self, value: f64) {
        if value < self.lower {
            self.lower = value;
        }
        if value > self.upper {
            self.upper = value;
        }
    }

    /// `upper - lower`.
    ///
    /// # Errors
    ///
    /// `ZeroRangeWidth` when both bounds coincide; normalizing by such a
    /// range would divide by zero.
    pub fn width(&self, objective: &str) -> Result<f64> {
        let width = self.upper - self.lower;
        if width > 0.0 {
            Ok(width)
        } else {
            Err(MultiforestError::ZeroRangeWidth {
                objective: objective.to_string(),
                value: self.lower,
            })
        }
    }

    /// Maps a value onto [0, 1] with 1 being the best end of the range.
    pub fn normalize(&self, objective: &str, value: f64, direction: Direction) -> Result<f64> {
        let width = self.width(objective)?;
        Ok(match direction {
            Direction::Max => (value - self.lower) / width,
            Direction::Min => (self.upper - value) / width,
        })
    }

    /// Bound corresponding to the worst achievable value.
    pub fn worst(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Max => self.lower,
            Direction::Min => self.upper,
        }
    }

    /// Bound corresponding to the best achievable value.
    pub fn best(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Max => self.upper,
            Direction::Min => self.lower,
        }
    }
}

impl From<(f64, f64)> for ObjectiveRange {
    fn from((lower, upper): (f64, f64)) -> Self {
        Self { lower, upper }
    }
}

impl From<ObjectiveRange> for (f64, f64) {
    fn from(range: ObjectiveRange) -> Self {
        (range.lower, range.upper)
    }
}

/// Objective name → range.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RangeTable {
    ranges: BTreeMap<String, ObjectiveRange>,
}

impl RangeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, objective: impl Into<String>, range: ObjectiveRange) {
        self.ranges.insert(objective.into(), range);
    }

    /// Records a solved value, creating the entry on first sight.
    pub fn observe(&mut self, objective: &str, value: f64) {
        match self.ranges.get_mut(objective) {
            Some(range) => range.observe(value),
            None => {
                self.ranges
                    .insert(objective.to_string(), ObjectiveRange::point(value));
            }
        }
    }

    pub fn get(&self, objective: &str) -> Option<&ObjectiveRange> {
        self.ranges.get(objective)
    }

    /// Range of an objective, failing with `RangeNotComputed` if absent.
    pub fn require(&self, objective: &str) -> Result<&ObjectiveRange> {
        self.ranges
            .get(objective)
            .ok_or_else(|| MultiforestError::RangeNotComputed(objective.to_string()))
    }

    /// Width of an objective's range; absent ranges and zero widths are errors.
    pub fn width(&self, objective: &str) -> Result<f64> {
        self.require(objective)?.width(objective)
    }

    /// Width if known and positive. Used where an unknown width simply
    /// disables a term.
    pub fn width_if_known(&self, objective: &str) -> Option<f64> {
        self.ranges
            .get(objective)
            .map(|r| r.upper - r.lower)
            .filter(|w| *w > 0.0)
    }

    pub fn contains(&self, objective: &str) -> bool {
        self.ranges.contains_key(objective)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObjectiveRange)> {
        self.ranges.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromIterator<(String, ObjectiveRange)> for RangeTable {
    fn from_iter<T: IntoIterator<Item = (String, ObjectiveRange)>>(iter: T) -> Self {
        Self {
            ranges: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_widens() {
        let mut table = RangeTable::new();
        table.observe("a", 5.0);
        table.observe("a", 2.0);
        table.observe("a", 3.0);
        let range = table.require("a").unwrap();
        assert_eq!(range.lower, 2.0);
        assert_eq!(range.upper, 5.0);
    }

    #[test]
    fn test_zero_width_is_surfaced() {
        let mut table = RangeTable::new();
        table.observe("flat", 7.0);
        let err = table.width("flat").unwrap_err();
        assert!(matches!(err, MultiforestError::ZeroRangeWidth { .. }));
        assert_eq!(table.width_if_known("flat"), None);
    }

    #[test]
    fn test_missing_range() {
        let table = RangeTable::new();
        assert!(matches!(
            table.require("x").unwrap_err(),
            MultiforestError::RangeNotComputed(_)
        ));
    }

    #[test]
    fn test_best_and_worst() {
        let range = ObjectiveRange::new(1.0, 3.0);
        assert_eq!(range.best(Direction::Max), 3.0);
        assert_eq!(range.worst(Direction::Max), 1.0);
        assert_eq!(range.best(Direction::Min), 1.0);
        assert_eq!(range.normalize("x", 1.0, Direction::Min).unwrap(), 1.0);
    }
}

//! Panel data: attribute values keyed by (stand, period, regime).
//!
//! The optimizer reads simulation output only through the [`PanelStore`]
//! trait. [`InMemoryPanel`] is the bundled implementation; it is assembled
//! with a [`PanelBuilder`] and offers the usual preparation steps (regime
//! classifications, area totals, values relative to the baseline state).

use std::collections::{BTreeSet, HashMap};

use crate::error::{MultiforestError, Result};
use crate::ids::{RegimeId, StandId, Year};

/// Prefix of attributes expressed relative to the baseline state.
pub const RELATIVE_PREFIX: &str = "Relative_";

/// Prefix of attributes derived as totals over the represented area.
pub const TOTAL_PREFIX: &str = "Total_";

/// Suffix of indicator attributes created by regime classifications.
pub const CLASSIFICATION_SUFFIX: &str = "_forests";

/// Read access to panel data.
///
/// A cell missing from the store means the regime is not available for that
/// stand in that period; it is never read as zero.
pub trait PanelStore {
    /// Stands in a stable order.
    fn stands(&self) -> &[StandId];

    /// Planning periods in ascending order. Index 0 is the anchor period.
    fn periods(&self) -> &[Year];

    /// All regimes appearing anywhere in the panel.
    fn regimes(&self) -> &[RegimeId];

    /// Represented area of a stand.
    fn area(&self, stand: &StandId) -> Option<f64>;

    /// Whether a cell exists for the given key.
    fn has_cell(&self, stand: &StandId, period: Year, regime: &RegimeId) -> bool;

    /// Attribute value of a cell, `None` if the cell or the attribute is absent.
    fn value(&self, stand: &StandId, period: Year, regime: &RegimeId, attribute: &str)
        -> Option<f64>;

    /// Whether any cell carries the attribute.
    fn has_attribute(&self, attribute: &str) -> bool;

    /// Whether the attribute is already normalized against the baseline.
    fn is_relative(&self, attribute: &str) -> bool;

    /// Share of the full population represented by the loaded stands.
    fn sample_ratio(&self) -> f64 {
        1.0
    }

    /// Sum of the attribute over the baseline (initial state) subset.
    fn baseline_total(&self, attribute: &str) -> Option<f64>;

    /// Earliest year of the baseline subset, if one exists.
    fn baseline_year(&self) -> Option<Year>;

    /// Total represented area of all stands.
    fn total_area(&self) -> f64 {
        self.stands().iter().filter_map(|s| self.area(s)).sum()
    }
}

type CellKey = (StandId, Year, RegimeId);

/// Basis used when turning per-hectare style values into totals.
#[derive(Debug, Clone, PartialEq)]
pub enum TotalBasis {
    /// Multiply by the stand's represented area.
    Area,
    /// Multiply by another attribute of the same cell (e.g. standing volume).
    Attribute(String),
}

/// Panel data held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPanel {
    stands: Vec<StandId>,
    periods: Vec<Year>,
    regimes: Vec<RegimeId>,
    areas: HashMap<StandId, f64>,
    cells: HashMap<CellKey, HashMap<String, f64>>,
    baseline: HashMap<(StandId, Year), HashMap<String, f64>>,
    attributes: BTreeSet<String>,
    relative: BTreeSet<String>,
    sample_ratio: f64,
}

impl InMemoryPanel {
    /// Starts building a panel.
    pub fn builder() -> PanelBuilder {
        PanelBuilder::new()
    }

    /// Number of non-baseline cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Names of all known attributes.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    /// Adds an indicator attribute `<class_name>_forests` that is 1 for cells
    /// whose regime belongs to `regimes` and 0 otherwise.
    ///
    /// Returns the name of the new attribute.
    pub fn classify_regimes(&mut self, class_name: &str, regimes: &[RegimeId]) -> String {
        let attribute = format!("{class_name}{CLASSIFICATION_SUFFIX}");
        for ((_, _, regime), values) in self.cells.iter_mut() {
            let member = if regimes.contains(regime) { 1.0 } else { 0.0 };
            values.insert(attribute.clone(), member);
        }
        self.attributes.insert(attribute.clone());
        attribute
    }

    /// Derives `Total_<column>` by multiplying the column with the chosen basis.
    ///
    /// Cells lacking the column are left without the derived attribute.
    /// The baseline subset is derived the same way.
    pub fn derive_total(&mut self, column: &str, basis: &TotalBasis) -> Result<String> {
        if !self.attributes.contains(column) {
            return Err(MultiforestError::MissingData(format!(
                "attribute '{column}' is not present in the panel"
            )));
        }
        if let TotalBasis::Attribute(other) = basis {
            if !self.attributes.contains(other) {
                return Err(MultiforestError::MissingData(format!(
                    "basis attribute '{other}' is not present in the panel"
                )));
            }
        }

        let derived = format!("{TOTAL_PREFIX}{column}");
        for ((stand, _, _), values) in self.cells.iter_mut() {
            let factor = match basis {
                TotalBasis::Area => self.areas.get(stand).copied(),
                TotalBasis::Attribute(other) => values.get(other).copied(),
            };
            if let (Some(value), Some(factor)) = (values.get(column).copied(), factor) {
                values.insert(derived.clone(), value * factor);
            }
        }
        for ((stand, _), values) in self.baseline.iter_mut() {
            let factor = match basis {
                TotalBasis::Area => self.areas.get(stand).copied(),
                TotalBasis::Attribute(other) => values.get(other).copied(),
            };
            if let (Some(value), Some(factor)) = (values.get(column).copied(), factor) {
                values.insert(derived.clone(), value * factor);
            }
        }
        self.attributes.insert(derived.clone());
        Ok(derived)
    }

    /// Derives `Relative_<column>` = value / baseline total for every attribute
    /// with a positive baseline total, and flags the results as relative.
    ///
    /// Returns the names of the derived attributes.
    pub fn derive_relative_to_baseline(&mut self) -> Vec<String> {
        let totals: Vec<(String, f64)> = self
            .attributes
            .iter()
            .filter(|a| !a.starts_with(RELATIVE_PREFIX))
            .filter_map(|a| self.baseline_total(a).map(|t| (a.clone(), t)))
            .filter(|(_, total)| *total > 0.0)
            .collect();

        let mut derived = Vec::with_capacity(totals.len());
        for (column, total) in totals {
            let name = format!("{RELATIVE_PREFIX}{column}");
            for values in self.cells.values_mut() {
                if let Some(value) = values.get(&column).copied() {
                    values.insert(name.clone(), value / total);
                }
            }
            self.attributes.insert(name.clone());
            self.relative.insert(name.clone());
            derived.push(name);
        }
        derived
    }
}

impl PanelStore for InMemoryPanel {
    fn stands(&self) -> &[StandId] {
        &self.stands
    }

    fn periods(&self) -> &[Year] {
        &self.periods
    }

    fn regimes(&self) -> &[RegimeId] {
        &self.regimes
    }

    fn area(&self, stand: &StandId) -> Option<f64> {
        self.areas.get(stand).copied()
    }

    fn has_cell(&self, stand: &StandId, period: Year, regime: &RegimeId) -> bool {
        self.cells
            .contains_key(&(stand.clone(), period, regime.clone()))
    }

    fn value(
        &self,
        stand: &StandId,
        period: Year,
        regime: &RegimeId,
        attribute: &str,
    ) -> Option<f64> {
        self.cells
            .get(&(stand.clone(), period, regime.clone()))
            .and_then(|values| values.get(attribute).copied())
    }

    fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }

    fn is_relative(&self, attribute: &str) -> bool {
        self.relative.contains(attribute)
    }

    fn sample_ratio(&self) -> f64 {
        self.sample_ratio
    }

    fn baseline_total(&self, attribute: &str) -> Option<f64> {
        let mut found = false;
        let mut total = 0.0;
        for values in self.baseline.values() {
            if let Some(value) = values.get(attribute) {
                found = true;
                total += value;
            }
        }
        found.then_some(total)
    }

    fn baseline_year(&self) -> Option<Year> {
        self.baseline.keys().map(|(_, year)| *year).min()
    }
}

/// Builder for [`InMemoryPanel`].
///
/// # Example
///
/// ```
/// use multiforest_core::{PanelBuilder, PanelStore};
///
/// let panel = PanelBuilder::new()
///     .stand("s1", 10.0)
///     .cell("s1", 2020, "A", &[("volume", 1.0)])
///     .cell("s1", 2020, "B", &[("volume", 2.0)])
///     .build()
///     .unwrap();
///
/// assert_eq!(panel.periods(), &[2020]);
/// assert_eq!(panel.regimes().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct PanelBuilder {
    stands: Vec<(StandId, f64)>,
    cells: Vec<(CellKey, Vec<(String, f64)>)>,
    baseline: Vec<((StandId, Year), Vec<(String, f64)>)>,
    baseline_regime: Option<RegimeId>,
    relative: BTreeSet<String>,
    sample_ratio: Option<f64>,
}

impl PanelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a stand with its represented area.
    pub fn stand(mut self, id: impl Into<StandId>, area: f64) -> Self {
        self.stands.push((id.into(), area));
        self
    }

    /// Adds (or extends) a cell.
    pub fn cell(
        mut self,
        stand: impl Into<StandId>,
        period: Year,
        regime: impl Into<RegimeId>,
        values: &[(&str, f64)],
    ) -> Self {
        let values = values.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self.cells
            .push(((stand.into(), period, regime.into()), values));
        self
    }

    /// Adds a baseline (initial state) record for a stand.
    pub fn baseline_cell(
        mut self,
        stand: impl Into<StandId>,
        period: Year,
        values: &[(&str, f64)],
    ) -> Self {
        let values = values.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self.baseline.push(((stand.into(), period), values));
        self
    }

    /// Cells with this regime are moved to the baseline subset on build.
    pub fn baseline_regime(mut self, regime: impl Into<RegimeId>) -> Self {
        self.baseline_regime = Some(regime.into());
        self
    }

    /// Flags an attribute as already normalized against the baseline.
    pub fn relative_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.relative.insert(attribute.into());
        self
    }

    /// Share of the population covered by the loaded stands (0, 1].
    pub fn sample_ratio(mut self, ratio: f64) -> Self {
        self.sample_ratio = Some(ratio);
        self
    }

    /// Validates and assembles the panel.
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` for a sample ratio outside (0, 1], a non-positive
    /// area or a duplicated stand; `MissingData` when a cell references an
    /// undeclared stand.
    pub fn build(self) -> Result<InMemoryPanel> {
        let sample_ratio = self.sample_ratio.unwrap_or(1.0);
        let baseline_regime = self.baseline_regime;
        if !(sample_ratio > 0.0 && sample_ratio <= 1.0) {
            return Err(MultiforestError::InvalidDefinition(format!(
                "sample ratio must be in (0, 1], got {sample_ratio}"
            )));
        }

        let mut panel = InMemoryPanel {
            sample_ratio,
            relative: self.relative,
            ..InMemoryPanel::default()
        };

        for (stand, area) in self.stands {
            if !(area > 0.0) {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "stand '{stand}' has non-positive area {area}"
                )));
            }
            if panel.areas.insert(stand.clone(), area).is_some() {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "stand '{stand}' declared twice"
                )));
            }
            panel.stands.push(stand);
        }

        let mut periods = BTreeSet::new();
        for ((stand, period, regime), values) in self.cells {
            if !panel.areas.contains_key(&stand) {
                return Err(MultiforestError::MissingData(format!(
                    "cell references undeclared stand '{stand}'"
                )));
            }
            for (attribute, _) in &values {
                panel.attributes.insert(attribute.clone());
            }
            if baseline_regime.as_ref() == Some(&regime) {
                panel
                    .baseline
                    .entry((stand, period))
                    .or_default()
                    .extend(values);
                continue;
            }
            periods.insert(period);
            if !panel.regimes.contains(&regime) {
                panel.regimes.push(regime.clone());
            }
            panel
                .cells
                .entry((stand, period, regime))
                .or_default()
                .extend(values);
        }

        for ((stand, period), values) in self.baseline {
            if !panel.areas.contains_key(&stand) {
                return Err(MultiforestError::MissingData(format!(
                    "baseline record references undeclared stand '{stand}'"
                )));
            }
            for (attribute, _) in &values {
                panel.attributes.insert(attribute.clone());
            }
            panel
                .baseline
                .entry((stand, period))
                .or_default()
                .extend(values);
        }

        panel.periods = periods.into_iter().collect();
        Ok(panel)
    }
}

#[cfg(test)]
mod tests;

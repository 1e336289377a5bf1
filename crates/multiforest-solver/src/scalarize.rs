//! Epsilon-constraint and reference-point scalarization.
//!
//! Both methods turn the multi-objective problem into a single LP over the
//! registered objective variables. Objectives are compared on the scale of
//! their ranges, so a [`RangeTable`] is required.

use std::collections::{BTreeMap, HashMap};

use multiforest_core::{Direction, MultiforestError, RangeTable, Result};
use tracing::{debug, info};

use crate::model::{LinearExpr, LpBackend, ModelContext, RowId, SolveStatus, VarId};
use crate::objectives::ObjectiveRegistry;

/// Result of one scalarized solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Objective name → value; empty unless the solve was optimal.
    pub values: BTreeMap<String, f64>,
    pub objective_value: Option<f64>,
}

impl SolveOutcome {
    pub(crate) fn collect(ctx: &ModelContext, registry: &ObjectiveRegistry, status: SolveStatus) -> Self {
        Self {
            status,
            values: registry.values(ctx).unwrap_or_default(),
            objective_value: ctx.objective_value(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    pub fn value(&self, objective: &str) -> Option<f64> {
        self.values.get(objective).copied()
    }
}

/// Adds `sign·augmentation/width · o` for every objective with a known,
/// positive width.
pub(crate) fn add_augmentation(
    ctx: &mut ModelContext,
    registry: &ObjectiveRegistry,
    ranges: &RangeTable,
    augmentation: f64,
) {
    if augmentation == 0.0 {
        return;
    }
    for objective in registry.iter() {
        if let Some(width) = ranges.width_if_known(&objective.name) {
            ctx.add_objective_coefficient(objective.var, objective.sign() * augmentation / width);
        }
    }
}

/// Epsilon-constraint rows, one per objective that was ever targeted.
#[derive(Debug, Default)]
pub struct EpsilonConstraints {
    rows: HashMap<String, RowId>,
}

impl EpsilonConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// The row bounding `objective`, once it has been targeted.
    pub fn row(&self, objective: &str) -> Option<RowId> {
        self.rows.get(objective).copied()
    }

    /// Bounds each targeted objective by its epsilon and optimizes the
    /// others.
    ///
    /// Maximized objectives must reach at least their target, minimized ones
    /// may not exceed it. Targets set by earlier calls stay in force until
    /// [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// `MissingData` for unknown objectives, `RangeNotComputed` for
    /// objectives without a range, `ZeroRangeWidth` when an optimized
    /// objective has a degenerate range. No row changes on error.
    pub fn solve(
        &mut self,
        ctx: &mut ModelContext,
        backend: &dyn LpBackend,
        registry: &ObjectiveRegistry,
        ranges: &RangeTable,
        targets: &BTreeMap<String, f64>,
        augmentation: f64,
    ) -> Result<SolveOutcome> {
        for name in targets.keys() {
            registry.require(name)?;
            ranges.require(name)?;
        }
        // Objectives left free are optimized; if every one is bounded they
        // are all optimized within their bounds.
        let all_targeted = registry.names().all(|name| targets.contains_key(name));
        let mut weights = Vec::with_capacity(registry.len());
        for objective in registry.iter() {
            if all_targeted || !targets.contains_key(&objective.name) {
                let width = ranges.width(&objective.name)?;
                weights.push((objective.var, objective.sign() / width));
            }
        }

        for (name, target) in targets {
            let objective = registry.require(name)?;
            let row = match self.rows.get(name) {
                Some(row) => *row,
                None => {
                    let row = ctx.add_row(
                        format!("epsilon:{name}"),
                        &LinearExpr::term(objective.var, 1.0),
                        f64::NEG_INFINITY,
                        f64::INFINITY,
                    )?;
                    self.rows.insert(name.clone(), row);
                    row
                }
            };
            match objective.direction {
                Direction::Max => ctx.set_row_bounds(row, *target, f64::INFINITY),
                Direction::Min => ctx.set_row_bounds(row, f64::NEG_INFINITY, *target),
            }
            debug!(event = "epsilon_bound", objective = %name, target = *target);
        }

        ctx.clear_objective();
        for (var, weight) in weights {
            ctx.add_objective_coefficient(var, weight);
        }
        add_augmentation(ctx, registry, ranges, augmentation);

        let status = ctx.solve(backend);
        info!(event = "epsilon_solved", targets = targets.len(), status = %status);
        Ok(SolveOutcome::collect(ctx, registry, status))
    }

    /// Relaxes every epsilon row to free bounds.
    pub fn reset(&self, ctx: &mut ModelContext) {
        for row in self.rows.values() {
            ctx.relax_row(*row);
        }
        debug!(event = "epsilon_reset", rows = self.rows.len());
    }
}

/// Achievement-scalarizing rows around one shared variable.
#[derive(Debug, Default)]
pub struct ReferencePoint {
    achievement: Option<VarId>,
    rows: HashMap<String, RowId>,
}

impl ReferencePoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared achievement variable, once built.
    pub fn achievement(&self) -> Option<VarId> {
        self.achievement
    }

    /// Maximizes the worst normalized distance to the aspiration levels.
    ///
    /// Objectives missing from `reference` do not constrain the
    /// achievement variable.
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` for an empty reference point, `MissingData` for
    /// unknown objectives, `RangeNotComputed` or `ZeroRangeWidth` when an
    /// objective cannot be normalized.
    pub fn solve(
        &mut self,
        ctx: &mut ModelContext,
        backend: &dyn LpBackend,
        registry: &ObjectiveRegistry,
        ranges: &RangeTable,
        reference: &BTreeMap<String, f64>,
        augmentation: f64,
    ) -> Result<SolveOutcome> {
        if reference.is_empty() {
            return Err(MultiforestError::InvalidDefinition(
                "reference point has no aspiration levels".to_string(),
            ));
        }
        let mut widths = HashMap::with_capacity(reference.len());
        for name in reference.keys() {
            registry.require(name)?;
            widths.insert(name.as_str(), ranges.width(name)?);
        }

        let achievement = match self.achievement {
            Some(var) => var,
            None => {
                let var = ctx.add_free_variable("achievement");
                self.achievement = Some(var);
                var
            }
        };

        for objective in registry.iter() {
            let name = &objective.name;
            let (Some(level), Some(width)) = (reference.get(name), widths.get(name.as_str())) else {
                if let Some(row) = self.rows.get(name) {
                    ctx.relax_row(*row);
                }
                continue;
            };
            // d - sign·o/w ≤ -sign·ref/w
            let sign = objective.sign();
            let expr = LinearExpr::term(achievement, 1.0).with_term(objective.var, -sign / width);
            let upper = -sign * level / width;
            match self.rows.get(name) {
                Some(row) => {
                    ctx.set_row_terms(*row, &expr);
                    ctx.set_row_bounds(*row, f64::NEG_INFINITY, upper);
                }
                None => {
                    let row = ctx.add_less_equal(format!("achievement:{name}"), &expr, upper)?;
                    self.rows.insert(name.clone(), row);
                }
            }
        }

        ctx.clear_objective();
        ctx.set_objective_coefficient(achievement, 1.0);
        add_augmentation(ctx, registry, ranges, augmentation);

        let status = ctx.solve(backend);
        info!(
            event = "reference_point_solved",
            objectives = reference.len(),
            status = %status,
            achievement = ctx.value(achievement),
        );
        Ok(SolveOutcome::collect(ctx, registry, status))
    }
}

//! Policy constraints.
//!
//! Every constraint family is built once, when registered, and switched on
//! or off afterwards by re-bounding its rows. A disabled row keeps its
//! coefficients but is bounded by the sentinel (or by 1 for allowed
//! regimes), so toggling never rebuilds the model.

use std::collections::HashMap;

use multiforest_core::{
    ConstraintDefinition, ConstraintKind, MultiforestError, PanelStore, Result, StandAggregation,
    Year,
};
use tracing::{debug, info, warn};

use crate::aggregation::{check_attributes, stand_expression};
use crate::allocator::DecisionVariables;
use crate::model::{LinearExpr, ModelContext, RowId, VarId};

#[derive(Debug)]
struct PolicyEntry {
    definition: ConstraintDefinition,
    rows: Vec<RowId>,
    enabled: bool,
}

/// The registered policy constraints.
#[derive(Debug)]
pub struct PolicyConstraints {
    entries: Vec<PolicyEntry>,
    index: HashMap<String, usize>,
    sentinel: f64,
}

impl PolicyConstraints {
    pub fn new(sentinel: f64) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            sentinel,
        }
    }

    pub fn sentinel(&self) -> f64 {
        self.sentinel
    }

    /// Builds the rows of one constraint and applies its initial state.
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` for invalid parameters or a name already in use,
    /// `MissingData` for attributes the panel does not carry.
    pub fn register(
        &mut self,
        ctx: &mut ModelContext,
        panel: &dyn PanelStore,
        decisions: &mut DecisionVariables,
        definition: &ConstraintDefinition,
    ) -> Result<()> {
        definition.validate()?;
        if self.index.contains_key(&definition.name) {
            return Err(MultiforestError::InvalidDefinition(format!(
                "constraint '{}' registered twice",
                definition.name
            )));
        }

        let name = &definition.name;
        let rows = match &definition.kind {
            ConstraintKind::AllowedRegimes { allowed, attribute } => {
                check_attributes(panel, attribute, &StandAggregation::Sum)?;
                let first = *panel.periods().first().ok_or_else(|| {
                    MultiforestError::MissingData("panel has no planning periods".to_string())
                })?;
                let mut rows = Vec::new();
                for decision in decisions.iter() {
                    if allowed.contains(&decision.regime) {
                        continue;
                    }
                    let flagged = panel
                        .value(&decision.stand, first, &decision.regime, attribute)
                        .is_some_and(|v| v != 0.0);
                    if !flagged {
                        continue;
                    }
                    rows.push(ctx.add_less_equal(
                        format!("policy:{name}:{}:{}", decision.stand, decision.regime),
                        &LinearExpr::term(decision.var, 1.0),
                        1.0,
                    )?);
                }
                rows
            }
            ConstraintKind::SpeciesReduction {
                attribute,
                periods,
                amount,
                aggregation,
            } => {
                let a = aggregates(ctx, panel, decisions, attribute, aggregation)?;
                let s = series(ctx, panel.periods(), name, "s", &a)?;
                lagged_rows(ctx, panel.periods(), name, &s, *periods, 1.0 - amount)?
            }
            ConstraintKind::SpeciesIncrease {
                attribute,
                periods,
                amount,
                aggregation,
            } => {
                let a = aggregates(ctx, panel, decisions, attribute, aggregation)?;
                let s = series(ctx, panel.periods(), name, "s", &a)?;
                lagged_rows(ctx, panel.periods(), name, &s, *periods, 1.0 + amount)?
            }
            ConstraintKind::LessThan {
                left,
                right,
                left_aggregation,
                right_aggregation,
            } => {
                // Both sides resolve before any variable is added.
                let left = aggregates(ctx, panel, decisions, left, left_aggregation)?;
                let right = aggregates(ctx, panel, decisions, right, right_aggregation)?;
                let l = series(ctx, panel.periods(), name, "l", &left)?;
                let r = series(ctx, panel.periods(), name, "r", &right)?;
                let mut rows = Vec::with_capacity(l.len());
                for ((period, l), r) in panel.periods().iter().zip(&l).zip(&r) {
                    let expr = LinearExpr::term(*l, 1.0).with_term(*r, -1.0);
                    rows.push(ctx.add_row(
                        format!("policy:{name}@{period}"),
                        &expr,
                        f64::NEG_INFINITY,
                        f64::INFINITY,
                    )?);
                }
                rows
            }
        };

        info!(
            event = "constraint_registered",
            constraint = %name,
            kind = definition.kind.code(),
            rows = rows.len(),
        );
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(PolicyEntry {
            definition: definition.clone(),
            rows,
            // Inverted so the toggle below applies the initial bounds.
            enabled: !definition.enabled,
        });
        self.set_enabled(ctx, name, definition.enabled)
    }

    /// Switches a constraint on or off.
    ///
    /// # Errors
    ///
    /// `MissingData` if no constraint has this name.
    pub fn set_enabled(&mut self, ctx: &mut ModelContext, name: &str, enabled: bool) -> Result<()> {
        let position = *self
            .index
            .get(name)
            .ok_or_else(|| MultiforestError::MissingData(format!("unknown constraint '{name}'")))?;
        let sentinel = self.sentinel;
        let entry = &mut self.entries[position];
        if entry.enabled == enabled {
            return Ok(());
        }
        let (lower, upper) = row_bounds(&entry.definition.kind, enabled, sentinel);
        for row in &entry.rows {
            ctx.set_row_bounds(*row, lower, upper);
        }
        entry.enabled = enabled;
        info!(event = "constraint_toggled", constraint = %name, enabled, rows = entry.rows.len());
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.index.get(name).map(|i| self.entries[*i].enabled)
    }

    pub fn rows(&self, name: &str) -> Option<&[RowId]> {
        self.index.get(name).map(|i| self.entries[*i].rows.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.definition.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The aggregate of `attribute` in every period.
fn aggregates(
    ctx: &mut ModelContext,
    panel: &dyn PanelStore,
    decisions: &mut DecisionVariables,
    attribute: &str,
    aggregation: &StandAggregation,
) -> Result<Vec<LinearExpr>> {
    check_attributes(panel, attribute, aggregation)?;
    panel
        .periods()
        .iter()
        .map(|period| stand_expression(ctx, panel, decisions, *period, attribute, aggregation))
        .collect()
}

/// One auxiliary variable per period tied to its aggregate.
fn series(
    ctx: &mut ModelContext,
    periods: &[Year],
    name: &str,
    tag: &str,
    aggregates: &[LinearExpr],
) -> Result<Vec<VarId>> {
    let mut vars = Vec::with_capacity(periods.len());
    for (period, aggregate) in periods.iter().zip(aggregates) {
        let var = ctx.add_free_variable(format!("policy:{name}:{tag}@{period}"));
        let mut tie = LinearExpr::term(var, 1.0);
        tie.add_scaled(aggregate, -1.0);
        ctx.add_equality(format!("policy:{name}:{tag}@{period}"), &tie, 0.0)?;
        vars.push(var);
    }
    Ok(vars)
}

/// Rows `s(t) - factor·s(t - lag)` with free bounds.
fn lagged_rows(
    ctx: &mut ModelContext,
    periods: &[Year],
    name: &str,
    s: &[VarId],
    lag: usize,
    factor: f64,
) -> Result<Vec<RowId>> {
    if lag >= s.len() {
        warn!(
            event = "constraint_without_rows",
            constraint = %name,
            lag,
            periods = s.len(),
        );
        return Ok(Vec::new());
    }
    let mut rows = Vec::with_capacity(s.len() - lag);
    for t in lag..s.len() {
        let expr = LinearExpr::term(s[t], 1.0).with_term(s[t - lag], -factor);
        let row = ctx.add_row(
            format!("policy:{name}@{}", periods[t]),
            &expr,
            f64::NEG_INFINITY,
            f64::INFINITY,
        )?;
        debug!(event = "policy_row", constraint = %name, period = periods[t], factor);
        rows.push(row);
    }
    Ok(rows)
}

fn row_bounds(kind: &ConstraintKind, enabled: bool, sentinel: f64) -> (f64, f64) {
    match kind {
        ConstraintKind::AllowedRegimes { .. } => {
            (f64::NEG_INFINITY, if enabled { 0.0 } else { 1.0 })
        }
        ConstraintKind::SpeciesReduction { .. } => {
            (if enabled { 0.0 } else { -sentinel }, f64::INFINITY)
        }
        ConstraintKind::SpeciesIncrease { .. } | ConstraintKind::LessThan { .. } => {
            (f64::NEG_INFINITY, if enabled { 0.0 } else { sentinel })
        }
    }
}

//! Objective aggregation engine.
//!
//! Every registered objective owns one free variable per planning period,
//! tied by equality to the stand-wise aggregate of its attribute, and one
//! objective variable tied to the per-period variables by the year-wise
//! policy.

use std::collections::{BTreeMap, HashMap};

use multiforest_core::{
    Direction, MultiforestError, ObjectiveDefinition, PanelStore, Result, Year, YearAggregation,
};
use tracing::{debug, info};

use crate::aggregation::{check_attributes, stand_expression};
use crate::allocator::DecisionVariables;
use crate::model::{LinearExpr, ModelContext, VarId};

const NEG_INF: f64 = f64::NEG_INFINITY;
const INF: f64 = f64::INFINITY;

/// An objective known to the model.
#[derive(Debug, Clone)]
pub struct RegisteredObjective {
    pub name: String,
    pub label: String,
    pub direction: Direction,
    /// The objective variable.
    pub var: VarId,
    /// Per-period variables; empty for objectives not built from a panel
    /// attribute (demand targets).
    pub by_period: Vec<VarId>,
    pub definition: Option<ObjectiveDefinition>,
}

impl RegisteredObjective {
    /// +1 for maximized objectives, -1 for minimized ones.
    pub fn sign(&self) -> f64 {
        self.direction.sign()
    }
}

/// All objectives in registration order.
#[derive(Debug, Default)]
pub struct ObjectiveRegistry {
    objectives: Vec<RegisteredObjective>,
    index: HashMap<String, usize>,
}

impl ObjectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the rows of one objective.
    ///
    /// # Errors
    ///
    /// - `DuplicateObjective` if the name is taken
    /// - `InconsistentDirection` / `InvalidDefinition` from validation, or
    ///   when the policy parameters do not fit the panel's periods
    /// - `MissingData` for unknown attributes, cells lacking the attribute,
    ///   or an initial value that cannot be resolved
    pub fn register(
        &mut self,
        ctx: &mut ModelContext,
        panel: &dyn PanelStore,
        decisions: &mut DecisionVariables,
        definition: &ObjectiveDefinition,
    ) -> Result<()> {
        let anchor = self.check(panel, definition)?;
        let periods = panel.periods().to_vec();

        let mut aggregates = Vec::with_capacity(periods.len());
        for period in &periods {
            aggregates.push(stand_expression(
                ctx,
                panel,
                decisions,
                *period,
                &definition.attribute,
                &definition.stand_aggregation,
            )?);
        }

        let name = &definition.name;
        let mut by_period = Vec::with_capacity(periods.len());
        for (period, aggregate) in periods.iter().zip(&aggregates) {
            let v = ctx.add_free_variable(format!("{name}@{period}"));
            let mut tie = LinearExpr::term(v, 1.0);
            tie.add_scaled(aggregate, -1.0);
            ctx.add_equality(format!("stand:{name}@{period}"), &tie, 0.0)?;
            by_period.push(v);
        }

        let var = ctx.add_free_variable(name.clone());
        let rows = year_rows(&definition.year_aggregation, var, &by_period, &periods, anchor);
        for (k, (expr, lower, upper)) in rows.iter().enumerate() {
            ctx.add_row(format!("year:{name}#{k}"), expr, *lower, *upper)?;
        }
        debug!(
            event = "objective_rows",
            objective = %name,
            stand_policy = definition.stand_aggregation.code(),
            year_policy = definition.year_aggregation.code(),
            rows = rows.len(),
        );

        self.push(RegisteredObjective {
            name: name.clone(),
            label: definition.label.clone(),
            direction: definition.direction,
            var,
            by_period,
            definition: Some(definition.clone()),
        });
        info!(event = "objective_registered", objective = %name, direction = %definition.direction);
        Ok(())
    }

    /// Runs every check [`register`](Self::register) makes before it
    /// touches the model, returning the slope anchor if the policy has one.
    pub(crate) fn check(
        &self,
        panel: &dyn PanelStore,
        definition: &ObjectiveDefinition,
    ) -> Result<Option<Anchor>> {
        definition.validate()?;
        self.ensure_unique(&definition.name)?;
        check_attributes(panel, &definition.attribute, &definition.stand_aggregation)?;

        let periods = panel.periods();
        let first = *periods.first().ok_or_else(|| {
            MultiforestError::MissingData("panel has no planning periods".to_string())
        })?;
        let anchor = match definition.year_aggregation {
            YearAggregation::TargetYearWithSlope { .. } => Some(Anchor {
                value: initial_value(panel, definition)?,
                year: panel.baseline_year().unwrap_or(first),
            }),
            _ => None,
        };
        check_policy(&definition.name, &definition.year_aggregation, periods, anchor)?;
        Ok(anchor)
    }

    /// Fails with `DuplicateObjective` if `name` is registered.
    pub fn ensure_unique(&self, name: &str) -> Result<()> {
        if self.index.contains_key(name) {
            return Err(MultiforestError::DuplicateObjective(name.to_string()));
        }
        Ok(())
    }

    /// Adds an objective whose rows were built elsewhere.
    pub(crate) fn push(&mut self, objective: RegisteredObjective) {
        self.index
            .insert(objective.name.clone(), self.objectives.len());
        self.objectives.push(objective);
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredObjective> {
        self.index.get(name).map(|i| &self.objectives[*i])
    }

    /// Looks an objective up, failing with `MissingData` if unknown.
    pub fn require(&self, name: &str) -> Result<&RegisteredObjective> {
        self.get(name)
            .ok_or_else(|| MultiforestError::MissingData(format!("unknown objective '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredObjective> {
        self.objectives.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objectives.iter().map(|o| o.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }

    /// Objective values of the last optimal solution.
    pub fn values(&self, ctx: &ModelContext) -> Option<BTreeMap<String, f64>> {
        self.objectives
            .iter()
            .map(|o| ctx.value(o.var).map(|v| (o.name.clone(), v)))
            .collect()
    }
}

/// Initial value and year used by `targetYearWithSlope`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Anchor {
    pub value: f64,
    pub year: Year,
}

/// Relative attributes start at 1; otherwise an explicit override wins over
/// the panel's baseline total.
pub(crate) fn initial_value(panel: &dyn PanelStore, definition: &ObjectiveDefinition) -> Result<f64> {
    if panel.is_relative(&definition.attribute) {
        return Ok(1.0);
    }
    if let Some(value) = definition.initial_value {
        return Ok(value);
    }
    panel.baseline_total(&definition.attribute).ok_or_else(|| {
        MultiforestError::MissingData(format!(
            "objective '{}' needs an initial value but attribute '{}' has no baseline",
            definition.name, definition.attribute
        ))
    })
}

/// Rejects policy parameters that do not fit the planning periods.
pub(crate) fn check_policy(
    name: &str,
    policy: &YearAggregation,
    periods: &[Year],
    anchor: Option<Anchor>,
) -> Result<()> {
    let invalid = |message: String| {
        Err(MultiforestError::InvalidDefinition(format!(
            "objective '{name}': {message}"
        )))
    };
    match policy {
        YearAggregation::MinYearlyIncrease | YearAggregation::MaxYearlyIncrease
            if periods.len() < 2 =>
        {
            invalid(format!("'{}' needs at least two periods", policy.code()))
        }
        YearAggregation::MaxDecreaseDuringNPeriods { periods: n }
        | YearAggregation::MinIncreaseDuringNPeriods { periods: n }
            if *n >= periods.len() =>
        {
            invalid(format!(
                "'{}' spans {n} periods but only {} exist",
                policy.code(),
                periods.len()
            ))
        }
        YearAggregation::TargetYear { year } if !periods.iter().any(|t| t > year) => {
            invalid(format!("no period after target year {year}"))
        }
        YearAggregation::TargetYearWithSlope { year } => match anchor {
            Some(anchor) if anchor.year == *year => {
                invalid(format!("target year {year} equals the initial year"))
            }
            Some(_) => Ok(()),
            None => invalid("a slope target needs an initial value".to_string()),
        },
        YearAggregation::PeriodicTargets { targets } if targets.len() != periods.len() => {
            invalid(format!(
                "{} periodic targets for {} periods",
                targets.len(),
                periods.len()
            ))
        }
        _ => Ok(()),
    }
}

/// Rows `(expr, lower, upper)` tying the objective `o` to the per-period
/// variables `v`.
pub(crate) fn year_rows(
    policy: &YearAggregation,
    o: VarId,
    v: &[VarId],
    periods: &[Year],
    anchor: Option<Anchor>,
) -> Vec<(LinearExpr, f64, f64)> {
    let n = v.len();
    // o - v(t) compared against zero
    let gap = |t: usize| LinearExpr::term(o, 1.0).with_term(v[t], -1.0);
    // o - (v(t) - v(t - lag)) compared against zero
    let change = |t: usize, lag: usize| gap(t).with_term(v[t - lag], 1.0);

    match policy {
        YearAggregation::Min => (0..n).map(|t| (gap(t), NEG_INF, 0.0)).collect(),
        YearAggregation::Max => (0..n).map(|t| (gap(t), 0.0, INF)).collect(),
        YearAggregation::Average | YearAggregation::Sum => {
            let weight = match policy {
                YearAggregation::Average => 1.0 / n as f64,
                _ => 1.0,
            };
            let mut expr = LinearExpr::term(o, 1.0);
            for var in v {
                expr.add_term(*var, -weight);
            }
            vec![(expr, 0.0, 0.0)]
        }
        YearAggregation::FirstYear => vec![(gap(0), 0.0, 0.0)],
        YearAggregation::LastYear => vec![(gap(n - 1), 0.0, 0.0)],
        YearAggregation::MinYearlyIncrease => {
            (1..n).map(|t| (change(t, 1), NEG_INF, 0.0)).collect()
        }
        YearAggregation::MaxYearlyIncrease => (1..n).map(|t| (change(t, 1), 0.0, INF)).collect(),
        YearAggregation::MaxDecreaseDuringNPeriods { periods: lag } => {
            (*lag..n).map(|t| (change(t, *lag), 0.0, INF)).collect()
        }
        YearAggregation::MinIncreaseDuringNPeriods { periods: lag } => {
            (*lag..n).map(|t| (change(t, *lag), NEG_INF, 0.0)).collect()
        }
        YearAggregation::TargetYearWithSlope { year } => {
            let Some(anchor) = anchor else {
                return Vec::new();
            };
            let span = f64::from(*year - anchor.year);
            periods
                .iter()
                .enumerate()
                .map(|(t, period)| {
                    if period <= year {
                        // v(t) - c·o ≥ (1 - c)·initial
                        let c = f64::from(*period - anchor.year) / span;
                        let expr = LinearExpr::term(v[t], 1.0).with_term(o, -c);
                        (expr, (1.0 - c) * anchor.value, INF)
                    } else {
                        (LinearExpr::term(v[t], 1.0).with_term(o, -1.0), 0.0, INF)
                    }
                })
                .collect()
        }
        YearAggregation::TargetYear { year } => periods
            .iter()
            .position(|t| t > year)
            .map(|t| vec![(gap(t), 0.0, 0.0)])
            .unwrap_or_default(),
        YearAggregation::PeriodicTargets { targets } => (0..n)
            .map(|t| {
                // o ≤ (v(t) - T) / T  ⇔  o - v(t)/T ≤ -1
                let expr = LinearExpr::term(o, 1.0).with_term(v[t], -1.0 / targets[t]);
                (expr, NEG_INF, -1.0)
            })
            .collect(),
    }
}

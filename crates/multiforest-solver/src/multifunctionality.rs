//! Eyvindson multifunctionality index.
//!
//! Objectives are normalized to `[0, 1]` (1 = best) over their ranges,
//! combined per ecosystem-service group, and the smallest group value, the
//! index, is maximized.

use std::collections::{BTreeMap, HashMap};

use multiforest_core::{
    validate_groups, Direction, GroupAggregation, MultiforestError, RangeTable, Result,
    ServiceGroup,
};
use tracing::{debug, info};

use crate::model::{LinearExpr, LpBackend, ModelContext, RowId, VarId};
use crate::objectives::ObjectiveRegistry;
use crate::scalarize::SolveOutcome;

/// Result of a multifunctionality solve.
#[derive(Debug, Clone, PartialEq)]
pub struct MultifunctionalityOutcome {
    pub outcome: SolveOutcome,
    /// Group name → group value; empty unless optimal.
    pub groups: BTreeMap<String, f64>,
    pub index: Option<f64>,
}

#[derive(Debug)]
struct GroupRows {
    name: String,
    var: VarId,
    rows: Vec<RowId>,
}

#[derive(Debug)]
struct Layout {
    groups: Vec<GroupRows>,
    index: VarId,
    index_rows: Vec<RowId>,
}

/// Group and index rows, built once per distinct group layout.
#[derive(Debug, Default)]
pub struct Multifunctionality {
    layouts: HashMap<Vec<ServiceGroup>, Layout>,
    active: Option<Vec<ServiceGroup>>,
}

impl Multifunctionality {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of layouts built so far.
    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    /// Maximizes the multifunctionality index of `groups`.
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` for an invalid layout, `MissingData` for groups
    /// naming unknown objectives, `RangeNotComputed` or `ZeroRangeWidth`
    /// when a member cannot be normalized.
    pub fn solve(
        &mut self,
        ctx: &mut ModelContext,
        backend: &dyn LpBackend,
        registry: &ObjectiveRegistry,
        ranges: &RangeTable,
        groups: &[ServiceGroup],
        augmentation: f64,
    ) -> Result<MultifunctionalityOutcome> {
        validate_groups(groups)?;
        for group in groups {
            for member in &group.objectives {
                registry.require(member)?;
                ranges.width(member)?;
            }
        }

        self.activate(ctx, groups)?;
        let layout = self.layouts.get(groups).ok_or_else(|| {
            MultiforestError::InvalidState("group layout was not built".to_string())
        })?;

        for (group, rows) in groups.iter().zip(&layout.groups) {
            refresh_group(ctx, registry, ranges, group, rows)?;
        }

        ctx.clear_objective();
        ctx.set_objective_coefficient(layout.index, 1.0);
        for group in &layout.groups {
            ctx.add_objective_coefficient(group.var, augmentation);
        }

        let status = ctx.solve(backend);
        let outcome = SolveOutcome::collect(ctx, registry, status);
        let group_values: BTreeMap<String, f64> = layout
            .groups
            .iter()
            .filter_map(|g| ctx.value(g.var).map(|v| (g.name.clone(), v)))
            .collect();
        let index = ctx.value(layout.index);
        info!(
            event = "multifunctionality_solved",
            groups = groups.len(),
            status = %status,
            index,
        );
        Ok(MultifunctionalityOutcome {
            outcome,
            groups: group_values,
            index,
        })
    }

    /// Builds the layout on first use and makes it the only one whose index
    /// rows are active.
    fn activate(&mut self, ctx: &mut ModelContext, groups: &[ServiceGroup]) -> Result<()> {
        if self.active.as_deref() == Some(groups) {
            return Ok(());
        }
        if let Some(previous) = self.active.take().and_then(|key| self.layouts.get(&key)) {
            for row in &previous.index_rows {
                ctx.relax_row(*row);
            }
        }
        match self.layouts.get(groups) {
            Some(layout) => {
                for row in &layout.index_rows {
                    ctx.set_row_bounds(*row, f64::NEG_INFINITY, 0.0);
                }
            }
            None => {
                let layout = build_layout(ctx, groups, self.layouts.len())?;
                self.layouts.insert(groups.to_vec(), layout);
            }
        }
        self.active = Some(groups.to_vec());
        Ok(())
    }
}

fn build_layout(ctx: &mut ModelContext, groups: &[ServiceGroup], id: usize) -> Result<Layout> {
    let index = ctx.add_free_variable(format!("mfi:{id}"));
    let mut layout = Layout {
        groups: Vec::with_capacity(groups.len()),
        index,
        index_rows: Vec::with_capacity(groups.len()),
    };
    for group in groups {
        let name = &group.name;
        let var = ctx.add_free_variable(format!("group:{id}:{name}"));
        // Terms and bounds are filled in by refresh_group.
        let row_count = match group.aggregation {
            GroupAggregation::Minimum if !group.is_singleton() => group.objectives.len(),
            _ => 1,
        };
        let mut rows = Vec::with_capacity(row_count);
        for k in 0..row_count {
            rows.push(ctx.add_row(
                format!("group:{id}:{name}#{k}"),
                &LinearExpr::term(var, 1.0),
                f64::NEG_INFINITY,
                f64::INFINITY,
            )?);
        }
        // I - g ≤ 0
        let tie = LinearExpr::term(index, 1.0).with_term(var, -1.0);
        layout
            .index_rows
            .push(ctx.add_less_equal(format!("mfi:{id}:{name}"), &tie, 0.0)?);
        layout.groups.push(GroupRows {
            name: name.clone(),
            var,
            rows,
        });
    }
    debug!(event = "group_layout_built", layout = id, groups = groups.len());
    Ok(layout)
}

/// Normalized performance `n = scale·o + offset`.
fn normalized(
    registry: &ObjectiveRegistry,
    ranges: &RangeTable,
    objective: &str,
) -> Result<(VarId, f64, f64)> {
    let registered = registry.require(objective)?;
    let range = ranges.require(objective)?;
    let width = range.width(objective)?;
    Ok(match registered.direction {
        Direction::Max => (registered.var, 1.0 / width, -range.lower / width),
        Direction::Min => (registered.var, -1.0 / width, range.upper / width),
    })
}

fn refresh_group(
    ctx: &mut ModelContext,
    registry: &ObjectiveRegistry,
    ranges: &RangeTable,
    group: &ServiceGroup,
    rows: &GroupRows,
) -> Result<()> {
    if rows.rows.len() == 1 {
        // g - mean(n) = 0; a singleton is the identity.
        let weight = 1.0 / group.objectives.len() as f64;
        let mut expr = LinearExpr::term(rows.var, 1.0);
        let mut rhs = 0.0;
        for member in &group.objectives {
            let (var, scale, offset) = normalized(registry, ranges, member)?;
            expr.add_term(var, -weight * scale);
            rhs += weight * offset;
        }
        ctx.set_row_terms(rows.rows[0], &expr);
        ctx.set_row_bounds(rows.rows[0], rhs, rhs);
    } else {
        // g - n_i ≤ 0
        for (member, row) in group.objectives.iter().zip(&rows.rows) {
            let (var, scale, offset) = normalized(registry, ranges, member)?;
            let expr = LinearExpr::term(rows.var, 1.0).with_term(var, -scale);
            ctx.set_row_terms(*row, &expr);
            ctx.set_row_bounds(*row, f64::NEG_INFINITY, offset);
        }
    }
    Ok(())
}

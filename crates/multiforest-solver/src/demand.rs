//! Demand targets.
//!
//! Source attributes (log volumes, say) are routed to demand targets
//! through non-negative flow variables; what reaches a target is scaled by
//! the transfer rate. Each target becomes an objective measuring how well
//! demand is met, and every secondary transfer an objective measuring how
//! much it is used.

use std::collections::BTreeMap;

use multiforest_core::{
    DemandTargets, Direction, MultiforestError, PanelStore, Result, StandAggregation, Usage,
};
use tracing::info;

use crate::aggregation::{check_attributes, stand_expression};
use crate::allocator::DecisionVariables;
use crate::model::{LinearExpr, ModelContext, VarId};
use crate::objectives::{ObjectiveRegistry, RegisteredObjective};

/// Flow variables of one set of demand targets, per (source, target), one
/// per period.
#[derive(Debug, Default)]
pub struct DemandFlows {
    flows: BTreeMap<(String, String), Vec<VarId>>,
}

impl DemandFlows {
    pub fn flow(&self, source: &str, target: &str) -> Option<&[VarId]> {
        self.flows
            .get(&(source.to_string(), target.to_string()))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Builds flows, balance rows and the demand objectives, and adds the
/// objectives to `registry`.
///
/// Relative matching maximizes the smallest share of demand met over the
/// periods; exact matching minimizes the largest absolute deviation.
///
/// # Errors
///
/// `InvalidDefinition` when the targets do not fit the panel's periods or a
/// source is already routed, `MissingData` for unknown source attributes or
/// cells lacking them, `DuplicateObjective` when an objective name is
/// taken. Nothing is added to the model on error.
pub fn register_demand(
    ctx: &mut ModelContext,
    panel: &dyn PanelStore,
    decisions: &mut DecisionVariables,
    registry: &mut ObjectiveRegistry,
    targets: &DemandTargets,
) -> Result<DemandFlows> {
    let periods = panel.periods().to_vec();
    targets.validate(periods.len())?;
    for name in targets.objective_names() {
        registry.ensure_unique(&name)?;
    }
    let mut supplies = Vec::with_capacity(targets.transfers.len());
    for source in targets.transfers.keys() {
        check_attributes(panel, source, &StandAggregation::Sum)?;
        if let Some(year) = periods.first() {
            if ctx.find_row(&format!("flow:{source}@{year}")).is_some() {
                return Err(MultiforestError::InvalidDefinition(format!(
                    "source '{source}' is already routed to demand targets"
                )));
            }
        }
        let supply = periods
            .iter()
            .map(|year| stand_expression(ctx, panel, decisions, *year, source, &StandAggregation::Sum))
            .collect::<Result<Vec<_>>>()?;
        supplies.push(supply);
    }

    let mut flows = DemandFlows::default();
    for ((source, routes), supply) in targets.transfers.iter().zip(&supplies) {
        let mut by_target: Vec<Vec<VarId>> = Vec::with_capacity(routes.len());
        for target in routes.keys() {
            let vars = periods
                .iter()
                .map(|year| ctx.add_variable(format!("flow:{source}:{target}@{year}"), 0.0, f64::INFINITY))
                .collect();
            by_target.push(vars);
        }
        // Σ_target f(source, t, target) = supply(source, t)
        for (t, year) in periods.iter().enumerate() {
            let mut balance = LinearExpr::new();
            for vars in &by_target {
                balance.add_term(vars[t], 1.0);
            }
            balance.add_scaled(&supply[t], -1.0);
            ctx.add_equality(format!("flow:{source}@{year}"), &balance, 0.0)?;
        }
        for (target, vars) in routes.keys().zip(by_target) {
            flows.flows.insert((source.clone(), target.clone()), vars);
        }
    }

    for (target, demand) in &targets.targets {
        let name = DemandTargets::demand_objective_name(target);
        let var = ctx.add_free_variable(name.clone());
        let direction = if targets.exact_matching {
            Direction::Min
        } else {
            Direction::Max
        };
        for (t, year) in periods.iter().enumerate() {
            let mut delivered = LinearExpr::new();
            for (source, transfer) in targets.sources_of(target) {
                if let Some(vars) = flows.flow(source, target) {
                    delivered.add_term(vars[t], transfer.rate);
                }
            }
            if targets.exact_matching {
                // o ≥ delivered - d  and  o ≥ d - delivered
                let mut over = LinearExpr::term(var, 1.0);
                over.add_scaled(&delivered, -1.0);
                ctx.add_greater_equal(format!("demand:{target}@{year}#over"), &over, -demand[t])?;
                let mut under = LinearExpr::term(var, 1.0);
                under.add_scaled(&delivered, 1.0);
                ctx.add_greater_equal(format!("demand:{target}@{year}#under"), &under, demand[t])?;
            } else {
                // o ≤ delivered / d
                let mut share = LinearExpr::term(var, 1.0);
                share.add_scaled(&delivered, -1.0 / demand[t]);
                ctx.add_less_equal(format!("demand:{target}@{year}"), &share, 0.0)?;
            }
        }
        registry.push(demand_objective(name, direction, var));
    }

    for (source, routes) in &targets.transfers {
        for (target, transfer) in routes {
            if transfer.usage != Usage::Secondary {
                continue;
            }
            let name = DemandTargets::secondary_objective_name(source, target);
            let var = ctx.add_free_variable(name.clone());
            let mut usage = LinearExpr::term(var, 1.0);
            if let Some(vars) = flows.flow(source, target) {
                for flow in vars {
                    usage.add_term(*flow, -1.0);
                }
            }
            ctx.add_equality(format!("usage:{source}:{target}"), &usage, 0.0)?;
            registry.push(demand_objective(name, Direction::Min, var));
        }
    }

    info!(
        event = "demand_registered",
        targets = targets.targets.len(),
        flows = flows.len(),
        exact = targets.exact_matching,
    );
    Ok(flows)
}

fn demand_objective(name: String, direction: Direction, var: VarId) -> RegisteredObjective {
    RegisteredObjective {
        label: name.clone(),
        name,
        direction,
        var,
        by_period: Vec::new(),
        definition: None,
    }
}

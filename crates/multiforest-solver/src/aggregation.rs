//! Stand-wise aggregation: one attribute in one period as a linear
//! expression over the decision variables.

use multiforest_core::{MultiforestError, PanelStore, Result, StandAggregation, Year};

use crate::allocator::{Decision, DecisionVariables};
use crate::model::{LinearExpr, ModelContext};

/// Fails with `MissingData` unless the panel knows every attribute the
/// policy reads.
pub(crate) fn check_attributes(
    panel: &dyn PanelStore,
    attribute: &str,
    policy: &StandAggregation,
) -> Result<()> {
    if !panel.has_attribute(attribute) {
        return Err(MultiforestError::MissingData(format!(
            "attribute '{attribute}' is not present in the panel"
        )));
    }
    if let StandAggregation::SubsetSum { secondary } = policy {
        if !panel.has_attribute(secondary) {
            return Err(MultiforestError::MissingData(format!(
                "secondary attribute '{secondary}' is not present in the panel"
            )));
        }
    }
    Ok(())
}

/// Builds the aggregate of `attribute` over all stands in `period`.
///
/// Decisions whose regime has no cell in `period` are closed first and
/// contribute nothing.
pub(crate) fn stand_expression(
    ctx: &mut ModelContext,
    panel: &dyn PanelStore,
    decisions: &mut DecisionVariables,
    period: Year,
    attribute: &str,
    policy: &StandAggregation,
) -> Result<LinearExpr> {
    decisions.close_missing(ctx, panel, period);

    let mut expr = LinearExpr::new();
    for decision in decisions.iter() {
        if decisions.is_closed(decision.var) {
            continue;
        }
        let value = cell_value(panel, decision, period, attribute)?;
        let coefficient = match policy {
            StandAggregation::Sum => value,
            StandAggregation::AreaWeightedSum | StandAggregation::AreaWeightedAverage => {
                value * stand_area(panel, decision)?
            }
            StandAggregation::SubsetSum { secondary } => {
                value * cell_value(panel, decision, period, secondary)?
            }
        };
        expr.add_term(decision.var, coefficient);
    }

    let divisor = match policy {
        StandAggregation::AreaWeightedAverage => panel.total_area(),
        _ if policy.rescales(panel.is_relative(attribute)) => panel.sample_ratio(),
        _ => 1.0,
    };
    if divisor != 1.0 {
        expr.scale(1.0 / divisor);
    }
    Ok(expr)
}

fn cell_value(
    panel: &dyn PanelStore,
    decision: &Decision,
    period: Year,
    attribute: &str,
) -> Result<f64> {
    panel
        .value(&decision.stand, period, &decision.regime, attribute)
        .ok_or_else(|| {
            MultiforestError::MissingData(format!(
                "cell ({}, {period}, {}) has no value for '{attribute}'",
                decision.stand, decision.regime
            ))
        })
}

fn stand_area(panel: &dyn PanelStore, decision: &Decision) -> Result<f64> {
    panel.area(&decision.stand).ok_or_else(|| {
        MultiforestError::MissingData(format!("stand '{}' has no area", decision.stand))
    })
}
